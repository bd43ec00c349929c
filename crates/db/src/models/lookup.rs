//! Lookup entity row model, shared by all four reference tables.

use marquee_core::content::LookupEntity;
use marquee_core::types::DbId;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct LookupRow {
    pub id: DbId,
    pub name: String,
}

impl LookupRow {
    pub fn into_entity<T: LookupEntity>(self) -> T {
        T::from_parts(self.id, self.name)
    }
}
