//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument.

pub mod content_repo;
pub mod lookup_repo;
pub mod user_content_repo;

pub use content_repo::ContentRepo;
pub use lookup_repo::LookupRepo;
pub use user_content_repo::UserContentRepo;
