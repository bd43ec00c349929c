//! Row models decoded straight from query results.

pub mod content;
pub mod lookup;
