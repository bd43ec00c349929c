pub mod content;
pub mod lookup;
