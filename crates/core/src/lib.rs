//! Domain core of the content catalog.
//!
//! Holds the content aggregate, the listing inputs, the storage ports and the
//! usecase that ties them together. No database or HTTP types live here.

pub mod content;
pub mod error;
pub mod filter;
pub mod ports;
pub mod service;
pub mod types;
