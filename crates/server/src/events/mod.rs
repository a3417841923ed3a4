//! Shipment webhook payloads and typed extraction.

pub mod extract;
pub mod types;

pub use extract::*;
pub use types::*;
