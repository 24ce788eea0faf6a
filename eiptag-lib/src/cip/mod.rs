//! Pure CIP codec: request building and response parsing, no I/O.

pub mod encap;
pub mod path;
pub mod response;
pub mod service;
pub mod types;

pub use response::CipResponse;
