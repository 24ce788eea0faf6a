#![forbid(unsafe_code)]

//! Client library for reading and writing named tags on PLCs speaking
//! EtherNet/IP with embedded CIP messages over TCP. Callers address data by
//! symbolic tag name, optionally with array indices or bit selectors; the
//! library frames the CIP requests, manages the session lifecycle, chunks
//! oversize array transfers, and decodes replies into typed values.

pub mod addr;
pub mod blocking;
pub mod cip;
pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use client::{ArrayView, Client};
pub use config::{Options, RoutePath};
pub use error::{ClientError, Result};
