//! Assembly service.
//!
//! Consumes `OrderPaid` events, simulates building the order and publishes
//! `OrderAssembled` once the build is done.

pub mod config;
pub mod error;
pub mod handler;
pub mod publisher;

pub use config::Config;
pub use error::{AssemblyError, Result};
pub use handler::AssemblyHandler;
pub use publisher::OrderAssembledPublisher;
