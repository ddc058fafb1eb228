//! Common utilities, errors, and shared plumbing

mod error;
pub mod hash;
mod ring;
pub mod validation;

pub use error::{ConfigError, IngestError, Result};
pub use ring::RollingRing;
