//! Shared message types and the error-context helpers used across askgeorge crates.

pub mod error;
pub mod types;

pub use error::FromMessage;
