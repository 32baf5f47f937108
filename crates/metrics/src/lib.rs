//! Metrics collection and export for askgeorge.
//!
//! Uses the `metrics` crate facade. With the `prometheus` feature the
//! recorder renders Prometheus text for the gateway's `/metrics` endpoint;
//! without it every macro call is a no-op.
//!
//! ```rust,ignore
//! use askgeorge_metrics::{counter, labels, reply};
//!
//! counter!(reply::REPLIES_TOTAL, labels::OUTCOME => "results").increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
