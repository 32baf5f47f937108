//! Gateway: the HTTP surface the SMS carrier talks to.
//!
//! Routes:
//! - `POST /sms`: carrier webhook, form-encoded in, TwiML out
//! - `GET /health`: liveness
//! - `GET /metrics`: Prometheus scrape (feature `prometheus`)
//!
//! All reply logic lives in `askgeorge-auto-reply`.

#[cfg(feature = "prometheus")]
pub mod metrics_routes;
pub mod server;
pub mod twiml;

pub use server::{AppState, build_app, start_server};
