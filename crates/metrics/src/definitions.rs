//! Metric name and label definitions.
//!
//! Every metric emitted by askgeorge is named here so dashboards have a single
//! place to look.

/// Inbound SMS handling
pub mod reply {
    /// Total inbound messages handled
    pub const MESSAGES_RECEIVED_TOTAL: &str = "askgeorge_messages_received_total";
    /// Replies produced, labelled by outcome
    pub const REPLIES_TOTAL: &str = "askgeorge_replies_total";
    /// Requests that failed without a reply
    pub const FAILURES_TOTAL: &str = "askgeorge_reply_failures_total";
    /// End-to-end reply latency in seconds
    pub const DURATION_SECONDS: &str = "askgeorge_reply_duration_seconds";
}

/// Session lifecycle
pub mod session {
    /// Sessions created for first-time senders
    pub const CREATED_TOTAL: &str = "askgeorge_sessions_created_total";
    /// Best-effort writes (history, activity, cache) that failed
    pub const BACKGROUND_WRITE_FAILURES_TOTAL: &str =
        "askgeorge_background_write_failures_total";
}

/// External provider calls
pub mod providers {
    /// Geocode lookups, labelled by outcome (found, not_found, ambiguous, error)
    pub const GEOCODE_TOTAL: &str = "askgeorge_geocode_total";
    /// Place detail lookups
    pub const DETAILS_TOTAL: &str = "askgeorge_place_details_total";
    /// Place detail lookups that failed
    pub const DETAILS_ERRORS_TOTAL: &str = "askgeorge_place_details_errors_total";
    /// Links shortened
    pub const SHORTEN_TOTAL: &str = "askgeorge_shorten_total";
    /// Provider call duration in seconds
    pub const REQUEST_DURATION_SECONDS: &str = "askgeorge_provider_request_duration_seconds";
}

/// Common label keys
pub mod labels {
    pub const OUTCOME: &str = "outcome";
    pub const PROVIDER: &str = "provider";
    pub const OPERATION: &str = "operation";
    pub const ERROR_TYPE: &str = "error_type";
}

/// Histogram bucket boundaries
pub mod buckets {
    /// Provider round trips: 10ms to 10s
    pub const PROVIDER_DURATION: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

    /// Whole replies fan out to several providers: 50ms to 30s
    pub const REPLY_DURATION: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 30.0];
}
