use std::{net::SocketAddr, sync::Arc};

use {
    askgeorge_auto_reply::AutoReply,
    askgeorge_common::types::InboundMessage,
    askgeorge_metrics::MetricsHandle,
    axum::{
        Form, Router,
        extract::State,
        http::header,
        response::IntoResponse,
        routing::{get, post},
    },
    tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer},
    tracing::{info, warn},
};

use crate::twiml;

/// Twilio webhook bodies are a few hundred bytes.
const MAX_BODY_BYTES: usize = 64 * 1024;

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub reply: Arc<AutoReply>,
    pub metrics_handle: MetricsHandle,
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the webhook router (shared between production startup and tests).
pub fn build_app(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/sms", post(sms_handler));

    #[cfg(feature = "prometheus")]
    let router = router.route(
        "/metrics",
        get(crate::metrics_routes::prometheus_metrics_handler),
    );

    router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn start_server(bind: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "askgeorge webhook listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler() -> &'static str {
    "ok"
}

/// Inbound SMS webhook. Faults are logged by the reply pipeline; the carrier
/// still gets a 200 with an empty response so it does not retry.
async fn sms_handler(
    State(state): State<AppState>,
    Form(msg): Form<InboundMessage>,
) -> impl IntoResponse {
    let body = match state.reply.get_reply(&msg).await {
        Ok(outcome) => twiml::message(outcome.text()),
        Err(e) => {
            warn!(sender = %msg.from, error = %e, "replying with empty response");
            twiml::empty()
        },
    };
    ([(header::CONTENT_TYPE, twiml::CONTENT_TYPE)], body)
}
