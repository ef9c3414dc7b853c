//! LINE webhook server
//!
//! | route            | purpose                                          |
//! |------------------|--------------------------------------------------|
//! | `GET /`          | health check                                     |
//! | `POST /callback` | LINE webhook; replies are sent from spawned tasks |
//!
//! Every response carries `x-trace-id` (taken from the request or generated)
//! and a fresh `x-request-id`. Both are recorded on the request span, which
//! the spawned dispatch tasks inherit.

use crate::dispatcher::CommandDispatcher;
use crate::error::error_chain;
use crate::platforms::line::{
    self, LINE_REQUEST_ID_HEADER, MessageReplier, SIGNATURE_HEADER, TextMessage, WebhookPayload,
};
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{Instrument, Span, error, info, info_span, warn};
use uuid::Uuid;

/// Trace id header, propagated when present
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Per-request id header, always generated
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared state for the webhook routes
#[derive(Clone)]
pub struct AppState {
    app_name: Arc<str>,
    channel_secret: Arc<str>,
    dispatcher: Arc<CommandDispatcher>,
    replier: Arc<dyn MessageReplier>,
}

impl AppState {
    pub fn new(
        app_name: impl Into<Arc<str>>,
        channel_secret: impl Into<Arc<str>>,
        dispatcher: Arc<CommandDispatcher>,
        replier: Arc<dyn MessageReplier>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            channel_secret: channel_secret.into(),
            dispatcher,
            replier,
        }
    }
}

/// Build the webhook router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/callback", post(callback))
        .layer(middleware::from_fn(trace_ids))
        .with_state(state)
}

/// Serve `app` until Ctrl-C
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

async fn trace_ids(request: Request, next: Next) -> Response {
    let headers = request.headers();
    let trace_id = header_str(headers, TRACE_ID_HEADER)
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string);
    let request_id = Uuid::new_v4().to_string();
    let line_request_id = header_str(headers, LINE_REQUEST_ID_HEADER)
        .unwrap_or("-")
        .to_string();

    let span = info_span!(
        "http",
        %trace_id,
        %request_id,
        %line_request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        headers.insert(TRACE_ID_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "app": &*state.app_name }))
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

async fn callback(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let signed = header_str(&headers, SIGNATURE_HEADER)
        .is_some_and(|signature| line::verify_signature(&state.channel_secret, &body, signature));
    if !signed {
        warn!("Rejected webhook with missing or invalid signature");
        return detail(StatusCode::BAD_REQUEST, "Invalid signature");
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Rejected malformed webhook payload");
            return detail(StatusCode::BAD_REQUEST, "Invalid payload");
        }
    };

    let mut spawned = 0_usize;
    for message in payload.text_messages() {
        let dispatcher = Arc::clone(&state.dispatcher);
        let replier = Arc::clone(&state.replier);
        tokio::spawn(handle_text_message(dispatcher, replier, message).instrument(Span::current()));
        spawned += 1;
    }
    info!(events = payload.events.len(), spawned, "Webhook accepted");

    (StatusCode::OK, "OK").into_response()
}

async fn handle_text_message(
    dispatcher: Arc<CommandDispatcher>,
    replier: Arc<dyn MessageReplier>,
    message: TextMessage,
) {
    let reply = dispatcher.dispatch(&message.text).await;

    if let Err(e) = replier.reply(&message.reply_token, &reply).await {
        error!(
            user = message.user_id.as_deref().unwrap_or("-"),
            error = %e,
            chain = %error_chain(&e),
            "Failed to send reply"
        );
    }
}
