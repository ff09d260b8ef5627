//! Slack Events API receiver.
//!
//! Verifies the request signature, answers `url_verification`, and hands
//! each qualifying event to the dispatcher on its own task. Slack expects a
//! response within three seconds, so the handler never waits for the
//! pipeline.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use secrecy::ExposeSecret;
use serde_json::json;

use docbot_core::dispatch::report::GREETING;
use docbot_core::transport::MessageTransport;
use docbot_infra::slack::{EventAction, SlackEnvelope, classify, verify_slack_signature};

use crate::http::error::AppError;
use crate::state::AppState;

const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
const SIGNATURE_HEADER: &str = "x-slack-signature";
const RETRY_HEADER: &str = "x-slack-retry-num";

/// POST /slack/events
pub async fn slack_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let timestamp = header(&headers, TIMESTAMP_HEADER)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {TIMESTAMP_HEADER}")))?;
    let signature = header(&headers, SIGNATURE_HEADER)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {SIGNATURE_HEADER}")))?;

    verify_slack_signature(
        state.signing_secret.expose_secret().as_bytes(),
        timestamp,
        &body,
        signature,
        chrono::Utc::now().timestamp(),
    )?;

    let envelope: SlackEnvelope =
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;

    match envelope {
        SlackEnvelope::UrlVerification { challenge } => {
            Ok(Json(json!({ "challenge": challenge })).into_response())
        }
        SlackEnvelope::EventCallback { event, event_id } => {
            // Slack retries when our first ack was slow; the original is
            // already being processed.
            if let Some(retry) = header(&headers, RETRY_HEADER) {
                tracing::debug!(event_id = ?event_id, retry, "ignoring Slack retry");
                return Ok(StatusCode::OK.into_response());
            }

            match classify(&event) {
                EventAction::Dispatch(message) => {
                    tracing::debug!(
                        event_id = ?event_id,
                        channel = %message.channel_id,
                        direct = message.is_direct_message,
                        "dispatching Slack event"
                    );
                    let dispatcher = Arc::clone(&state.dispatcher);
                    tokio::spawn(async move {
                        dispatcher.handle(&message).await;
                    });
                }
                EventAction::Greet { channel_id } => {
                    let transport = Arc::clone(&state.transport);
                    tokio::spawn(async move {
                        if let Err(e) = transport.send(&channel_id, GREETING).await {
                            tracing::error!(channel = %channel_id, error = %e, "failed to send greeting");
                        }
                    });
                }
                EventAction::Ignore => {}
            }
            Ok(StatusCode::OK.into_response())
        }
        SlackEnvelope::Unsupported => Ok(StatusCode::OK.into_response()),
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
