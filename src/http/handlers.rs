//! Endpoint handlers.

use axum::{http::HeaderMap, Json};
use serde::{Deserialize, Serialize};

use crate::trace_context::extract;

pub const INFO_MESSAGE: &str = "Hello, this is an info endpoint";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    #[serde(rename = "Hello")]
    pub hello: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InfoResponse {
    pub message: String,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub sampled: Option<bool>,
}

pub async fn health(headers: HeaderMap) -> Json<HealthResponse> {
    tracing::debug!(headers = ?headers, "Health check");
    Json(HealthResponse {
        hello: "World".to_string(),
    })
}

/// Report the trace context carried by this request's headers.
///
/// An unusable `traceparent` is logged and reported as nulls; the request
/// still succeeds.
pub async fn info(headers: HeaderMap) -> Json<InfoResponse> {
    tracing::debug!(headers = ?headers, "Info request");

    let response = match extract(&headers) {
        Ok(ctx) => {
            tracing::info!(
                trace_id = %ctx.trace_id(),
                span_id = %ctx.span_id(),
                sampled = ctx.is_sampled(),
                "Received trace context"
            );
            InfoResponse {
                message: INFO_MESSAGE.to_string(),
                trace_id: Some(ctx.trace_id().to_string()),
                span_id: Some(ctx.span_id().to_string()),
                sampled: Some(ctx.is_sampled()),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, reason = e.as_str(), "No usable trace context, continuing untraced");
            InfoResponse {
                message: INFO_MESSAGE.to_string(),
                trace_id: None,
                span_id: None,
                sampled: None,
            }
        }
    };

    Json(response)
}
