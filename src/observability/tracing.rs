//! Distributed tracing support.
//!
//! # Responsibilities
//! - Extract W3C trace context from incoming requests
//! - Start a server span per request (child of the caller, or a new root)
//! - Propagate the server span to the handler and back to the caller
//!
//! # Design Decisions
//! - Extraction failure never fails the request; it only changes the span kind
//! - The propagation policy is read from an ArcSwap per request (hot reload)

use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use crate::config::TracingConfig;
use crate::http::request::RequestIdExt;
use crate::observability::metrics;
use crate::trace_context::{
    extract, extract_trace_state, inject, inject_trace_state, Extractor, Injector, TraceContext,
    TraceState, TRACESTATE_HEADER,
};

/// Hot-swappable propagation policy shared between the server and middleware.
pub type SharedTracingConfig = Arc<ArcSwap<TracingConfig>>;

/// Trace information attached to each request as an extension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestTrace {
    /// Context received from the caller, if it was valid.
    pub parent: Option<TraceContext>,
    /// Server span started for this request.
    pub span: Option<TraceContext>,
    /// Vendor state received from the caller. Only kept when a parent exists.
    pub trace_state: TraceState,
}

impl RequestTrace {
    /// Extract the inbound context and decide the server span.
    pub fn start<C: Extractor + ?Sized>(carrier: &C, policy: &TracingConfig) -> Self {
        match extract(carrier) {
            Ok(parent) => {
                metrics::record_extraction("ok");
                metrics::record_span_started("child");
                Self {
                    parent: Some(parent),
                    span: Some(parent.child()),
                    trace_state: extract_trace_state(carrier),
                }
            }
            Err(e) => {
                metrics::record_extraction(e.as_str());
                tracing::debug!(reason = e.as_str(), "No inbound trace context");
                if policy.start_root_span {
                    metrics::record_span_started("root");
                    Self {
                        parent: None,
                        span: Some(TraceContext::new_root(policy.sample_new_roots)),
                        trace_state: TraceState::default(),
                    }
                } else {
                    Self::default()
                }
            }
        }
    }

    /// Write the server span into an outbound carrier.
    pub fn inject_into<C: Injector + ?Sized>(&self, carrier: &mut C) {
        if let Some(span) = &self.span {
            inject(span, carrier);
            inject_trace_state(&self.trace_state, carrier);
        }
    }
}

/// Middleware that runs every request inside a server span.
pub async fn trace_context_middleware(
    State(policy): State<SharedTracingConfig>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let policy = policy.load_full();
    let request_id = request.request_id().to_string();

    if policy.log_headers {
        tracing::debug!(request_id = %request_id, headers = ?request.headers(), "Request headers");
    }

    let trace = RequestTrace::start(request.headers(), &policy);
    if trace.parent.is_none() {
        // Vendor state is only meaningful alongside the traceparent it came with.
        request.headers_mut().remove(TRACESTATE_HEADER);
    }

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        trace_id = tracing::field::Empty,
        span_id = tracing::field::Empty,
    );

    if let Some(ctx) = &trace.span {
        span.record("trace_id", tracing::field::display(ctx.trace_id()));
        span.record("span_id", tracing::field::display(ctx.span_id()));
        tracing::info!(
            request_id = %request_id,
            trace_id = %ctx.trace_id(),
            span_id = %ctx.span_id(),
            parent_span_id = ?trace.parent.map(|p| p.span_id().to_string()),
            sampled = ctx.is_sampled(),
            "Server span started"
        );
    }

    if policy.inject_request {
        trace.inject_into(request.headers_mut());
    }
    request.extensions_mut().insert(trace.clone());

    let mut response = next.run(request).instrument(span).await;

    if policy.inject_response {
        trace.inject_into(response.headers_mut());
    }
    response
}
