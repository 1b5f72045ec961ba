//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request produces:
//!     → tracing.rs (trace context extraction, server span, propagation headers)
//!     → logging.rs (structured log events carrying trace_id / span_id)
//!     → metrics.rs (request counters, latency histogram, extraction outcomes)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Downstream services (traceparent on forwarded headers / responses)
//! ```
//!
//! # Design Decisions
//! - Trace extraction failures degrade to "untraced", never to an error response
//! - Metrics are cheap (atomic increments) and no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
pub mod tracing;
