//! W3C Trace Context propagation.
//!
//! # Data Flow
//! ```text
//! Inbound request headers
//!     → carrier.rs (case-insensitive Extractor over the header bag)
//!     → extractor.rs (traceparent parse + validation)
//!     → context.rs (TraceContext value: version, trace id, span id, flags)
//!
//! Outbound:
//!     TraceContext::child() / TraceContext::new_root()
//!     → extractor.rs inject()
//!     → carrier.rs (Injector writes traceparent / tracestate)
//! ```
//!
//! # Design Decisions
//! - Extraction is a pure function with a typed error per failure kind
//! - Callers treat every failure as "no context", never as a request error
//! - Only version `00` is accepted; lowercase hex only

pub mod carrier;
pub mod context;
pub mod extractor;
pub mod trace_state;

pub use carrier::{Extractor, Injector};
pub use context::{SpanId, TraceContext, TraceFlags, TraceId};
pub use extractor::{
    extract, extract_trace_state, inject, inject_trace_state, parse_traceparent,
    ExtractionError, TRACEPARENT_HEADER, TRACESTATE_HEADER,
};
pub use trace_state::TraceState;
