//! W3C trace context demonstration service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod trace_context;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use trace_context::{extract, ExtractionError, TraceContext};
