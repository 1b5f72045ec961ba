//! Trace context value types.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::trace_context::extractor::{parse_traceparent, ExtractionError};

/// The only traceparent version this service understands.
pub const SUPPORTED_VERSION: u8 = 0x00;

/// 128-bit trace identifier shared by every span of one trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(u128);

impl TraceId {
    pub fn from_u128(value: u128) -> Self {
        Self(value)
    }

    pub fn to_u128(self) -> u128 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Generate a random, non-zero trace id.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let id: u128 = rng.gen();
            if id != 0 {
                return Self(id);
            }
        }
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// 64-bit identifier of one unit of work within a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanId(u64);

impl SpanId {
    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(self) -> u64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Generate a random, non-zero span id.
    pub fn random() -> Self {
        let mut rng = rand::thread_rng();
        loop {
            let id: u64 = rng.gen();
            if id != 0 {
                return Self(id);
            }
        }
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// 8-bit trace flags field. Bit 0 is the sampled flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TraceFlags(u8);

impl TraceFlags {
    pub const SAMPLED: TraceFlags = TraceFlags(0x01);
    pub const NOT_SAMPLED: TraceFlags = TraceFlags(0x00);

    pub fn new(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn is_sampled(self) -> bool {
        self.0 & Self::SAMPLED.0 != 0
    }
}

impl fmt::Display for TraceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

/// A validated W3C trace context.
///
/// Values only come out of [`parse_traceparent`], [`TraceContext::new_root`]
/// or [`TraceContext::child`], so both identifiers are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceContext {
    version: u8,
    trace_id: TraceId,
    span_id: SpanId,
    trace_flags: TraceFlags,
}

impl TraceContext {
    pub(crate) fn from_parts(
        version: u8,
        trace_id: TraceId,
        span_id: SpanId,
        trace_flags: TraceFlags,
    ) -> Self {
        Self {
            version,
            trace_id,
            span_id,
            trace_flags,
        }
    }

    /// Start a new trace with random identifiers.
    pub fn new_root(sampled: bool) -> Self {
        let flags = if sampled {
            TraceFlags::SAMPLED
        } else {
            TraceFlags::NOT_SAMPLED
        };
        Self::from_parts(SUPPORTED_VERSION, TraceId::random(), SpanId::random(), flags)
    }

    /// Start a span inside this trace: same trace id and flags, fresh span id.
    pub fn child(&self) -> Self {
        let mut span_id = SpanId::random();
        while span_id == self.span_id {
            span_id = SpanId::random();
        }
        Self::from_parts(self.version, self.trace_id, span_id, self.trace_flags)
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    pub fn trace_flags(&self) -> TraceFlags {
        self.trace_flags
    }

    pub fn is_sampled(&self) -> bool {
        self.trace_flags.is_sampled()
    }
}

/// Formats the `traceparent` wire form.
impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}-{}-{}-{}",
            self.version, self.trace_id, self.span_id, self.trace_flags
        )
    }
}

impl FromStr for TraceContext {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_traceparent(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_zero_padded_lowercase() {
        let ctx = TraceContext::from_parts(
            0,
            TraceId::from_u128(0xab),
            SpanId::from_u64(0x1),
            TraceFlags::SAMPLED,
        );
        assert_eq!(
            ctx.to_string(),
            "00-000000000000000000000000000000ab-0000000000000001-01"
        );
    }

    #[test]
    fn test_new_root_has_valid_ids() {
        let root = TraceContext::new_root(true);
        assert!(root.trace_id().is_valid());
        assert!(root.span_id().is_valid());
        assert!(root.is_sampled());
        assert_eq!(root.version(), SUPPORTED_VERSION);

        let unsampled = TraceContext::new_root(false);
        assert!(!unsampled.is_sampled());
    }

    #[test]
    fn test_child_keeps_trace_and_flags() {
        let parent = TraceContext::new_root(true);
        let child = parent.child();

        assert_eq!(child.trace_id(), parent.trace_id());
        assert_eq!(child.trace_flags(), parent.trace_flags());
        assert_ne!(child.span_id(), parent.span_id());
        assert!(child.span_id().is_valid());
    }

    #[test]
    fn test_sampled_flag_is_bit_zero() {
        assert!(TraceFlags::new(0x01).is_sampled());
        assert!(TraceFlags::new(0x03).is_sampled());
        assert!(!TraceFlags::new(0x02).is_sampled());
        assert!(!TraceFlags::default().is_sampled());
    }

    #[test]
    fn test_generated_context_parses_back() {
        let ctx = TraceContext::new_root(true);
        let parsed: TraceContext = ctx.to_string().parse().unwrap();
        assert_eq!(parsed, ctx);
    }
}
