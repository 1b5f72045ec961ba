//! `traceparent` extraction and injection.
//!
//! Wire format:
//! ```text
//! traceparent: 00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01
//!              ^  ^                                ^                ^
//!              |  trace-id (32 hex)                span-id (16 hex) flags (2 hex)
//!              version (2 hex)
//! ```

use thiserror::Error;

use crate::trace_context::carrier::{Extractor, Injector};
use crate::trace_context::context::{SpanId, TraceContext, TraceFlags, TraceId, SUPPORTED_VERSION};
use crate::trace_context::trace_state::TraceState;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Field lengths of version, trace-id, span-id and flags.
const FIELD_LENGTHS: [usize; 4] = [2, 32, 16, 2];

/// Reasons a carrier does not yield a usable trace context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// No `traceparent` entry in the carrier.
    #[error("traceparent header is missing")]
    MissingHeader,

    /// Wrong number of fields or wrong field lengths.
    #[error("traceparent is not four dash-separated fields of length 2/32/16/2")]
    MalformedFormat,

    /// A field contains something other than lowercase hex digits.
    #[error("traceparent contains non lowercase-hex characters")]
    InvalidEncoding,

    /// Version other than `00`.
    #[error("traceparent version is not supported")]
    UnsupportedVersion,

    /// All-zero trace id or span id.
    #[error("traceparent carries an all-zero trace id or span id")]
    InvalidIdentifier,
}

impl ExtractionError {
    /// Stable label for log fields and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionError::MissingHeader => "missing_header",
            ExtractionError::MalformedFormat => "malformed_format",
            ExtractionError::InvalidEncoding => "invalid_encoding",
            ExtractionError::UnsupportedVersion => "unsupported_version",
            ExtractionError::InvalidIdentifier => "invalid_identifier",
        }
    }
}

/// Extract a trace context from the `traceparent` entry of a carrier.
pub fn extract<C: Extractor + ?Sized>(carrier: &C) -> Result<TraceContext, ExtractionError> {
    let value = carrier
        .get(TRACEPARENT_HEADER)
        .ok_or(ExtractionError::MissingHeader)?;
    parse_traceparent(&value)
}

/// Extract the `tracestate` entry. Missing or invalid entries give an empty state.
pub fn extract_trace_state<C: Extractor + ?Sized>(carrier: &C) -> TraceState {
    carrier
        .get(TRACESTATE_HEADER)
        .map(|value| TraceState::parse(&value))
        .unwrap_or_default()
}

/// Parse a raw `traceparent` value.
///
/// Checks run in a fixed order: field count, field lengths, encoding,
/// version, then identifiers.
pub fn parse_traceparent(value: &str) -> Result<TraceContext, ExtractionError> {
    let fields: Vec<&str> = value.split('-').collect();
    if fields.len() != FIELD_LENGTHS.len() {
        return Err(ExtractionError::MalformedFormat);
    }

    if fields
        .iter()
        .zip(FIELD_LENGTHS.iter())
        .any(|(field, len)| field.len() != *len)
    {
        return Err(ExtractionError::MalformedFormat);
    }

    if !fields.iter().all(|field| is_lower_hex(field)) {
        return Err(ExtractionError::InvalidEncoding);
    }

    // The encoding check above guarantees these conversions succeed.
    let version = u8::from_str_radix(fields[0], 16).map_err(|_| ExtractionError::InvalidEncoding)?;
    if version != SUPPORTED_VERSION {
        return Err(ExtractionError::UnsupportedVersion);
    }

    let trace_id = u128::from_str_radix(fields[1], 16)
        .map(TraceId::from_u128)
        .map_err(|_| ExtractionError::InvalidEncoding)?;
    let span_id = u64::from_str_radix(fields[2], 16)
        .map(SpanId::from_u64)
        .map_err(|_| ExtractionError::InvalidEncoding)?;
    let flags = u8::from_str_radix(fields[3], 16)
        .map(TraceFlags::new)
        .map_err(|_| ExtractionError::InvalidEncoding)?;

    if !trace_id.is_valid() || !span_id.is_valid() {
        return Err(ExtractionError::InvalidIdentifier);
    }

    Ok(TraceContext::from_parts(version, trace_id, span_id, flags))
}

/// Write `traceparent` into a carrier.
pub fn inject<C: Injector + ?Sized>(ctx: &TraceContext, carrier: &mut C) {
    carrier.set(TRACEPARENT_HEADER, ctx.to_string());
}

/// Write `tracestate` into a carrier. Empty states are not written.
pub fn inject_trace_state<C: Injector + ?Sized>(state: &TraceState, carrier: &mut C) {
    if !state.is_empty() {
        carrier.set(TRACESTATE_HEADER, state.to_string());
    }
}

fn is_lower_hex(field: &str) -> bool {
    field
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn carrier(key: &str, value: &str) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert(key.to_string(), value.to_string());
        map
    }

    #[test]
    fn test_extract_valid_header() {
        let c = carrier(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        );
        let ctx = extract(&c).unwrap();

        assert_eq!(ctx.trace_id().to_string(), "4bf92f3577b34da6a3ce929d0e0e4736");
        assert_eq!(ctx.span_id().to_string(), "00f067aa0ba902b7");
        assert_eq!(ctx.trace_flags().to_string(), "01");
        assert_eq!(ctx.trace_id().to_u128(), 0x4bf92f3577b34da6a3ce929d0e0e4736);
        assert_eq!(ctx.span_id().to_u64(), 0x00f067aa0ba902b7);
        assert!(ctx.is_sampled());
        assert_eq!(ctx.version(), 0);
    }

    #[test]
    fn test_extract_missing_header() {
        let c: HashMap<String, String> = HashMap::new();
        assert_eq!(extract(&c), Err(ExtractionError::MissingHeader));

        let c = carrier("tracestate", "congo=t61rcWkgMzE");
        assert_eq!(extract(&c), Err(ExtractionError::MissingHeader));
    }

    #[test]
    fn test_extract_header_name_case_insensitive() {
        let value = "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01";
        let expected = parse_traceparent(value).unwrap();

        for key in ["traceparent", "Traceparent", "TRACEPARENT"] {
            assert_eq!(extract(&carrier(key, value)), Ok(expected), "key {key}");
        }
    }

    #[test]
    fn test_all_zero_trace_id() {
        let result = parse_traceparent("00-00000000000000000000000000000000-0000000000000000-01");
        assert_eq!(result, Err(ExtractionError::InvalidIdentifier));
    }

    #[test]
    fn test_all_zero_span_id() {
        let result = parse_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-0000000000000000-01");
        assert_eq!(result, Err(ExtractionError::InvalidIdentifier));
    }

    #[test]
    fn test_unsupported_version() {
        let result = parse_traceparent("01-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01");
        assert_eq!(result, Err(ExtractionError::UnsupportedVersion));

        let result = parse_traceparent("ff-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01");
        assert_eq!(result, Err(ExtractionError::UnsupportedVersion));
    }

    #[test]
    fn test_malformed_format() {
        // Short trace id
        assert_eq!(
            parse_traceparent("00-ZZbad-00f067aa0ba902b7-01"),
            Err(ExtractionError::MalformedFormat)
        );
        // Too few fields
        assert_eq!(
            parse_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7"),
            Err(ExtractionError::MalformedFormat)
        );
        // Trailing field
        assert_eq!(
            parse_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01-extra"),
            Err(ExtractionError::MalformedFormat)
        );
        assert_eq!(parse_traceparent(""), Err(ExtractionError::MalformedFormat));
        // Surrounding whitespace changes the field lengths
        assert_eq!(
            parse_traceparent(" 00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
            Err(ExtractionError::MalformedFormat)
        );
    }

    #[test]
    fn test_invalid_encoding() {
        // Uppercase hex
        assert_eq!(
            parse_traceparent("00-4BF92F3577B34DA6A3CE929D0E0E4736-00f067aa0ba902b7-01"),
            Err(ExtractionError::InvalidEncoding)
        );
        // Right length, non-hex
        assert_eq!(
            parse_traceparent("00-4bf92f3577b34da6a3ce929d0e0e47zz-00f067aa0ba902b7-01"),
            Err(ExtractionError::InvalidEncoding)
        );
        assert_eq!(
            parse_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-0g"),
            Err(ExtractionError::InvalidEncoding)
        );
        // Encoding is checked before the version
        assert_eq!(
            parse_traceparent("0x-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
            Err(ExtractionError::InvalidEncoding)
        );
    }

    #[test]
    fn test_random_valid_headers_roundtrip() {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        for _ in 0..256 {
            let trace_id: u128 = rng.gen_range(1..=u128::MAX);
            let span_id: u64 = rng.gen_range(1..=u64::MAX);
            let flags: u8 = rng.gen();
            let value = format!("00-{:032x}-{:016x}-{:02x}", trace_id, span_id, flags);

            let ctx = parse_traceparent(&value).unwrap();
            assert_eq!(ctx.trace_id().to_u128(), trace_id);
            assert_eq!(ctx.span_id().to_u64(), span_id);
            assert_eq!(ctx.trace_flags().bits(), flags);
            assert_eq!(ctx.to_string(), value);
        }
    }

    #[test]
    fn test_inject_writes_wire_form() {
        let ctx = parse_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00").unwrap();
        let mut c: HashMap<String, String> = HashMap::new();
        inject(&ctx, &mut c);

        assert_eq!(
            c.get("traceparent").map(String::as_str),
            Some("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00")
        );
        assert_eq!(extract(&c), Ok(ctx));
    }

    #[test]
    fn test_trace_state_injection_skips_empty() {
        let mut c: HashMap<String, String> = HashMap::new();
        inject_trace_state(&TraceState::default(), &mut c);
        assert!(c.is_empty());

        let state = TraceState::parse("congo=t61rcWkgMzE");
        inject_trace_state(&state, &mut c);
        assert_eq!(extract_trace_state(&c), state);
    }

    #[test]
    fn test_error_labels_are_distinct() {
        let labels = [
            ExtractionError::MissingHeader.as_str(),
            ExtractionError::MalformedFormat.as_str(),
            ExtractionError::InvalidEncoding.as_str(),
            ExtractionError::UnsupportedVersion.as_str(),
            ExtractionError::InvalidIdentifier.as_str(),
        ];
        let unique: std::collections::HashSet<_> = labels.iter().collect();
        assert_eq!(unique.len(), labels.len());
    }
}
