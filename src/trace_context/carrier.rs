//! Key/value carriers for trace context propagation.
//!
//! # Responsibilities
//! - Case-insensitive lookup of header names (HTTP semantics)
//! - Write-back of propagation headers on outbound messages
//!
//! # Design Decisions
//! - Header bags are an explicit string-to-string interface, not a dynamic map
//! - Implemented for `HashMap<String, String>` and `http::HeaderMap`

use std::borrow::Cow;
use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Read side of a carrier.
pub trait Extractor {
    /// Get the value for `key`, matching the key case-insensitively.
    ///
    /// A present entry always yields `Some`, even when its raw value is not
    /// valid text, so that callers can tell "absent" from "unreadable".
    fn get(&self, key: &str) -> Option<Cow<'_, str>>;
}

/// Write side of a carrier.
pub trait Injector {
    /// Set `key` to `value`, replacing any existing entry with the same name.
    fn set(&mut self, key: &str, value: String);
}

impl Extractor for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        // Exact hit first, then fall back to a case-insensitive scan.
        if let Some(v) = HashMap::get(self, key) {
            return Some(Cow::Borrowed(v.as_str()));
        }
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| Cow::Borrowed(v.as_str()))
    }
}

impl Injector for HashMap<String, String> {
    fn set(&mut self, key: &str, value: String) {
        self.retain(|k, _| !k.eq_ignore_ascii_case(key));
        self.insert(key.to_lowercase(), value);
    }
}

impl Extractor for HeaderMap {
    fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        // HeaderMap lookups by &str are already case-insensitive.
        HeaderMap::get(self, key).map(header_text)
    }
}

/// Text of a header value. Each obs-text byte (0x80-0xFF) becomes a single
/// `?`, which keeps field lengths intact and never passes hex validation.
fn header_text(value: &HeaderValue) -> Cow<'_, str> {
    match value.to_str() {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(
            value
                .as_bytes()
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '?' })
                .collect(),
        ),
    }
}

impl Injector for HeaderMap {
    fn set(&mut self, key: &str, value: String) {
        let name = match HeaderName::from_bytes(key.as_bytes()) {
            Ok(name) => name,
            Err(_) => {
                tracing::warn!(key = %key, "Invalid propagation header name");
                return;
            }
        };
        match HeaderValue::from_str(&value) {
            Ok(value) => {
                self.insert(name, value);
            }
            Err(_) => tracing::warn!(key = %key, "Invalid propagation header value"),
        }
    }
}
