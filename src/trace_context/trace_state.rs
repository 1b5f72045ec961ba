//! `tracestate` vendor entries.

use std::fmt;

/// Maximum number of list members kept from an inbound header.
pub const MAX_MEMBERS: usize = 32;

const MAX_KEY_LEN: usize = 256;
const MAX_VALUE_LEN: usize = 256;

/// Ordered `key=value` entries from a `tracestate` header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TraceState {
    entries: Vec<(String, String)>,
}

impl TraceState {
    /// Parse a header value, dropping invalid members.
    ///
    /// Duplicate keys keep their first occurrence. At most [`MAX_MEMBERS`]
    /// entries are retained.
    pub fn parse(header: &str) -> Self {
        let mut entries: Vec<(String, String)> = Vec::new();

        for member in header.split(',') {
            if entries.len() == MAX_MEMBERS {
                break;
            }
            let member = member.trim_matches(|c| c == ' ' || c == '\t');
            if member.is_empty() {
                continue;
            }
            let Some((key, value)) = member.split_once('=') else {
                continue;
            };
            if !is_valid_key(key) || !is_valid_value(value) {
                continue;
            }
            if entries.iter().any(|(k, _)| k == key) {
                continue;
            }
            entries.push((key.to_string(), value.to_string()));
        }

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for TraceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        Ok(())
    }
}

fn is_valid_key(key: &str) -> bool {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return false;
    }
    // Multi-tenant keys look like `tenant@system`.
    let mut parts = key.splitn(2, '@');
    let tenant = parts.next().unwrap_or_default();
    let system = parts.next();

    let starts_lower = |s: &str| s.bytes().next().is_some_and(|b| b.is_ascii_lowercase());
    let starts_lower_or_digit = |s: &str| {
        s.bytes()
            .next()
            .is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    };
    let chars_ok = |s: &str| {
        s.bytes().all(|b| {
            b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'_' | b'-' | b'*' | b'/')
        })
    };

    match system {
        None => starts_lower(tenant) && chars_ok(tenant),
        Some(system) => {
            starts_lower_or_digit(tenant)
                && chars_ok(tenant)
                && starts_lower(system)
                && chars_ok(system)
        }
    }
}

fn is_valid_value(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_VALUE_LEN
        && !value.ends_with(' ')
        && value
            .bytes()
            .all(|b| (0x20..=0x7e).contains(&b) && b != b',' && b != b'=')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_members_in_order() {
        let state = TraceState::parse("rojo=00f067aa0ba902b7, congo=t61rcWkgMzE");
        assert_eq!(state.len(), 2);
        assert_eq!(state.get("rojo"), Some("00f067aa0ba902b7"));
        assert_eq!(state.get("congo"), Some("t61rcWkgMzE"));
        assert_eq!(state.to_string(), "rojo=00f067aa0ba902b7,congo=t61rcWkgMzE");
    }

    #[test]
    fn test_invalid_members_dropped() {
        let state = TraceState::parse("Upper=1,novalue,=x,ok=1,,tenant@sys=2,bad=a=b");
        let keys: Vec<&str> = state.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["ok", "tenant@sys"]);
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let state = TraceState::parse("a=1,a=2");
        assert_eq!(state.get("a"), Some("1"));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_member_limit() {
        let header: Vec<String> = (0..40).map(|i| format!("k{i}=v")).collect();
        let state = TraceState::parse(&header.join(","));
        assert_eq!(state.len(), MAX_MEMBERS);
    }
}
