//! Protocol-agnostic check model

use std::collections::BTreeMap;
use std::fmt;

/// Wire protocol a check arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolKind {
    Grpc,
    Http,
}

impl fmt::Display for ProtocolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolKind::Grpc => f.write_str("gRPC"),
            ProtocolKind::Http => f.write_str("HTTP"),
        }
    }
}

/// Request metadata relevant to a check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckAttributes {
    headers: BTreeMap<String, String>,
    host: String,
    path: String,
    method: String,
}

impl CheckAttributes {
    /// Build a snapshot. Header names are lowercased so lookups are
    /// case-insensitive; on duplicate names the first value wins.
    pub fn new<I, K, V>(headers: I, host: impl Into<String>, path: impl Into<String>, method: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (name, value) in headers {
            map.entry(name.as_ref().to_ascii_lowercase())
                .or_insert_with(|| value.into());
        }

        Self {
            headers: map,
            host: host.into(),
            path: path.into(),
            method: method.into(),
        }
    }

    /// Header value by case-insensitive name, "" when absent
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &str {
        &self.method
    }
}

/// Status a verdict maps to, independent of protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Ok,
    PermissionDenied,
}

/// How to express a verdict back to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDirective {
    pub status: StatusCategory,
    /// Headers to inject, in order
    pub headers: Vec<(String, String)>,
}

impl ResponseDirective {
    pub fn new(status: StatusCategory) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let attrs = CheckAttributes::new(
            vec![("X-Ext-Authz", "allow"), ("Authorization", "Bearer allow")],
            "example.com",
            "/headers",
            "GET",
        );

        assert_eq!(attrs.header("x-ext-authz"), "allow");
        assert_eq!(attrs.header("AUTHORIZATION"), "Bearer allow");
        assert_eq!(attrs.header("missing"), "");
        assert_eq!(attrs.host(), "example.com");
        assert_eq!(attrs.path(), "/headers");
        assert_eq!(attrs.method(), "GET");
    }

    #[test]
    fn test_first_duplicate_wins() {
        let attrs = CheckAttributes::new(
            vec![("x-ext-authz", "allow"), ("X-EXT-AUTHZ", "block")],
            "",
            "",
            "",
        );

        assert_eq!(attrs.header("x-ext-authz"), "allow");
        assert_eq!(attrs.headers().len(), 1);
    }

    #[test]
    fn test_directive_keeps_header_order() {
        let directive = ResponseDirective::new(StatusCategory::Ok)
            .with_header("a", "1")
            .with_header("b", "2");

        assert_eq!(
            directive.headers,
            vec![("a".to_string(), "1".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_protocol_display() {
        assert_eq!(ProtocolKind::Grpc.to_string(), "gRPC");
        assert_eq!(ProtocolKind::Http.to_string(), "HTTP");
    }
}
