//! Method routing.
//!
//! filedav answers exactly three methods. [`DavMethod::from_method`] is the
//! whole routing table: every other method, standard or extension, maps to
//! `None` and is answered with `405 Method Not Allowed`.

use std::fmt;

/// The methods filedav handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DavMethod {
    /// Directory listing (`Depth: 1` only).
    Propfind,
    /// Whole-file read.
    Get,
    /// Whole-file create or overwrite, optionally conditional on `If-Match`.
    Put,
}

impl DavMethod {
    /// Look up the handler for an HTTP method. Matching is case-sensitive.
    #[must_use]
    pub fn from_method(method: &http::Method) -> Option<Self> {
        match method.as_str() {
            "PROPFIND" => Some(Self::Propfind),
            "GET" => Some(Self::Get),
            "PUT" => Some(Self::Put),
            _ => None,
        }
    }

    /// The method name as sent on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Propfind => "PROPFIND",
            Self::Get => "GET",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for DavMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str) -> http::Method {
        http::Method::from_bytes(name.as_bytes()).expect("valid method token")
    }

    #[test]
    fn test_should_route_supported_methods() {
        assert_eq!(
            DavMethod::from_method(&method("PROPFIND")),
            Some(DavMethod::Propfind)
        );
        assert_eq!(DavMethod::from_method(&http::Method::GET), Some(DavMethod::Get));
        assert_eq!(DavMethod::from_method(&http::Method::PUT), Some(DavMethod::Put));
    }

    #[test]
    fn test_should_not_route_other_methods() {
        for name in ["DELETE", "HEAD", "POST", "OPTIONS", "MKCOL", "propfind", "get"] {
            assert_eq!(DavMethod::from_method(&method(name)), None, "{name}");
        }
    }

    #[test]
    fn test_should_display_wire_name() {
        assert_eq!(DavMethod::Propfind.to_string(), "PROPFIND");
        assert_eq!(
            DavMethod::from_method(&http::Method::PUT).map(DavMethod::as_str),
            Some("PUT")
        );
    }
}
