//! Extraction of the request fields the handlers use.

use http::header::{AsHeaderName, HeaderMap};
use http::uri::PathAndQuery;

use crate::router::DavMethod;

/// `Depth` is not among the `http` crate's predefined header names.
const DEPTH: &str = "depth";

/// The parts of an HTTP request that filedav acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavRequest {
    /// The routed method.
    pub method: DavMethod,
    /// Request target as received: path plus optional query, still percent-encoded.
    pub url: String,
    /// Raw `Depth` header.
    pub depth: Option<String>,
    /// Raw `If-Match` header.
    pub if_match: Option<String>,
}

impl DavRequest {
    /// Build from request parts.
    ///
    /// Header values that are not valid UTF-8 are decoded lossily. They can
    /// then never equal `1` or a hex fingerprint, but their presence is kept:
    /// a garbled `If-Match` still makes the PUT conditional.
    #[must_use]
    pub fn from_parts(method: DavMethod, parts: &http::request::Parts) -> Self {
        let url = parts
            .uri
            .path_and_query()
            .map_or("/", PathAndQuery::as_str)
            .to_owned();

        Self {
            method,
            url,
            depth: header_lossy(&parts.headers, DEPTH),
            if_match: header_lossy(&parts.headers, http::header::IF_MATCH),
        }
    }
}

fn header_lossy<K: AsHeaderName>(headers: &HeaderMap, name: K) -> Option<String> {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}
