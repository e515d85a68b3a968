//! Building HTTP responses from resource results and [`DavError`]s.
//!
//! Every response body is fully buffered, so the response type is plain
//! `http::Response<Full<Bytes>>`. An empty body is `Full` over empty bytes.

use bytes::Bytes;
use http::StatusCode;
use http::header::{CONTENT_TYPE, ETAG, HeaderValue};
use http_body_util::Full;

use filedav_core::{DavError, DavResult, Resource};

/// Response type produced by the service.
pub type DavResponse = http::Response<Full<Bytes>>;

/// Content type of multistatus documents.
pub const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Content type of plain-text error messages.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

fn with_body(status: StatusCode, body: Bytes) -> DavResponse {
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = status;
    response
}

/// A response with no body, e.g. `204` after a write.
#[must_use]
pub fn status_only(status: StatusCode) -> DavResponse {
    with_body(status, Bytes::new())
}

/// `207 Multi-Status` carrying a serialized listing.
#[must_use]
pub fn multistatus(xml: Vec<u8>) -> DavResponse {
    let mut response = with_body(StatusCode::MULTI_STATUS, Bytes::from(xml));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE));
    response
}

/// `200 OK` with the file's bytes and its fingerprint as `ETag`.
///
/// # Errors
///
/// [`DavError::Serialization`] if the fingerprint is not a valid header
/// value, which a hex digest always is.
pub fn resource(resource: Resource) -> DavResult<DavResponse> {
    let etag = HeaderValue::from_str(resource.fingerprint.as_str())
        .map_err(|e| DavError::Serialization(e.to_string()))?;
    let mut response = with_body(StatusCode::OK, resource.contents);
    response.headers_mut().insert(ETAG, etag);
    Ok(response)
}

/// Convert an error into the response sent to the client.
///
/// The status comes from [`DavError::status_code`]. Errors with a
/// [`client_message`](DavError::client_message) get it as a `text/plain`
/// body; all others get an empty body. Internal details (paths, OS errors)
/// are never included.
#[must_use]
pub fn error_to_response(err: &DavError) -> DavResponse {
    match err.client_message() {
        Some(message) => {
            let body = Bytes::from_static(message.as_bytes());
            let mut response = with_body(err.status_code(), body);
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
            response
        }
        None => status_only(err.status_code()),
    }
}
