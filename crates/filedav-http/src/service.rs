//! The filedav HTTP service implementing hyper's `Service` trait.
//!
//! [`DavHttpService`] runs every request through the same pipeline:
//!
//! 1. Method routing (`405` for anything but `PROPFIND`, `GET`, `PUT`)
//! 2. Extraction of the URL and the `Depth` / `If-Match` headers
//! 3. Wrapping the body for lazy, chunk-limited collection
//! 4. Dispatch to the [`DavHandler`]
//! 5. Error response formatting
//! 6. Common response headers (`x-request-id`, `Server`)
//!
//! A request whose body could not be collected gets no response at all: the
//! service future fails and hyper closes the connection.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::header::HeaderValue;
use http_body::Body;
use hyper::service::Service;
use tracing::{debug, warn};
use uuid::Uuid;

use filedav_core::config::DEFAULT_MAX_BODY_CHUNKS;
use filedav_core::{DavConfig, DavError};

use crate::collector::{BoxError, RequestBody};
use crate::dispatch::{DavHandler, dispatch_request};
use crate::request::DavRequest;
use crate::response::{DavResponse, error_to_response};
use crate::router::DavMethod;

/// Value of the `Server` header on every response.
pub const SERVER_NAME: &str = "filedav";

/// Response header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Configuration for the HTTP service.
#[derive(Debug, Clone)]
pub struct DavHttpConfig {
    /// Number of body chunks after which an upload is cut off.
    pub max_body_chunks: usize,
}

impl Default for DavHttpConfig {
    fn default() -> Self {
        Self {
            max_body_chunks: DEFAULT_MAX_BODY_CHUNKS,
        }
    }
}

impl DavHttpConfig {
    /// Take the HTTP settings from the server configuration.
    #[must_use]
    pub fn from_config(config: &DavConfig) -> Self {
        Self {
            max_body_chunks: config.max_body_chunks,
        }
    }
}

/// Error returned by the service when a request must not be answered.
///
/// hyper reacts to it by closing the connection.
#[derive(Debug, thiserror::Error)]
#[error("connection aborted for request {request_id}: {reason}")]
pub struct ConnectionAborted {
    /// Id of the request that caused the abort.
    pub request_id: String,
    /// What went wrong.
    pub reason: String,
}

/// The filedav HTTP service.
///
/// Generic over the request body so that it runs on hyper's `Incoming` in
/// production and on in-memory bodies in tests.
#[derive(Debug)]
pub struct DavHttpService<H: DavHandler> {
    handler: Arc<H>,
    config: Arc<DavHttpConfig>,
}

impl<H: DavHandler> DavHttpService<H> {
    /// Create a new service with the given handler and configuration.
    #[must_use]
    pub fn new(handler: H, config: DavHttpConfig) -> Self {
        Self::from_shared(Arc::new(handler), config)
    }

    /// Create a new service from an `Arc<H>` handler.
    #[must_use]
    pub fn from_shared(handler: Arc<H>, config: DavHttpConfig) -> Self {
        Self {
            handler,
            config: Arc::new(config),
        }
    }
}

impl<H: DavHandler> Clone for DavHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H, B> Service<http::Request<B>> for DavHttpService<H>
where
    H: DavHandler,
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = DavResponse;
    type Error = ConnectionAborted;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();

            let response = process_request(req, handler.as_ref(), &config, &request_id).await?;

            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Process an incoming HTTP request through the filedav pipeline.
async fn process_request<H, B>(
    req: http::Request<B>,
    handler: &H,
    config: &DavHttpConfig,
    request_id: &str,
) -> Result<DavResponse, ConnectionAborted>
where
    H: DavHandler,
    B: Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    let uri = req.uri().clone();
    debug!(%method, %uri, request_id, "processing WebDAV request");

    // 1. Route by method.
    let Some(dav_method) = DavMethod::from_method(&method) else {
        warn!(%method, %uri, request_id, "method not allowed");
        let err = DavError::MethodNotAllowed {
            method: method.to_string(),
        };
        return Ok(error_to_response(&err));
    };

    // 2. Extract request fields.
    let (parts, body) = req.into_parts();
    let request = DavRequest::from_parts(dav_method, &parts);

    // 3. Defer body collection to the handler.
    let body = RequestBody::new(body, config.max_body_chunks);

    // 4. Dispatch.
    match dispatch_request(handler, request, body).await {
        Ok(response) => Ok(response),
        Err(err) if err.aborts_connection() => {
            warn!(%method, %uri, error = %err, request_id, "dropping connection");
            Err(ConnectionAborted {
                request_id: request_id.to_owned(),
                reason: err.to_string(),
            })
        }
        Err(err) => {
            debug!(
                status = err.status_code().as_u16(),
                error = %err,
                request_id,
                "WebDAV request failed"
            );
            Ok(error_to_response(&err))
        }
    }
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: DavResponse,
    request_id: &str,
) -> DavResponse {
    let headers = response.headers_mut();

    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, hv);
    }
    headers.insert(http::header::SERVER, HeaderValue::from_static(SERVER_NAME));

    response
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};

    use futures::stream;
    use http_body::Frame;
    use http_body_util::{BodyExt, Empty, Full, StreamBody};
    use tempfile::TempDir;

    use filedav_core::FileStore;

    use super::*;
    use crate::handler::FileStoreHandler;

    const HI_MD5: &str = "49f68a5c8493ec2c0bf489821c21fc3b";

    fn fixture(max_body_chunks: usize) -> (TempDir, DavHttpService<FileStoreHandler>) {
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("docs/sub")).expect("mkdir");
        std::fs::write(dir.path().join("docs/a.txt"), b"hi").expect("write");
        let handler = FileStoreHandler::new(FileStore::new(dir.path()));
        let service = DavHttpService::new(handler, DavHttpConfig { max_body_chunks });
        (dir, service)
    }

    fn request<B>(method: &str, uri: &str, body: B) -> http::Request<B> {
        http::Request::builder()
            .method(http::Method::from_bytes(method.as_bytes()).expect("method"))
            .uri(uri)
            .body(body)
            .expect("valid request")
    }

    fn chunked(
        parts: &[&'static str],
    ) -> StreamBody<impl futures::Stream<Item = Result<Frame<Bytes>, io::Error>> + Send + 'static>
    {
        let frames: Vec<_> = parts
            .iter()
            .map(|p| Ok(Frame::data(Bytes::from_static(p.as_bytes()))))
            .collect();
        StreamBody::new(stream::iter(frames))
    }

    async fn body_text(response: DavResponse) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("infallible")
            .to_bytes();
        String::from_utf8(bytes.to_vec()).expect("utf-8")
    }

    fn header<'a>(response: &'a DavResponse, name: &str) -> Option<&'a str> {
        response.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[tokio::test]
    async fn test_should_run_docs_scenario() {
        let (_dir, service) = fixture(DEFAULT_MAX_BODY_CHUNKS);

        let mut req = request("PROPFIND", "/docs", Empty::<Bytes>::new());
        req.headers_mut()
            .insert("Depth", HeaderValue::from_static("1"));
        let resp = service.call(req).await.expect("propfind");
        assert_eq!(resp.status(), http::StatusCode::MULTI_STATUS);
        let xml = body_text(resp).await;
        assert_eq!(xml.matches("<response>").count(), 2);
        assert!(xml.contains("<href>docs/a.txt</href></response>"));
        assert!(xml.contains("<href>docs/sub</href><propstat>"));

        let resp = service
            .call(request("GET", "/docs/a.txt", Empty::<Bytes>::new()))
            .await
            .expect("get");
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(header(&resp, "etag"), Some(HI_MD5));
        assert_eq!(body_text(resp).await, "hi");

        let mut req = request("PUT", "/docs/a.txt", Full::new(Bytes::from_static(b"bye")));
        req.headers_mut()
            .insert("If-Match", HeaderValue::from_static(HI_MD5));
        let resp = service.call(req).await.expect("put");
        assert_eq!(resp.status(), http::StatusCode::NO_CONTENT);

        let resp = service
            .call(request("GET", "/docs/a.txt", Empty::<Bytes>::new()))
            .await
            .expect("get");
        let etag = header(&resp, "etag").map(ToOwned::to_owned);
        assert_ne!(etag.as_deref(), Some(HI_MD5));
        assert_eq!(etag.as_deref(), Some(filedav_core::Fingerprint::of(b"bye").as_str()));
        assert_eq!(body_text(resp).await, "bye");
    }

    #[tokio::test]
    async fn test_should_answer_unknown_methods_with_405() {
        let (_dir, service) = fixture(DEFAULT_MAX_BODY_CHUNKS);
        for method in ["DELETE", "HEAD", "POST", "MKCOL"] {
            let mut req = request(method, "/docs/a.txt", Empty::<Bytes>::new());
            req.headers_mut()
                .insert("If-Match", HeaderValue::from_static(HI_MD5));
            let resp = service.call(req).await.expect("response");
            assert_eq!(resp.status(), http::StatusCode::METHOD_NOT_ALLOWED, "{method}");
            assert!(body_text(resp).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_should_reject_bad_depth_with_403() {
        let (_dir, service) = fixture(DEFAULT_MAX_BODY_CHUNKS);
        for depth in [None, Some("0"), Some("infinity")] {
            let mut req = request("PROPFIND", "/docs", Empty::<Bytes>::new());
            if let Some(depth) = depth {
                req.headers_mut()
                    .insert("Depth", HeaderValue::from_static(depth));
            }
            let resp = service.call(req).await.expect("response");
            assert_eq!(resp.status(), http::StatusCode::FORBIDDEN, "{depth:?}");
            assert_eq!(
                body_text(resp).await,
                "PROPFIND requests are limited to `Depth: 1`\n"
            );
        }
    }

    #[tokio::test]
    async fn test_should_add_common_headers() {
        let (_dir, service) = fixture(DEFAULT_MAX_BODY_CHUNKS);
        let resp = service
            .call(request("GET", "/docs/missing", Empty::<Bytes>::new()))
            .await
            .expect("response");
        assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);
        assert_eq!(header(&resp, "server"), Some(SERVER_NAME));
        let id = header(&resp, REQUEST_ID_HEADER).expect("request id");
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[tokio::test]
    async fn test_should_abort_connection_past_chunk_ceiling() {
        let (dir, service) = fixture(2);

        let err = service
            .call(request("PUT", "/docs/big.txt", chunked(&["a", "b", "c"])))
            .await
            .expect_err("over the ceiling");
        assert!(err.reason.contains("exceeded 2 chunks"), "{err}");
        assert!(!dir.path().join("docs/big.txt").exists());

        let resp = service
            .call(request("PUT", "/docs/ok.txt", chunked(&["a", "b"])))
            .await
            .expect("at the ceiling");
        assert_eq!(resp.status(), http::StatusCode::NO_CONTENT);
        assert_eq!(
            std::fs::read(dir.path().join("docs/ok.txt")).expect("read"),
            b"ab"
        );
    }

    #[tokio::test]
    async fn test_should_abort_connection_on_client_disconnect() {
        let (dir, service) = fixture(DEFAULT_MAX_BODY_CHUNKS);
        let frames = vec![
            Ok(Frame::data(Bytes::from_static(b"part"))),
            Err(io::Error::from(io::ErrorKind::ConnectionReset)),
        ];

        let result = service
            .call(request(
                "PUT",
                "/docs/a.txt",
                StreamBody::new(stream::iter(frames)),
            ))
            .await;
        assert!(result.is_err());
        assert_eq!(
            std::fs::read(dir.path().join("docs/a.txt")).expect("read"),
            b"hi"
        );
    }

    #[tokio::test]
    async fn test_should_leave_body_unread_on_precondition_failure() {
        let (_dir, service) = fixture(DEFAULT_MAX_BODY_CHUNKS);
        let polled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&polled);
        let body = StreamBody::new(stream::poll_fn(move |_| {
            flag.store(true, Ordering::SeqCst);
            std::task::Poll::Ready(None::<Result<Frame<Bytes>, io::Error>>)
        }));

        let mut req = request("PUT", "/docs/a.txt", body);
        req.headers_mut()
            .insert("If-Match", HeaderValue::from_static("stale"));
        let resp = service.call(req).await.expect("response");

        assert_eq!(resp.status(), http::StatusCode::PRECONDITION_FAILED);
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_should_reject_malformed_percent_encoding() {
        let (_dir, service) = fixture(DEFAULT_MAX_BODY_CHUNKS);
        let resp = service
            .call(request("GET", "/docs/%E0%A4%A", Empty::<Bytes>::new()))
            .await
            .expect("response");
        assert_eq!(resp.status(), http::StatusCode::BAD_REQUEST);
        assert_eq!(body_text(resp).await, "malformed request path\n");
    }

    #[test]
    fn test_should_take_chunk_ceiling_from_config() {
        let config = DavConfig::builder().max_body_chunks(7).build();
        assert_eq!(DavHttpConfig::from_config(&config).max_body_chunks, 7);
        assert_eq!(
            DavHttpConfig::default().max_body_chunks,
            DEFAULT_MAX_BODY_CHUNKS
        );
    }
}
