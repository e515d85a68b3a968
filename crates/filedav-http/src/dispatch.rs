//! Dispatch of routed requests to a handler.
//!
//! [`DavHandler`] is the boundary between the HTTP layer and the resource
//! operations. [`FileStoreHandler`](crate::handler::FileStoreHandler) is the
//! implementation the server uses; tests can plug in their own.

use std::future::Future;
use std::pin::Pin;

use filedav_core::DavError;

use crate::collector::RequestBody;
use crate::request::DavRequest;
use crate::response::DavResponse;

/// Boxed future returned by [`DavHandler::handle_request`].
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<DavResponse, DavError>> + Send>>;

/// Trait implemented by the resource backend.
///
/// The returned future must not borrow `self`; implementations clone what
/// they need (see [`FileStore`](filedav_core::FileStore), which is cheap to
/// clone).
pub trait DavHandler: Send + Sync + 'static {
    /// Handle a routed request and produce a response.
    ///
    /// `body` is unread. Implementations collect it only once they know
    /// they will use it.
    fn handle_request(&self, request: DavRequest, body: RequestBody) -> HandlerFuture;
}

/// Dispatch a routed request to the handler.
///
/// # Errors
///
/// Whatever the handler returns. The service maps errors to responses, or
/// drops the connection for [`DavError::BodyAborted`].
pub async fn dispatch_request<H: DavHandler>(
    handler: &H,
    request: DavRequest,
    body: RequestBody,
) -> Result<DavResponse, DavError> {
    tracing::debug!(
        method = %request.method,
        url = %request.url,
        depth = ?request.depth,
        if_match = ?request.if_match,
        "dispatching WebDAV request"
    );
    handler.handle_request(request, body).await
}
