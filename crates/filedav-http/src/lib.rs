//! HTTP layer of filedav: method routing, body collection, response mapping,
//! and the hyper service.
//!
//! - **Routing** ([`router`]): maps the request method to a [`DavMethod`].
//! - **Request extraction** ([`request`]): pulls URL, `Depth` and `If-Match`
//!   into a [`DavRequest`].
//! - **Body collection** ([`collector`]): buffers uploads under a chunk
//!   ceiling, lazily, via [`RequestBody`].
//! - **Dispatch** ([`dispatch`], [`handler`]): the [`DavHandler`] trait and
//!   its [`FileStore`](filedav_core::FileStore)-backed implementation.
//! - **Responses** ([`response`]): success and error responses over a
//!   buffered `Full<Bytes>` body.
//! - **Service** ([`service`]) and **server** ([`server`]): the hyper
//!   `Service` and the accept loop.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> DavHttpService (hyper Service)
//!     -> DavMethod routing (405 for anything else)
//!     -> DavRequest extraction
//!     -> RequestBody (not read yet)
//!     -> dispatch_request (DavHandler trait)
//!       -> FileStore read / list / write
//!     -> error_to_response
//!     -> Common response headers (x-request-id, Server)
//!   <- HTTP Response, or a closed connection if the body was cut off
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use filedav_core::FileStore;
//! use filedav_http::{DavHttpConfig, DavHttpService, FileStoreHandler};
//!
//! # async fn run() -> std::io::Result<()> {
//! let handler = FileStoreHandler::new(FileStore::new("."));
//! let service = DavHttpService::new(handler, DavHttpConfig::default());
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! filedav_http::serve(listener, service, async {
//!     tokio::signal::ctrl_c().await.ok();
//! })
//! .await;
//! # Ok(())
//! # }
//! ```

pub mod collector;
pub mod dispatch;
pub mod handler;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod service;

pub use collector::{CollectError, RequestBody};
pub use dispatch::{DavHandler, dispatch_request};
pub use handler::FileStoreHandler;
pub use request::DavRequest;
pub use response::{DavResponse, error_to_response};
pub use router::DavMethod;
pub use server::serve;
pub use service::{ConnectionAborted, DavHttpConfig, DavHttpService};
