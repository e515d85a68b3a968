//! The [`DavHandler`] backed by a [`FileStore`].
//!
//! | Method | Success |
//! |--------|---------|
//! | `PROPFIND` | `207 Multi-Status`, multistatus XML |
//! | `GET` | `200 OK`, `ETag: <md5 hex>`, file bytes |
//! | `PUT` | `204 No Content` |

use http::StatusCode;

use filedav_core::{DavResult, FileStore};
use filedav_xml::multistatus_to_xml;

use crate::collector::RequestBody;
use crate::dispatch::{DavHandler, HandlerFuture};
use crate::request::DavRequest;
use crate::response::{self, DavResponse};
use crate::router::DavMethod;

/// Serves requests from a [`FileStore`].
#[derive(Debug, Clone)]
pub struct FileStoreHandler {
    store: FileStore,
}

impl FileStoreHandler {
    /// Create a handler over `store`.
    #[must_use]
    pub fn new(store: FileStore) -> Self {
        Self { store }
    }
}

impl DavHandler for FileStoreHandler {
    fn handle_request(&self, request: DavRequest, body: RequestBody) -> HandlerFuture {
        let store = self.store.clone();
        Box::pin(async move {
            match request.method {
                DavMethod::Propfind => handle_propfind(&store, &request).await,
                DavMethod::Get => handle_get(&store, &request).await,
                DavMethod::Put => handle_put(&store, &request, body).await,
            }
        })
    }
}

async fn handle_propfind(store: &FileStore, request: &DavRequest) -> DavResult<DavResponse> {
    let entries = store
        .list_directory(&request.url, request.depth.as_deref())
        .await?;
    Ok(response::multistatus(multistatus_to_xml(&entries)?))
}

async fn handle_get(store: &FileStore, request: &DavRequest) -> DavResult<DavResponse> {
    let resource = store.read_resource(&request.url).await?;
    response::resource(resource)
}

async fn handle_put(
    store: &FileStore,
    request: &DavRequest,
    body: RequestBody,
) -> DavResult<DavResponse> {
    store
        .write_resource(&request.url, request.if_match.as_deref(), body.collect())
        .await?;
    Ok(response::status_only(StatusCode::NO_CONTENT))
}
