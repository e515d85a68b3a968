//! Request body collection.
//!
//! Uploads are buffered in memory and handed to the write path as one
//! [`Bytes`]. The only limit is a ceiling on the number of data frames, not
//! on their total size: the collector fails once more than `max_chunks`
//! frames have arrived. Frame size is decided by the transport, so the
//! ceiling is a coarse guard against runaway clients rather than a byte
//! quota.
//!
//! A failed collection never yields partial data. The service turns it into
//! a dropped connection instead of a response.

use std::fmt;
use std::future::Future;
use std::pin::{Pin, pin};

use bytes::{Bytes, BytesMut};
use http_body::Body;
use http_body_util::BodyExt;

use filedav_core::DavError;

/// Boxed transport error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a request body could not be collected.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// More than `limit` data frames arrived.
    #[error("request body exceeded {limit} chunks")]
    TooManyChunks {
        /// The configured ceiling.
        limit: usize,
    },

    /// The body stream failed, typically because the client went away.
    #[error("request body stream failed: {0}")]
    Disconnected(#[source] BoxError),
}

impl From<CollectError> for DavError {
    fn from(err: CollectError) -> Self {
        Self::BodyAborted {
            reason: err.to_string(),
        }
    }
}

/// Read every data frame of `body` and concatenate them.
///
/// Trailers are ignored.
///
/// # Errors
///
/// [`CollectError::TooManyChunks`] as soon as frame `max_chunks + 1` arrives,
/// [`CollectError::Disconnected`] if the stream yields an error.
pub async fn collect_body<B>(body: B, max_chunks: usize) -> Result<Bytes, CollectError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let mut body = pin!(body);
    let mut chunks: Vec<Bytes> = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| CollectError::Disconnected(e.into()))?;
        if let Ok(data) = frame.into_data() {
            chunks.push(data);
            if chunks.len() > max_chunks {
                return Err(CollectError::TooManyChunks { limit: max_chunks });
            }
        }
    }

    Ok(concat(chunks))
}

fn concat(mut chunks: Vec<Bytes>) -> Bytes {
    match chunks.len() {
        0 => Bytes::new(),
        1 => chunks.swap_remove(0),
        _ => {
            let mut buf = BytesMut::with_capacity(chunks.iter().map(Bytes::len).sum());
            for chunk in &chunks {
                buf.extend_from_slice(chunk);
            }
            buf.freeze()
        }
    }
}

/// A request body that has not been read yet.
///
/// Nothing is pulled from the connection until [`RequestBody::collect`] is
/// awaited. Handlers that reject a request early simply drop it.
pub struct RequestBody {
    inner: Pin<Box<dyn Future<Output = Result<Bytes, CollectError>> + Send>>,
}

impl RequestBody {
    /// Wrap `body`, to be collected with the given chunk ceiling.
    pub fn new<B>(body: B, max_chunks: usize) -> Self
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        Self {
            inner: Box::pin(collect_body(body, max_chunks)),
        }
    }

    /// Collect the whole body.
    ///
    /// # Errors
    ///
    /// See [`collect_body`].
    pub async fn collect(self) -> Result<Bytes, CollectError> {
        self.inner.await
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestBody").finish_non_exhaustive()
    }
}
