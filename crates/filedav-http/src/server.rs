//! Accept loop with graceful shutdown.

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::dispatch::DavHandler;
use crate::service::DavHttpService;

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Serve connections from `listener` until `shutdown` resolves.
///
/// Each connection runs on its own task and speaks HTTP/1 or HTTP/2 as the
/// client chooses. Once `shutdown` completes no new connections are accepted
/// and the call returns after in-flight connections have finished.
pub async fn serve<H, F>(listener: TcpListener, service: DavHttpService<H>, shutdown: F)
where
    H: DavHandler,
    F: Future<Output = ()>,
{
    let graceful = GracefulShutdown::new();
    let builder = HttpConnBuilder::new(TokioExecutor::new());
    let mut shutdown = pin!(shutdown);

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(pair) => pair,
                Err(err) => {
                    // Usually descriptor exhaustion; retrying at once would spin.
                    warn!(error = %err, "accept failed, retrying");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            },
            () = &mut shutdown => break,
        };
        debug!(%peer, "client connected");

        let conn = builder
            .serve_connection(TokioIo::new(stream), service.clone())
            .into_owned();
        let conn = graceful.watch(conn);
        tokio::spawn(async move {
            match conn.await {
                Ok(()) => debug!(%peer, "client disconnected"),
                Err(err) => error!(%peer, error = %err, "connection closed with error"),
            }
        });
    }

    info!("no longer accepting connections, waiting for open ones to finish");
    graceful.shutdown().await;
    info!("filedav stopped");
}

#[cfg(test)]
mod tests {
    use filedav_core::FileStore;

    use super::*;
    use crate::handler::FileStoreHandler;
    use crate::service::DavHttpConfig;

    #[tokio::test]
    async fn test_should_return_once_shutdown_resolves() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let service = DavHttpService::new(
            FileStoreHandler::new(FileStore::new(".")),
            DavHttpConfig::default(),
        );

        tokio::time::timeout(
            Duration::from_secs(5),
            serve(listener, service, std::future::ready(())),
        )
        .await
        .expect("serve should stop when shutdown is already complete");
    }
}
