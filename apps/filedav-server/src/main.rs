//! filedav server - a minimal WebDAV file server.
//!
//! Serves the directory tree below `FILEDAV_ROOT` (default: the working
//! directory) with `PROPFIND` (`Depth: 1`), `GET` and `PUT`.
//!
//! # Usage
//!
//! ```text
//! filedav-server [port] [host]
//! ```
//!
//! Positional arguments override the port and host of `FILEDAV_LISTEN`.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `FILEDAV_LISTEN` | `127.0.0.1:8000` | Bind address |
//! | `FILEDAV_ROOT` | `.` | Directory request paths are resolved against |
//! | `FILEDAV_MAX_BODY_CHUNKS` | `1000000` | Upload chunk ceiling |
//! | `FILEDAV_LOCK_WRITES` | `false` | Serialize PUTs per path |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use filedav_core::{DavConfig, FileStore};
use filedav_http::{DavHttpConfig, DavHttpService, FileStoreHandler};

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Load configuration from the environment, then apply `[port] [host]`.
fn load_config(args: &[String]) -> DavConfig {
    let mut config = DavConfig::from_env();
    config.override_listen(
        args.first().map(String::as_str),
        args.get(1).map(String::as_str),
    );
    config
}

/// Resolve the bind address; hostnames such as `localhost` are looked up.
async fn resolve_listen(listen: &str) -> Result<SocketAddr> {
    if let Ok(addr) = listen.parse::<SocketAddr>() {
        return Ok(addr);
    }
    tokio::net::lookup_host(listen)
        .await
        .with_context(|| format!("invalid bind address: {listen}"))?
        .next()
        .with_context(|| format!("bind address resolved to nothing: {listen}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(&args);

    init_tracing(&config.log_level)?;

    info!(
        listen = %config.listen,
        root_dir = %config.root_dir.display(),
        max_body_chunks = config.max_body_chunks,
        lock_writes = config.lock_writes,
        version = VERSION,
        "starting filedav server",
    );

    let handler = FileStoreHandler::new(FileStore::from_config(&config));
    let service = DavHttpService::new(handler, DavHttpConfig::from_config(&config));

    let addr = resolve_listen(&config.listen).await?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening on http://{}", config.listen);

    filedav_http::serve(listener, service, async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    })
    .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[test]
    fn test_should_apply_positional_port_and_host() {
        let config = load_config(&args(&["9000", "0.0.0.0"]));
        assert_eq!(config.listen, "0.0.0.0:9000");
    }

    #[test]
    fn test_should_apply_port_only() {
        let config = load_config(&args(&["9001"]));
        assert!(config.listen.ends_with(":9001"), "{}", config.listen);
    }

    #[test]
    fn test_should_keep_env_listen_without_args() {
        let config = load_config(&[]);
        assert_eq!(config.listen, DavConfig::from_env().listen);
    }

    #[tokio::test]
    async fn test_should_resolve_ip_and_hostname_listen_addresses() {
        let addr = resolve_listen("127.0.0.1:8000").await.expect("ip");
        assert_eq!(addr.port(), 8000);

        let addr = resolve_listen("localhost:8001").await.expect("hostname");
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 8001);

        assert!(resolve_listen("not an address").await.is_err());
    }
}
