//! Server configuration.
//!
//! Provides [`DavConfig`] for configuring a filedav server. Values are loaded
//! from environment variables, falling back to defaults that reproduce the
//! behavior of a bare `filedav-server` started in the directory to be served.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default chunk ceiling for request bodies.
pub const DEFAULT_MAX_BODY_CHUNKS: usize = 1_000_000;

/// filedav configuration.
///
/// # Examples
///
/// ```
/// use filedav_core::config::DavConfig;
///
/// let config = DavConfig::default();
/// assert_eq!(config.listen, "127.0.0.1:8000");
/// assert!(!config.lock_writes);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct DavConfig {
    /// Bind address (e.g. `"127.0.0.1:8000"`).
    #[builder(default = String::from("127.0.0.1:8000"))]
    pub listen: String,

    /// Directory that resolved request paths are interpreted against.
    #[builder(default = PathBuf::from("."))]
    pub root_dir: PathBuf,

    /// Number of body chunks after which an upload is cut off.
    ///
    /// This counts frames as delivered by the transport, not bytes.
    #[builder(default = DEFAULT_MAX_BODY_CHUNKS)]
    pub max_body_chunks: usize,

    /// Serialize writes per resolved path so that an `If-Match` check and the
    /// write that follows it cannot interleave with another PUT.
    #[builder(default = false)]
    pub lock_writes: bool,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for DavConfig {
    fn default() -> Self {
        Self {
            listen: String::from("127.0.0.1:8000"),
            root_dir: PathBuf::from("."),
            max_body_chunks: DEFAULT_MAX_BODY_CHUNKS,
            lock_writes: false,
            log_level: String::from("info"),
        }
    }
}

impl DavConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `FILEDAV_LISTEN` | `127.0.0.1:8000` |
    /// | `FILEDAV_ROOT` | `.` |
    /// | `FILEDAV_MAX_BODY_CHUNKS` | `1000000` |
    /// | `FILEDAV_LOCK_WRITES` | `false` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("FILEDAV_LISTEN") {
            config.listen = v;
        }
        if let Ok(v) = std::env::var("FILEDAV_ROOT") {
            config.root_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("FILEDAV_MAX_BODY_CHUNKS") {
            if let Ok(n) = v.parse::<usize>() {
                config.max_body_chunks = n;
            }
        }
        if let Ok(v) = std::env::var("FILEDAV_LOCK_WRITES") {
            config.lock_writes = parse_bool(&v);
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Override the port and/or host part of [`listen`](Self::listen).
    ///
    /// Either argument may be `None`, in which case the current value is kept.
    /// IPv6 hosts must be given in brackets.
    pub fn override_listen(&mut self, port: Option<&str>, host: Option<&str>) {
        if port.is_none() && host.is_none() {
            return;
        }
        let (current_host, current_port) = self
            .listen
            .rsplit_once(':')
            .unwrap_or((self.listen.as_str(), "8000"));
        self.listen = format!(
            "{}:{}",
            host.unwrap_or(current_host),
            port.unwrap_or(current_port)
        );
    }
}

/// Parse a string as a boolean, accepting `"1"`, `"true"` and `"yes"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = DavConfig::default();
        assert_eq!(config.listen, "127.0.0.1:8000");
        assert_eq!(config.root_dir, PathBuf::from("."));
        assert_eq!(config.max_body_chunks, 1_000_000);
        assert!(!config.lock_writes);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_should_load_from_env() {
        let config = DavConfig::from_env();
        assert!(!config.listen.is_empty());
    }

    #[test]
    fn test_should_build_with_typed_builder() {
        let config = DavConfig::builder()
            .listen("0.0.0.0:9999".into())
            .root_dir(PathBuf::from("/srv/dav"))
            .max_body_chunks(16)
            .lock_writes(true)
            .log_level("debug".into())
            .build();

        assert_eq!(config.listen, "0.0.0.0:9999");
        assert_eq!(config.root_dir, PathBuf::from("/srv/dav"));
        assert_eq!(config.max_body_chunks, 16);
        assert!(config.lock_writes);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_should_serialize_to_camel_case_json() {
        let config = DavConfig::default();
        let json = serde_json::to_string(&config).expect("test serialization");
        assert!(json.contains("rootDir"));
        assert!(json.contains("maxBodyChunks"));
    }

    #[test]
    fn test_should_override_port_and_host() {
        let mut config = DavConfig::default();
        config.override_listen(Some("9000"), None);
        assert_eq!(config.listen, "127.0.0.1:9000");

        config.override_listen(Some("9001"), Some("localhost"));
        assert_eq!(config.listen, "localhost:9001");

        config.override_listen(None, None);
        assert_eq!(config.listen, "localhost:9001");
    }

    #[test]
    fn test_should_parse_bool_values() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("yes"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }
}
