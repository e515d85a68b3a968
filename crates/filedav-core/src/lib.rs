//! Filesystem resource operations for filedav.
//!
//! This crate holds everything filedav does that is not HTTP plumbing:
//! mapping URLs to paths, fingerprinting content, reading files, listing
//! directories and performing (conditional) writes.
//!
//! # Architecture
//!
//! ```text
//! filedav-http (dispatch, body collection, responses)
//!        |
//!        v
//!   FileStore (read / list / write)
//!        |
//!        +-- path::resolve_path      URL -> ResolvedPath
//!        +-- fingerprint::Fingerprint bytes -> MD5 hex (ETag)
//!        +-- locks::WriteLocks        optional per-path write serialization
//!        |
//!        v
//!   tokio::fs
//! ```

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod locks;
pub mod path;
pub mod store;

pub use config::DavConfig;
pub use error::{DavError, DavResult};
pub use fingerprint::Fingerprint;
pub use path::{ResolvedPath, resolve_path};
pub use store::{DirectoryEntry, FileStore, Resource, WriteMode};
