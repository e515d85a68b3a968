//! WebDAV XML serialization for filedav.
//!
//! filedav only ever writes one kind of document: the `207 Multi-Status`
//! body of a `Depth: 1` PROPFIND, with one `<response>` per directory entry.
//!
//! # Conventions
//!
//! - Namespace: `DAV:` (default namespace, no prefix)
//! - XML declaration: `<?xml version="1.0" encoding="utf-8"?>`
//! - No indentation or whitespace between elements
//! - `href` holds the entry's resolved filesystem path, written without
//!   escaping

pub mod error;
pub mod serialize;

pub use error::XmlError;
pub use serialize::{DAV_NAMESPACE, DavSerialize, Multistatus, multistatus_to_xml, to_xml};
