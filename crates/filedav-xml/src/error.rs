//! XML serialization error type.

use std::io;

/// Errors that can occur while writing XML.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),
}

impl From<XmlError> for filedav_core::DavError {
    fn from(err: XmlError) -> Self {
        Self::Serialization(err.to_string())
    }
}
