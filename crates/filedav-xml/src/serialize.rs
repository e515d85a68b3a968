//! Multistatus serialization.
//!
//! The document produced for a listing looks like this (shown wrapped; the
//! real output has no whitespace between elements):
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <multistatus xmlns="DAV:">
//!   <response><status>HTTP/1.1 200 OK</status><href>docs/a.txt</href></response>
//!   <response><status>HTTP/1.1 200 OK</status><href>docs/sub</href>
//!     <propstat><prop><resourcetype><collection/></resourcetype></prop></propstat>
//!   </response>
//! </multistatus>
//! ```
//!
//! Hrefs are written as raw text. A file name containing `<` or `&` ends up
//! unescaped in the document, so clients may receive malformed XML for such
//! directories.

use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

use filedav_core::DirectoryEntry;

use crate::error::XmlError;

/// The WebDAV XML namespace.
pub const DAV_NAMESPACE: &str = "DAV:";

/// Per-entry status line; every listed entry was stat'ed successfully.
const ENTRY_STATUS: &str = "HTTP/1.1 200 OK";

/// Trait for writing a value as WebDAV XML child elements.
///
/// Uses `io::Result` because `quick_xml::Writer` closures require `io::Result<()>`.
pub trait DavSerialize {
    /// Serialize this value as XML child elements into the given writer.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if writing to the underlying writer fails.
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()>;
}

/// Serialize a value as a complete document with declaration and `DAV:` namespace.
pub fn to_xml<T: DavSerialize>(root_element: &str, value: &T) -> Result<Vec<u8>, XmlError> {
    let mut buf = Vec::with_capacity(512);
    let mut writer = Writer::new(&mut buf);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    writer
        .create_element(root_element)
        .with_attribute(("xmlns", DAV_NAMESPACE))
        .write_inner_content(|w| value.serialize_xml(w))?;

    Ok(buf)
}

/// The body of a PROPFIND response: one `<response>` per entry, in order.
#[derive(Debug, Clone, Copy)]
pub struct Multistatus<'a>(pub &'a [DirectoryEntry]);

impl DavSerialize for Multistatus<'_> {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        for entry in self.0 {
            writer
                .create_element("response")
                .write_inner_content(|w| entry.serialize_xml(w))?;
        }
        Ok(())
    }
}

impl DavSerialize for DirectoryEntry {
    fn serialize_xml<W: Write>(&self, writer: &mut Writer<W>) -> io::Result<()> {
        writer
            .create_element("status")
            .write_text_content(BytesText::new(ENTRY_STATUS))?;
        writer
            .create_element("href")
            .write_text_content(BytesText::from_escaped(self.path.to_href()))?;

        if self.is_collection {
            writer
                .create_element("propstat")
                .write_inner_content(|w| -> io::Result<()> {
                    w.create_element("prop")
                        .write_inner_content(|w| -> io::Result<()> {
                            w.create_element("resourcetype")
                                .write_inner_content(|w| -> io::Result<()> {
                                    w.create_element("collection").write_empty()?;
                                    Ok(())
                                })?;
                            Ok(())
                        })?;
                    Ok(())
                })?;
        }
        Ok(())
    }
}

/// Serialize a directory listing as a `multistatus` document.
///
/// # Examples
///
/// ```
/// use filedav_core::{DirectoryEntry, ResolvedPath};
/// use filedav_xml::multistatus_to_xml;
///
/// let entries = vec![DirectoryEntry {
///     name: "a.txt".to_owned(),
///     path: ResolvedPath::new("docs/a.txt"),
///     is_collection: false,
/// }];
/// let xml = multistatus_to_xml(&entries).unwrap();
/// assert!(String::from_utf8(xml).unwrap().contains("<href>docs/a.txt</href>"));
/// ```
pub fn multistatus_to_xml(entries: &[DirectoryEntry]) -> Result<Vec<u8>, XmlError> {
    to_xml("multistatus", &Multistatus(entries))
}
