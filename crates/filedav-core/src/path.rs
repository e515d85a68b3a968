//! Mapping request URLs to filesystem paths.
//!
//! The mapping is purely lexical: the query string is dropped, one leading
//! `/` is removed, and each `/`-separated segment is percent-decoded on its
//! own before the segments are joined again.
//!
//! No `.`/`..` normalization and no containment check is performed. A URL
//! such as `/../etc/passwd` resolves to `../etc/passwd`, and a segment that
//! decodes to an absolute path (`/%2Fetc`) yields an absolute path. Callers
//! must not assume the result stays below any root directory.

use std::borrow::Cow;
use std::fmt;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::error::{DavError, DavResult};

/// The path used when a URL has no segments left (`/`, `/?x=1`, ...).
const CURRENT_DIR: &str = ".";

/// A filesystem path derived from a request URL.
///
/// This is the path as the protocol sees it: it appears verbatim as the
/// `href` of directory entries. Filesystem access goes through
/// [`ResolvedPath::under`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    /// Wrap an already-resolved path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// The path itself.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// The path of a directory entry named `name` inside this path.
    ///
    /// Joining onto `.` yields the bare name, so entries listed at the root
    /// read `a.txt` rather than `./a.txt`.
    #[must_use]
    pub fn join_entry(&self, name: &str) -> Self {
        if self.0.as_os_str() == CURRENT_DIR {
            Self(PathBuf::from(name))
        } else {
            Self(self.0.join(name))
        }
    }

    /// The path to use for filesystem access when serving from `root`.
    #[must_use]
    pub fn under(&self, root: &Path) -> PathBuf {
        if root.as_os_str() == CURRENT_DIR {
            self.0.clone()
        } else {
            root.join(&self.0)
        }
    }

    /// The path rendered as text, as written into `href` elements.
    #[must_use]
    pub fn to_href(&self) -> Cow<'_, str> {
        self.0.to_string_lossy()
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Resolve a raw request URL (path plus optional query) to a filesystem path.
///
/// # Errors
///
/// Returns [`DavError::MalformedPath`] if a segment contains a `%` not
/// followed by two hex digits, or decodes to invalid UTF-8.
///
/// # Examples
///
/// ```
/// use filedav_core::path::resolve_path;
///
/// let path = resolve_path("/docs/hello%20world.txt?rev=2").unwrap();
/// assert_eq!(path.to_href(), "docs/hello world.txt");
/// ```
pub fn resolve_path(url: &str) -> DavResult<ResolvedPath> {
    let path = url.split_once('?').map_or(url, |(path, _query)| path);
    let path = path.strip_prefix('/').unwrap_or(path);

    let mut segments = Vec::new();
    for raw in path.split('/') {
        let segment = decode_segment(raw).ok_or_else(|| DavError::MalformedPath {
            url: url.to_owned(),
        })?;
        if !segment.is_empty() {
            segments.push(segment);
        }
    }

    if segments.is_empty() {
        return Ok(ResolvedPath::new(CURRENT_DIR));
    }
    Ok(ResolvedPath::new(segments.join(MAIN_SEPARATOR_STR)))
}

/// Percent-decode a single path segment, rejecting malformed escapes.
fn decode_segment(raw: &str) -> Option<Cow<'_, str>> {
    let bytes = raw.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'%' {
            let valid = matches!(
                (bytes.get(i + 1), bytes.get(i + 2)),
                (Some(h), Some(l)) if h.is_ascii_hexdigit() && l.is_ascii_hexdigit()
            );
            if !valid {
                return None;
            }
        }
    }
    percent_decode_str(raw).decode_utf8().ok()
}
