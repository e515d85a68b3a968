//! Content fingerprints used as ETags.
//!
//! A [`Fingerprint`] is the lowercase hex MD5 digest of a file's bytes. It
//! identifies content, not files: two files with identical bytes share a
//! fingerprint. MD5 is used for uniqueness only and is not a security
//! boundary.

use std::fmt;

use md5::{Digest, Md5};

/// Hex-encoded MD5 digest of a byte sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of `data`.
    ///
    /// # Examples
    ///
    /// ```
    /// use filedav_core::fingerprint::Fingerprint;
    ///
    /// let fp = Fingerprint::of(b"hi");
    /// assert_eq!(fp.as_str(), "49f68a5c8493ec2c0bf489821c21fc3b");
    /// ```
    #[must_use]
    pub fn of(data: &[u8]) -> Self {
        Self(hex::encode(Md5::digest(data)))
    }

    /// The hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a client-supplied `If-Match` token names this fingerprint.
    ///
    /// The comparison is exact: quoted or weak (`W/"..."`) tokens do not match.
    #[must_use]
    pub fn matches(&self, token: &str) -> bool {
        self.0 == token
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
