//! On-disk format selection.
//!
//! Two independent axes pick the representation: the encoding (text JSON or
//! binary CBOR) and whether the byte stream is zstd-compressed. Both are
//! derived purely from the filename suffix:
//!
//! | suffix | encoding | compressed |
//! |---|---|---|
//! | `.pickle.zst` | binary | yes |
//! | `.pickle` | binary | no |
//! | `.zst` | text | yes |
//! | anything else | text | no |

use std::fmt;
use std::path::Path;

use crate::error::{Result, TraceError};

/// Suffix that marks the binary encoding.
pub const BINARY_SUFFIX: &str = ".pickle";
/// Suffix that marks a zstd-compressed stream.
pub const COMPRESSED_SUFFIX: &str = ".zst";

/// Serialized representation of a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Pretty-printed UTF-8 JSON with a trailing newline.
    Text,
    /// Self-describing CBOR stream.
    Binary,
}

/// Encoding plus compression flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Format {
    /// Text or binary.
    pub encoding: Encoding,
    /// Whether the encoded bytes pass through zstd.
    pub compressed: bool,
}

impl Format {
    /// Plain JSON.
    pub const TEXT: Self = Self::new(Encoding::Text, false);
    /// zstd-compressed JSON.
    pub const TEXT_ZST: Self = Self::new(Encoding::Text, true);
    /// Plain CBOR.
    pub const BINARY: Self = Self::new(Encoding::Binary, false);
    /// zstd-compressed CBOR.
    pub const BINARY_ZST: Self = Self::new(Encoding::Binary, true);

    /// Combine an encoding with a compression flag.
    #[inline]
    #[must_use]
    pub const fn new(encoding: Encoding, compressed: bool) -> Self {
        Self {
            encoding,
            compressed,
        }
    }

    /// Classify a filename by suffix.
    ///
    /// Fails with [`TraceError::UnsupportedFormat`] when the name is not valid
    /// UTF-8, since no suffix rule can then be applied reliably.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path.to_str().ok_or_else(|| TraceError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: "filename is not valid UTF-8",
        })?;
        Ok(Self::from_name(name))
    }

    /// Classify a filename given as a string.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let compressed = name.ends_with(COMPRESSED_SUFFIX);
        let binary = name.ends_with(BINARY_SUFFIX)
            || name.ends_with(&format!("{BINARY_SUFFIX}{COMPRESSED_SUFFIX}"));
        let encoding = if binary {
            Encoding::Binary
        } else {
            Encoding::Text
        };
        Self::new(encoding, compressed)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enc = match self.encoding {
            Encoding::Text => "text",
            Encoding::Binary => "binary",
        };
        if self.compressed {
            write!(f, "{enc}+zstd")
        } else {
            f.write_str(enc)
        }
    }
}
