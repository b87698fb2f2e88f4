//! Error taxonomy for decoding, validating, loading and saving traces.
//!
//! Library code returns [`TraceError`]; callers that only care about the
//! category match on [`TraceError::kind`], which looks through the
//! [`TraceError::InFile`] wrapper added by the file-level loaders.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::format::Format;

/// Convenience alias used throughout the crate.
pub type Result<T, E = TraceError> = std::result::Result<T, E>;

/// Coarse error category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bytes are not well-formed for the selected format.
    Decode,
    /// Well-formed input that violates the trace schema.
    Validation,
    /// A trace file (top-level or referenced) does not exist.
    NotFound,
    /// The filename cannot be mapped to a format.
    UnsupportedFormat,
    /// Any other filesystem failure.
    Io,
    /// Serialization failed on the write path.
    Encode,
}

/// Errors produced by the trace codec and loaders.
#[derive(Debug, Error)]
pub enum TraceError {
    /// Malformed bytes for `format`.
    #[error("malformed {format} input: {message}")]
    Decode {
        /// Format the bytes were decoded as.
        format: Format,
        /// Underlying parser message.
        message: String,
    },

    /// Schema violation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Missing file.
    #[error("trace file not found: {}", .path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// Filename could not be classified.
    #[error("unsupported trace format for {}: {reason}", .path.display())]
    UnsupportedFormat {
        /// Offending path.
        path: PathBuf,
        /// Why classification failed.
        reason: &'static str,
    },

    /// Filesystem failure other than a missing file.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization failure.
    #[error("failed to encode {format} output: {message}")]
    Encode {
        /// Target format.
        format: Format,
        /// Underlying serializer message.
        message: String,
    },

    /// An error that occurred while processing a specific file.
    #[error("{}: {source}", .path.display())]
    InFile {
        /// File being processed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: Box<TraceError>,
    },
}

impl TraceError {
    /// Category of this error, looking through [`TraceError::InFile`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::Io { .. } => ErrorKind::Io,
            Self::Encode { .. } => ErrorKind::Encode,
            Self::InFile { source, .. } => source.kind(),
        }
    }

    /// The schema violation behind this error, if any.
    #[must_use]
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(v) => Some(v),
            Self::InFile { source, .. } => source.validation(),
            _ => None,
        }
    }

    /// Attach `path` as file context. Errors that already name a path are
    /// returned unchanged.
    #[must_use]
    pub fn in_file(self, path: &Path) -> Self {
        match self {
            Self::NotFound { .. }
            | Self::UnsupportedFormat { .. }
            | Self::Io { .. }
            | Self::InFile { .. } => self,
            other => Self::InFile {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    /// Map an I/O error on `path`, distinguishing missing files.
    pub(crate) fn from_io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/* ---------------- Validation ---------------- */

/// One step of a [`NodePath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object field.
    Field(&'static str),
    /// List element.
    Index(usize),
}

/// Location of a node inside a trace document, rendered as
/// `$.declarations[3].kind.steps[0]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodePath(pub Vec<Segment>);

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for seg in &self.0 {
            match seg {
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

/// What exactly was wrong with the node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Violation {
    /// A required field is absent.
    MissingField(&'static str),
    /// A field not declared by the schema is present.
    UnknownField(String),
    /// A tagged value has no `type` discriminator.
    MissingTag {
        /// Union being decoded.
        union: &'static str,
    },
    /// The discriminator names no variant of the union.
    UnknownTag {
        /// Union being decoded.
        union: &'static str,
        /// Tag found in the input.
        found: String,
    },
    /// The JSON type of the node is not the expected one.
    WrongType {
        /// Expected shape.
        expected: &'static str,
        /// Shape found.
        found: &'static str,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(name) => write!(f, "missing required field `{name}`"),
            Self::UnknownField(name) => write!(f, "unexpected field `{name}`"),
            Self::MissingTag { union } => write!(f, "{union} is missing its `type` tag"),
            Self::UnknownTag { union, found } => write!(f, "unknown {union} tag `{found}`"),
            Self::WrongType { expected, found } => write!(f, "expected {expected}, found {found}"),
        }
    }
}

/// A schema violation located at `path`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid trace at {path}: {violation}")]
pub struct ValidationError {
    /// Where the violation was found.
    pub path: NodePath,
    /// What was wrong.
    pub violation: Violation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_path_renders_fields_and_indices() {
        let p = NodePath(vec![
            Segment::Field("declarations"),
            Segment::Index(3),
            Segment::Field("kind"),
        ]);
        assert_eq!(p.to_string(), "$.declarations[3].kind");
        assert_eq!(NodePath::default().to_string(), "$");
    }

    #[test]
    fn kind_looks_through_file_context() {
        let inner = TraceError::Validation(ValidationError {
            path: NodePath::default(),
            violation: Violation::MissingField("declarations"),
        });
        let wrapped = inner.in_file(Path::new("a.json"));
        assert_eq!(wrapped.kind(), ErrorKind::Validation);
        assert!(wrapped.validation().is_some());
        assert!(wrapped.to_string().starts_with("a.json: invalid trace at $"));
    }

    #[test]
    fn missing_file_maps_to_not_found() {
        let e = TraceError::from_io(
            Path::new("nope.json"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert_eq!(e.kind(), ErrorKind::NotFound);
        // Already carries the path, so no extra wrapper is added.
        assert!(matches!(e.in_file(Path::new("nope.json")), TraceError::NotFound { .. }));
    }
}
