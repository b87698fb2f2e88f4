//! Strict and lazy trace envelopes.

use serde::Serialize;

use crate::error::Result;
use crate::producer::Producer;
use crate::schema::Declaration;

/// Validated, fully materialized trace. This is what the codec encodes and
/// what the validator produces.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TraceFile {
    /// Paths of further trace files, relative to this file's directory.
    pub sub_filenames: Vec<String>,
    /// Declarations recorded in this file.
    pub declarations: Vec<Declaration>,
}

impl TraceFile {
    /// Lazy view over this trace.
    #[must_use]
    pub fn into_lazy(self) -> Trace {
        self.into()
    }
}

/// Trace whose sequences are single-pass [`Producer`]s.
///
/// Produced by the loaders; in deep mode `declarations` reads referenced files
/// only as it is drained, and I/O or decode failures surface as `Err` items at
/// that point. Use [`Trace::force`] when the contents are needed more than
/// once.
#[derive(Debug, Default)]
pub struct Trace {
    /// Referenced file names (empty after a deep load).
    pub sub_filenames: Producer<String>,
    /// Declarations, possibly spanning several files.
    pub declarations: Producer<Declaration>,
}

impl Trace {
    /// Assemble a lazy trace from two producers.
    #[must_use]
    pub const fn new(sub_filenames: Producer<String>, declarations: Producer<Declaration>) -> Self {
        Self {
            sub_filenames,
            declarations,
        }
    }

    /// Drain both sequences (file names first) into a [`TraceFile`].
    ///
    /// Memory grows with the total declaration count; the first error aborts.
    pub fn force(self) -> Result<TraceFile> {
        Ok(TraceFile {
            sub_filenames: self.sub_filenames.collect::<Result<_>>()?,
            declarations: self.declarations.collect::<Result<_>>()?,
        })
    }
}

impl From<TraceFile> for Trace {
    fn from(t: TraceFile) -> Self {
        Self::new(
            Producer::from_vec(t.sub_filenames),
            Producer::from_vec(t.declarations),
        )
    }
}

/// Concatenate traces field by field, in order, without draining them.
///
/// Only the trace handles are collected; their contents stay lazy.
pub fn join_traces<I>(traces: I) -> Trace
where
    I: IntoIterator<Item = Trace>,
{
    let (subs, decls): (Vec<_>, Vec<_>) = traces
        .into_iter()
        .map(|t| (t.sub_filenames, t.declarations))
        .unzip();
    Trace::new(Producer::concat(subs), Producer::concat(decls))
}
