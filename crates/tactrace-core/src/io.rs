//! File-level load/save with suffix-based format detection and deep loading.
//!
//! - [`load`] reads one file (or, with `deep`, a whole reference graph).
//! - [`load_deep`] flattens `sub_filenames` lazily: referenced files are
//!   opened only when the returned declaration producer reaches them.
//! - [`save`] writes any lazy trace; binary targets force it first, text
//!   targets stream it.
//!
//! File handles live only for the duration of one read or write.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::codec::{self, CodecOptions};
use crate::error::{Result, TraceError};
use crate::format::Format;
use crate::producer::Producer;
use crate::trace::{Trace, TraceFile};

/// Byte count at which progress is reported (plus once at end of file).
pub const PROGRESS_STEP: u64 = 1 << 20;

/// Read progress for one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadProgress {
    /// File being read.
    pub path: PathBuf,
    /// Raw bytes read from disk so far.
    pub bytes_read: u64,
    /// File size, when known.
    pub total: Option<u64>,
    /// Set on the final report for this file.
    pub done: bool,
}

/// Progress callback. It observes reads and cannot influence them.
pub type ProgressFn = Arc<dyn Fn(&ReadProgress) + Send + Sync>;

/// Options for [`load`].
#[derive(Clone, Default)]
pub struct LoadOptions {
    /// Flatten `sub_filenames` recursively.
    pub deep: bool,
    /// Codec tuning applied to every file read.
    pub codec: CodecOptions,
    /// Optional read-progress side channel.
    pub progress: Option<ProgressFn>,
}

impl LoadOptions {
    /// Options for a deep load with default codec settings.
    #[must_use]
    pub fn deep() -> Self {
        Self {
            deep: true,
            ..Self::default()
        }
    }

    /// Attach a progress callback.
    #[must_use]
    pub fn with_progress(mut self, f: impl Fn(&ReadProgress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("deep", &self.deep)
            .field("codec", &self.codec)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Options for [`save`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Codec tuning for the write.
    pub codec: CodecOptions,
}

/* ---------------- Load ---------------- */

/// Load a trace file; with `opts.deep`, flatten its references as in
/// [`load_deep`].
pub fn load<P: AsRef<Path>>(path: P, opts: &LoadOptions) -> Result<Trace> {
    if opts.deep {
        load_deep(path, opts)
    } else {
        read_trace_file(path.as_ref(), opts).map(Trace::from)
    }
}

/// Load a trace and every file it references, transitively, as one flat trace.
///
/// `path` itself is read and validated before returning. The result has no
/// `sub_filenames`; its declarations are this file's own, followed by each
/// referenced file's (deep) declarations in reference order. Referenced paths
/// are resolved against the directory of the referencing file.
///
/// Referenced files are opened lazily while the declarations are drained, so
/// a missing or invalid sub-file is reported as an `Err` item at that point.
/// Reference cycles are not detected and must be avoided by the caller.
pub fn load_deep<P: AsRef<Path>>(path: P, opts: &LoadOptions) -> Result<Trace> {
    let path = path.as_ref();
    let TraceFile {
        sub_filenames,
        declarations,
    } = read_trace_file(path, opts)?;

    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let opts = opts.clone();
    let referenced = sub_filenames.into_iter().map(move |name| {
        let sub_path = dir.join(name);
        let opts = opts.clone();
        Producer::deferred(move || {
            trace!(path = %sub_path.display(), "descending into referenced trace");
            load_deep(&sub_path, &opts).map(|t| t.declarations)
        })
    });

    let declarations =
        Producer::concat(std::iter::once(Producer::from_vec(declarations)).chain(referenced));
    Ok(Trace::new(Producer::empty(), declarations))
}

/// Read and validate a single file into a [`TraceFile`] (no flattening).
pub fn read_trace_file(path: &Path, opts: &LoadOptions) -> Result<TraceFile> {
    let format = Format::from_path(path)?;
    let file = File::open(path).map_err(|e| TraceError::from_io(path, e))?;
    let total = file.metadata().ok().map(|m| m.len());
    debug!(path = %path.display(), %format, bytes = ?total, "loading trace");

    let rdr = BufReader::new(ProgressReader::new(file, path, total, opts.progress.clone()));
    let tf = codec::decode_reader(rdr, format, &opts.codec).map_err(|e| e.in_file(path))?;

    debug!(
        path = %path.display(),
        declarations = tf.declarations.len(),
        sub_filenames = tf.sub_filenames.len(),
        "loaded trace"
    );
    Ok(tf)
}

/// Auto-detecting strict read with default options.
pub fn read_trace_auto<P: AsRef<Path>>(path: P) -> Result<TraceFile> {
    read_trace_file(path.as_ref(), &LoadOptions::default())
}

/* ---------------- Save ---------------- */

/// Write `trace` to `path` in the format implied by its suffix.
///
/// Consumes the trace. On failure the partially written file is removed.
pub fn save<P: AsRef<Path>>(path: P, trace: Trace, opts: &SaveOptions) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    write_file(path, format, |w| codec::write_trace(w, trace, format, &opts.codec))
}

/// Auto-detecting write of a materialized trace with default options.
pub fn write_trace_auto<P: AsRef<Path>>(path: P, trace: &TraceFile) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    write_file(path, format, |w| {
        codec::write_trace_file(w, trace, format, &CodecOptions::default())
    })
}

fn write_file(
    path: &Path,
    format: Format,
    body: impl FnOnce(&mut BufWriter<File>) -> Result<()>,
) -> Result<()> {
    ensure_parent_dir(path)?;
    let file = File::create(path).map_err(|e| TraceError::from_io(path, e))?;
    debug!(path = %path.display(), %format, "saving trace");

    let mut w = BufWriter::new(file);
    let res = body(&mut w);
    drop(w);

    if let Err(e) = res {
        warn!(path = %path.display(), error = %e, "save failed; removing partial output");
        let _ = fs::remove_file(path);
        return Err(e.in_file(path));
    }
    Ok(())
}

/// Ensure the parent directory for a file exists (no-op if none).
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| TraceError::from_io(dir, e))?;
        }
    }
    Ok(())
}

/* ---------------- Progress ---------------- */

/// Counts raw bytes and reports them every [`PROGRESS_STEP`] bytes and once
/// more when the file is finished (EOF or drop, whichever comes first).
struct ProgressReader<R> {
    inner: R,
    report: Option<(ProgressFn, ReadProgress)>,
    next_report: u64,
}

impl<R> ProgressReader<R> {
    fn new(inner: R, path: &Path, total: Option<u64>, progress: Option<ProgressFn>) -> Self {
        let report = progress.map(|f| {
            let state = ReadProgress {
                path: path.to_path_buf(),
                bytes_read: 0,
                total,
                done: false,
            };
            (f, state)
        });
        Self {
            inner,
            report,
            next_report: PROGRESS_STEP,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if let Some((f, state)) = self.report.as_mut() {
            if state.done {
                return Ok(n);
            }
            state.bytes_read += n as u64;
            if n == 0 {
                state.done = true;
                f(&*state);
            } else if state.bytes_read >= self.next_report {
                f(&*state);
                while self.next_report <= state.bytes_read {
                    self.next_report += PROGRESS_STEP;
                }
            }
        }
        Ok(n)
    }
}

/// Emits the final report if the decoder stopped before end of file.
impl<R> Drop for ProgressReader<R> {
    fn drop(&mut self) {
        if let Some((f, state)) = self.report.as_mut() {
            if !state.done {
                state.done = true;
                f(&*state);
            }
        }
    }
}
