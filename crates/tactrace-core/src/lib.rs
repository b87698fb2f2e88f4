//! tactrace-core: typed traces of interactive proof sessions.
//!
//! A trace records declarations, the proof steps of interactive ones, the
//! execution tree of every tactic, and the goals before and after. This crate
//! provides:
//!
//! - `schema`: the recursive trace types (closed enums, `type`-tagged);
//! - `validate`: strict decoding with located [`ValidationError`]s;
//! - `codec`: JSON/CBOR encodings, optionally zstd-compressed;
//! - `format`: filename-suffix format detection;
//! - `producer` / `trace`: single-pass lazy sequences and the strict/lazy
//!   trace envelopes;
//! - `io`: `load`, `load_deep` (lazy flattening of file references) and `save`.
//!
//! ```no_run
//! use tactrace_core::{load, save, LoadOptions, SaveOptions};
//! // Flatten a trace and all files it references into one compressed file.
//! let trace = load("trace.json", &LoadOptions::deep())?;
//! save("flat.pickle.zst", trace, &SaveOptions::default())?;
//! # Ok::<(), tactrace_core::TraceError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Text/binary encode and decode.
pub mod codec;
/// zstd adapter.
pub mod compress;
/// Reference extraction for dataset generation.
pub mod dataset;
/// Error taxonomy.
pub mod error;
/// Filename-suffix format detection.
pub mod format;
/// Load, deep load, and save.
pub mod io;
/// Single-pass lazy sequences.
pub mod producer;
/// Trace schema types.
pub mod schema;
/// Stack growth for recursion over nested events.
pub mod stack;
/// Strict and lazy trace envelopes.
pub mod trace;
/// Strict decoding from a value tree.
pub mod validate;

pub use codec::CodecOptions;
pub use error::{ErrorKind, Result, TraceError, ValidationError};
pub use format::{Encoding, Format};
pub use io::{load, load_deep, save, LoadOptions, SaveOptions};
pub use producer::Producer;
pub use schema::*;
pub use trace::{join_traces, Trace, TraceFile};
