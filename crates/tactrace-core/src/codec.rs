//! Encode/decode traces to and from bytes in one [`Format`].
//!
//! - **Text**: JSON via `serde_json`, 2-space indentation, trailing newline.
//! - **Binary**: CBOR via `ciborium`. Self-describing; carries the same keys and
//!   `type` discriminators as the text form.
//! - **Compressed**: either of the above through the zstd adapter.
//!
//! Decoding parses into a generic value tree and then runs the strict
//! validator, so both encodings accept exactly the same documents.
//!
//! Event trees can nest hundreds of thousands of levels. The parsers' own
//! nesting limits are lifted and every nesting level of parse, validation and
//! serialization grows the stack on demand (see [`crate::stack`]). The parsed
//! value tree is released with an explicit worklist.

use std::cell::RefCell;
use std::fmt;
use std::io::{Read, Write};

use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Error as _, SerializeSeq, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Number, Value};

use crate::compress;
use crate::error::{Result, TraceError};
use crate::format::{Encoding, Format};
use crate::producer::Producer;
use crate::schema::Declaration;
use crate::stack;
use crate::trace::{Trace, TraceFile};
use crate::validate;

/// Default stack reserved up front for one encode/decode call (lazily
/// committed). Deeper input grows past it in [`stack::SEGMENT`] steps.
pub const DEFAULT_STACK_SIZE: usize = 256 << 20;

/// Per-call codec tuning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodecOptions {
    /// Stack bytes reserved up front for one encode/decode; `0` starts on the
    /// caller's stack. Not a depth limit.
    pub stack_size: usize,
    /// zstd level for compressed output.
    pub zstd_level: i32,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            zstd_level: compress::DEFAULT_LEVEL,
        }
    }
}

fn with_stack<T>(opts: &CodecOptions, f: impl FnOnce() -> T) -> T {
    if opts.stack_size == 0 {
        f()
    } else {
        stacker::grow(opts.stack_size, f)
    }
}

fn decode_err(format: Format, e: impl std::fmt::Display) -> TraceError {
    TraceError::Decode {
        format,
        message: e.to_string(),
    }
}

fn encode_err(format: Format, e: impl std::fmt::Display) -> TraceError {
    TraceError::Encode {
        format,
        message: e.to_string(),
    }
}

/* ---------------- Decode ---------------- */

/// Decode and validate an in-memory buffer.
pub fn decode(bytes: &[u8], format: Format, opts: &CodecOptions) -> Result<TraceFile> {
    decode_reader(bytes, format, opts)
}

/// Decode and validate from a reader. Wrap unbuffered readers in a
/// `BufReader`; the JSON parser reads in small pieces.
pub fn decode_reader<R: Read>(reader: R, format: Format, opts: &CodecOptions) -> Result<TraceFile> {
    with_stack(opts, || {
        let value = if format.compressed {
            let rdr = compress::decoder(reader).map_err(|e| decode_err(format, e))?;
            parse_value(rdr, format)?
        } else {
            parse_value(reader, format)?
        };
        let res = validate::trace_file(&value);
        release(value);
        Ok(res?)
    })
}

fn parse_value<R: Read>(mut reader: R, format: Format) -> Result<Value> {
    match format.encoding {
        Encoding::Text => {
            let mut de = serde_json::Deserializer::from_reader(reader);
            de.disable_recursion_limit();
            let Growing(value) = Growing::deserialize(&mut de).map_err(|e| decode_err(format, e))?;
            if let Err(e) = de.end() {
                release(value);
                return Err(decode_err(format, e));
            }
            Ok(value)
        }
        Encoding::Binary => {
            let Growing(value) =
                ciborium::de::from_reader_with_recursion_limit(&mut reader, usize::MAX)
                    .map_err(|e| decode_err(format, format_args!("{e:?}")))?;
            let mut next_byte = [0u8; 1];
            let trailing = match reader.read(&mut next_byte) {
                Ok(n) => n,
                Err(e) => {
                    release(value);
                    return Err(decode_err(format, e));
                }
            };
            if trailing != 0 {
                release(value);
                return Err(decode_err(format, "trailing bytes after top-level value"));
            }
            Ok(value)
        }
    }
}

/* ---------------- Deep value trees ---------------- */

/// A [`Value`] whose every nesting level is parsed through [`stack::guarded`].
///
/// Works with any self-describing deserializer, so JSON and CBOR share it.
struct Growing(Value);

impl<'de> Deserialize<'de> for Growing {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        stack::guarded(|| d.deserialize_any(GrowingVisitor))
    }
}

struct GrowingVisitor;

impl<'de> Visitor<'de> for GrowingVisitor {
    type Value = Growing;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON-compatible value")
    }

    fn visit_unit<E>(self) -> std::result::Result<Growing, E> {
        Ok(Growing(Value::Null))
    }

    fn visit_none<E>(self) -> std::result::Result<Growing, E> {
        Ok(Growing(Value::Null))
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> std::result::Result<Growing, D::Error> {
        Growing::deserialize(d)
    }

    fn visit_bool<E>(self, b: bool) -> std::result::Result<Growing, E> {
        Ok(Growing(Value::Bool(b)))
    }

    fn visit_i64<E>(self, n: i64) -> std::result::Result<Growing, E> {
        Ok(Growing(Value::Number(n.into())))
    }

    fn visit_u64<E>(self, n: u64) -> std::result::Result<Growing, E> {
        Ok(Growing(Value::Number(n.into())))
    }

    fn visit_f64<E>(self, n: f64) -> std::result::Result<Growing, E> {
        Ok(Growing(Number::from_f64(n).map_or(Value::Null, Value::Number)))
    }

    fn visit_str<E>(self, s: &str) -> std::result::Result<Growing, E> {
        Ok(Growing(Value::String(s.to_owned())))
    }

    fn visit_string<E>(self, s: String) -> std::result::Result<Growing, E> {
        Ok(Growing(Value::String(s)))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Growing, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1024));
        loop {
            match seq.next_element::<Growing>() {
                Ok(Some(Growing(v))) => items.push(v),
                Ok(None) => return Ok(Growing(Value::Array(items))),
                Err(e) => {
                    release(Value::Array(items));
                    return Err(e);
                }
            }
        }
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Growing, A::Error> {
        let mut map = Map::new();
        loop {
            let entry = match access.next_key::<String>() {
                Ok(Some(k)) => access.next_value::<Growing>().map(|Growing(v)| Some((k, v))),
                Ok(None) => Ok(None),
                Err(e) => Err(e),
            };
            match entry {
                Ok(Some((k, v))) => {
                    if let Some(old) = map.insert(k, v) {
                        release(old);
                    }
                }
                Ok(None) => return Ok(Growing(Value::Object(map))),
                Err(e) => {
                    release(Value::Object(map));
                    return Err(e);
                }
            }
        }
    }
}

/// Drop a value tree of any depth without recursing.
fn release(value: Value) {
    let mut pending = vec![value];
    while let Some(v) = pending.pop() {
        match v {
            Value::Array(items) => pending.extend(items),
            Value::Object(map) => pending.extend(map.into_iter().map(|(_, v)| v)),
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {}
        }
    }
}

/// Parse and validate a JSON document held in memory.
pub fn parse_trace(s: &str) -> Result<TraceFile> {
    decode(s.as_bytes(), Format::TEXT, &CodecOptions::default())
}

/* ---------------- Encode ---------------- */

/// Encode a materialized trace to bytes.
pub fn encode(trace: &TraceFile, format: Format, opts: &CodecOptions) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_trace_file(&mut buf, trace, format, opts)?;
    Ok(buf)
}

/// Canonical JSON of `trace` without the trailing newline.
pub fn stringify_trace(trace: &TraceFile) -> Result<String> {
    let mut bytes = encode(trace, Format::TEXT, &CodecOptions::default())?;
    bytes.pop();
    String::from_utf8(bytes).map_err(|e| encode_err(Format::TEXT, e))
}

/// Encode a materialized trace into `writer`.
pub fn write_trace_file<W: Write>(
    writer: W,
    trace: &TraceFile,
    format: Format,
    opts: &CodecOptions,
) -> Result<()> {
    with_stack(opts, || write_value(writer, trace, format, opts))
}

/// Encode a lazy trace into `writer`, consuming it.
///
/// Binary output needs the complete object graph, so the trace is forced
/// first. Text output drains both producers while writing; the bytes are the
/// same as encoding the forced trace. If a producer fails midway, its error is
/// returned and `writer` holds a truncated document.
pub fn write_trace<W: Write>(writer: W, trace: Trace, format: Format, opts: &CodecOptions) -> Result<()> {
    match format.encoding {
        Encoding::Binary => {
            let eager = trace.force()?;
            write_trace_file(writer, &eager, format, opts)
        }
        Encoding::Text => {
            let streamed = Streamed::new(trace);
            let res = with_stack(opts, || write_value(writer, &streamed, format, opts));
            match streamed.failure.into_inner() {
                Some(e) => Err(e),
                None => res,
            }
        }
    }
}

fn write_value<W: Write, T: Serialize>(
    mut writer: W,
    value: &T,
    format: Format,
    opts: &CodecOptions,
) -> Result<()> {
    if format.compressed {
        let mut enc =
            compress::encoder(&mut writer, opts.zstd_level).map_err(|e| encode_err(format, e))?;
        serialize_into(&mut enc, value, format)?;
        enc.finish().map_err(|e| encode_err(format, e))?;
    } else {
        serialize_into(&mut writer, value, format)?;
    }
    writer.flush().map_err(|e| encode_err(format, e))
}

fn serialize_into<W: Write, T: Serialize>(mut w: W, value: &T, format: Format) -> Result<()> {
    match format.encoding {
        Encoding::Text => {
            serde_json::to_writer_pretty(&mut w, value).map_err(|e| encode_err(format, e))?;
            w.write_all(b"\n").map_err(|e| encode_err(format, e))
        }
        Encoding::Binary => ciborium::ser::into_writer(value, &mut w)
            .map_err(|e| encode_err(format, format_args!("{e:?}"))),
    }
}

/* ---------------- Streaming text writer ---------------- */

/// Serializes like [`TraceFile`] but pulls items from producers.
///
/// The first producer error is parked in `failure` so the caller gets the
/// typed error back instead of the serializer's string.
struct Streamed {
    sub_filenames: RefCell<Option<Producer<String>>>,
    declarations: RefCell<Option<Producer<Declaration>>>,
    failure: RefCell<Option<TraceError>>,
}

impl Streamed {
    fn new(trace: Trace) -> Self {
        Self {
            sub_filenames: RefCell::new(Some(trace.sub_filenames)),
            declarations: RefCell::new(Some(trace.declarations)),
            failure: RefCell::new(None),
        }
    }
}

impl Serialize for Streamed {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut st = serializer.serialize_struct("TraceFile", 2)?;
        st.serialize_field(
            "sub_filenames",
            &Drain {
                items: &self.sub_filenames,
                failure: &self.failure,
            },
        )?;
        st.serialize_field(
            "declarations",
            &Drain {
                items: &self.declarations,
                failure: &self.failure,
            },
        )?;
        st.end()
    }
}

struct Drain<'a, T> {
    items: &'a RefCell<Option<Producer<T>>>,
    failure: &'a RefCell<Option<TraceError>>,
}

impl<T: Serialize> Serialize for Drain<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let Some(items) = self.items.borrow_mut().take() else {
            return Err(S::Error::custom("lazy sequence was already drained"));
        };
        let mut seq = serializer.serialize_seq(None)?;
        for item in items {
            match item {
                Ok(x) => seq.serialize_element(&x)?,
                Err(e) => {
                    let msg = e.to_string();
                    *self.failure.borrow_mut() = Some(e);
                    return Err(S::Error::custom(msg));
                }
            }
        }
        seq.end()
    }
}
