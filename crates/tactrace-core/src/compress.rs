//! zstd adapter: the only place that touches the compression crate.

use std::io::{self, BufReader, Read, Write};

/// Compression level used when none is configured.
pub const DEFAULT_LEVEL: i32 = 3;

/// Streaming decompressor over `reader`.
pub fn decoder<'a, R: Read>(reader: R) -> io::Result<zstd::stream::read::Decoder<'a, BufReader<R>>> {
    zstd::stream::read::Decoder::new(reader)
}

/// Streaming compressor into `writer`. Call `finish` to write the frame end.
pub fn encoder<'a, W: Write>(writer: W, level: i32) -> io::Result<zstd::stream::write::Encoder<'a, W>> {
    zstd::stream::write::Encoder::new(writer, level)
}
