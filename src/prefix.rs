//! Line-prefixing writer, used to tag subprocess output with the name of
//! the target that produced it.

use std::io::{self, Write};

/// Wraps a writer, prepending a fixed prefix to every complete line.
///
/// A partial line (no trailing newline yet) stays buffered until its
/// newline arrives; it is never emitted without one, not even on drop.
pub struct PrefixWriter<W: Write> {
    prefix: Vec<u8>,
    w: W,

    /// Holds the current line, which doesn't have a newline yet.
    buf: Vec<u8>,
}

impl<W: Write> PrefixWriter<W> {
    pub fn new(w: W, prefix: &[u8]) -> PrefixWriter<W> {
        PrefixWriter {
            prefix: prefix.to_vec(),
            w,
            buf: Vec::new(),
        }
    }
}

impl<W: Write> Write for PrefixWriter<W> {
    fn write(&mut self, b: &[u8]) -> io::Result<usize> {
        let mut rest = b;
        while let Some(i) = rest.iter().position(|&c| c == b'\n') {
            self.buf.extend_from_slice(&rest[..=i]);
            rest = &rest[i + 1..];
            // Emit prefix and line as one write so concurrent writers
            // sharing a sink can't interleave inside a line.
            let mut line = Vec::with_capacity(self.prefix.len() + self.buf.len());
            line.extend_from_slice(&self.prefix);
            line.extend_from_slice(&self.buf);
            self.buf.clear();
            self.w.write_all(&line)?;
        }
        self.buf.extend_from_slice(rest);
        Ok(b.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // The partial line stays buffered; only flush the sink.
        self.w.flush()
    }
}
