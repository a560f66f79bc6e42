//! Line reader shared by the OBJ and MTL parsers.
//!
//! Lines are read into one reused buffer. For each line the reader records the
//! offsets of every separator plus a sentinel offset equal to the line length,
//! so fields are sliced straight out of the buffer without allocating.

use std::io::BufRead;

use crate::error::{ObjError, ObjResult};

/// Forward-only reader over the non-blank lines of a text source.
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
    spaces: Vec<usize>,
    line_no: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(128),
            spaces: Vec::with_capacity(8),
            line_no: 0,
        }
    }

    /// Advance to the next non-blank line. Returns `Ok(None)` at end of input.
    pub fn next_line(&mut self) -> ObjResult<Option<Line<'_>>> {
        loop {
            self.buf.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut self.buf)
                .map_err(|source| ObjError::Read {
                    line: self.line_no + 1,
                    source,
                })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            for b in self.buf.iter_mut() {
                if *b == b'\t' {
                    *b = b' ';
                }
            }
            while matches!(self.buf.last(), Some(b'\n' | b'\r' | b' ')) {
                self.buf.pop();
            }
            let start = self
                .buf
                .iter()
                .position(|&b| b != b' ')
                .unwrap_or(self.buf.len());
            if start == self.buf.len() {
                continue;
            }

            let bytes = &self.buf[start..];
            self.spaces.clear();
            self.spaces.extend(
                bytes
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| **b == b' ')
                    .map(|(i, _)| i),
            );
            // end-of-line sentinel
            self.spaces.push(bytes.len());

            return Ok(Some(Line {
                number: self.line_no,
                bytes,
                spaces: &self.spaces,
            }));
        }
    }
}

/// One non-blank line, trimmed, with its separator offsets.
#[derive(Clone, Copy, Debug)]
pub struct Line<'a> {
    pub number: usize,
    bytes: &'a [u8],
    spaces: &'a [usize],
}

impl<'a> Line<'a> {
    /// Two-byte directive key. A one-byte line is keyed as if followed by a space.
    pub fn key(&self) -> [u8; 2] {
        [self.bytes[0], self.bytes.get(1).copied().unwrap_or(b' ')]
    }

    /// The leading token, up to the first separator.
    pub fn directive(&self) -> &'a [u8] {
        &self.bytes[..self.spaces[0]]
    }

    /// Everything after the directive and its separator, verbatim.
    pub fn rest(&self) -> &'a [u8] {
        let first = self.spaces[0];
        if first >= self.bytes.len() {
            return &[];
        }
        let rest = &self.bytes[first + 1..];
        let skip = rest.iter().take_while(|&&b| b == b' ').count();
        &rest[skip..]
    }

    /// Non-empty fields following the directive.
    pub fn fields(&self) -> impl Iterator<Item = &'a [u8]> + 'a {
        let (bytes, spaces) = (self.bytes, self.spaces);
        spaces
            .windows(2)
            .map(move |w| &bytes[w[0] + 1..w[1]])
            .filter(|field| !field.is_empty())
    }
}
