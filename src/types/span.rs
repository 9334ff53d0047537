//! Defines a [`Span`] which is used to represent a region in the template
//! source code.

use std::cmp::{max, min};
use std::ops::{Index, Range};

use serde::Serialize;

/// A half-open byte range `[m, n)` into the original source.
#[derive(Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub m: usize,
    pub n: usize,
}

impl Span {
    pub fn combine(self, other: Self) -> Self {
        let m = min(self.m, other.m);
        let n = max(self.n, other.n);
        Self { m, n }
    }
}

impl Index<Span> for str {
    type Output = str;

    fn index(&self, span: Span) -> &Self::Output {
        let Span { m, n } = span;
        &self[m..n]
    }
}

impl From<Range<usize>> for Span {
    fn from(r: Range<usize>) -> Self {
        Self {
            m: r.start,
            n: r.end,
        }
    }
}

impl std::fmt::Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&(self.m..self.n), f)
    }
}

/// A precomputed index of line start offsets used to derive `(line, column)`
/// positions from byte offsets.
///
/// Both line and column are 1-based. Columns are counted in characters, not
/// bytes.
#[derive(Debug, Clone)]
pub struct LineIndex<'source> {
    source: &'source str,
    starts: Vec<usize>,
}

impl<'source> LineIndex<'source> {
    /// Build an index over the given source.
    pub fn new(source: &'source str) -> Self {
        let mut starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                starts.push(i + 1);
            }
        }
        Self { source, starts }
    }

    /// Returns the 1-based `(line, column)` of the given byte offset.
    ///
    /// Offsets past the end of the source resolve to one past the final
    /// character.
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = min(offset, self.source.len());
        let line = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = self.source[self.starts[line]..offset].chars().count();
        (line + 1, col + 1)
    }
}
