//! Source locations for diagnostics
//!
//! A [`SourceSpan`] covers a `(line, col)` range of one source file together with
//! the literal text of every line it touches, so a diagnostic can be rendered
//! without going back to the file.

use std::fmt;
use std::ops::Add;
use std::sync::Arc;

/// A 1-based line/column position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    /// Line number, starting at 1
    pub line: u32,
    /// Column number in characters, starting at 1
    pub col: u32,
}

impl Position {
    /// Create a new position
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Immutable source range plus the lines it covers
///
/// `end` is inclusive: a single character at column 5 has `start == end == (l, 5)`.
/// `lines` always holds `end.line - start.line + 1` entries; an empty entry marks a
/// line that is irrelevant to the span (for example the gap between two merged spans).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpan {
    file: Arc<str>,
    start: Position,
    end: Position,
    lines: Vec<Arc<str>>,
}

impl SourceSpan {
    /// Create a span on a single line
    pub fn single_line(file: Arc<str>, line: u32, start_col: u32, end_col: u32, text: Arc<str>) -> Self {
        Self {
            file,
            start: Position::new(line, start_col),
            end: Position::new(line, end_col.max(start_col)),
            lines: vec![text],
        }
    }

    /// Create a span from explicit bounds and covered lines
    ///
    /// Returns `None` when `lines` does not match the number of lines covered or
    /// when `end` precedes `start`.
    pub fn new(file: Arc<str>, start: Position, end: Position, lines: Vec<Arc<str>>) -> Option<Self> {
        if end < start || lines.len() != (end.line - start.line + 1) as usize {
            return None;
        }
        Some(Self { file, start, end, lines })
    }

    /// Name of the file the span points into
    pub fn file(&self) -> &str {
        &self.file
    }

    /// First covered position
    pub const fn start(&self) -> Position {
        self.start
    }

    /// Last covered position (inclusive)
    pub const fn end(&self) -> Position {
        self.end
    }

    /// Covered source lines, one per line in `start.line..=end.line`
    pub fn lines(&self) -> &[Arc<str>] {
        &self.lines
    }

    /// Iterate `(line number, text)` for every covered line
    pub fn numbered_lines(&self) -> impl Iterator<Item = (u32, &str)> {
        self.lines
            .iter()
            .enumerate()
            .map(move |(offset, text)| (self.start.line + offset as u32, text.as_ref()))
    }

    /// Whether the span starts and ends on the same line
    pub const fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    /// Merge two spans into one covering both
    ///
    /// `self` is expected to start before `other`; if it doesn't the operands are
    /// swapped. Lines of `self` that overlap `other` are replaced by `other`'s copy,
    /// and a gap between the two is filled with empty (irrelevant) lines.
    pub fn merge(&self, other: &Self) -> Self {
        let (first, second) = if other.start < self.start {
            (other, self)
        } else {
            (self, other)
        };

        let mut lines: Vec<Arc<str>> = Vec::with_capacity(first.lines.len() + second.lines.len());
        if second.start.line <= first.end.line {
            let keep = (second.start.line - first.start.line) as usize;
            lines.extend(first.lines.iter().take(keep).cloned());
        } else {
            lines.extend(first.lines.iter().cloned());
            let gap = second.start.line - first.end.line - 1;
            lines.extend((0..gap).map(|_| Arc::<str>::from("")));
        }

        let end = first.end.max(second.end);
        if end == second.end {
            lines.extend(second.lines.iter().cloned());
        } else {
            // `second` sits entirely inside `first`
            lines = first.lines.clone();
        }

        Self {
            file: Arc::clone(&first.file),
            start: first.start,
            end,
            lines,
        }
    }
}

impl Add for &SourceSpan {
    type Output = SourceSpan;

    fn add(self, rhs: Self) -> SourceSpan {
        self.merge(rhs)
    }
}

impl Add for SourceSpan {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.merge(&rhs)
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.start)
    }
}
