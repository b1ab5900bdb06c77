use serde::{Deserialize, Serialize};
use std::fmt;

/// A region of program text. Lines and columns count from 1; a zero line
/// marks a position with no source (prelude internals, interruptions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "line")]
    pub start_line: u32,
    #[serde(rename = "column")]
    pub start_col: u32,
    pub end_line: u32,
    #[serde(rename = "end_column")]
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Zero-width span at one position.
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, line, col)
    }

    /// Span of a node that has no place in any source text.
    pub fn synthetic() -> Self {
        Self::point(0, 0)
    }

    pub fn is_synthetic(&self) -> bool {
        self.start_line == 0
    }

    /// Smallest span covering both.
    pub fn merge(self, other: Span) -> Span {
        let start = self.start().min(other.start());
        let end = self.end().max(other.end());
        Span::new(start.0, start.1, end.0, end.1)
    }

    fn start(&self) -> (u32, u32) {
        (self.start_line, self.start_col)
    }

    fn end(&self) -> (u32, u32) {
        (self.end_line, self.end_col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// A named program text, kept so diagnostics can quote the offending line.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Byte offset of the first character of each line.
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Text of the 1-based line `number`, without its terminator.
    pub fn line(&self, number: u32) -> Option<&str> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        let start = *self.line_starts.get(index)?;
        let end = self
            .line_starts
            .get(index + 1)
            .map_or(self.source.len(), |next| next - 1);
        let text = &self.source[start..end];
        Some(text.strip_suffix('\r').unwrap_or(text))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_is_zero_width() {
        let s = Span::point(4, 9);
        assert_eq!((s.start_line, s.start_col), (4, 9));
        assert_eq!((s.end_line, s.end_col), (4, 9));
    }

    #[test]
    fn merge_across_lines() {
        let a = Span::new(1, 5, 1, 10);
        let b = Span::new(2, 3, 2, 8);
        assert_eq!(a.merge(b), Span::new(1, 5, 2, 8));
        assert_eq!(b.merge(a), Span::new(1, 5, 2, 8));
    }

    #[test]
    fn merge_on_one_line_takes_outer_columns() {
        let a = Span::new(1, 5, 1, 10);
        let b = Span::new(1, 3, 1, 8);
        assert_eq!(a.merge(b), Span::new(1, 3, 1, 10));
    }

    #[test]
    fn display_is_line_colon_column() {
        assert_eq!(Span::new(3, 7, 3, 15).to_string(), "3:7");
    }

    #[test]
    fn json_uses_line_and_column() {
        let json = serde_json::to_string(&Span::new(2, 4, 2, 9)).unwrap();
        assert_eq!(json, r#"{"line":2,"column":4,"end_line":2,"end_column":9}"#);
    }

    #[test]
    fn source_lines_are_one_based() {
        let src = SourceFile::new("main.amb", "let x = 1;\nx + 1;\namb(x, 2);");
        assert_eq!(src.line(1), Some("let x = 1;"));
        assert_eq!(src.line(3), Some("amb(x, 2);"));
        assert_eq!(src.line(0), None);
        assert_eq!(src.line(4), None);
        assert_eq!(src.line_count(), 3);
    }

    #[test]
    fn crlf_is_stripped() {
        let src = SourceFile::new("main.amb", "1;\r\n2;\r\n");
        assert_eq!(src.line(1), Some("1;"));
        assert_eq!(src.line(2), Some("2;"));
    }

    #[test]
    fn empty_source_has_one_empty_line() {
        let src = SourceFile::new("main.amb", "");
        assert_eq!(src.line_count(), 1);
        assert_eq!(src.line(1), Some(""));
    }
}
