//! Source location tracking for the Lys compiler
//!
//! Diagnostics carry zero-based *character* offsets into the source text.
//! A [`SourceMap`] translates those offsets back into line/column pairs
//! when a human-readable excerpt is wanted.
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open range of character offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Zero-width span at one offset
    pub fn at(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both
    pub fn merge(self, other: Self) -> Self {
        Self::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}..{}", self.start, self.end)
        }
    }
}

/// A source map that tracks line starts for efficient position lookup
#[derive(Debug, Clone)]
pub struct SourceMap {
    chars: Vec<char>,
    /// Character offsets of line starts
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let chars: Vec<char> = source.chars().collect();
        let mut line_starts = vec![0];
        for (offset, ch) in chars.iter().enumerate() {
            if *ch == '\n' {
                line_starts.push(offset + 1);
            }
        }
        Self { chars, line_starts }
    }

    /// 1-based line and column for a character offset
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.chars.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    /// Text of a line by 1-based number, without its terminator
    pub fn get_line(&self, line_num: usize) -> Option<String> {
        if line_num == 0 || line_num > self.line_starts.len() {
            return None;
        }
        let start = self.line_starts[line_num - 1];
        let end = self
            .line_starts
            .get(line_num)
            .map(|next| next - 1)
            .unwrap_or(self.chars.len());
        Some(
            self.chars[start..end]
                .iter()
                .collect::<String>()
                .trim_end_matches('\r')
                .to_string(),
        )
    }

    /// Format an excerpt of the offending line with a caret under the offset
    pub fn format_excerpt(&self, offset: usize) -> String {
        let (line, column) = self.line_column(offset);
        let mut result = format!("  --> {}:{}\n", line, column);

        if let Some(text) = self.get_line(line) {
            let line_num_str = line.to_string();
            let padding = " ".repeat(line_num_str.len());
            result.push_str(&format!("{} |\n", padding));
            result.push_str(&format!("{} | {}\n", line_num_str, text));
            result.push_str(&format!(
                "{} | {}^\n",
                padding,
                " ".repeat(column.saturating_sub(1))
            ));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_merge_and_display() {
        let merged = Span::new(4, 6).merge(Span::at(2));
        assert_eq!(merged, Span::new(2, 6));
        assert_eq!(merged.to_string(), "2..6");
        assert_eq!(Span::at(9).to_string(), "9");
    }

    #[test]
    fn test_line_column_lookup() {
        let map = SourceMap::new("ab\ncd\n\nx");
        assert_eq!(map.line_column(0), (1, 1));
        assert_eq!(map.line_column(1), (1, 2));
        assert_eq!(map.line_column(3), (2, 1));
        assert_eq!(map.line_column(6), (3, 1));
        assert_eq!(map.line_column(7), (4, 1));
        // End of document sits one past the last character
        assert_eq!(map.line_column(8), (4, 2));
    }

    #[test]
    fn test_offsets_count_characters_not_bytes() {
        let map = SourceMap::new("é\nü");
        assert_eq!(map.line_column(2), (2, 1));
        assert_eq!(map.get_line(2).as_deref(), Some("ü"));
    }

    #[test]
    fn test_format_excerpt_places_caret() {
        let map = SourceMap::new("int x = @;\n");
        let excerpt = map.format_excerpt(8);
        assert!(excerpt.contains("--> 1:9"));
        assert!(excerpt.contains("1 | int x = @;"));
        assert!(excerpt.ends_with("|         ^\n"));
    }
}
