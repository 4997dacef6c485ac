//! Character sources feeding the tokenizer
//!
//! A source hands out characters one at a time and takes characters back.
//! The tokenizer never needs more than [`MAX_PUSHBACK_DEPTH`] characters of
//! push-back: the float probe returns both the letter it looked at and the
//! `.` before it.

use super::error::LexerError;
use crate::config::constants::compile_time::lexical::MAX_PUSHBACK_DEPTH;
use std::collections::VecDeque;
use std::io::BufRead;

pub trait CharSource {
    /// Next character, `None` at the end of the input
    fn read(&mut self) -> Result<Option<char>, LexerError>;

    /// Un-read a character; the next `read` returns it
    fn push_back(&mut self, ch: char);

    /// Number of characters consumed so far, i.e. the offset of the next character
    fn offset(&self) -> usize;
}

/// In-memory source over a string
#[derive(Debug, Clone)]
pub struct StringCharSource {
    chars: Vec<char>,
    pointer: usize,
    pushed: usize,
}

impl StringCharSource {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pointer: 0,
            pushed: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl CharSource for StringCharSource {
    fn read(&mut self) -> Result<Option<char>, LexerError> {
        let ch = self.chars.get(self.pointer).copied();
        if ch.is_some() {
            self.pointer += 1;
            self.pushed = self.pushed.saturating_sub(1);
        }
        Ok(ch)
    }

    fn push_back(&mut self, ch: char) {
        debug_assert!(self.pointer > 0, "push back before start of source");
        debug_assert!(self.pushed < MAX_PUSHBACK_DEPTH, "push back too deep");
        if self.pointer == 0 {
            return;
        }
        // The slot is overwritten, so a character other than the one read may be returned
        self.pointer -= 1;
        self.chars[self.pointer] = ch;
        self.pushed += 1;
    }

    fn offset(&self) -> usize {
        self.pointer
    }
}

/// Streaming source over a buffered reader, decoded line by line
pub struct ReaderCharSource<R: BufRead> {
    reader: R,
    buffer: VecDeque<char>,
    pushed: Vec<char>,
    consumed: usize,
    exhausted: bool,
}

impl<R: BufRead> ReaderCharSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: VecDeque::new(),
            pushed: Vec::with_capacity(MAX_PUSHBACK_DEPTH),
            consumed: 0,
            exhausted: false,
        }
    }

    fn fill(&mut self) -> Result<(), LexerError> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .map_err(|e| LexerError::Io {
                message: e.to_string(),
                offset: self.consumed,
            })?;
        if read == 0 {
            self.exhausted = true;
        } else {
            self.buffer.extend(line.chars());
        }
        Ok(())
    }
}

impl<R: BufRead> CharSource for ReaderCharSource<R> {
    fn read(&mut self) -> Result<Option<char>, LexerError> {
        if let Some(ch) = self.pushed.pop() {
            self.consumed += 1;
            return Ok(Some(ch));
        }
        while self.buffer.is_empty() && !self.exhausted {
            self.fill()?;
        }
        let ch = self.buffer.pop_front();
        if ch.is_some() {
            self.consumed += 1;
        }
        Ok(ch)
    }

    fn push_back(&mut self, ch: char) {
        debug_assert!(self.pushed.len() < MAX_PUSHBACK_DEPTH, "push back too deep");
        self.pushed.push(ch);
        self.consumed = self.consumed.saturating_sub(1);
    }

    fn offset(&self) -> usize {
        self.consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn drain<S: CharSource>(source: &mut S) -> String {
        let mut text = String::new();
        while let Some(ch) = source.read().unwrap() {
            text.push(ch);
        }
        text
    }

    #[test]
    fn test_string_source_push_back() {
        let mut source = StringCharSource::new("ab");
        assert_eq!(source.read().unwrap(), Some('a'));
        assert_eq!(source.read().unwrap(), Some('b'));
        assert_eq!(source.offset(), 2);
        source.push_back('b');
        source.push_back('a');
        assert_eq!(source.offset(), 0);
        assert_eq!(drain(&mut source), "ab");
        assert_eq!(source.read().unwrap(), None);
        assert_eq!(source.offset(), 2);
    }

    #[test]
    fn test_reader_source_spans_lines() {
        let mut source = ReaderCharSource::new(Cursor::new("x\ny\n"));
        assert_eq!(source.read().unwrap(), Some('x'));
        assert_eq!(source.read().unwrap(), Some('\n'));
        source.push_back('\n');
        assert_eq!(drain(&mut source), "\ny\n");
        assert_eq!(source.offset(), 4);
    }

    #[test]
    fn test_reader_source_counts_characters() {
        let mut source = ReaderCharSource::new(Cursor::new("é;"));
        source.read().unwrap();
        assert_eq!(source.offset(), 1);
        assert_eq!(source.read().unwrap(), Some(';'));
    }
}
