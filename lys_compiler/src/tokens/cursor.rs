//! Token cursor with nested revert points
//!
//! The parser reads tokens one at a time through a [`TokenCursor`]. Speculative
//! parses open a checkpoint, and every token read while at least one checkpoint
//! is open is remembered. Reverting hands the remembered tokens back to the
//! underlying [`TokenSource`] so they are read again in the same order, without
//! touching the character source a second time.

use super::token::{Token, TokenKind};

/// Anything that yields tokens one by one and accepts tokens back
pub trait TokenSource {
    type Error;

    fn read(&mut self) -> Result<Token, Self::Error>;

    /// Return a token so that the next `read` yields it again
    fn push_back(&mut self, token: Token);
}

pub struct TokenCursor<S: TokenSource> {
    source: S,
    current: Token,
    history: Vec<Token>,
    marks: Vec<usize>,
}

impl<S: TokenSource> TokenCursor<S> {
    /// The cursor starts before the first token; call [`advance`](Self::advance) first.
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: Token::new(TokenKind::EndOfDocument, 0),
            history: Vec::new(),
            marks: Vec::new(),
        }
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn position(&self) -> usize {
        self.current.position
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    pub fn is_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current.kind)
    }

    pub fn is_word(&self, word: &str) -> bool {
        self.current.is_word(word)
    }

    /// Read the next token. Returns `false` once the end of the document is current.
    pub fn advance(&mut self) -> Result<bool, S::Error> {
        self.current = self.source.read()?;
        if !self.marks.is_empty() {
            self.history.push(self.current.clone());
        }
        Ok(self.current.kind != TokenKind::EndOfDocument)
    }

    /// Open a revert point at the current token
    pub fn checkpoint(&mut self) {
        if self.marks.is_empty() {
            self.history.clear();
            self.history.push(self.current.clone());
            self.marks.push(0);
        } else {
            // The current token was recorded when it was read
            self.marks.push(self.history.len().saturating_sub(1));
        }
    }

    /// Undo every read since the innermost checkpoint and close it
    pub fn revert(&mut self) -> Result<(), S::Error> {
        let Some(mark) = self.marks.pop() else {
            debug_assert!(false, "revert without checkpoint");
            return Ok(());
        };
        let replay: Vec<Token> = self.history.drain(mark..).collect();
        for token in replay.into_iter().rev() {
            self.source.push_back(token);
        }
        self.advance()?;
        Ok(())
    }

    /// Keep every read since the innermost checkpoint and close it
    pub fn commit(&mut self) {
        debug_assert!(!self.marks.is_empty(), "commit without checkpoint");
        self.marks.pop();
        if self.marks.is_empty() {
            self.history.clear();
        }
    }

    pub fn has_checkpoint(&self) -> bool {
        !self.marks.is_empty()
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Yields names "t0", "t1", ... then end of document
    struct Counter {
        next: usize,
        limit: usize,
        pushed: Vec<Token>,
        reads: usize,
    }

    impl Counter {
        fn new(limit: usize) -> Self {
            Self {
                next: 0,
                limit,
                pushed: Vec::new(),
                reads: 0,
            }
        }
    }

    impl TokenSource for Counter {
        type Error = ();

        fn read(&mut self) -> Result<Token, ()> {
            if let Some(token) = self.pushed.pop() {
                return Ok(token);
            }
            self.reads += 1;
            if self.next >= self.limit {
                return Ok(Token::new(TokenKind::EndOfDocument, self.next));
            }
            let token = Token::name(format!("t{}", self.next), false, self.next);
            self.next += 1;
            Ok(token)
        }

        fn push_back(&mut self, token: Token) {
            self.pushed.push(token);
        }
    }

    fn text<S: TokenSource>(cursor: &TokenCursor<S>) -> String {
        cursor.current().to_string()
    }

    #[test]
    fn test_revert_replays_tokens() {
        let mut cursor = TokenCursor::new(Counter::new(5));
        cursor.advance().unwrap();
        cursor.checkpoint();
        cursor.advance().unwrap();
        cursor.advance().unwrap();
        assert_eq!(text(&cursor), "t2");

        cursor.revert().unwrap();
        assert_eq!(text(&cursor), "t0");
        cursor.advance().unwrap();
        assert_eq!(text(&cursor), "t1");
        cursor.advance().unwrap();
        assert_eq!(text(&cursor), "t2");
        assert_eq!(cursor.into_source().reads, 3);
    }

    #[test]
    fn test_commit_keeps_position() {
        let mut cursor = TokenCursor::new(Counter::new(5));
        cursor.advance().unwrap();
        cursor.checkpoint();
        cursor.advance().unwrap();
        cursor.commit();
        assert!(!cursor.has_checkpoint());
        cursor.advance().unwrap();
        assert_eq!(text(&cursor), "t2");
    }

    #[test]
    fn test_nested_checkpoints() {
        let mut cursor = TokenCursor::new(Counter::new(6));
        cursor.advance().unwrap();
        cursor.checkpoint();
        cursor.advance().unwrap();
        cursor.checkpoint();
        cursor.advance().unwrap();
        cursor.advance().unwrap();
        assert_eq!(text(&cursor), "t3");

        cursor.revert().unwrap();
        assert_eq!(text(&cursor), "t1");
        cursor.advance().unwrap();
        assert_eq!(text(&cursor), "t2");

        cursor.revert().unwrap();
        assert_eq!(text(&cursor), "t0");
        for expected in ["t1", "t2", "t3", "t4"] {
            cursor.advance().unwrap();
            assert_eq!(text(&cursor), expected);
        }
    }

    #[test]
    fn test_advance_reports_end() {
        let mut cursor = TokenCursor::new(Counter::new(1));
        assert!(cursor.advance().unwrap());
        assert!(!cursor.advance().unwrap());
        assert!(cursor.is(TokenKind::EndOfDocument));
    }
}
