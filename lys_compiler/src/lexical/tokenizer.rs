//! On-demand tokenizer
//!
//! Tokens are produced one at a time from a [`CharSource`]. Multi-character
//! operators are recognized with one character of lookahead, pushing the
//! rejected character back. Tokens returned through
//! [`push_back`](Tokenizer::push_back) are handed out again before any new
//! character is read.

use super::error::LexerError;
use super::source::CharSource;
use crate::config::constants::compile_time::lexical::*;
use crate::config::constants::literals::*;
use crate::tokens::{IntBase, RawFloat, RawInt, Token, TokenKind, TokenSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentMode {
    None,
    Line,
    Block,
}

/// Token statistics of one tokenizer run
#[derive(Debug, Default, Clone)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub name_tokens: usize,
    pub literal_tokens: usize,
    pub operator_tokens: usize,
    pub comment_count: usize,
    pub max_string_length: usize,
    pub replayed_tokens: usize,
}

impl LexicalMetrics {
    pub(crate) fn record_token(&mut self, token: &Token) {
        self.total_tokens += 1;
        if token.kind.is_name() {
            self.name_tokens += 1;
        } else if token.kind.is_literal() {
            self.literal_tokens += 1;
        } else if token.kind != TokenKind::EndOfDocument {
            self.operator_tokens += 1;
        }
    }

    pub(crate) fn record_string_length(&mut self, length: usize) {
        self.max_string_length = self.max_string_length.max(length);
    }
}

pub struct Tokenizer<S: CharSource> {
    source: S,
    pushed: Vec<Token>,
    metrics: LexicalMetrics,
}

impl<S: CharSource> Tokenizer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            pushed: Vec::new(),
            metrics: LexicalMetrics::default(),
        }
    }

    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    /// Next token, either a pushed-back one or a freshly read one
    pub fn read(&mut self) -> Result<Token, LexerError> {
        if let Some(token) = self.pushed.pop() {
            self.metrics.replayed_tokens += 1;
            return Ok(token);
        }

        if self.metrics.total_tokens >= MAX_TOKEN_COUNT {
            return Err(LexerError::TooManyTokens {
                count: self.metrics.total_tokens,
                offset: self.source.offset(),
            });
        }

        let token = self.read_new()?;
        self.metrics.record_token(&token);
        Ok(token)
    }

    pub fn push_back(&mut self, token: Token) {
        self.pushed.push(token);
    }

    fn next_char(&mut self) -> Result<Option<char>, LexerError> {
        let ch = self.source.read()?;
        if self.source.offset() > MAX_SOURCE_SIZE {
            return Err(LexerError::SourceTooLarge {
                offset: self.last_position(),
            });
        }
        Ok(ch)
    }

    fn unread(&mut self, ch: Option<char>) {
        if let Some(ch) = ch {
            self.source.push_back(ch);
        }
    }

    /// Offset of the most recently read character
    fn last_position(&self) -> usize {
        self.source.offset().saturating_sub(1)
    }

    /// Single-character token, or a longer one when the next character completes it
    fn with_follow(
        &mut self,
        position: usize,
        single: TokenKind,
        follow: &[(char, TokenKind)],
    ) -> Result<Token, LexerError> {
        let next = self.next_char()?;
        if let Some(ch) = next {
            if let Some((_, kind)) = follow.iter().find(|(c, _)| *c == ch) {
                return Ok(Token::new(*kind, position));
            }
        }
        self.unread(next);
        Ok(Token::new(single, position))
    }

    fn read_new(&mut self) -> Result<Token, LexerError> {
        let mut comment = CommentMode::None;

        while let Some(ch) = self.next_char()? {
            match comment {
                CommentMode::Line => {
                    if ch == '\n' || ch == '\r' {
                        comment = CommentMode::None;
                    }
                    continue;
                }
                CommentMode::Block => {
                    if ch == '*' {
                        let next = self.next_char()?;
                        if next == Some('/') {
                            comment = CommentMode::None;
                        } else {
                            self.unread(next);
                        }
                    }
                    continue;
                }
                CommentMode::None => {}
            }

            if ch.is_whitespace() {
                continue;
            }

            let position = self.last_position();
            use TokenKind::*;
            let token = match ch {
                '+' => self.with_follow(position, Plus, &[('+', Increment), ('=', AssignPlus)])?,
                '-' => {
                    self.with_follow(position, Minus, &[('-', Decrement), ('=', AssignMinus)])?
                }
                '*' => self.with_follow(position, Times, &[('=', AssignTimes)])?,
                '%' => self.with_follow(position, Modulo, &[('=', AssignModulo)])?,
                '/' => match self.next_char()? {
                    Some('=') => Token::new(AssignDivide, position),
                    Some('/') => {
                        comment = CommentMode::Line;
                        self.metrics.comment_count += 1;
                        continue;
                    }
                    Some('*') => {
                        comment = CommentMode::Block;
                        self.metrics.comment_count += 1;
                        continue;
                    }
                    other => {
                        self.unread(other);
                        Token::new(Divide, position)
                    }
                },
                '(' => Token::new(BracketLeft, position),
                ')' => Token::new(BracketRight, position),
                '[' => Token::new(SquareBracketLeft, position),
                ']' => Token::new(SquareBracketRight, position),
                '{' => Token::new(CurlyBracketLeft, position),
                '}' => Token::new(CurlyBracketRight, position),
                ';' => Token::new(EndOfInstruction, position),
                ',' => Token::new(Comma, position),
                '.' => {
                    let next = self.next_char()?;
                    self.unread(next);
                    match next {
                        Some(digit) if digit.is_ascii_digit() => {
                            match self.process_float(position, Default::default(), '.')? {
                                Some(token) => token,
                                None => Token::new(Period, position),
                            }
                        }
                        _ => Token::new(Period, position),
                    }
                }
                ':' => self.with_follow(position, Colon, &[(':', DoubleColon)])?,
                '<' => match self.next_char()? {
                    Some('<') => self.with_follow(position, LeftShift, &[('=', AssignLeftShift)])?,
                    Some('=') => Token::new(LessThanEqual, position),
                    other => {
                        self.unread(other);
                        Token::new(LessThan, position)
                    }
                },
                '>' => match self.next_char()? {
                    Some('>') => {
                        self.with_follow(position, RightShift, &[('=', AssignRightShift)])?
                    }
                    Some('=') => Token::new(MoreThanEqual, position),
                    other => {
                        self.unread(other);
                        Token::new(MoreThan, position)
                    }
                },
                '!' => self.with_follow(position, LogicalNot, &[('=', NotEqual)])?,
                '~' => Token::new(BitwiseNot, position),
                '&' => self.with_follow(
                    position,
                    BitwiseAnd,
                    &[('&', LogicalAnd), ('=', AssignBitwiseAnd)],
                )?,
                '|' => self.with_follow(
                    position,
                    BitwiseOr,
                    &[('|', LogicalOr), ('=', AssignBitwiseOr)],
                )?,
                '^' => self.with_follow(position, BitwiseXor, &[('=', AssignBitwiseXor)])?,
                '=' => self.with_follow(position, Assign, &[('=', Equal)])?,
                '\'' => self.process_char_literal(position)?,
                _ => {
                    if let Some(token) = self.process_number(ch)? {
                        token
                    } else if let Some(token) = self.process_name(ch)? {
                        token
                    } else if let Some(token) = self.process_string(ch)? {
                        token
                    } else {
                        return Err(LexerError::UnrecognizedCharacter {
                            character: ch,
                            offset: position,
                        });
                    }
                }
            };
            return Ok(token);
        }

        Ok(Token::new(TokenKind::EndOfDocument, self.source.offset()))
    }

    /// `'x'`, lexed as a decimal integer carrying the character code
    fn process_char_literal(&mut self, position: usize) -> Result<Token, LexerError> {
        let value = match self.next_char()? {
            None => {
                return Err(LexerError::UnexpectedEnd {
                    offset: self.source.offset(),
                })
            }
            Some('\'') => {
                return Err(LexerError::EmptyCharacter {
                    offset: self.last_position(),
                })
            }
            Some('\\') => match self.next_char()? {
                Some('0') => '\0',
                Some('\'') => '\'',
                Some('"') => '"',
                Some('\\') => '\\',
                Some('n') => '\n',
                Some('r') => '\r',
                Some('t') => '\t',
                _ => {
                    return Err(LexerError::InvalidEscape {
                        offset: self.last_position(),
                    })
                }
            },
            Some(ch) => ch,
        };

        if self.next_char()? != Some('\'') {
            return Err(LexerError::TooManyCharacters {
                offset: self.last_position(),
            });
        }

        let code = u32::from(value);
        Ok(Token::int(RawInt::decimal(code.to_string()), position))
    }

    fn process_number(&mut self, first: char) -> Result<Option<Token>, LexerError> {
        if !first.is_ascii_digit() {
            return Ok(None);
        }
        let position = self.last_position();
        let mut digits = String::new();
        digits.push(first);

        loop {
            let next = self.next_char()?;
            match next {
                Some(ch) if ch.is_ascii_digit() => digits.push(ch),
                Some(ch @ ('.' | 'e' | 'E')) => {
                    if let Some(token) = self.process_float(position, digits.clone(), ch)? {
                        return Ok(Some(token));
                    }
                    // `.` starts a property access; the probe restored what followed it
                    self.unread(Some('.'));
                    break;
                }
                Some('x' | 'X') if digits == "0" => {
                    return self.process_radix(position, IntBase::Hexadecimal).map(Some);
                }
                Some('b' | 'B') if digits == "0" => {
                    return self.process_radix(position, IntBase::Binary).map(Some);
                }
                other => {
                    self.unread(other);
                    break;
                }
            }
        }
        self.check_length(digits.len(), MAX_NAME_LENGTH, position)?;

        let unsigned = match self.next_char()? {
            Some('u' | 'U') => true,
            other => {
                self.unread(other);
                false
            }
        };
        let bits = self.read_bit_suffix(false)?;

        let value = RawInt::decimal(digits)
            .with_unsigned(unsigned)
            .with_bits(bits);
        Ok(Some(Token::int(value, position)))
    }

    /// Reads the tail of a float. `first` is the `.` or `E` already consumed.
    /// Returns `None` when a `.` turns out to be a property access; in that case
    /// the character that decided it is pushed back, the `.` is not.
    fn process_float(
        &mut self,
        position: usize,
        integer_part: String,
        first: char,
    ) -> Result<Option<Token>, LexerError> {
        let mut fractional_part = String::new();
        let mut exponent_part = String::new();
        let mut reading_fraction = first == '.';

        if first == '.' {
            // Whitespace between `.` and a name is dropped
            let mut next = self.next_char()?;
            while matches!(next, Some(ch) if ch.is_whitespace()) {
                next = self.next_char()?;
            }
            if matches!(next, Some(ch) if is_name_start(ch)) {
                self.unread(next);
                return Ok(None);
            }
            self.unread(next);
        }

        loop {
            let next = self.next_char()?;
            match next {
                Some(ch) if ch.is_ascii_digit() => {
                    if reading_fraction {
                        fractional_part.push(ch);
                    } else {
                        exponent_part.push(ch);
                    }
                }
                Some('e' | 'E') if reading_fraction => reading_fraction = false,
                Some('-') if !reading_fraction && exponent_part.is_empty() => {
                    exponent_part.push('-');
                }
                other => {
                    self.unread(other);
                    break;
                }
            }
        }

        let bits = self.read_bit_suffix(true)?;

        if integer_part.is_empty() && fractional_part.is_empty() {
            return Err(LexerError::MissingFloatDigits { offset: position });
        }
        if !reading_fraction && matches!(exponent_part.as_str(), "" | "-") {
            return Err(LexerError::MissingExponent { offset: position });
        }
        self.check_length(
            integer_part.len() + fractional_part.len() + exponent_part.len(),
            MAX_NAME_LENGTH,
            position,
        )?;

        Ok(Some(Token::float(
            RawFloat {
                integer_part,
                fractional_part,
                exponent_part,
                bits,
            },
            position,
        )))
    }

    /// Digits after a `0x` / `0b` prefix. Such literals are always unsigned.
    fn process_radix(&mut self, position: usize, base: IntBase) -> Result<Token, LexerError> {
        let mut digits = String::new();
        loop {
            let next = self.next_char()?;
            match (base, next) {
                (IntBase::Hexadecimal, Some(ch)) if ch.is_ascii_hexdigit() => {
                    digits.push(ch.to_ascii_uppercase())
                }
                (IntBase::Binary, Some(ch @ ('0' | '1'))) => digits.push(ch),
                (_, other) => {
                    self.unread(other);
                    break;
                }
            }
        }

        if digits.is_empty() {
            return Err(match base {
                IntBase::Binary => LexerError::MissingBinaryDigits { offset: position },
                _ => LexerError::MissingHexDigits { offset: position },
            });
        }
        self.check_length(digits.len(), MAX_NAME_LENGTH, position)?;

        let bits = self.read_bit_suffix(false)?;
        Ok(Token::int(
            RawInt {
                digits,
                base,
                bits,
                unsigned: true,
            },
            position,
        ))
    }

    /// Optional `@<digits>` suffix, 0 when absent
    fn read_bit_suffix(&mut self, float: bool) -> Result<u32, LexerError> {
        let next = self.next_char()?;
        if next != Some('@') {
            self.unread(next);
            return Ok(0);
        }
        let at_position = self.last_position();

        let mut bits: u64 = 0;
        let mut digit_count = 0;
        loop {
            let next = self.next_char()?;
            match next {
                Some(ch) if ch.is_ascii_digit() => {
                    bits = bits
                        .saturating_mul(10)
                        .saturating_add(u64::from(ch as u8 - b'0'));
                    digit_count += 1;
                }
                other => {
                    self.unread(other);
                    break;
                }
            }
        }

        if digit_count == 0 {
            return Err(LexerError::ExpectedBitLength {
                offset: at_position,
            });
        }

        if float {
            let valid = bits >= u64::from(MIN_FLOAT_BITS)
                && bits <= u64::from(MAX_FLOAT_BITS)
                && bits % u64::from(FLOAT_BITS_STEP) == 0;
            if !valid {
                return Err(LexerError::UnsupportedFloatBits {
                    bits,
                    offset: at_position,
                });
            }
        } else if bits < u64::from(MIN_INT_BITS) || bits > u64::from(MAX_INT_BITS) {
            return Err(LexerError::UnsupportedIntBits {
                bits,
                offset: at_position,
            });
        }

        // Bounded by the checks above
        Ok(bits as u32)
    }

    fn process_name(&mut self, first: char) -> Result<Option<Token>, LexerError> {
        if !is_name_start(first) {
            return Ok(None);
        }
        let position = self.last_position();
        let mut name = String::new();
        name.push(first);

        loop {
            let next = self.next_char()?;
            match next {
                Some(ch) if ch.is_alphanumeric() || ch == '_' => name.push(ch),
                other => {
                    self.unread(other);
                    break;
                }
            }
        }

        self.check_length(name.chars().count(), MAX_NAME_LENGTH, position)?;
        Ok(Some(Token::name(name, first == '$', position)))
    }

    fn process_string(&mut self, first: char) -> Result<Option<Token>, LexerError> {
        if first != '"' {
            return Ok(None);
        }
        let position = self.last_position();
        let mut text = String::new();
        let mut length = 0usize;

        loop {
            let Some(ch) = self.next_char()? else {
                return Err(LexerError::UnexpectedEnd {
                    offset: self.source.offset(),
                });
            };
            let decoded = match ch {
                '"' => break,
                '\\' => match self.next_char()? {
                    Some('n') => '\n',
                    Some('r') => '\r',
                    Some('t') => '\t',
                    Some('\\') => '\\',
                    Some('"') => '"',
                    None => {
                        return Err(LexerError::UnexpectedEnd {
                            offset: self.source.offset(),
                        })
                    }
                    Some(_) => {
                        return Err(LexerError::InvalidEscape {
                            offset: self.last_position(),
                        })
                    }
                },
                other => other,
            };
            text.push(decoded);
            length += 1;
            self.check_length(length, MAX_STRING_LENGTH, position)?;
        }

        self.metrics.record_string_length(length);
        Ok(Some(Token::string(text, position)))
    }

    fn check_length(&self, length: usize, limit: usize, offset: usize) -> Result<(), LexerError> {
        if length > limit {
            return Err(LexerError::LiteralTooLong {
                length,
                limit,
                offset,
            });
        }
        Ok(())
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

impl<S: CharSource> TokenSource for Tokenizer<S> {
    type Error = LexerError;

    fn read(&mut self) -> Result<Token, LexerError> {
        Tokenizer::read(self)
    }

    fn push_back(&mut self, token: Token) {
        Tokenizer::push_back(self, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::source::StringCharSource;
    use assert_matches::assert_matches;

    fn tokenize(source: &str) -> Result<Vec<Token>, LexerError> {
        let mut tokenizer = Tokenizer::new(StringCharSource::new(source));
        let mut tokens = Vec::new();
        loop {
            let token = tokenizer.read()?;
            let done = token.kind == TokenKind::EndOfDocument;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_operators_use_longest_match() {
        use TokenKind::*;
        assert_eq!(
            kinds("a <<= b >> c != !d && e &= f ||"),
            vec![
                Name,
                AssignLeftShift,
                Name,
                RightShift,
                Name,
                NotEqual,
                LogicalNot,
                Name,
                LogicalAnd,
                Name,
                AssignBitwiseAnd,
                Name,
                LogicalOr,
                EndOfDocument
            ]
        );
        assert_eq!(
            kinds("x++ + --y :: : ;"),
            vec![
                Name,
                Increment,
                Plus,
                Decrement,
                Name,
                DoubleColon,
                Colon,
                EndOfInstruction,
                EndOfDocument
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        use TokenKind::*;
        assert_eq!(
            kinds("a // line\n/* block * still */ b / c"),
            vec![Name, Name, Divide, Name, EndOfDocument]
        );
    }

    #[test]
    fn test_positions_are_character_offsets() {
        let tokens = tokenize("int8 x;").unwrap();
        let positions: Vec<usize> = tokens.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![0, 5, 6, 7]);
    }

    #[test]
    fn test_integer_suffixes() {
        let tokens = tokenize("123u@16").unwrap();
        let value = tokens[0].as_int().unwrap();
        assert_eq!(value.digits, "123");
        assert!(value.unsigned);
        assert_eq!(value.bits, 16);
        assert_eq!(value.base, IntBase::Decimal);
    }

    #[test]
    fn test_hex_and_binary_literals_are_unsigned() {
        let tokens = tokenize("0x1f@8 0b101").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::HexInt);
        let hex = tokens[0].as_int().unwrap();
        assert_eq!(hex.digits, "1F");
        assert_eq!(hex.bits, 8);
        assert!(hex.unsigned);

        assert_eq!(tokens[1].kind, TokenKind::BinInt);
        assert_eq!(tokens[1].as_int().unwrap().digits, "101");
    }

    #[test]
    fn test_leading_dot_float() {
        let tokens = tokenize(".5").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].as_float().unwrap().target_text(), "0.5");
    }

    #[test]
    fn test_float_forms() {
        let tokens = tokenize("1.25 3e-2 2.5E3@16").unwrap();
        let floats: Vec<String> = tokens[..3]
            .iter()
            .map(|t| t.as_float().unwrap().to_string())
            .collect();
        assert_eq!(floats, vec!["1.25", "3.0E-2", "2.5E3@16"]);
    }

    #[test]
    fn test_period_before_name_is_property_access() {
        use TokenKind::*;
        let tokens = tokenize("x.y 1. foo").unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![Name, Period, Name, DecInt, Period, Name, EndOfDocument]
        );
        assert_eq!(tokens[2].text(), Some("y"));
        assert_eq!(tokens[5].text(), Some("foo"));
    }

    #[test]
    fn test_reserved_names() {
        let tokens = tokenize("$ $x sys").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::ReservedName);
        assert_eq!(tokens[1].kind, TokenKind::ReservedName);
        assert_eq!(tokens[1].text(), Some("$x"));
        assert_eq!(tokens[2].kind, TokenKind::Name);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#""a\n\"b\"\\""#).unwrap();
        assert_eq!(tokens[0].text(), Some("a\n\"b\"\\"));
    }

    #[test]
    fn test_char_literals() {
        let tokens = tokenize(r"'A' '\n' '\0'").unwrap();
        let codes: Vec<&str> = tokens[..3]
            .iter()
            .map(|t| t.as_int().unwrap().digits.as_str())
            .collect();
        assert_eq!(codes, vec!["65", "10", "0"]);
        assert!(tokens.iter().take(3).all(|t| t.kind == TokenKind::DecInt));
    }

    #[test]
    fn test_lexical_errors() {
        assert_matches!(tokenize("''"), Err(LexerError::EmptyCharacter { .. }));
        assert_matches!(tokenize("'ab'"), Err(LexerError::TooManyCharacters { .. }));
        assert_matches!(tokenize(r#""\q""#), Err(LexerError::InvalidEscape { .. }));
        assert_matches!(tokenize("\"open"), Err(LexerError::UnexpectedEnd { .. }));
        assert_matches!(tokenize("0x"), Err(LexerError::MissingHexDigits { offset: 0 }));
        assert_matches!(tokenize("0b2"), Err(LexerError::MissingBinaryDigits { .. }));
        assert_matches!(tokenize("1@"), Err(LexerError::ExpectedBitLength { offset: 1 }));
        assert_matches!(
            tokenize("1@2000"),
            Err(LexerError::UnsupportedIntBits { bits: 2000, .. })
        );
        assert_matches!(
            tokenize("1.0@12"),
            Err(LexerError::UnsupportedFloatBits { bits: 12, .. })
        );
        assert_matches!(tokenize("1e"), Err(LexerError::MissingExponent { .. }));
        assert_matches!(
            tokenize("a # b"),
            Err(LexerError::UnrecognizedCharacter {
                character: '#',
                offset: 2
            })
        );
    }

    #[test]
    fn test_push_back_replays_tokens() {
        let mut tokenizer = Tokenizer::new(StringCharSource::new("a b"));
        let first = tokenizer.read().unwrap();
        let second = tokenizer.read().unwrap();
        tokenizer.push_back(second.clone());
        tokenizer.push_back(first.clone());
        assert_eq!(tokenizer.read().unwrap(), first);
        assert_eq!(tokenizer.read().unwrap(), second);
        assert_eq!(tokenizer.metrics().replayed_tokens, 2);
        assert_eq!(tokenizer.metrics().total_tokens, 2);
    }

    #[test]
    fn test_end_of_document_position() {
        let tokens = tokenize("ab  ").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::EndOfDocument);
        assert_eq!(tokens[1].position, 4);
    }
}
