//! Token kinds and payloads produced by the tokenizer
//!
//! Tokens are immutable once produced. Each carries the zero-based character
//! offset of its first character, which is the offset syntax diagnostics report.

use super::literal::{IntBase, RawFloat, RawInt};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Arithmetic operators
    Plus,     // +
    Minus,    // -
    Times,    // *
    Divide,   // /
    Modulo,   // %

    // Bitwise operators
    LeftShift,  // <<
    RightShift, // >>
    BitwiseNot, // ~
    BitwiseAnd, // &
    BitwiseOr,  // |
    BitwiseXor, // ^

    // Logical operators
    LogicalNot, // !
    LogicalAnd, // &&
    LogicalOr,  // ||

    // Comparison operators
    Equal,         // ==
    NotEqual,      // !=
    LessThan,      // <
    LessThanEqual, // <=
    MoreThan,      // >
    MoreThanEqual, // >=

    // Assignment operators
    Assign,           // =
    AssignPlus,       // +=
    AssignMinus,      // -=
    AssignTimes,      // *=
    AssignDivide,     // /=
    AssignModulo,     // %=
    AssignLeftShift,  // <<=
    AssignRightShift, // >>=
    AssignBitwiseAnd, // &=
    AssignBitwiseOr,  // |=
    AssignBitwiseXor, // ^=
    Increment,        // ++
    Decrement,        // --

    // Punctuation
    BracketLeft,        // (
    BracketRight,       // )
    SquareBracketLeft,  // [
    SquareBracketRight, // ]
    CurlyBracketLeft,   // {
    CurlyBracketRight,  // }
    Comma,              // ,
    Period,             // .
    Colon,              // :
    DoubleColon,        // ::
    EndOfInstruction,   // ;
    EndOfDocument,

    // Names and literals
    Name,
    ReservedName,
    DecInt,
    HexInt,
    BinInt,
    Float,
    String,
}

impl TokenKind {
    /// Source spelling of fixed tokens, `None` for payload-bearing kinds
    pub fn symbol(&self) -> Option<&'static str> {
        let text = match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Times => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
            Self::BitwiseNot => "~",
            Self::BitwiseAnd => "&",
            Self::BitwiseOr => "|",
            Self::BitwiseXor => "^",
            Self::LogicalNot => "!",
            Self::LogicalAnd => "&&",
            Self::LogicalOr => "||",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanEqual => "<=",
            Self::MoreThan => ">",
            Self::MoreThanEqual => ">=",
            Self::Assign => "=",
            Self::AssignPlus => "+=",
            Self::AssignMinus => "-=",
            Self::AssignTimes => "*=",
            Self::AssignDivide => "/=",
            Self::AssignModulo => "%=",
            Self::AssignLeftShift => "<<=",
            Self::AssignRightShift => ">>=",
            Self::AssignBitwiseAnd => "&=",
            Self::AssignBitwiseOr => "|=",
            Self::AssignBitwiseXor => "^=",
            Self::Increment => "++",
            Self::Decrement => "--",
            Self::BracketLeft => "(",
            Self::BracketRight => ")",
            Self::SquareBracketLeft => "[",
            Self::SquareBracketRight => "]",
            Self::CurlyBracketLeft => "{",
            Self::CurlyBracketRight => "}",
            Self::Comma => ",",
            Self::Period => ".",
            Self::Colon => ":",
            Self::DoubleColon => "::",
            Self::EndOfInstruction => ";",
            Self::EndOfDocument
            | Self::Name
            | Self::ReservedName
            | Self::DecInt
            | Self::HexInt
            | Self::BinInt
            | Self::Float
            | Self::String => return None,
        };
        Some(text)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::DecInt | Self::HexInt | Self::BinInt)
    }

    pub fn is_literal(&self) -> bool {
        self.is_integer() || matches!(self, Self::Float | Self::String)
    }

    pub fn is_name(&self) -> bool {
        matches!(self, Self::Name | Self::ReservedName)
    }

    /// Token kind for an integer literal in the given base
    pub fn for_int_base(base: IntBase) -> Self {
        match base {
            IntBase::Binary => Self::BinInt,
            IntBase::Decimal => Self::DecInt,
            IntBase::Hexadecimal => Self::HexInt,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(symbol) = self.symbol() {
            return write!(f, "'{}'", symbol);
        }
        let text = match self {
            Self::EndOfDocument => "end of document",
            Self::Name => "name",
            Self::ReservedName => "reserved name",
            Self::DecInt => "decimal integer",
            Self::HexInt => "hexadecimal integer",
            Self::BinInt => "binary integer",
            Self::Float => "float",
            Self::String => "string",
            _ => "token",
        };
        write!(f, "{}", text)
    }
}

/// Payload attached to names and literals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenValue {
    None,
    Text(String),
    Int(RawInt),
    Float(RawFloat),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
    pub value: TokenValue,
}

impl Token {
    pub fn new(kind: TokenKind, position: usize) -> Self {
        Self {
            kind,
            position,
            value: TokenValue::None,
        }
    }

    pub fn name(text: impl Into<String>, reserved: bool, position: usize) -> Self {
        let kind = if reserved {
            TokenKind::ReservedName
        } else {
            TokenKind::Name
        };
        Self {
            kind,
            position,
            value: TokenValue::Text(text.into()),
        }
    }

    pub fn string(text: impl Into<String>, position: usize) -> Self {
        Self {
            kind: TokenKind::String,
            position,
            value: TokenValue::Text(text.into()),
        }
    }

    pub fn int(value: RawInt, position: usize) -> Self {
        Self {
            kind: TokenKind::for_int_base(value.base),
            position,
            value: TokenValue::Int(value),
        }
    }

    pub fn float(value: RawFloat, position: usize) -> Self {
        Self {
            kind: TokenKind::Float,
            position,
            value: TokenValue::Float(value),
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// True for a plain name with exactly this text
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Name && self.text() == Some(word)
    }

    /// Text of names and strings
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<&RawInt> {
        match &self.value {
            TokenValue::Int(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&RawFloat> {
        match &self.value {
            TokenValue::Float(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.value) {
            (TokenKind::String, TokenValue::Text(text)) => write!(f, "\"{}\"", text),
            (_, TokenValue::Text(text)) => write!(f, "{}", text),
            (_, TokenValue::Int(value)) => write!(f, "{}", value),
            (_, TokenValue::Float(value)) => write!(f, "{}", value),
            (kind, TokenValue::None) => match kind.symbol() {
                Some(symbol) => write!(f, "{}", symbol),
                None => write!(f, "{}", kind),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_display_quotes_symbols() {
        assert_eq!(TokenKind::AssignLeftShift.to_string(), "'<<='");
        assert_eq!(TokenKind::EndOfDocument.to_string(), "end of document");
        assert_eq!(TokenKind::ReservedName.to_string(), "reserved name");
    }

    #[test]
    fn test_int_token_kind_follows_base() {
        let hex = RawInt {
            digits: "FF".to_string(),
            base: IntBase::Hexadecimal,
            bits: 0,
            unsigned: true,
        };
        let token = Token::int(hex, 4);
        assert_eq!(token.kind, TokenKind::HexInt);
        assert_eq!(token.to_string(), "0xFF");
        assert!(token.kind.is_integer());
    }

    #[test]
    fn test_word_matching_ignores_reserved_names() {
        assert!(Token::name("if", false, 0).is_word("if"));
        assert!(!Token::name("$", true, 0).is_word("$"));
        assert_eq!(Token::string("hi", 3).to_string(), "\"hi\"");
    }
}
