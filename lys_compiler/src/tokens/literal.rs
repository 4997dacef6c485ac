//! Lexical numeric literals
//!
//! Numbers are kept as digit strings. The static type of a literal depends on
//! its suffixes, so conversion is left to the code generator.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntBase {
    Binary,
    Decimal,
    Hexadecimal,
}

/// Integer literal as written in the source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawInt {
    /// Digits without prefix; hex digits are upper case
    pub digits: String,
    pub base: IntBase,
    /// Declared bit width, 0 when the literal has no `@` suffix
    pub bits: u32,
    pub unsigned: bool,
}

impl RawInt {
    pub fn decimal(digits: impl Into<String>) -> Self {
        Self {
            digits: digits.into(),
            base: IntBase::Decimal,
            bits: 0,
            unsigned: false,
        }
    }

    pub fn with_bits(mut self, bits: u32) -> Self {
        self.bits = bits;
        self
    }

    pub fn with_unsigned(mut self, unsigned: bool) -> Self {
        self.unsigned = unsigned;
        self
    }

    /// Numeric text in target syntax
    pub fn target_text(&self) -> String {
        match self.base {
            IntBase::Decimal => self.digits.clone(),
            IntBase::Hexadecimal => format!("0x{}", self.digits),
            IntBase::Binary => format!("0b{}", self.digits),
        }
    }
}

impl fmt::Display for RawInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target_text())?;
        if self.unsigned && self.base == IntBase::Decimal {
            write!(f, "u")?;
        }
        if self.bits > 0 {
            write!(f, "@{}", self.bits)?;
        }
        Ok(())
    }
}

/// Floating point literal as written in the source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawFloat {
    pub integer_part: String,
    pub fractional_part: String,
    /// Exponent digits, possibly starting with `-`
    pub exponent_part: String,
    pub bits: u32,
}

impl RawFloat {
    /// Numeric text in target syntax. Missing parts are filled with `0`.
    pub fn target_text(&self) -> String {
        let integer = if self.integer_part.is_empty() {
            "0"
        } else {
            &self.integer_part
        };
        let fraction = if self.fractional_part.is_empty() {
            "0"
        } else {
            &self.fractional_part
        };
        let mut text = format!("{}.{}", integer, fraction);
        if !self.exponent_part.is_empty() {
            text.push('E');
            text.push_str(&self.exponent_part);
        }
        text
    }
}

impl fmt::Display for RawFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target_text())?;
        if self.bits > 0 {
            write!(f, "@{}", self.bits)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_target_text_keeps_prefix() {
        let hex = RawInt {
            digits: "1F".to_string(),
            base: IntBase::Hexadecimal,
            bits: 8,
            unsigned: true,
        };
        assert_eq!(hex.target_text(), "0x1F");
        assert_eq!(hex.to_string(), "0x1F@8");

        let dec = RawInt::decimal("123").with_unsigned(true).with_bits(16);
        assert_eq!(dec.to_string(), "123u@16");
    }

    #[test]
    fn test_float_target_text_fills_missing_parts() {
        let leading_dot = RawFloat {
            integer_part: String::new(),
            fractional_part: "5".to_string(),
            exponent_part: String::new(),
            bits: 0,
        };
        assert_eq!(leading_dot.target_text(), "0.5");

        let exponent = RawFloat {
            integer_part: "1".to_string(),
            fractional_part: String::new(),
            exponent_part: "-3".to_string(),
            bits: 16,
        };
        assert_eq!(exponent.target_text(), "1.0E-3");
        assert_eq!(exponent.to_string(), "1.0E-3@16");
    }
}
