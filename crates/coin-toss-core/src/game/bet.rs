//! Free-text bet amounts entered in a frame.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors from parsing a bet amount
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BetAmountError {
    #[error("Invalid bet amount: empty input")]
    Empty,

    #[error("Invalid bet amount: '{0}' is not a number")]
    NotANumber(String),

    #[error("Invalid bet amount: {0} is not a positive amount")]
    NotPositive(f64),
}

/// A validated, strictly positive bet amount
///
/// Keeps the text the player typed so cards can echo it back verbatim.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BetAmount {
    text: String,
    value: f64,
}

impl BetAmount {
    /// Parse a bet the way a lenient float parser would: leading whitespace is
    /// skipped and the longest numeric prefix is used, so `"0.5 eth"` is 0.5.
    pub fn parse(input: &str) -> Result<Self, BetAmountError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(BetAmountError::Empty);
        }

        let number = numeric_prefix(trimmed)
            .ok_or_else(|| BetAmountError::NotANumber(trimmed.to_string()))?;
        let value: f64 = number
            .parse()
            .map_err(|_| BetAmountError::NotANumber(trimmed.to_string()))?;

        if !value.is_finite() || value <= 0.0 {
            return Err(BetAmountError::NotPositive(value));
        }

        Ok(Self {
            text: input.to_string(),
            value,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// The text as entered
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for BetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Normalized numeric prefix (`[sign] digits [. digits] [e [sign] digits]`),
/// or None when the input does not start with a number.
fn numeric_prefix(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut pos = 0;
    let mut out = String::new();

    if let Some(&sign @ (b'+' | b'-')) = bytes.first() {
        if sign == b'-' {
            out.push('-');
        }
        pos += 1;
    }

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_digits = &s[int_start..pos];

    let mut frac_digits = "";
    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        frac_digits = &s[frac_start..frac_end];
        if !int_digits.is_empty() || !frac_digits.is_empty() {
            pos = frac_end;
        }
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    out.push_str(if int_digits.is_empty() { "0" } else { int_digits });
    if !frac_digits.is_empty() {
        out.push('.');
        out.push_str(frac_digits);
    }

    // Exponent only counts when it has digits
    if pos < bytes.len() && matches!(bytes[pos], b'e' | b'E') {
        let mut exp_pos = pos + 1;
        let mut exp = String::from("e");
        if let Some(&sign @ (b'+' | b'-')) = bytes.get(exp_pos) {
            if sign == b'-' {
                exp.push('-');
            }
            exp_pos += 1;
        }
        let digits_start = exp_pos;
        while exp_pos < bytes.len() && bytes[exp_pos].is_ascii_digit() {
            exp_pos += 1;
        }
        if exp_pos > digits_start {
            exp.push_str(&s[digits_start..exp_pos]);
            out.push_str(&exp);
        }
    }

    Some(out)
}
