//! Coin sides and the off-chain coin flip.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One face of the coin
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinSide {
    Heads,
    Tails,
}

impl CoinSide {
    /// Flip a fair coin
    pub fn flip() -> Self {
        Self::flip_with(&mut rand::thread_rng())
    }

    /// Flip using the given RNG
    pub fn flip_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen::<f64>() < 0.5 {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        }
    }

    /// Contract encoding: `true` is heads
    pub fn from_is_heads(is_heads: bool) -> Self {
        if is_heads {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        }
    }

    pub fn is_heads(&self) -> bool {
        matches!(self, CoinSide::Heads)
    }

    /// Frame button encoding: button 1 is heads, anything else tails
    pub fn from_button_index(index: u32) -> Self {
        Self::from_is_heads(index == 1)
    }

    /// Image query encoding: 0 is heads, anything else tails
    pub fn from_code(code: i64) -> Self {
        Self::from_is_heads(code == 0)
    }

    pub fn code(&self) -> u8 {
        match self {
            CoinSide::Heads => 0,
            CoinSide::Tails => 1,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            CoinSide::Heads => CoinSide::Tails,
            CoinSide::Tails => CoinSide::Heads,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoinSide::Heads => "Heads",
            CoinSide::Tails => "Tails",
        }
    }

    /// Upper-case label used on cards and buttons
    pub fn label(&self) -> &'static str {
        match self {
            CoinSide::Heads => "HEADS",
            CoinSide::Tails => "TAILS",
        }
    }
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown coin side '{0}', expected heads or tails")]
pub struct ParseSideError(String);

impl FromStr for CoinSide {
    type Err = ParseSideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heads" | "h" => Ok(CoinSide::Heads),
            "tails" | "t" => Ok(CoinSide::Tails),
            _ => Err(ParseSideError(s.to_string())),
        }
    }
}
