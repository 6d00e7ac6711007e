//! Round state as read from the coin toss contract.

use super::CoinSide;
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

/// Wager token decimals (mUSDT)
pub const TOKEN_DECIMALS: u32 = 6;

/// Fixed stake per player: 0.1 mUSDT
pub const WAGER_UNITS: u64 = 100_000;

pub fn wager() -> U256 {
    U256::from(WAGER_UNITS)
}

/// Format base units with the wager token's decimals, e.g. `100000` -> `0.1`
pub fn format_token_amount(amount: U256) -> String {
    let scale = U256::exp10(TOKEN_DECIMALS as usize);
    let whole = amount / scale;
    let frac = (amount % scale).low_u64();
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:0width$}", frac, width = TOKEN_DECIMALS as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

/// `0x1234...abcd`
pub fn shorten_address(address: &Address) -> String {
    let full = format!("{:#x}", address);
    format!("{}...{}", &full[..6], &full[full.len() - 4..])
}

/// A player's seat in the current round
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub address: Address,
    pub side: CoinSide,
}

/// Contract `getState()` result
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub player1: Address,
    pub player2: Address,
    pub player1_heads: bool,
    pub player2_heads: bool,
    pub winner: Address,
    pub toss_number: u64,
}

impl From<(Address, Address, bool, bool, Address, U256)> for GameState {
    fn from(raw: (Address, Address, bool, bool, Address, U256)) -> Self {
        let (player1, player2, player1_heads, player2_heads, winner, toss) = raw;
        Self {
            player1,
            player2,
            player1_heads,
            player2_heads,
            winner,
            toss_number: toss.low_u64(),
        }
    }
}

impl GameState {
    pub fn player1(&self) -> Option<Seat> {
        (!self.player1.is_zero()).then(|| Seat {
            address: self.player1,
            side: CoinSide::from_is_heads(self.player1_heads),
        })
    }

    pub fn player2(&self) -> Option<Seat> {
        (!self.player2.is_zero()).then(|| Seat {
            address: self.player2,
            side: CoinSide::from_is_heads(self.player2_heads),
        })
    }

    pub fn winner(&self) -> Option<Address> {
        (!self.winner.is_zero()).then_some(self.winner)
    }

    /// Seat of the winner, if the round has been decided
    pub fn winning_seat(&self) -> Option<Seat> {
        let winner = self.winner()?;
        [self.player1(), self.player2()]
            .into_iter()
            .flatten()
            .find(|seat| seat.address == winner)
    }

    /// Round the next bet joins; a decided round counts as the next, empty one
    pub fn next_round(&self) -> GameState {
        match self.winner() {
            Some(_) => GameState {
                toss_number: self.toss_number + 1,
                ..GameState::default()
            },
            None => self.clone(),
        }
    }

    /// The next bet fills the second seat
    pub fn awaiting_second_player(&self) -> bool {
        self.player1().is_some() && self.player2().is_none()
    }

    /// Side still open to the second player
    pub fn available_side(&self) -> Option<CoinSide> {
        match (self.player1(), self.player2()) {
            (None, _) => None,
            (Some(seat), None) => Some(seat.side.opposite()),
            (Some(_), Some(_)) => None,
        }
    }

    /// Whether `player` may bet on `side` right now
    pub fn is_open_for(&self, player: Address, side: CoinSide) -> bool {
        if self.winner().is_some() {
            return false;
        }
        match (self.player1(), self.player2()) {
            (None, _) => true,
            (Some(seat), None) => seat.address != player && seat.side != side,
            (Some(_), Some(_)) => false,
        }
    }

    pub fn seat_of(&self, player: Address) -> Option<Seat> {
        [self.player1(), self.player2()]
            .into_iter()
            .flatten()
            .find(|seat| seat.address == player)
    }

    /// Human readable round status
    pub fn status_message(&self) -> String {
        if let Some(winner) = self.winner() {
            let side = self
                .winning_seat()
                .map(|seat| seat.side.label())
                .unwrap_or("?");
            return format!("Winner: {} ({})", shorten_address(&winner), side);
        }
        match (self.player1(), self.player2()) {
            (None, _) => "Choose your side".to_string(),
            (Some(seat), None) => format!(
                "Waiting for Player 2 to bet on {}",
                seat.side.opposite().label()
            ),
            (Some(_), Some(_)) => "Flipping the coin...".to_string(),
        }
    }
}
