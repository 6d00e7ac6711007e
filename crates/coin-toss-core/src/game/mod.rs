//! Game domain: sides, bets, round state and toss randomness.

mod bet;
mod randomness;
mod side;
mod state;

pub use bet::{BetAmount, BetAmountError};
pub use randomness::{resolve_winner, toss_side, LocalOutcome};
pub use side::{CoinSide, ParseSideError};
pub use state::{format_token_amount, shorten_address, wager, GameState, Seat, TOKEN_DECIMALS, WAGER_UNITS};
