//! Coin Toss Core Library
//!
//! Shared primitives for the coin toss frame service and player:
//! - Coin sides, bet amounts and the on-chain game state view
//! - TossContract trait with an RPC client and MockTossContract
//! - The bet submission flow with local outcome recomputation

pub mod chain;
pub mod contract;
pub mod flow;
pub mod game;

pub use chain::ChainConfig;
pub use contract::{
    BlockInfo, ContractError, MockTossContract, RpcTossContract, TossContract, TxReceipt,
};
pub use flow::{BetError, BetFlow, BetOutcome};
pub use game::{BetAmount, BetAmountError, CoinSide, GameState, LocalOutcome, Seat};
