//! Contract client trait definition.

use crate::chain::EXPLORER_TX_URL;
use crate::game::{CoinSide, GameState};
use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use serde::Serialize;
use thiserror::Error;

/// Errors from contract calls
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("No signer configured")]
    NoSigner,

    #[error("Invalid signer key: {0}")]
    InvalidKey(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Signature rejected: {0}")]
    Rejected(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Transaction dropped before confirmation: {0:#x}")]
    Dropped(H256),

    #[error("RPC error: {0}")]
    Rpc(String),
}

impl ContractError {
    /// Classify a node or wallet error message
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("user rejected") || lower.contains("user denied") {
            ContractError::Rejected(message)
        } else if lower.contains("insufficient") {
            ContractError::InsufficientFunds(message)
        } else {
            ContractError::Rpc(message)
        }
    }
}

/// A mined transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub hash: H256,
    /// false when the transaction reverted
    pub success: bool,
}

impl TxReceipt {
    pub fn explorer_url(&self) -> String {
        format!("{}{:#x}", EXPLORER_TX_URL, self.hash)
    }
}

/// Fields of a block the toss randomness depends on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BlockInfo {
    pub number: u64,
    pub timestamp: U256,
    pub prev_randao: U256,
}

/// Operations on the coin toss contract and its wager token
///
/// Implementations:
/// - RpcTossContract talks to a deployed contract over JSON-RPC
/// - MockTossContract simulates the contract in memory
///
/// Transaction methods return `Err` only when the transaction could not be
/// submitted; a mined but reverted transaction is `Ok` with `success == false`.
#[async_trait]
pub trait TossContract: Send + Sync {
    /// Address of the coin toss contract
    fn address(&self) -> Address;

    /// Account that signs transactions, if any
    fn signer_address(&self) -> Option<Address>;

    /// Read the current round
    async fn get_state(&self) -> Result<GameState, ContractError>;

    /// Wager on a side (`placeBet(bool)`)
    async fn place_bet(&self, side: CoinSide) -> Result<TxReceipt, ContractError>;

    /// Force a new round (`resetGame()`), owner only on chain
    async fn reset_game(&self) -> Result<TxReceipt, ContractError>;

    /// Token allowance granted by `owner` to the contract
    async fn token_allowance(&self, owner: Address) -> Result<U256, ContractError>;

    /// Approve the contract to pull `amount` from the signer
    async fn approve_token(&self, amount: U256) -> Result<TxReceipt, ContractError>;

    /// Token balance of `owner`
    async fn token_balance(&self, owner: Address) -> Result<U256, ContractError>;

    /// Mint test tokens (mock token only)
    async fn mint_tokens(&self, to: Address, amount: U256) -> Result<TxReceipt, ContractError>;

    /// Latest block header fields
    async fn latest_block(&self) -> Result<BlockInfo, ContractError>;
}
