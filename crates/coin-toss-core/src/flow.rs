//! Bet submission flow.
//!
//! Mirrors what a player's wallet session does for one bet: top up the token
//! allowance, check the balance, place the bet with a bounded retry, and for
//! the second bet of a round recompute the outcome locally for display before
//! re-reading the authoritative state.

use crate::contract::{ContractError, TossContract, TxReceipt};
use crate::game::{
    format_token_amount, resolve_winner, toss_side, wager, CoinSide, GameState, LocalOutcome,
    Seat,
};
use ethers::types::{Address, H256, U256};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// Bet submission attempts before giving up
pub const MAX_RETRIES: u32 = 3;

/// Pause between bet submission attempts
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Errors from a bet or reset
#[derive(Debug, Error)]
pub enum BetError {
    #[error("No signer address available")]
    NoSigner,

    #[error("Insufficient mUSDT balance. You need 0.1 mUSDT to play.")]
    InsufficientBalance { balance: U256 },

    #[error("Transaction was rejected")]
    Rejected,

    #[error("{0} is not available this round")]
    SideTaken(CoinSide),

    #[error("You already have a bet in this round")]
    AlreadySeated,

    #[error("Transaction {0:#x} failed")]
    TransactionFailed(H256),

    #[error("Only the contract deployer can reset the game")]
    NotOwner,

    #[error(transparent)]
    Contract(ContractError),
}

impl From<ContractError> for BetError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::Rejected(_) => BetError::Rejected,
            ContractError::InsufficientFunds(_) => BetError::InsufficientBalance {
                balance: U256::zero(),
            },
            ContractError::NoSigner => BetError::NoSigner,
            other => BetError::Contract(other),
        }
    }
}

impl BetError {
    /// Message shown to the player
    pub fn user_message(&self) -> String {
        match self {
            BetError::InsufficientBalance { .. }
            | BetError::Rejected
            | BetError::SideTaken(_)
            | BetError::AlreadySeated
            | BetError::NotOwner => self.to_string(),
            BetError::TransactionFailed(_) => "Transaction failed. Please try again.".to_string(),
            BetError::NoSigner | BetError::Contract(_) => {
                "Failed to place bet. Please try again.".to_string()
            }
        }
    }
}

/// Result of a confirmed bet
#[derive(Clone, Debug)]
pub struct BetOutcome {
    pub side: CoinSide,
    pub receipt: TxReceipt,
    /// Approval sent before the bet, if the allowance was short
    pub approval: Option<TxReceipt>,
    pub attempts: u32,
    /// Locally recomputed result, only for the bet that completed a round
    pub local: Option<LocalOutcome>,
    /// State read back after confirmation
    pub state: GameState,
}

/// Drives bets and resets against a [`TossContract`]
pub struct BetFlow {
    contract: Arc<dyn TossContract>,
    max_retries: u32,
    retry_delay: Duration,
    status: Option<UnboundedSender<String>>,
}

impl BetFlow {
    pub fn new(contract: Arc<dyn TossContract>) -> Self {
        Self {
            contract,
            max_retries: MAX_RETRIES,
            retry_delay: RETRY_DELAY,
            status: None,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Send status lines to `tx` as the flow progresses
    pub fn with_status(mut self, tx: UnboundedSender<String>) -> Self {
        self.status = Some(tx);
        self
    }

    fn report(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        if let Some(tx) = &self.status {
            let _ = tx.send(message);
        }
    }

    /// Place a bet on `side` for the signer
    pub async fn place_bet(&self, side: CoinSide) -> Result<BetOutcome, BetError> {
        let player = self.contract.signer_address().ok_or(BetError::NoSigner)?;
        let stake = wager();

        let allowance = self.contract.token_allowance(player).await?;
        info!("Current allowance: {} mUSDT", format_token_amount(allowance));
        let approval = if allowance < stake {
            self.report("Approving mUSDT...");
            let receipt = self.contract.approve_token(stake).await?;
            if !receipt.success {
                return Err(BetError::TransactionFailed(receipt.hash));
            }
            Some(receipt)
        } else {
            None
        };

        let balance = self.contract.token_balance(player).await?;
        info!(
            "Current balance: {} mUSDT, required: {} mUSDT",
            format_token_amount(balance),
            format_token_amount(stake)
        );
        if balance < stake {
            return Err(BetError::InsufficientBalance { balance });
        }

        let before = self.contract.get_state().await?.next_round();
        if before.seat_of(player).is_some() {
            return Err(BetError::AlreadySeated);
        }
        if !before.is_open_for(player, side) {
            return Err(BetError::SideTaken(side));
        }
        let completes_round = before.awaiting_second_player();

        self.report(format!("Placing bet on {}...", side.label()));
        let (receipt, attempts) = self.submit_with_retry(side).await?;
        if !receipt.success {
            return Err(BetError::TransactionFailed(receipt.hash));
        }
        info!("Bet confirmed: {}", receipt.explorer_url());

        let local = match (completes_round, before.player1()) {
            (true, Some(first)) => {
                self.report("Both bets placed! Flipping the coin...");
                let bettor = Seat {
                    address: player,
                    side,
                };
                Some(self.local_outcome(first, bettor).await?)
            }
            _ => None,
        };

        let state = self.contract.get_state().await?;
        match &local {
            Some(outcome) => self.report(format!(
                "Winner: {:#x} with {}!",
                outcome.winner,
                outcome.winning_side.label()
            )),
            None => self.report("Waiting for Player 2..."),
        }

        Ok(BetOutcome {
            side,
            receipt,
            approval,
            attempts,
            local,
            state,
        })
    }

    /// Only bet submission is retried; a rejected signature is final.
    async fn submit_with_retry(&self, side: CoinSide) -> Result<(TxReceipt, u32), BetError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.contract.place_bet(side).await {
                Ok(receipt) => return Ok((receipt, attempt)),
                Err(ContractError::Rejected(_)) => return Err(BetError::Rejected),
                Err(err) if attempt < self.max_retries => {
                    warn!(
                        "Transaction attempt {} failed ({}), retrying in {:?}",
                        attempt, err, self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn local_outcome(&self, first: Seat, second: Seat) -> Result<LocalOutcome, BetError> {
        let block = self.contract.latest_block().await?;
        let winning_side = toss_side(block.timestamp, block.prev_randao);
        let winner = resolve_winner(first, second, winning_side);
        Ok(LocalOutcome {
            winning_side,
            winner: winner.address,
            block_number: block.number,
        })
    }

    /// Force a new round; the signer must be `owner`
    pub async fn reset_game(&self, owner: Address) -> Result<TxReceipt, BetError> {
        let signer = self.contract.signer_address().ok_or(BetError::NoSigner)?;
        if signer != owner {
            return Err(BetError::NotOwner);
        }

        self.report("Force resetting game...");
        let receipt = self.contract.reset_game().await?;
        if !receipt.success {
            return Err(BetError::TransactionFailed(receipt.hash));
        }
        self.report("Choose your side");
        Ok(receipt)
    }

    /// Mint `amount` test tokens to the signer
    pub async fn mint(&self, amount: U256) -> Result<TxReceipt, BetError> {
        let signer = self.contract.signer_address().ok_or(BetError::NoSigner)?;
        let receipt = self.contract.mint_tokens(signer, amount).await?;
        if !receipt.success {
            return Err(BetError::TransactionFailed(receipt.hash));
        }
        self.report(format!("Minted {} mUSDT", format_token_amount(amount)));
        Ok(receipt)
    }
}
