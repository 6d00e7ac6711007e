//! Mock coin toss contract for testing and local play.

use super::traits::{BlockInfo, ContractError, TossContract, TxReceipt};
use crate::game::{resolve_winner, toss_side, wager, CoinSide, GameState};
use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use ethers::utils::keccak256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Platform fee taken from the pot, in percent
const FEE_PERCENT: u64 = 1;

/// Seconds between simulated blocks
const BLOCK_TIME: u64 = 2;

struct MockChain {
    state: GameState,
    owner: Address,
    balances: HashMap<Address, U256>,
    /// owner -> allowance granted to the game contract
    allowances: HashMap<Address, U256>,
    pot: U256,
    fees: U256,
    block: BlockInfo,
    tx_count: u64,
    fail_next_bets: u32,
    reject_signatures: bool,
    /// Leave a decided round readable until the next bet or reset
    keep_settled: bool,
    last_winner: Option<(Address, CoinSide)>,
}

impl MockChain {
    /// Mine one block and return a receipt for it
    fn mine(&mut self, success: bool) -> TxReceipt {
        self.tx_count += 1;
        self.block.number += 1;
        self.block.timestamp += U256::from(BLOCK_TIME);
        self.block.prev_randao = U256::from_big_endian(&keccak256(self.block.number.to_be_bytes()));
        TxReceipt {
            hash: H256::from_low_u64_be(self.tx_count),
            success,
        }
    }

    fn balance(&self, owner: &Address) -> U256 {
        self.balances.get(owner).copied().unwrap_or_default()
    }

    /// `transferFrom(player, game, wager)`; false on revert
    fn collect_wager(&mut self, player: Address) -> bool {
        let stake = wager();
        let allowance = self.allowances.get(&player).copied().unwrap_or_default();
        let balance = self.balance(&player);
        if allowance < stake || balance < stake {
            return false;
        }
        self.allowances.insert(player, allowance - stake);
        self.balances.insert(player, balance - stake);
        self.pot += stake;
        true
    }

    fn credit(&mut self, to: Address, amount: U256) {
        let balance = self.balance(&to);
        self.balances.insert(to, balance + amount);
    }

    /// Settle a full round against the current block, pay out and open the next toss
    fn settle(&mut self) {
        let (Some(p1), Some(p2)) = (self.state.player1(), self.state.player2()) else {
            return;
        };
        let side = toss_side(self.block.timestamp, self.block.prev_randao);
        let winner = resolve_winner(p1, p2, side);

        let fee = self.pot * U256::from(FEE_PERCENT) / U256::from(100u64);
        let payout = self.pot - fee;
        self.fees += fee;
        self.pot = U256::zero();
        self.credit(winner.address, payout);

        self.last_winner = Some((winner.address, side));
        if self.keep_settled {
            self.state.winner = winner.address;
        } else {
            self.state = GameState {
                toss_number: self.state.toss_number + 1,
                ..GameState::default()
            };
        }
    }
}

/// In-memory coin toss contract
///
/// Clones share the same chain; use [`MockTossContract::as_player`] to act as
/// a different account against it.
#[derive(Clone)]
pub struct MockTossContract {
    chain: Arc<Mutex<MockChain>>,
    contract: Address,
    signer: Address,
}

impl MockTossContract {
    /// Create a fresh chain owned by `owner`, acting as `owner`
    pub fn new(owner: Address) -> Self {
        let chain = MockChain {
            state: GameState {
                toss_number: 1,
                ..GameState::default()
            },
            owner,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            pot: U256::zero(),
            fees: U256::zero(),
            block: BlockInfo {
                number: 1,
                timestamp: U256::from(1_700_000_000u64),
                prev_randao: U256::from(1u64),
            },
            tx_count: 0,
            fail_next_bets: 0,
            reject_signatures: false,
            keep_settled: false,
            last_winner: None,
        };

        Self {
            chain: Arc::new(Mutex::new(chain)),
            contract: Address::from_low_u64_be(0xC0FFEE),
            signer: owner,
        }
    }

    /// Same chain, signing as `player`
    pub fn as_player(&self, player: Address) -> Self {
        Self {
            chain: self.chain.clone(),
            contract: self.contract,
            signer: player,
        }
    }

    /// Current token balance of `owner`
    pub fn balance(&self, owner: Address) -> U256 {
        self.chain.lock().unwrap().balance(&owner)
    }

    /// Fund an account without a transaction
    pub fn fund(&self, owner: Address, amount: U256) {
        self.chain.lock().unwrap().credit(owner, amount);
    }

    /// Make the next `count` bet submissions fail before reaching the chain
    pub fn fail_next_bets(&self, count: u32) {
        self.chain.lock().unwrap().fail_next_bets = count;
    }

    /// Reject every signature request, as a wallet whose user declines
    pub fn reject_signatures(&self, reject: bool) {
        self.chain.lock().unwrap().reject_signatures = reject;
    }

    /// Keep the winner and seats of a settled round visible until the next
    /// bet or reset, instead of opening the next toss in the settling block
    pub fn keep_settled_rounds(&self, keep: bool) {
        self.chain.lock().unwrap().keep_settled = keep;
    }

    /// Winner and side of the last settled round
    pub fn last_winner(&self) -> Option<(Address, CoinSide)> {
        self.chain.lock().unwrap().last_winner
    }

    /// Fees accumulated by the platform
    pub fn collected_fees(&self) -> U256 {
        self.chain.lock().unwrap().fees
    }

    /// Number of transactions mined so far
    pub fn tx_count(&self) -> u64 {
        self.chain.lock().unwrap().tx_count
    }

    fn check_signature(&self, chain: &MockChain) -> Result<(), ContractError> {
        if chain.reject_signatures {
            return Err(ContractError::Rejected(
                "user rejected transaction".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl TossContract for MockTossContract {
    fn address(&self) -> Address {
        self.contract
    }

    fn signer_address(&self) -> Option<Address> {
        Some(self.signer)
    }

    async fn get_state(&self) -> Result<GameState, ContractError> {
        Ok(self.chain.lock().unwrap().state.clone())
    }

    async fn place_bet(&self, side: CoinSide) -> Result<TxReceipt, ContractError> {
        let mut chain = self.chain.lock().unwrap();
        self.check_signature(&chain)?;

        if chain.fail_next_bets > 0 {
            chain.fail_next_bets -= 1;
            return Err(ContractError::Rpc("replacement transaction underpriced".to_string()));
        }

        let state = chain.state.next_round();
        let seat_ok = match (state.player1(), state.player2()) {
            (None, _) => true,
            (Some(p1), None) => p1.address != self.signer && p1.side != side,
            (Some(_), Some(_)) => false,
        };
        if !seat_ok || !chain.collect_wager(self.signer) {
            return Ok(chain.mine(false));
        }
        chain.state = state.clone();

        if state.player1().is_none() {
            chain.state.player1 = self.signer;
            chain.state.player1_heads = side.is_heads();
            return Ok(chain.mine(true));
        }

        chain.state.player2 = self.signer;
        chain.state.player2_heads = side.is_heads();
        let receipt = chain.mine(true);
        chain.settle();
        Ok(receipt)
    }

    async fn reset_game(&self) -> Result<TxReceipt, ContractError> {
        let mut chain = self.chain.lock().unwrap();
        self.check_signature(&chain)?;

        if self.signer != chain.owner {
            return Ok(chain.mine(false));
        }

        // Refund whoever is seated in an undecided round
        let stake = wager();
        let seated: Vec<Address> = if chain.state.winner().is_some() {
            Vec::new()
        } else {
            [chain.state.player1(), chain.state.player2()]
                .into_iter()
                .flatten()
                .map(|seat| seat.address)
                .collect()
        };
        for player in seated {
            chain.pot -= stake;
            chain.credit(player, stake);
        }

        chain.state = GameState {
            toss_number: chain.state.toss_number + 1,
            ..GameState::default()
        };
        Ok(chain.mine(true))
    }

    async fn token_allowance(&self, owner: Address) -> Result<U256, ContractError> {
        let chain = self.chain.lock().unwrap();
        Ok(chain.allowances.get(&owner).copied().unwrap_or_default())
    }

    async fn approve_token(&self, amount: U256) -> Result<TxReceipt, ContractError> {
        let mut chain = self.chain.lock().unwrap();
        self.check_signature(&chain)?;
        chain.allowances.insert(self.signer, amount);
        Ok(chain.mine(true))
    }

    async fn token_balance(&self, owner: Address) -> Result<U256, ContractError> {
        Ok(self.chain.lock().unwrap().balance(&owner))
    }

    async fn mint_tokens(&self, to: Address, amount: U256) -> Result<TxReceipt, ContractError> {
        let mut chain = self.chain.lock().unwrap();
        self.check_signature(&chain)?;
        chain.credit(to, amount);
        Ok(chain.mine(true))
    }

    async fn latest_block(&self) -> Result<BlockInfo, ContractError> {
        Ok(self.chain.lock().unwrap().block)
    }
}
