//! RPC client for the deployed coin toss contract.
//!
//! Reads go through a plain HTTP provider. Transactions need a local signing
//! key and go through `SignerMiddleware`.

use super::traits::{BlockInfo, ContractError, TossContract, TxReceipt};
use crate::chain::ChainConfig;
use crate::game::{CoinSide, GameState};
use async_trait::async_trait;
use ethers::{
    abi::Detokenize,
    contract::{abigen, ContractCall},
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, BlockNumber, U256},
};
use std::sync::Arc;

abigen!(
    CoinTossGame,
    r#"[
        function placeBet(bool isHeads)
        function getState() view returns (address, address, bool, bool, address, uint256)
        function resetGame()
    ]"#,
);

abigen!(
    WagerToken,
    r#"[
        function allowance(address owner, address spender) view returns (uint256)
        function approve(address spender, uint256 amount) returns (bool)
        function balanceOf(address account) view returns (uint256)
        function mint(address to, uint256 amount)
    ]"#,
);

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// RPC client for the coin toss contract
pub struct RpcTossContract {
    provider: Arc<Provider<Http>>,
    signer: Option<Arc<SignerClient>>,
    chain_id: u64,
    contract: Address,
    token: Address,
}

impl RpcTossContract {
    /// Create a read-only client
    pub fn new(config: &ChainConfig) -> Result<Self, ContractError> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| ContractError::Rpc(format!("invalid RPC URL {}: {}", config.rpc_url, e)))?;

        Ok(Self {
            provider: Arc::new(provider),
            signer: None,
            chain_id: config.chain_id,
            contract: config.contract,
            token: config.token,
        })
    }

    /// Attach a hex private key for sending transactions
    pub fn with_signer(mut self, private_key: &str) -> Result<Self, ContractError> {
        let wallet = private_key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| ContractError::InvalidKey(e.to_string()))?
            .with_chain_id(self.chain_id);

        let client = SignerMiddleware::new(self.provider.as_ref().clone(), wallet);
        self.signer = Some(Arc::new(client));
        Ok(self)
    }

    fn signer(&self) -> Result<Arc<SignerClient>, ContractError> {
        self.signer.clone().ok_or(ContractError::NoSigner)
    }

    fn game_reader(&self) -> CoinTossGame<Provider<Http>> {
        CoinTossGame::new(self.contract, self.provider.clone())
    }

    fn token_reader(&self) -> WagerToken<Provider<Http>> {
        WagerToken::new(self.token, self.provider.clone())
    }
}

/// Send a transaction and wait for its receipt
async fn submit<D: Detokenize>(call: ContractCall<SignerClient, D>) -> Result<TxReceipt, ContractError> {
    let pending = call
        .send()
        .await
        .map_err(|e| ContractError::from_message(e.to_string()))?;
    let hash = pending.tx_hash();
    tracing::debug!("Transaction sent: {:#x}", hash);

    let receipt = pending
        .await
        .map_err(|e| ContractError::Rpc(e.to_string()))?
        .ok_or(ContractError::Dropped(hash))?;

    Ok(TxReceipt {
        hash,
        success: receipt.status.map(|s| s.as_u64() == 1).unwrap_or(false),
    })
}

#[async_trait]
impl TossContract for RpcTossContract {
    fn address(&self) -> Address {
        self.contract
    }

    fn signer_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|client| client.address())
    }

    async fn get_state(&self) -> Result<GameState, ContractError> {
        let raw = self
            .game_reader()
            .get_state()
            .call()
            .await
            .map_err(|e| ContractError::Rpc(e.to_string()))?;
        Ok(GameState::from(raw))
    }

    async fn place_bet(&self, side: CoinSide) -> Result<TxReceipt, ContractError> {
        let game = CoinTossGame::new(self.contract, self.signer()?);
        submit(game.place_bet(side.is_heads())).await
    }

    async fn reset_game(&self) -> Result<TxReceipt, ContractError> {
        let game = CoinTossGame::new(self.contract, self.signer()?);
        submit(game.reset_game()).await
    }

    async fn token_allowance(&self, owner: Address) -> Result<U256, ContractError> {
        self.token_reader()
            .allowance(owner, self.contract)
            .call()
            .await
            .map_err(|e| ContractError::Rpc(e.to_string()))
    }

    async fn approve_token(&self, amount: U256) -> Result<TxReceipt, ContractError> {
        let token = WagerToken::new(self.token, self.signer()?);
        submit(token.approve(self.contract, amount)).await
    }

    async fn token_balance(&self, owner: Address) -> Result<U256, ContractError> {
        self.token_reader()
            .balance_of(owner)
            .call()
            .await
            .map_err(|e| ContractError::Rpc(e.to_string()))
    }

    async fn mint_tokens(&self, to: Address, amount: U256) -> Result<TxReceipt, ContractError> {
        let token = WagerToken::new(self.token, self.signer()?);
        submit(token.mint(to, amount)).await
    }

    async fn latest_block(&self) -> Result<BlockInfo, ContractError> {
        let block = self
            .provider
            .get_block(BlockNumber::Latest)
            .await
            .map_err(|e| ContractError::Rpc(e.to_string()))?
            .ok_or_else(|| ContractError::Rpc("latest block unavailable".to_string()))?;

        Ok(BlockInfo {
            number: block.number.map(|n| n.as_u64()).unwrap_or_default(),
            timestamp: block.timestamp,
            // prevrandao is exposed as mixHash after the merge
            prev_randao: block
                .mix_hash
                .map(|h| U256::from_big_endian(h.as_bytes()))
                .unwrap_or_default(),
        })
    }
}
