//! Chain endpoints and deployed contract addresses.

use crate::contract::ContractError;
use ethers::types::Address;

pub const DEFAULT_RPC_URL: &str = "https://base-sepolia.publicnode.com";
/// Base Sepolia
pub const DEFAULT_CHAIN_ID: u64 = 84532;
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x34A9785D18e9a15d2d60C2ac99D3535041111A56";
pub const DEFAULT_TOKEN_ADDRESS: &str = "0xEF37f57D8a64Fd6EdF2184Ad4b2c4Cd718ec4538";
pub const DEFAULT_OWNER_ADDRESS: &str = "0xe6DE23FF0664F79F38dC068147CFE15c61755f3c";
pub const EXPLORER_TX_URL: &str = "https://sepolia.basescan.org/tx/";

/// Where the game lives on chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub contract: Address,
    pub token: Address,
    pub owner: Address,
}

impl ChainConfig {
    /// Read `RPC_URL`, `CHAIN_ID`, `CONTRACT_ADDRESS`, `TOKEN_ADDRESS` and
    /// `CONTRACT_OWNER` through `lookup`, falling back to the Base Sepolia
    /// deployment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ContractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_url = lookup("RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let chain_id = lookup("CHAIN_ID")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_CHAIN_ID);
        let contract = parse_address(
            &lookup("CONTRACT_ADDRESS").unwrap_or_else(|| DEFAULT_CONTRACT_ADDRESS.to_string()),
        )?;
        let token = parse_address(
            &lookup("TOKEN_ADDRESS").unwrap_or_else(|| DEFAULT_TOKEN_ADDRESS.to_string()),
        )?;
        let owner = parse_address(
            &lookup("CONTRACT_OWNER").unwrap_or_else(|| DEFAULT_OWNER_ADDRESS.to_string()),
        )?;

        Ok(Self {
            rpc_url,
            chain_id,
            contract,
            token,
            owner,
        })
    }

    pub fn from_env() -> Result<Self, ContractError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None).unwrap_or_else(|_| Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            contract: Address::zero(),
            token: Address::zero(),
            owner: Address::zero(),
        })
    }
}

/// Parse a hex address, with or without `0x`, any case
pub fn parse_address(s: &str) -> Result<Address, ContractError> {
    s.trim()
        .parse::<Address>()
        .map_err(|_| ContractError::InvalidAddress(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ChainConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.chain_id, 84532);
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(
            config.owner,
            parse_address("0xe6de23ff0664f79f38dc068147cfe15c61755f3c").unwrap()
        );
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RPC_URL", "http://localhost:8545"),
            ("CHAIN_ID", "31337"),
            ("CONTRACT_ADDRESS", "0x0000000000000000000000000000000000000001"),
        ]
        .into_iter()
        .collect();
        let config = ChainConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.chain_id, 31337);
        assert_eq!(config.contract, Address::from_low_u64_be(1));
    }

    #[test]
    fn test_invalid_address() {
        let result = ChainConfig::from_lookup(|k| (k == "TOKEN_ADDRESS").then(|| "nope".to_string()));
        assert!(matches!(result, Err(ContractError::InvalidAddress(_))));
    }
}
