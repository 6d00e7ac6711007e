//! Service configuration from the environment.

use coin_toss_core::{ChainConfig, ContractError};
use std::path::PathBuf;

pub const DEFAULT_APP_URL: &str = "https://farcaster-toss.vercel.app";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// Public base URL, without trailing slash
    pub app_url: String,
    pub wallet_connect_project_id: Option<String>,
    pub manifest_path: PathBuf,
    pub public_dir: PathBuf,
    pub chain: ChainConfig,
    /// Build a read-only contract client for `/api/game/state`
    pub contract_reads: bool,
    pub hub_url: Option<String>,
}

impl Config {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ContractError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = non_empty("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let app_url = non_empty("APP_URL")
            .or_else(|| non_empty("NEXT_PUBLIC_APP_URL"))
            .unwrap_or_else(|| DEFAULT_APP_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let wallet_connect_project_id = non_empty("WALLETCONNECT_PROJECT_ID")
            .or_else(|| non_empty("NEXT_PUBLIC_WALLET_CONNECT_PROJECT_ID"));

        Ok(Self {
            port,
            app_url,
            wallet_connect_project_id,
            manifest_path: non_empty("MANIFEST_PATH")
                .unwrap_or_else(|| ".well-known/farcaster".to_string())
                .into(),
            public_dir: non_empty("PUBLIC_DIR")
                .unwrap_or_else(|| "public".to_string())
                .into(),
            chain: ChainConfig::from_lookup(&non_empty)?,
            contract_reads: non_empty("ENABLE_CONTRACT").as_deref() == Some("1"),
            hub_url: non_empty("FARCASTER_HUB_URL").map(|s| s.trim_end_matches('/').to_string()),
        })
    }

    pub fn from_env() -> Result<Self, ContractError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Absolute URL for a path on this service
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.app_url, path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            app_url: DEFAULT_APP_URL.to_string(),
            wallet_connect_project_id: None,
            manifest_path: PathBuf::from(".well-known/farcaster"),
            public_dir: PathBuf::from("public"),
            chain: ChainConfig::default(),
            contract_reads: false,
            hub_url: None,
        }
    }
}
