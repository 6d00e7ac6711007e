//! Shared application state.

use coin_toss_core::{RpcTossContract, TossContract};
use reqwest::Client;
use std::sync::Arc;

use crate::config::Config;
use crate::validate::{HubValidator, MessageValidator, PresenceValidator};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Read-only contract client for `/api/game/state`
    pub contract: Option<Arc<dyn TossContract>>,
    pub validator: Arc<dyn MessageValidator>,
    /// Outbound client for URL diagnostics
    pub http: Client,
}

impl AppState {
    /// State without a contract client and with presence-only validation
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            contract: None,
            validator: Arc::new(PresenceValidator),
            http: Client::new(),
        }
    }

    /// Build the optional clients the configuration asks for
    pub fn from_config(config: Config) -> Self {
        let http = Client::new();

        let contract: Option<Arc<dyn TossContract>> = if config.contract_reads {
            tracing::info!(
                "Contract reads enabled: {:#x} via {}",
                config.chain.contract,
                config.chain.rpc_url
            );
            match RpcTossContract::new(&config.chain) {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    tracing::error!("Failed to build contract client: {}", e);
                    None
                }
            }
        } else {
            tracing::info!("Contract reads not configured (set ENABLE_CONTRACT=1 to enable)");
            None
        };

        let validator: Arc<dyn MessageValidator> = match &config.hub_url {
            Some(url) => {
                tracing::info!("Hub message validation enabled: {}", url);
                Arc::new(HubValidator::with_client(http.clone(), url.clone()))
            }
            None => {
                tracing::info!(
                    "Hub validation not configured (set FARCASTER_HUB_URL to enable)"
                );
                Arc::new(PresenceValidator)
            }
        };

        Self {
            config: Arc::new(config),
            contract,
            validator,
            http,
        }
    }

    pub fn with_contract(mut self, contract: Arc<dyn TossContract>) -> Self {
        self.contract = Some(contract);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn MessageValidator>) -> Self {
        self.validator = validator;
        self
    }
}
