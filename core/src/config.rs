use crate::token::RpcSettings;
use config::{Config, ConfigError};
use serde::Deserialize;
use std::time::Duration;

/// Hardhat / Anvil default account #0. Only meaningful on a local dev node.
const DEV_OPERATOR_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

#[derive(Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub rust_log: String,
    pub eth_rpc_url: String,
    pub operator_private_key: String,
    /// Contract to load at startup.
    #[serde(default)]
    pub contract_address: Option<String>,
    /// 0 disables the limit.
    pub rpc_timeout_secs: u64,
    /// 0 waits for a receipt indefinitely.
    pub receipt_timeout_secs: u64,
    pub confirmations: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("server_port", &self.server_port)
            .field("rust_log", &self.rust_log)
            .field("eth_rpc_url", &self.eth_rpc_url)
            .field("operator_private_key", &"<redacted>")
            .field("contract_address", &self.contract_address)
            .field("rpc_timeout_secs", &self.rpc_timeout_secs)
            .field("receipt_timeout_secs", &self.receipt_timeout_secs)
            .field("confirmations", &self.confirmations)
            .finish()
    }
}

impl AppConfig {
    pub fn uses_dev_key(&self) -> bool {
        self.operator_private_key.trim() == DEV_OPERATOR_KEY
    }

    pub fn rpc_settings(&self) -> RpcSettings {
        RpcSettings {
            rpc_url: self.eth_rpc_url.clone(),
            operator_private_key: self.operator_private_key.clone(),
            read_timeout: non_zero_secs(self.rpc_timeout_secs),
            receipt_timeout: non_zero_secs(self.receipt_timeout_secs),
            confirmations: self.confirmations,
        }
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Read configuration from the environment (and `.env`, if present).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    from_source(config::Environment::default().try_parsing(true))
}

fn from_source<S>(source: S) -> Result<AppConfig, ConfigError>
where
    S: config::Source + Send + Sync + 'static,
{
    let settings = Config::builder()
        .add_source(source)
        .set_default("server_port", 8080)?
        .set_default("rust_log", "info")?
        .set_default("eth_rpc_url", "http://127.0.0.1:8545")?
        .set_default("operator_private_key", DEV_OPERATOR_KEY)?
        .set_default("rpc_timeout_secs", 30)?
        .set_default("receipt_timeout_secs", 300)?
        .set_default("confirmations", 1)?
        .build()?;

    settings.try_deserialize()
}
