use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

pub mod erc20;

pub use erc20::{AlloyTokenFactory, RpcSettings};

/// Errors raised by a token client or factory.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("Contract not deployed or loaded")]
    ContractNotReady,

    #[error("RPC request failed: {0}")]
    Transport(String),

    #[error("Execution reverted: {reason}")]
    Reverted { reason: String },

    #[error("RPC node timeout")]
    Timeout,

    #[error("Transaction {tx_hash} was submitted but no receipt arrived in time")]
    ReceiptTimeout { tx_hash: TxHash },

    #[error("No contract code at address {0}")]
    NoContractCode(Address),

    #[error("Deployment failed: {reason}")]
    DeploymentFailed {
        reason: String,
        tx_hash: Option<TxHash>,
    },

    #[error("Invalid client settings: {0}")]
    InvalidSettings(String),
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// `true` when the receipt status is 1.
    pub success: bool,
    /// Set for contract-creation transactions.
    pub contract_address: Option<Address>,
}

impl TxReceipt {
    /// Receipt status as rendered by Ethereum JSON-RPC (`0x1` / `0x0`).
    pub fn status_code(&self) -> &'static str {
        if self.success {
            "0x1"
        } else {
            "0x0"
        }
    }
}

/// Static token information read from the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub owner: Address,
}

/// Result of deploying a fresh token contract.
#[derive(Clone)]
pub struct Deployment {
    pub address: Address,
    pub receipt: TxReceipt,
    /// Client already bound to the new contract.
    pub client: Arc<dyn TokenClient>,
}

/// Typed client bound to a single deployed token contract.
///
/// View methods read current chain state. Transaction methods submit a
/// transaction signed by the operator and wait until its receipt is
/// available; they never return before the transaction is mined.
#[async_trait]
pub trait TokenClient: Send + Sync {
    fn address(&self) -> Address;

    async fn balance_of(&self, account: Address) -> Result<U256, TokenError>;

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, TokenError>;

    async fn total_supply(&self) -> Result<U256, TokenError>;

    async fn metadata(&self) -> Result<TokenMetadata, TokenError>;

    async fn mint(&self, to: Address, amount: U256) -> Result<TxReceipt, TokenError>;

    /// Burns `amount` from the operator's own balance.
    async fn burn(&self, amount: U256) -> Result<TxReceipt, TokenError>;

    async fn transfer(&self, to: Address, amount: U256) -> Result<TxReceipt, TokenError>;

    async fn approve(&self, spender: Address, amount: U256) -> Result<TxReceipt, TokenError>;

    async fn transfer_from(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TxReceipt, TokenError>;
}

/// Creates token clients: either by deploying the fixed contract or by
/// attaching to an existing deployment.
#[async_trait]
pub trait TokenFactory: Send + Sync {
    /// Identity that signs every submitted transaction.
    fn operator(&self) -> Address;

    async fn deploy(&self) -> Result<Deployment, TokenError>;

    async fn load(&self, address: Address) -> Result<Arc<dyn TokenClient>, TokenError>;
}
