use super::{Deployment, TokenClient, TokenError, TokenFactory, TokenMetadata, TxReceipt};
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::providers::{
    DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder, SendableTx,
};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::sol;
use alloy::transports::TransportError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

// ── Contract bindings ─────────────────────────────────────────────────────────

sol! {
    #[sol(rpc)]
    contract ERC20Test {
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function owner() external view returns (address);
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function mint(address to, uint256 amount) external;
        function burn(uint256 amount) external;
        function transfer(address to, uint256 value) external returns (bool);
        function approve(address spender, uint256 value) external returns (bool);
        function transferFrom(address from, address to, uint256 value) external returns (bool);
    }
}

/// Creation bytecode of the fixed token contract, hex encoded.
const CREATION_BYTECODE: &str = include_str!("../../../contracts/erc20_test/ERC20Test.bin");

// ── Settings ──────────────────────────────────────────────────────────────────

/// Connection settings for the JSON-RPC endpoint and the operator identity.
#[derive(Debug, Clone)]
pub struct RpcSettings {
    pub rpc_url: String,
    /// Hex-encoded secp256k1 key that signs every transaction.
    pub operator_private_key: String,
    /// Upper bound for a single read or submission. `None` waits forever.
    pub read_timeout: Option<Duration>,
    /// Upper bound for waiting on a receipt. `None` waits forever.
    pub receipt_timeout: Option<Duration>,
    pub confirmations: u64,
}

#[derive(Debug, Clone, Copy)]
struct Waits {
    read: Option<Duration>,
    receipt: Option<Duration>,
    confirmations: u64,
}

// ── Factory ───────────────────────────────────────────────────────────────────

/// Deploys and attaches to `ERC20Test` contracts through an alloy provider.
pub struct AlloyTokenFactory {
    provider: DynProvider,
    operator: Address,
    waits: Waits,
}

impl AlloyTokenFactory {
    /// Build a provider for `settings.rpc_url` that signs with the operator key.
    ///
    /// No network request is made here; an unreachable node surfaces on the
    /// first call.
    pub fn connect(settings: &RpcSettings) -> Result<Self, TokenError> {
        let signer: PrivateKeySigner = settings
            .operator_private_key
            .trim()
            .parse()
            .map_err(|e| TokenError::InvalidSettings(format!("operator key: {e}")))?;
        let operator = signer.address();

        let url: Url = settings
            .rpc_url
            .parse()
            .map_err(|e| TokenError::InvalidSettings(format!("rpc url: {e}")))?;

        let provider = ProviderBuilder::new()
            .wallet(signer)
            .connect_http(url)
            .erased();

        Ok(Self {
            provider,
            operator,
            waits: Waits {
                read: settings.read_timeout,
                receipt: settings.receipt_timeout,
                confirmations: settings.confirmations.max(1),
            },
        })
    }

    /// Bind a client to `address` without checking that code exists there.
    pub fn attach(&self, address: Address) -> AlloyTokenClient {
        AlloyTokenClient {
            contract: ERC20Test::new(address, self.provider.clone()),
            operator: self.operator,
            waits: self.waits,
        }
    }
}

#[async_trait]
impl TokenFactory for AlloyTokenFactory {
    fn operator(&self) -> Address {
        self.operator
    }

    async fn deploy(&self) -> Result<Deployment, TokenError> {
        let code = creation_code()?;
        tracing::info!(operator = %self.operator, "Deploying ERC20Test contract");

        let tx = TransactionRequest::default()
            .with_from(self.operator)
            .with_deploy_code(code);
        let receipt = submit(&self.provider, tx, self.waits).await?;

        if !receipt.success {
            return Err(TokenError::DeploymentFailed {
                reason: format!("transaction failed with status {}", receipt.status_code()),
                tx_hash: Some(receipt.transaction_hash),
            });
        }
        let address = receipt
            .contract_address
            .ok_or_else(|| TokenError::DeploymentFailed {
                reason: "receipt carries no contract address".to_string(),
                tx_hash: Some(receipt.transaction_hash),
            })?;

        tracing::info!(%address, tx_hash = %receipt.transaction_hash, "ERC20Test contract deployed");
        Ok(Deployment {
            address,
            receipt,
            client: Arc::new(self.attach(address)),
        })
    }

    async fn load(&self, address: Address) -> Result<Arc<dyn TokenClient>, TokenError> {
        tracing::info!(%address, "Loading ERC20Test contract");
        let code = within(self.waits.read, async {
            self.provider.get_code_at(address).await.map_err(classify_rpc)
        })
        .await?;

        if code.is_empty() {
            return Err(TokenError::NoContractCode(address));
        }
        Ok(Arc::new(self.attach(address)))
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// [`TokenClient`] backed by `sol!` bindings over a shared provider.
pub struct AlloyTokenClient {
    contract: ERC20Test::ERC20TestInstance<DynProvider>,
    operator: Address,
    waits: Waits,
}

impl AlloyTokenClient {
    async fn send(&self, tx: TransactionRequest) -> Result<TxReceipt, TokenError> {
        submit(self.contract.provider(), tx.with_from(self.operator), self.waits).await
    }
}

#[async_trait]
impl TokenClient for AlloyTokenClient {
    fn address(&self) -> Address {
        *self.contract.address()
    }

    async fn balance_of(&self, account: Address) -> Result<U256, TokenError> {
        let call = self.contract.balanceOf(account);
        within(self.waits.read, async { call.call().await.map_err(classify_call) }).await
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, TokenError> {
        let call = self.contract.allowance(owner, spender);
        within(self.waits.read, async { call.call().await.map_err(classify_call) }).await
    }

    async fn total_supply(&self) -> Result<U256, TokenError> {
        let call = self.contract.totalSupply();
        within(self.waits.read, async { call.call().await.map_err(classify_call) }).await
    }

    async fn metadata(&self) -> Result<TokenMetadata, TokenError> {
        let name = self.contract.name();
        let symbol = self.contract.symbol();
        let decimals = self.contract.decimals();
        let owner = self.contract.owner();

        within(self.waits.read, async {
            Ok(TokenMetadata {
                name: name.call().await.map_err(classify_call)?,
                symbol: symbol.call().await.map_err(classify_call)?,
                decimals: decimals.call().await.map_err(classify_call)?,
                owner: owner.call().await.map_err(classify_call)?,
            })
        })
        .await
    }

    async fn mint(&self, to: Address, amount: U256) -> Result<TxReceipt, TokenError> {
        self.send(self.contract.mint(to, amount).into_transaction_request())
            .await
    }

    async fn burn(&self, amount: U256) -> Result<TxReceipt, TokenError> {
        self.send(self.contract.burn(amount).into_transaction_request())
            .await
    }

    async fn transfer(&self, to: Address, amount: U256) -> Result<TxReceipt, TokenError> {
        self.send(self.contract.transfer(to, amount).into_transaction_request())
            .await
    }

    async fn approve(&self, spender: Address, amount: U256) -> Result<TxReceipt, TokenError> {
        self.send(self.contract.approve(spender, amount).into_transaction_request())
            .await
    }

    async fn transfer_from(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TxReceipt, TokenError> {
        self.send(
            self.contract
                .transferFrom(from, to, amount)
                .into_transaction_request(),
        )
        .await
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn creation_code() -> Result<Bytes, TokenError> {
    let raw = CREATION_BYTECODE.trim();
    let raw = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(raw)
        .map(Bytes::from)
        .map_err(|e| TokenError::DeploymentFailed {
            reason: format!("invalid creation bytecode: {e}"),
            tx_hash: None,
        })
}

/// Submit `tx` and block until its receipt is available.
///
/// The request is filled and signed before anything is broadcast, so every
/// failure after that point carries the transaction hash.
async fn submit(
    provider: &DynProvider,
    tx: TransactionRequest,
    waits: Waits,
) -> Result<TxReceipt, TokenError> {
    let filled = within(waits.read, async {
        provider.fill(tx).await.map_err(classify_rpc)
    })
    .await?;
    let envelope = match filled {
        SendableTx::Envelope(envelope) => envelope,
        SendableTx::Builder(_) => {
            return Err(TokenError::InvalidSettings(
                "provider did not sign the transaction".to_string(),
            ))
        }
    };

    let tx_hash = *envelope.tx_hash();
    tracing::debug!(%tx_hash, "Broadcasting signed transaction");
    let pending = broadcast(tx_hash, waits.read, async {
        provider.send_tx_envelope(envelope).await.map_err(classify_rpc)
    })
    .await?;
    await_receipt(pending, waits).await
}

/// Like [`within`], but a timeout reports `tx_hash`: the node may already
/// hold the signed transaction.
async fn broadcast<T, F>(tx_hash: TxHash, limit: Option<Duration>, fut: F) -> Result<T, TokenError>
where
    F: Future<Output = Result<T, TokenError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| TokenError::ReceiptTimeout { tx_hash })?,
        None => fut.await,
    }
}

async fn await_receipt(
    pending: PendingTransactionBuilder<alloy::network::Ethereum>,
    waits: Waits,
) -> Result<TxReceipt, TokenError> {
    let tx_hash = *pending.tx_hash();
    tracing::debug!(%tx_hash, confirmations = waits.confirmations, "Waiting for receipt");

    let wait = pending
        .with_required_confirmations(waits.confirmations)
        .get_receipt();
    let receipt = match waits.receipt {
        Some(limit) => tokio::time::timeout(limit, wait)
            .await
            .map_err(|_| TokenError::ReceiptTimeout { tx_hash })?,
        None => wait.await,
    }
    .map_err(|e| TokenError::Transport(e.to_string()))?;

    Ok(TxReceipt::from(&receipt))
}

async fn within<T, F>(limit: Option<Duration>, fut: F) -> Result<T, TokenError>
where
    F: Future<Output = Result<T, TokenError>>,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| TokenError::Timeout)?,
        None => fut.await,
    }
}

impl From<&TransactionReceipt> for TxReceipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            success: receipt.status(),
            contract_address: receipt.contract_address,
        }
    }
}

fn is_revert_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("revert") || lower.contains("invalid opcode")
}

fn classify_rpc(err: TransportError) -> TokenError {
    if let Some(payload) = err.as_error_resp() {
        if is_revert_message(&payload.message) {
            return TokenError::Reverted {
                reason: payload.message.to_string(),
            };
        }
    }
    TokenError::Transport(err.to_string())
}

fn classify_call(err: alloy::contract::Error) -> TokenError {
    match err {
        alloy::contract::Error::TransportError(e) => classify_rpc(e),
        other => TokenError::Transport(other.to_string()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
