use crate::token::{TokenClient, TokenError, TxReceipt};
use alloy::primitives::{Address, TxHash, U256};
use thiserror::Error;

/// Why a guarded `transferFrom` did not complete.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("Insufficient balance in from address. Balance: {observed}, required: {required}")]
    InsufficientBalance { observed: U256, required: U256 },

    #[error("Insufficient allowance. Current: {observed}, required: {required}")]
    InsufficientAllowance { observed: U256, required: U256 },

    #[error("TransferFrom execution failed{}{}{}",
        .status.as_ref().map(|s| format!(" with status {s}")).unwrap_or_default(),
        .tx_hash.as_ref().map(|h| format!(" (tx {h})")).unwrap_or_default(),
        .reason.as_ref().map(|r| format!(": {r}")).unwrap_or_default())]
    ExecutionFailed {
        status: Option<String>,
        tx_hash: Option<TxHash>,
        reason: Option<String>,
    },

    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Third-party transfer that checks balance and allowance before submitting.
///
/// The steps run strictly in order and stop at the first failure:
/// 1. `from` must hold at least `amount`;
/// 2. `from` must have approved at least `amount` to `spender`;
/// 3. `transferFrom(from, to, amount)` is submitted and its receipt awaited;
/// 4. a receipt with failing status is reported as `ExecutionFailed`.
///
/// The checks are point-in-time reads. Another transaction can consume the
/// balance or allowance between the check and inclusion, in which case the
/// contract rejects the transfer and that rejection is returned as
/// `ExecutionFailed`.
pub async fn guarded_transfer_from(
    client: &dyn TokenClient,
    from: Address,
    to: Address,
    amount: U256,
    spender: Address,
) -> Result<TxReceipt, TransferError> {
    tracing::info!(%from, %to, %amount, %spender, "Starting transferFrom");

    let balance = client.balance_of(from).await?;
    tracing::debug!(%from, %balance, "From address balance");
    if balance < amount {
        return Err(TransferError::InsufficientBalance {
            observed: balance,
            required: amount,
        });
    }

    let allowance = client.allowance(from, spender).await?;
    tracing::debug!(%spender, %allowance, "Current allowance");
    if allowance < amount {
        return Err(TransferError::InsufficientAllowance {
            observed: allowance,
            required: amount,
        });
    }

    let receipt = match client.transfer_from(from, to, amount).await {
        Ok(receipt) => receipt,
        Err(TokenError::Reverted { reason }) => {
            tracing::warn!(%from, %to, %amount, %reason, "transferFrom reverted");
            return Err(TransferError::ExecutionFailed {
                status: None,
                tx_hash: None,
                reason: Some(reason),
            });
        }
        Err(e) => return Err(e.into()),
    };

    if !receipt.success {
        tracing::warn!(
            tx_hash = %receipt.transaction_hash,
            status = receipt.status_code(),
            "transferFrom transaction failed"
        );
        return Err(TransferError::ExecutionFailed {
            status: Some(receipt.status_code().to_string()),
            tx_hash: Some(receipt.transaction_hash),
            reason: None,
        });
    }

    tracing::info!(tx_hash = %receipt.transaction_hash, "TransferFrom successful");
    Ok(receipt)
}
