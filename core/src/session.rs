use crate::token::{TokenClient, TokenError};
use alloy::primitives::Address;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A contract instance together with the client bound to it.
#[derive(Clone)]
pub struct TokenSession {
    pub address: Address,
    pub client: Arc<dyn TokenClient>,
}

impl TokenSession {
    pub fn new(client: Arc<dyn TokenClient>) -> Self {
        Self {
            address: client.address(),
            client,
        }
    }
}

impl std::fmt::Debug for TokenSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSession")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Holds the session that requests without an explicit contract talk to.
///
/// Handlers take one snapshot via [`SessionStore::current`] and use it for the
/// whole request, so a concurrent deploy or load never switches the contract
/// underneath an in-flight operation.
#[derive(Default)]
pub struct SessionStore {
    current: RwLock<Option<TokenSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current session, or `ContractNotReady`.
    pub async fn current(&self) -> Result<TokenSession, TokenError> {
        self.current
            .read()
            .await
            .clone()
            .ok_or(TokenError::ContractNotReady)
    }

    pub async fn current_address(&self) -> Option<Address> {
        self.current.read().await.as_ref().map(|s| s.address)
    }

    /// Make `session` current. Returns the previously current address, if any.
    pub async fn replace(&self, session: TokenSession) -> Option<Address> {
        let mut current = self.current.write().await;
        let previous = current.as_ref().map(|s| s.address);
        tracing::info!(
            address = %session.address,
            previous = ?previous,
            "Switched current token contract"
        );
        *current = Some(session);
        previous
    }
}
