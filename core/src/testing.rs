//! Recording test doubles for the token traits.

use crate::token::{Deployment, TokenClient, TokenError, TokenFactory, TokenMetadata, TxReceipt};
use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    BalanceOf(Address),
    Allowance(Address, Address),
    TotalSupply,
    Metadata,
    Mint(Address, U256),
    Burn(U256),
    Transfer(Address, U256),
    Approve(Address, U256),
    TransferFrom(Address, Address, U256),
}

impl Call {
    fn is_submit(&self) -> bool {
        matches!(
            self,
            Call::Mint(..)
                | Call::Burn(..)
                | Call::Transfer(..)
                | Call::Approve(..)
                | Call::TransferFrom(..)
        )
    }
}

pub fn receipt(success: bool) -> TxReceipt {
    TxReceipt {
        transaction_hash: TxHash::repeat_byte(0xaa),
        block_number: Some(42),
        gas_used: 51_000,
        success,
        contract_address: None,
    }
}

/// In-memory token that records every call made against it.
pub struct MockToken {
    address: Address,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    supply: U256,
    read_error: Option<TokenError>,
    submit_result: Result<TxReceipt, TokenError>,
    calls: Mutex<Vec<Call>>,
}

impl MockToken {
    pub fn at(address: Address) -> Self {
        Self {
            address,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            supply: U256::ZERO,
            read_error: None,
            submit_result: Ok(receipt(true)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_balance(mut self, account: Address, amount: u64) -> Self {
        self.balances.insert(account, U256::from(amount));
        self
    }

    pub fn with_allowance(mut self, owner: Address, spender: Address, amount: u64) -> Self {
        self.allowances.insert((owner, spender), U256::from(amount));
        self
    }

    pub fn with_supply(mut self, supply: U256) -> Self {
        self.supply = supply;
        self
    }

    pub fn with_read_error(mut self, err: TokenError) -> Self {
        self.read_error = Some(err);
        self
    }

    pub fn with_submit_result(mut self, result: Result<TxReceipt, TokenError>) -> Self {
        self.submit_result = result;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submit_count(&self) -> usize {
        self.calls().iter().filter(|c| c.is_submit()).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn read<T>(&self, call: Call, value: T) -> Result<T, TokenError> {
        self.record(call);
        match &self.read_error {
            Some(err) => Err(err.clone()),
            None => Ok(value),
        }
    }

    fn submit(&self, call: Call) -> Result<TxReceipt, TokenError> {
        self.record(call);
        self.submit_result.clone()
    }
}

#[async_trait]
impl TokenClient for MockToken {
    fn address(&self) -> Address {
        self.address
    }

    async fn balance_of(&self, account: Address) -> Result<U256, TokenError> {
        let balance = self.balances.get(&account).copied().unwrap_or_default();
        self.read(Call::BalanceOf(account), balance)
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, TokenError> {
        let allowance = self
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default();
        self.read(Call::Allowance(owner, spender), allowance)
    }

    async fn total_supply(&self) -> Result<U256, TokenError> {
        self.read(Call::TotalSupply, self.supply)
    }

    async fn metadata(&self) -> Result<TokenMetadata, TokenError> {
        let metadata = TokenMetadata {
            name: "CQToken".to_string(),
            symbol: "CQ".to_string(),
            decimals: 18,
            owner: Address::repeat_byte(0x0f),
        };
        self.read(Call::Metadata, metadata)
    }

    async fn mint(&self, to: Address, amount: U256) -> Result<TxReceipt, TokenError> {
        self.submit(Call::Mint(to, amount))
    }

    async fn burn(&self, amount: U256) -> Result<TxReceipt, TokenError> {
        self.submit(Call::Burn(amount))
    }

    async fn transfer(&self, to: Address, amount: U256) -> Result<TxReceipt, TokenError> {
        self.submit(Call::Transfer(to, amount))
    }

    async fn approve(&self, spender: Address, amount: U256) -> Result<TxReceipt, TokenError> {
        self.submit(Call::Approve(spender, amount))
    }

    async fn transfer_from(
        &self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<TxReceipt, TokenError> {
        self.submit(Call::TransferFrom(from, to, amount))
    }
}

/// Factory that hands out pre-registered [`MockToken`]s.
pub struct MockFactory {
    operator: Address,
    deployed: Arc<MockToken>,
    known: HashMap<Address, Arc<MockToken>>,
    deploy_error: Option<TokenError>,
    deploys: Mutex<usize>,
}

impl MockFactory {
    /// `deployed` is what the next `deploy()` produces.
    pub fn new(operator: Address, deployed: Arc<MockToken>) -> Self {
        Self {
            operator,
            deployed,
            known: HashMap::new(),
            deploy_error: None,
            deploys: Mutex::new(0),
        }
    }

    pub fn with_existing(mut self, token: Arc<MockToken>) -> Self {
        self.known.insert(token.address(), token);
        self
    }

    pub fn with_deploy_error(mut self, err: TokenError) -> Self {
        self.deploy_error = Some(err);
        self
    }

    pub fn deploy_count(&self) -> usize {
        *self.deploys.lock().unwrap()
    }
}

#[async_trait]
impl TokenFactory for MockFactory {
    fn operator(&self) -> Address {
        self.operator
    }

    async fn deploy(&self) -> Result<Deployment, TokenError> {
        *self.deploys.lock().unwrap() += 1;
        if let Some(err) = &self.deploy_error {
            return Err(err.clone());
        }
        let mut receipt = receipt(true);
        receipt.contract_address = Some(self.deployed.address());
        Ok(Deployment {
            address: self.deployed.address(),
            receipt,
            client: self.deployed.clone(),
        })
    }

    async fn load(&self, address: Address) -> Result<Arc<dyn TokenClient>, TokenError> {
        match self.known.get(&address) {
            Some(token) => Ok(token.clone() as Arc<dyn TokenClient>),
            None => Err(TokenError::NoContractCode(address)),
        }
    }
}
