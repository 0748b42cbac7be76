//! HTTP gateway for deploying and operating a fixed ERC-20 token contract.
//!
//! Requests flow `api` → [`transfer`] (for guarded `transferFrom`) →
//! [`token::TokenClient`] → JSON-RPC node. The contract that requests talk to
//! lives in a [`session::SessionStore`] and is switched by deploy/load.

pub mod api;
pub mod config;
pub mod errors;
pub mod parser;
pub mod session;
pub mod token;
pub mod transfer;

#[cfg(test)]
pub(crate) mod testing;
