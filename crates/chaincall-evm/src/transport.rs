//! The `CallTransport` trait: the collaborator that performs the network
//! side of dispatch.
//!
//! The dispatcher builds payloads synchronously and hands them over here in
//! a single `.await`. Errors come back as [`TransportError`] and are never
//! reinterpreted.

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use chaincall_core::error::TransportError;
use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// A read-only call or gas-estimation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    /// Block tag or number the call executes against (`"latest"`, `"0x10"`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
}

/// Handle for a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    pub hash: B256,
    /// The transaction as it was handed to the transport.
    pub transaction: Transaction,
}

/// Network collaborator used by [`crate::contract::Contract`].
///
/// # Object Safety
/// The trait is object-safe and is stored as `Arc<dyn CallTransport>`.
#[async_trait]
pub trait CallTransport: Send + Sync + 'static {
    /// Execute a call without creating a transaction; returns raw return data.
    async fn static_call(&self, request: CallRequest) -> Result<Bytes, TransportError>;

    /// Sign (or have the node sign) and broadcast a transaction. `from` is
    /// the requested sender, when the caller named one.
    async fn send_transaction(
        &self,
        transaction: Transaction,
        from: Option<Address>,
    ) -> Result<PendingTransaction, TransportError>;

    /// Estimate the gas a call would use.
    async fn estimate_gas(&self, request: CallRequest) -> Result<U256, TransportError>;

    /// Transport identifier for logs.
    fn name(&self) -> &str {
        "transport"
    }
}
