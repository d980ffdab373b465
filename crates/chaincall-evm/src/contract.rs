//! Method dispatch against a deployed contract.
//!
//! ```ignore
//! let token = Contract::new(address, registry, transport);
//! let balance = token.method("balanceOf")?.static_call(args![holder], &CallOverrides::default()).await?;
//! let tx = token.method("transfer(address,uint256)")?
//!     .populate_transaction(args![to, 1_000u64], &CallOverrides::default().with_nonce(7))?;
//! ```
//!
//! Every operation resolves the method and encodes the call data before the
//! transport is touched, so resolution and encoding errors never reach the
//! network.

use alloy_primitives::{Address, Bytes, U256};
use chaincall_core::{
    error::{CodecError, DispatchError, ResolveError},
    fragment::Fragment,
    selector::selector_hex,
    typed::Arg,
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::{
    call_decoder::DecodedValues,
    coder::AbiCoder,
    config::DispatchConfig,
    registry::MethodRegistry,
    resolver,
    transaction::{Transaction, TxType},
    transport::{CallRequest, CallTransport, PendingTransaction},
};

/// Per-call overrides for sender, value, gas and fee fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallOverrides {
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default)]
    pub value: Option<U256>,
    #[serde(default)]
    pub gas_limit: Option<u64>,
    #[serde(default)]
    pub nonce: Option<u64>,
    #[serde(default)]
    pub gas_price: Option<u128>,
    #[serde(default)]
    pub max_fee_per_gas: Option<u128>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<u128>,
    /// Block tag for static calls; defaults to the contract's configured block
    #[serde(default)]
    pub block: Option<String>,
}

impl CallOverrides {
    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    pub fn with_value(mut self, value: impl Into<U256>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn with_gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn with_fees(mut self, max_fee_per_gas: u128, max_priority_fee_per_gas: u128) -> Self {
        self.max_fee_per_gas = Some(max_fee_per_gas);
        self.max_priority_fee_per_gas = Some(max_priority_fee_per_gas);
        self
    }

    pub fn at_block(mut self, block: impl Into<String>) -> Self {
        self.block = Some(block.into());
        self
    }

    fn carries_value(&self) -> bool {
        self.value.is_some_and(|v| !v.is_zero())
    }

    fn has_fee_market_fields(&self) -> bool {
        self.max_fee_per_gas.is_some() || self.max_priority_fee_per_gas.is_some()
    }
}

/// Result of [`MethodDescriptor::call`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// A view/pure method was executed statically.
    Returned(Option<Value>),
    /// A mutating method was submitted.
    Submitted(PendingTransaction),
}

/// A deployed contract: an address, its ABI, and the transport used to
/// reach it.
#[derive(Clone)]
pub struct Contract {
    address: Address,
    registry: Arc<MethodRegistry>,
    transport: Arc<dyn CallTransport>,
    config: DispatchConfig,
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("address", &self.address)
            .field("functions", &self.registry.len())
            .field("transport", &self.transport.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Contract {
    pub fn new(
        address: Address,
        registry: Arc<MethodRegistry>,
        transport: Arc<dyn CallTransport>,
    ) -> Self {
        Self {
            address,
            registry,
            transport,
            config: DispatchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Look a method up by bare name or full signature.
    ///
    /// Fails `NoSuchMethod` when neither matches. Overloads are not chosen
    /// here; that happens per operation, once the arguments are known.
    pub fn method(&self, key: &str) -> Result<MethodDescriptor<'_>, ResolveError> {
        resolver::lookup(&self.registry, key)?;
        Ok(MethodDescriptor {
            contract: self,
            key: key.to_string(),
        })
    }
}

/// One method of a [`Contract`], with its execution modes.
#[derive(Debug, Clone)]
pub struct MethodDescriptor<'a> {
    contract: &'a Contract,
    key: String,
}

/// Resolved fragment plus encoded call data.
struct Prepared {
    fragment: Arc<Fragment>,
    data: Bytes,
}

impl MethodDescriptor<'_> {
    /// The key this descriptor was looked up with.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The fragment `args` resolve to.
    pub fn fragment(&self, args: &[Arg]) -> Result<Arc<Fragment>, DispatchError> {
        Ok(resolver::select(&self.contract.registry, &self.key, args)?)
    }

    /// Raw call data: selector followed by the ABI-encoded arguments.
    pub fn encode(&self, args: Vec<Arg>) -> Result<Bytes, DispatchError> {
        Ok(self.prepare("encode", args, &CallOverrides::default())?.data)
    }

    /// Default action: static call for view/pure methods, otherwise send.
    pub async fn call(
        &self,
        args: Vec<Arg>,
        overrides: &CallOverrides,
    ) -> Result<CallOutcome, DispatchError> {
        let prepared = self.prepare("call", args, overrides)?;
        if prepared.fragment.is_constant() {
            let output = self.execute_static(prepared, overrides).await?;
            Ok(CallOutcome::Returned(output.into_value()))
        } else {
            let pending = self.submit(prepared, overrides).await?;
            Ok(CallOutcome::Submitted(pending))
        }
    }

    /// Static call returning every named output.
    pub async fn static_call_result(
        &self,
        args: Vec<Arg>,
        overrides: &CallOverrides,
    ) -> Result<DecodedValues, DispatchError> {
        let prepared = self.prepare("static_call", args, overrides)?;
        self.execute_static(prepared, overrides).await
    }

    /// Static call returning the destructured output: `None` without
    /// outputs, the value for one, a tuple for several.
    pub async fn static_call(
        &self,
        args: Vec<Arg>,
        overrides: &CallOverrides,
    ) -> Result<Option<Value>, DispatchError> {
        Ok(self.static_call_result(args, overrides).await?.into_value())
    }

    /// Build a transaction and hand it to the transport for submission.
    pub async fn send(
        &self,
        args: Vec<Arg>,
        overrides: &CallOverrides,
    ) -> Result<PendingTransaction, DispatchError> {
        let prepared = self.prepare("send", args, overrides)?;
        self.submit(prepared, overrides).await
    }

    /// Ask the transport for a gas estimate. Nothing is submitted.
    pub async fn estimate_gas(
        &self,
        args: Vec<Arg>,
        overrides: &CallOverrides,
    ) -> Result<U256, DispatchError> {
        let prepared = self.prepare("estimate_gas", args, overrides)?;
        let request = self.call_request(prepared.data, overrides);
        Ok(self.contract.transport.estimate_gas(request).await?)
    }

    /// Build the unsigned transaction `send` would submit. No I/O.
    pub fn populate_transaction(
        &self,
        args: Vec<Arg>,
        overrides: &CallOverrides,
    ) -> Result<Transaction, DispatchError> {
        let prepared = self.prepare("populate_transaction", args, overrides)?;
        self.build_transaction(prepared.data, overrides)
    }

    fn prepare(
        &self,
        mode: &'static str,
        args: Vec<Arg>,
        overrides: &CallOverrides,
    ) -> Result<Prepared, DispatchError> {
        let call = resolver::resolve(&self.contract.registry, &self.key, args)?;
        if overrides.carries_value() && !call.fragment.is_payable() {
            return Err(DispatchError::NonPayableValue {
                signature: call.signature(),
            });
        }
        let data = AbiCoder::shared().encode_call(&call)?;
        debug!(
            mode,
            signature = %call.signature(),
            selector = %selector_hex(call.fragment.selector()),
            contract = %self.contract.address,
            "dispatch"
        );
        Ok(Prepared {
            fragment: call.fragment,
            data,
        })
    }

    async fn execute_static(
        &self,
        prepared: Prepared,
        overrides: &CallOverrides,
    ) -> Result<DecodedValues, DispatchError> {
        let request = self.call_request(prepared.data, overrides);
        let returned = self.contract.transport.static_call(request).await?;
        let fragment = prepared.fragment;

        if returned.is_empty() && !fragment.outputs.is_empty() {
            return Err(DispatchError::Decode {
                signature: fragment.signature(),
                reason: "call returned no data".into(),
            });
        }
        AbiCoder::shared()
            .decode_output(&fragment, &returned)
            .map_err(|e| DispatchError::Decode {
                signature: fragment.signature(),
                reason: e.to_string(),
            })
    }

    async fn submit(
        &self,
        prepared: Prepared,
        overrides: &CallOverrides,
    ) -> Result<PendingTransaction, DispatchError> {
        let tx = self.build_transaction(prepared.data, overrides)?;
        let from = overrides.from.or(self.contract.config.from);
        Ok(self.contract.transport.send_transaction(tx, from).await?)
    }

    fn call_request(&self, data: Bytes, overrides: &CallOverrides) -> CallRequest {
        let config = &self.contract.config;
        CallRequest {
            from: overrides.from.or(config.from),
            to: self.contract.address,
            data,
            value: overrides.value,
            gas: overrides.gas_limit,
            block: Some(overrides.block.clone().unwrap_or_else(|| config.block.clone())),
        }
    }

    fn build_transaction(
        &self,
        data: Bytes,
        overrides: &CallOverrides,
    ) -> Result<Transaction, DispatchError> {
        let config = &self.contract.config;
        if config.tx_type == TxType::Blob {
            return Err(CodecError::transaction(
                "blob transactions need blob hashes and cannot be populated from a call",
            )
            .into());
        }
        // An explicit fee style picks the envelope that can carry it.
        let tx_type = match (overrides.gas_price.is_some(), overrides.has_fee_market_fields()) {
            (true, true) => {
                return Err(CodecError::transaction(
                    "gasPrice cannot be combined with maxFeePerGas / maxPriorityFeePerGas",
                )
                .into())
            }
            (true, false) if config.tx_type == TxType::DynamicFee => TxType::Legacy,
            (false, true) if matches!(config.tx_type, TxType::Legacy | TxType::AccessList) => {
                TxType::DynamicFee
            }
            _ => config.tx_type,
        };

        let mut tx = Transaction::new(tx_type);
        tx.chain_id = Some(config.chain_id);
        tx.nonce = overrides.nonce;
        tx.gas_limit = overrides.gas_limit;
        tx.to = Some(self.contract.address);
        tx.value = overrides.value.unwrap_or_default();
        tx.data = data;
        match tx_type {
            TxType::Legacy => tx.gas_price = overrides.gas_price,
            TxType::AccessList => tx.gas_price = overrides.gas_price,
            TxType::DynamicFee | TxType::Blob => {
                tx.max_fee_per_gas = overrides.max_fee_per_gas;
                tx.max_priority_fee_per_gas = overrides.max_priority_fee_per_gas;
            }
        }
        Ok(tx)
    }
}
