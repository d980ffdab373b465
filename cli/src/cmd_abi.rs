//! `selector`, `normalize`, `resolve`, `encode-call`, `decode-call` and
//! `populate`.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chaincall_core::{
    error::TransportError,
    fragment::Fragment,
    normalize_signature, selector_hex,
    typed::{Arg, TypedValue},
    value::{parse_address, parse_unsigned, Value},
};
use chaincall_evm::{
    decode_call as decode_calldata, resolve as resolve_call, AbiCoder, CallOverrides, CallRequest,
    CallTransport, Contract, DispatchConfig, MethodRegistry, PendingTransaction, Transaction,
};
use clap::Args;

/// ABI file, method key and arguments shared by several commands.
#[derive(Args)]
pub struct CallArgs {
    /// Path to the ABI JSON file (array, or artifact with an "abi" key)
    #[arg(long)]
    pub abi: String,
    /// Bare method name or full signature
    #[arg(long)]
    pub method: String,
    /// JSON array of arguments, e.g. '["0xd8dA...", "1000000"]'
    #[arg(long, default_value = "[]")]
    pub args: String,
    /// JSON array of explicit argument types; null leaves an argument untyped,
    /// e.g. '["uint160", null]'
    #[arg(long)]
    pub types: Option<String>,
}

pub struct PopulateOverrides {
    pub nonce: Option<u64>,
    pub gas_limit: Option<u64>,
    pub value: Option<String>,
}

/// Transport for commands that must never reach a node.
struct OfflineTransport;

#[async_trait]
impl CallTransport for OfflineTransport {
    async fn static_call(&self, _request: CallRequest) -> Result<Bytes, TransportError> {
        Err(offline())
    }

    async fn send_transaction(
        &self,
        _transaction: Transaction,
        _from: Option<Address>,
    ) -> Result<PendingTransaction, TransportError> {
        Err(offline())
    }

    async fn estimate_gas(&self, _request: CallRequest) -> Result<U256, TransportError> {
        Err(offline())
    }

    fn name(&self) -> &str {
        "offline"
    }
}

fn offline() -> TransportError {
    TransportError::Other("the CLI has no network transport".into())
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn load_registry(path: &str) -> Result<MethodRegistry> {
    let json = std::fs::read_to_string(path).with_context(|| format!("read ABI file '{path}'"))?;
    let registry = MethodRegistry::from_json(&json).with_context(|| format!("parse ABI file '{path}'"))?;
    tracing::debug!(path, bytes = json.len(), "ABI loaded");
    Ok(registry)
}

fn build_args(args_json: &str, types_json: Option<&str>) -> Result<Vec<Arg>> {
    let args: Vec<serde_json::Value> = serde_json::from_str(args_json).context("parse args JSON")?;
    let types: Vec<Option<String>> = match types_json {
        Some(t) => serde_json::from_str(t).context("parse types JSON")?,
        None => vec![None; args.len()],
    };
    if types.len() != args.len() {
        bail!("--types has {} entries but --args has {}", types.len(), args.len());
    }

    args.iter()
        .zip(types)
        .enumerate()
        .map(|(i, (json, ty))| {
            let value = Value::from_json(json).with_context(|| format!("argument {i}"))?;
            Ok(match ty {
                Some(ty) => Arg::Typed(
                    TypedValue::parse(&ty, value).with_context(|| format!("type of argument {i}"))?,
                ),
                None => Arg::Plain(value),
            })
        })
        .collect()
}

fn parse_hex(s: &str, what: &str) -> Result<Vec<u8>> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s)).with_context(|| format!("invalid {what} hex"))
}

// ─── Commands ─────────────────────────────────────────────────────────────────

pub fn selector(signature: &str) -> Result<()> {
    let canonical = normalize_signature(signature)?;
    println!("Signature: {canonical}");
    println!("Selector:  {}", selector_hex(chaincall_core::selector(&canonical)));
    println!("Topic:     {}", chaincall_core::topic(&canonical));
    Ok(())
}

pub fn normalize(fragment: &str) -> Result<()> {
    let fragment = Fragment::parse(fragment)?;
    println!("Kind:      {}", fragment.kind);
    println!("Signature: {}", fragment.signature());
    println!("Full:      {}", fragment.format_full());
    println!("JSON:      {}", serde_json::to_string(&fragment.to_json())?);
    Ok(())
}

pub fn resolve(call: &CallArgs) -> Result<()> {
    let registry = load_registry(&call.abi)?;
    let resolved = resolve_call(&registry, &call.method, build_args(&call.args, call.types.as_deref())?)?;

    println!("Resolved:  {}", resolved.signature());
    println!("Selector:  {}", selector_hex(resolved.fragment.selector()));
    println!("Arguments:");
    for (i, (value, ty)) in resolved.arguments.iter().enumerate() {
        println!("  [{i}] {ty} = {value}");
    }
    Ok(())
}

pub fn encode_call(call: &CallArgs) -> Result<()> {
    let registry = load_registry(&call.abi)?;
    let resolved = resolve_call(&registry, &call.method, build_args(&call.args, call.types.as_deref())?)?;
    let calldata = AbiCoder::shared().encode_call(&resolved)?;
    println!("0x{}", hex::encode(&calldata));
    Ok(())
}

pub fn decode_call(abi: &str, calldata: &str, as_json: bool) -> Result<()> {
    let registry = load_registry(abi)?;
    let bytes = parse_hex(calldata, "calldata")?;
    let decoded = decode_calldata(&registry, &bytes)?;

    if as_json {
        let out = serde_json::json!({
            "function": decoded.fragment.signature(),
            "selector": selector_hex(decoded.fragment.selector()),
            "inputs": decoded.inputs.to_json(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Function:  {}", decoded.fragment.signature());
        println!("Selector:  {}", selector_hex(decoded.fragment.selector()));
        println!("Inputs:");
        for (name, value) in decoded.inputs.iter() {
            println!("  {name}: {value}");
        }
    }
    Ok(())
}

pub fn populate(
    call: &CallArgs,
    address: &str,
    config_path: Option<&str>,
    overrides: PopulateOverrides,
    raw: bool,
) -> Result<()> {
    let registry = Arc::new(load_registry(&call.abi)?);
    let address = parse_address(address).ok_or_else(|| anyhow!("invalid contract address '{address}'"))?;
    let config = match config_path {
        Some(path) => DispatchConfig::from_file(path)?,
        None => DispatchConfig::default(),
    };
    tracing::debug!(chain_id = config.chain_id, tx_type = %config.tx_type, "dispatch config");

    let mut call_overrides = CallOverrides {
        nonce: overrides.nonce,
        gas_limit: overrides.gas_limit,
        ..CallOverrides::default()
    };
    if let Some(value) = overrides.value.as_deref() {
        call_overrides.value =
            Some(parse_unsigned(value).ok_or_else(|| anyhow!("invalid value '{value}'"))?);
    }

    let contract = Contract::new(address, registry, Arc::new(OfflineTransport)).with_config(config);
    let tx = contract
        .method(&call.method)?
        .populate_transaction(build_args(&call.args, call.types.as_deref())?, &call_overrides)?;

    tracing::info!(method = %call.method, tx_type = %tx.tx_type, "transaction populated");
    println!("{}", serde_json::to_string_pretty(&tx)?);
    if raw {
        println!("0x{}", hex::encode(tx.serialize_unsigned()?));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_and_plain_args() {
        let args = build_args(r#"["0x01", true]"#, Some(r#"["uint160", null]"#)).unwrap();
        assert!(matches!(&args[0], Arg::Typed(t) if t.ty().to_string() == "uint160"));
        assert!(matches!(&args[1], Arg::Plain(Value::Bool(true))));
    }

    #[test]
    fn types_must_line_up_with_args() {
        assert!(build_args(r#"[1, 2]"#, Some(r#"["uint8"]"#)).is_err());
        assert!(build_args("not json", None).is_err());
    }
}
