//! Calldata and return-data decoder.
//!
//! # How it works
//! - First 4 bytes of calldata = keccak256(function_signature)[:4] (the selector)
//! - Remaining bytes = ABI-encoded inputs tuple
//! - Return data = ABI-encoded outputs tuple, no prefix
//! - Constructor arguments: no selector prefix; all bytes = ABI-encoded args

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use chaincall_core::{
    error::EncodeError,
    fragment::{Fragment, Param},
    selector::selector_hex,
    value::Value,
};
use std::sync::Arc;

use crate::{encoder::sol_type, normalizer, registry::MethodRegistry};

/// Ordered values paired with their parameter names.
///
/// Unnamed parameters are keyed by their position (`"0"`, `"1"`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedValues {
    fields: Vec<(String, Value)>,
}

impl DecodedValues {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    /// Look a value up by parameter name or position.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(name, _)| name == key).map(|(_, v)| v)
    }

    pub fn at(&self, index: usize) -> Option<&Value> {
        self.fields.get(index).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }

    /// Destructured form: `None` for no values, the value itself for one,
    /// otherwise a tuple of all of them.
    pub fn into_value(self) -> Option<Value> {
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        match values.len() {
            0 => None,
            1 => values.pop(),
            _ => Some(Value::Tuple(values)),
        }
    }

    /// JSON object keyed by parameter name.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .map(|(name, v)| (name.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

/// A decoded function call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCall {
    pub fragment: Arc<Fragment>,
    pub inputs: DecodedValues,
}

/// ABI-decode `data` as the tuple described by `params`.
pub fn decode_params(params: &[Param], data: &[u8]) -> Result<DecodedValues, EncodeError> {
    if params.is_empty() {
        return Ok(DecodedValues::default());
    }

    let tuple_type = DynSolType::Tuple(
        params
            .iter()
            .map(|p| sol_type(&p.ty))
            .collect::<Result<_, _>>()?,
    );
    let decoded = tuple_type
        .abi_decode_params(data)
        .map_err(|e| EncodeError::Decode {
            reason: e.to_string(),
        })?;

    let values = match decoded {
        DynSolValue::Tuple(vals) => vals,
        other => vec![other],
    };

    let fields = params
        .iter()
        .enumerate()
        .zip(values)
        .map(|((i, param), val)| (param.display_name(i), normalizer::normalize(val)))
        .collect();
    Ok(DecodedValues::new(fields))
}

/// Decode a function's return data.
pub fn decode_output(fragment: &Fragment, data: &[u8]) -> Result<DecodedValues, EncodeError> {
    decode_params(&fragment.outputs, data)
}

/// Decode calldata whose selector is known to `fragment`.
pub fn decode_input(fragment: &Fragment, calldata: &[u8]) -> Result<DecodedValues, EncodeError> {
    let (selector, args) = split_selector(calldata)?;
    if selector != fragment.selector() {
        return Err(EncodeError::Decode {
            reason: format!(
                "selector {} does not match {} ({})",
                selector_hex(selector),
                fragment.signature(),
                selector_hex(fragment.selector())
            ),
        });
    }
    decode_params(&fragment.inputs, args)
}

/// Decode calldata by looking its selector up in the registry.
pub fn decode_call(registry: &MethodRegistry, calldata: &[u8]) -> Result<DecodedCall, EncodeError> {
    let (selector, args) = split_selector(calldata)?;
    let fragment = registry
        .function_by_selector(selector)
        .ok_or_else(|| EncodeError::Decode {
            reason: format!("no function found for selector {}", selector_hex(selector)),
        })?;
    Ok(DecodedCall {
        fragment: Arc::clone(fragment),
        inputs: decode_params(&fragment.inputs, args)?,
    })
}

/// Decode ABI-encoded constructor arguments (no selector prefix).
pub fn decode_constructor(registry: &MethodRegistry, data: &[u8]) -> Result<DecodedValues, EncodeError> {
    let constructor = registry.constructor().ok_or_else(|| EncodeError::Decode {
        reason: "ABI has no constructor definition".into(),
    })?;
    decode_params(&constructor.inputs, data)
}

fn split_selector(calldata: &[u8]) -> Result<([u8; 4], &[u8]), EncodeError> {
    match calldata {
        [a, b, c, d, rest @ ..] => Ok(([*a, *b, *c, *d], rest)),
        _ => Err(EncodeError::Decode {
            reason: format!(
                "calldata too short: {} bytes (need at least 4 for selector)",
                calldata.len()
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    const ERC20_ABI: &str = r#"[
        {
            "name": "transfer",
            "type": "function",
            "inputs": [
                {"name": "to", "type": "address"},
                {"name": "amount", "type": "uint256"}
            ],
            "outputs": [{"name": "", "type": "bool"}],
            "stateMutability": "nonpayable"
        },
        {
            "type": "constructor",
            "inputs": [{"name": "supply", "type": "uint256"}]
        }
    ]"#;

    fn transfer_calldata() -> Vec<u8> {
        hex::decode(concat!(
            "a9059cbb",
            "000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa96045",
            "00000000000000000000000000000000000000000000000000000000000f4240",
        ))
        .unwrap()
    }

    #[test]
    fn decode_transfer_calldata() {
        let registry = MethodRegistry::from_json(ERC20_ABI).unwrap();
        let decoded = decode_call(&registry, &transfer_calldata()).unwrap();
        assert_eq!(decoded.fragment.name, "transfer");
        assert_eq!(decoded.inputs.len(), 2);
        assert_eq!(decoded.inputs.get("amount"), Some(&Value::Uint(U256::from(1_000_000u64))));
        let to = decoded.inputs.get("to").and_then(Value::to_address).unwrap();
        assert_eq!(to.to_checksum(None), "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045");
    }

    #[test]
    fn unnamed_outputs_use_positions() {
        let registry = MethodRegistry::from_json(ERC20_ABI).unwrap();
        let f = registry.function_by_signature("transfer(address,uint256)").unwrap();
        let mut word = [0u8; 32];
        word[31] = 1;
        let out = decode_output(f, &word).unwrap();
        assert_eq!(out.get("0"), Some(&Value::Bool(true)));
        assert_eq!(out.into_value(), Some(Value::Bool(true)));
    }

    #[test]
    fn short_or_unknown_calldata_fails() {
        let registry = MethodRegistry::from_json(ERC20_ABI).unwrap();
        assert!(decode_call(&registry, &[0xa9, 0x05]).is_err());
        assert!(decode_call(&registry, &[0, 0, 0, 0]).is_err());
        // truncated argument words
        assert!(decode_call(&registry, &transfer_calldata()[..40]).is_err());
    }

    #[test]
    fn input_selector_must_match() {
        let registry = MethodRegistry::from_json(ERC20_ABI).unwrap();
        let f = registry.function_by_signature("transfer(address,uint256)").unwrap();
        assert!(decode_input(f, &transfer_calldata()).is_ok());
        let mut other = transfer_calldata();
        other[0] = 0;
        assert!(decode_input(f, &other).is_err());
    }

    #[test]
    fn constructor_args() {
        let registry = MethodRegistry::from_json(ERC20_ABI).unwrap();
        let mut word = [0u8; 32];
        word[31] = 7;
        let args = decode_constructor(&registry, &word).unwrap();
        assert_eq!(args.get("supply"), Some(&Value::from(7u64)));
    }

    #[test]
    fn destructuring() {
        let two = DecodedValues::new(vec![
            ("a".into(), Value::from(1u64)),
            ("b".into(), Value::from(2u64)),
        ]);
        assert_eq!(
            two.clone().into_value(),
            Some(Value::Tuple(vec![Value::from(1u64), Value::from(2u64)]))
        );
        assert_eq!(two.to_json(), serde_json::json!({"a": "1", "b": "2"}));
        assert_eq!(DecodedValues::default().into_value(), None);
    }
}
