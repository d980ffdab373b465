//! ABI value coder.
//!
//! `AbiCoder` bundles the encode/decode entry points behind one handle.
//! Contracts use the process-wide instance returned by [`AbiCoder::shared`].

use alloy_core::dyn_abi::DynSolType;
use alloy_primitives::Bytes;
use chaincall_core::{error::EncodeError, fragment::Fragment, types::ParamType, value::Value};
use std::sync::OnceLock;
use tracing::trace;

use crate::{
    call_decoder::{decode_output, DecodedValues},
    encoder::{encode_arguments, encode_call, sol_type},
    normalizer::normalize,
    resolver::ResolvedCall,
};

static SHARED: OnceLock<AbiCoder> = OnceLock::new();

/// Encodes `Value`s against `ParamType`s and decodes them back.
#[derive(Debug, Default)]
pub struct AbiCoder {
    _private: (),
}

impl AbiCoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide coder, built on first access.
    pub fn shared() -> &'static AbiCoder {
        SHARED.get_or_init(|| {
            trace!("initialising shared ABI coder");
            AbiCoder::new()
        })
    }

    /// ABI-encode `values` as the parameter list `types` (no selector).
    pub fn encode(&self, types: &[ParamType], values: &[Value]) -> Result<Bytes, EncodeError> {
        if types.len() != values.len() {
            return Err(EncodeError::Value {
                value: format!("{} value(s)", values.len()),
                ty: format!("{} type(s)", types.len()),
                reason: "types and values length mismatch".into(),
            });
        }
        let pairs: Vec<(Value, ParamType)> = values.iter().cloned().zip(types.iter().cloned()).collect();
        Ok(encode_arguments(&pairs)?.into())
    }

    /// Like [`AbiCoder::encode`] with types given as strings (`"uint256"`, `"(address,bool)[]"`).
    pub fn encode_str(&self, types: &[&str], values: &[Value]) -> Result<Bytes, EncodeError> {
        let types = parse_types(types)?;
        self.encode(&types, values)
    }

    /// ABI-decode `data` as the parameter list `types`.
    pub fn decode(&self, types: &[ParamType], data: &[u8]) -> Result<Vec<Value>, EncodeError> {
        if types.is_empty() {
            return Ok(Vec::new());
        }
        let tuple = DynSolType::Tuple(types.iter().map(sol_type).collect::<Result<_, _>>()?);
        let decoded = tuple.abi_decode_params(data).map_err(|e| EncodeError::Decode {
            reason: e.to_string(),
        })?;
        match normalize(decoded) {
            Value::Tuple(values) => Ok(values),
            other => Ok(vec![other]),
        }
    }

    pub fn decode_str(&self, types: &[&str], data: &[u8]) -> Result<Vec<Value>, EncodeError> {
        let types = parse_types(types)?;
        self.decode(&types, data)
    }

    /// Calldata for a resolved call.
    pub fn encode_call(&self, call: &ResolvedCall) -> Result<Bytes, EncodeError> {
        encode_call(call)
    }

    /// Named outputs of `fragment` from its return data.
    pub fn decode_output(&self, fragment: &Fragment, data: &[u8]) -> Result<DecodedValues, EncodeError> {
        decode_output(fragment, data)
    }
}

fn parse_types(types: &[&str]) -> Result<Vec<ParamType>, EncodeError> {
    types
        .iter()
        .map(|ty| {
            ty.parse::<ParamType>().map_err(|e| EncodeError::Value {
                value: String::new(),
                ty: ty.to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn shared_is_a_singleton() {
        let a = AbiCoder::shared() as *const AbiCoder;
        let b = AbiCoder::shared() as *const AbiCoder;
        assert_eq!(a, b);
    }

    #[test]
    fn shared_across_threads() {
        let addrs: Vec<usize> = (0..4)
            .map(|_| std::thread::spawn(|| AbiCoder::shared() as *const AbiCoder as usize))
            .map(|h| h.join().unwrap())
            .collect();
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn encode_decode_strings() {
        let coder = AbiCoder::shared();
        let values = vec![Value::from(42u64), Value::from("hello")];
        let data = coder.encode_str(&["uint256", "string"], &values).unwrap();
        // head (2 words) + length word + padded string
        assert_eq!(data.len(), 32 * 4);
        assert_eq!(&data[..32], U256::from(42u64).to_be_bytes::<32>().as_slice());

        let back = coder.decode_str(&["uint256", "string"], &data).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn length_mismatch_and_bad_types_fail() {
        let coder = AbiCoder::new();
        assert!(coder.encode_str(&["uint256"], &[]).is_err());
        assert!(coder.encode_str(&["uint7"], &[Value::from(1u64)]).is_err());
        assert!(coder.decode_str(&["uint256"], &[0u8; 4]).is_err());
    }

    #[test]
    fn hand_built_types_are_checked() {
        let coder = AbiCoder::shared();
        let forty = Value::Bytes(vec![0u8; 40].into());
        assert!(coder.encode(&[ParamType::FixedBytes(40)], &[forty]).is_err());
        assert!(coder.decode(&[ParamType::FixedBytes(40)], &[0u8; 32]).is_err());
        assert!(coder.decode(&[ParamType::Uint(3)], &[0u8; 32]).is_err());
    }
}
