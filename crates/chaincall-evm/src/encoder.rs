//! ABI encoder: resolved arguments → calldata.
//!
//! Converts loosely-typed `Value`s into alloy `DynSolValue`s for the
//! parameter type they were resolved against, then ABI-encodes them.
//! Strings are coerced here: `"0x…"` becomes an address or bytes and
//! decimal / hex digits become integers, depending on the parameter.
//!
//! # Usage
//! ```ignore
//! let call = resolver::resolve(&registry, "transfer", args![to, 1_000_000u64])?;
//! let calldata = encoder::encode_call(&call)?;
//! ```

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{Bytes, Function, B256};
use chaincall_core::{
    error::EncodeError,
    fragment::Fragment,
    types::ParamType,
    value::{signed_fits, Value},
};

use crate::resolver::ResolvedCall;

/// Encode a resolved call: `selector ‖ abi_encode(args...)`.
pub fn encode_call(call: &ResolvedCall) -> Result<Bytes, EncodeError> {
    let mut calldata = call.fragment.selector().to_vec();
    calldata.extend_from_slice(&encode_arguments(&call.arguments)?);
    Ok(calldata.into())
}

/// Encode values against a fragment's inputs, with the selector prefix.
///
/// Skips overload resolution; the values must already be in declaration
/// order and count.
pub fn encode_function_data(fragment: &Fragment, values: &[Value]) -> Result<Bytes, EncodeError> {
    if values.len() != fragment.inputs.len() {
        return Err(EncodeError::Value {
            value: format!("{} argument(s)", values.len()),
            ty: fragment.signature(),
            reason: format!("expected {} argument(s)", fragment.inputs.len()),
        });
    }
    let pairs: Vec<(Value, ParamType)> = values
        .iter()
        .cloned()
        .zip(fragment.input_types())
        .collect();
    let mut calldata = fragment.selector().to_vec();
    calldata.extend_from_slice(&encode_arguments(&pairs)?);
    Ok(calldata.into())
}

/// Deployment payload: contract bytecode followed by the ABI-encoded
/// constructor arguments (no selector).
pub fn encode_deploy(bytecode: &[u8], args: &[(Value, ParamType)]) -> Result<Bytes, EncodeError> {
    let mut data = bytecode.to_vec();
    data.extend_from_slice(&encode_arguments(args)?);
    Ok(data.into())
}

/// ABI-encode a parameter list without a selector.
pub fn encode_arguments(args: &[(Value, ParamType)]) -> Result<Vec<u8>, EncodeError> {
    let values = args
        .iter()
        .map(|(value, ty)| to_dyn_value(value, ty))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(DynSolValue::Tuple(values).abi_encode_params())
}

/// The alloy type for a canonical parameter type.
///
/// Hand-built types are checked first: integer widths must be multiples of
/// 8 up to 256 and fixed byte lengths 1 to 32.
pub fn sol_type(ty: &ParamType) -> Result<DynSolType, EncodeError> {
    ty.validate().map_err(|e| EncodeError::Value {
        value: String::new(),
        ty: ty.to_string(),
        reason: e.to_string(),
    })?;
    Ok(checked_sol_type(ty))
}

fn checked_sol_type(ty: &ParamType) -> DynSolType {
    match ty {
        ParamType::Address => DynSolType::Address,
        ParamType::Bool => DynSolType::Bool,
        ParamType::String => DynSolType::String,
        ParamType::Bytes => DynSolType::Bytes,
        ParamType::Function => DynSolType::Function,
        ParamType::FixedBytes(n) => DynSolType::FixedBytes(*n),
        ParamType::Uint(bits) => DynSolType::Uint(*bits),
        ParamType::Int(bits) => DynSolType::Int(*bits),
        ParamType::Array(inner) => DynSolType::Array(Box::new(checked_sol_type(inner))),
        ParamType::FixedArray(inner, len) => {
            DynSolType::FixedArray(Box::new(checked_sol_type(inner)), *len)
        }
        ParamType::Tuple(members) => DynSolType::Tuple(members.iter().map(checked_sol_type).collect()),
    }
}

/// Convert a `Value` to the alloy `DynSolValue` for the given parameter type.
pub fn to_dyn_value(value: &Value, ty: &ParamType) -> Result<DynSolValue, EncodeError> {
    let fail = |reason: &str| EncodeError::Value {
        value: value.to_string(),
        ty: ty.to_string(),
        reason: reason.to_string(),
    };

    match ty {
        ParamType::Bool => match value {
            Value::Bool(b) => Ok(DynSolValue::Bool(*b)),
            _ => Err(fail("expected a bool")),
        },

        ParamType::Address => value
            .to_address()
            .map(DynSolValue::Address)
            .ok_or_else(|| fail("expected an address (0x + 40 hex digits, valid checksum)")),

        ParamType::Uint(bits) => {
            ty.validate().map_err(|e| fail(&e.to_string()))?;
            let v = value.to_unsigned().ok_or_else(|| fail("expected an unsigned integer"))?;
            if v.bit_len() > *bits {
                return Err(fail("value does not fit"));
            }
            Ok(DynSolValue::Uint(v, *bits))
        }

        ParamType::Int(bits) => {
            ty.validate().map_err(|e| fail(&e.to_string()))?;
            let v = value.to_signed().ok_or_else(|| fail("expected a signed integer"))?;
            if !signed_fits(v, *bits) {
                return Err(fail("value does not fit"));
            }
            Ok(DynSolValue::Int(v, *bits))
        }

        ParamType::String => match value {
            Value::Str(s) => Ok(DynSolValue::String(s.clone())),
            _ => Err(fail("expected a string")),
        },

        ParamType::Bytes => value
            .to_byte_vec()
            .map(DynSolValue::Bytes)
            .ok_or_else(|| fail("expected bytes or 0x-hex")),

        ParamType::FixedBytes(n) => {
            ty.validate().map_err(|e| fail(&e.to_string()))?;
            let bytes = value.to_byte_vec().ok_or_else(|| fail("expected bytes or 0x-hex"))?;
            if bytes.len() != *n {
                return Err(fail(&format!("expected exactly {n} bytes, got {}", bytes.len())));
            }
            // Right-padded to a full word
            let mut word = B256::ZERO;
            word[..*n].copy_from_slice(&bytes);
            Ok(DynSolValue::FixedBytes(word, *n))
        }

        ParamType::Function => {
            let bytes = value.to_byte_vec().ok_or_else(|| fail("expected bytes or 0x-hex"))?;
            if bytes.len() != 24 {
                return Err(fail("a function pointer is 24 bytes (address ‖ selector)"));
            }
            Ok(DynSolValue::Function(Function::from_slice(&bytes)))
        }

        ParamType::Array(inner) => {
            let items = value.elements().ok_or_else(|| fail("expected an array"))?;
            let items = items
                .iter()
                .map(|v| to_dyn_value(v, inner))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DynSolValue::Array(items))
        }

        ParamType::FixedArray(inner, len) => {
            let items = value.elements().ok_or_else(|| fail("expected an array"))?;
            if items.len() != *len {
                return Err(fail(&format!("expected {len} element(s), got {}", items.len())));
            }
            let items = items
                .iter()
                .map(|v| to_dyn_value(v, inner))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DynSolValue::FixedArray(items))
        }

        ParamType::Tuple(members) => {
            let items = value.elements().ok_or_else(|| fail("expected a tuple or array"))?;
            if items.len() != members.len() {
                return Err(fail(&format!(
                    "expected {} member(s), got {}",
                    members.len(),
                    items.len()
                )));
            }
            let items = items
                .iter()
                .zip(members)
                .map(|(v, t)| to_dyn_value(v, t))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DynSolValue::Tuple(items))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MethodRegistry;
    use crate::resolver::resolve;
    use chaincall_core::args;

    const ERC20: [&str; 3] = [
        "function transfer(address to, uint256 amount) returns (bool)",
        "function approve(address spender, uint256 amount) returns (bool)",
        "function balanceOf(address owner) view returns (uint256)",
    ];

    #[test]
    fn encode_transfer() {
        let registry = MethodRegistry::from_human_readable(ERC20).unwrap();
        let call = resolve(
            &registry,
            "transfer",
            args!["0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045", 1_000_000u64],
        )
        .unwrap();
        let calldata = encode_call(&call).unwrap();

        assert_eq!(
            hex::encode(&calldata),
            concat!(
                "a9059cbb",
                "000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa96045",
                "00000000000000000000000000000000000000000000000000000000000f4240",
            )
        );
    }

    #[test]
    fn dynamic_params_use_offsets() {
        let f = Fragment::parse("function setName(string name)").unwrap();
        let data = encode_function_data(&f, &[Value::from("hi")]).unwrap();
        // selector + offset word + length word + one padded data word
        assert_eq!(data.len(), 4 + 32 * 3);
        assert_eq!(data[4 + 31], 0x20);
        assert_eq!(data[4 + 63], 2);
    }

    #[test]
    fn string_coercions() {
        let v = to_dyn_value(&Value::from("0xff"), &ParamType::Uint(8)).unwrap();
        assert_eq!(v, DynSolValue::Uint(alloy_primitives::U256::from(255u64), 8));

        let v = to_dyn_value(&Value::from("-2"), &ParamType::Int(16)).unwrap();
        assert!(matches!(v, DynSolValue::Int(i, 16) if i.is_negative()));

        let v = to_dyn_value(&Value::from("0xdeadbeef"), &ParamType::FixedBytes(4)).unwrap();
        assert!(matches!(v, DynSolValue::FixedBytes(w, 4) if w[..4] == [0xde, 0xad, 0xbe, 0xef]));
    }

    #[test]
    fn rejects_values_that_do_not_fit() {
        assert!(to_dyn_value(&Value::from(256u64), &ParamType::Uint(8)).is_err());
        assert!(to_dyn_value(&Value::from(-1i64), &ParamType::Uint(256)).is_err());
        assert!(to_dyn_value(&Value::from("0x1234"), &ParamType::FixedBytes(4)).is_err());
        assert!(to_dyn_value(&Value::from("nope"), &ParamType::Address).is_err());
        let pair = Value::Array(vec![Value::from(1u64)]);
        let tuple = ParamType::Tuple(vec![ParamType::Uint(8), ParamType::Uint(8)]);
        assert!(to_dyn_value(&pair, &tuple).is_err());
    }

    #[test]
    fn rejects_hand_built_invalid_types() {
        let forty = Value::Bytes(vec![0u8; 40].into());
        assert!(to_dyn_value(&forty, &ParamType::FixedBytes(40)).is_err());
        assert!(to_dyn_value(&Value::Bytes(Bytes::new()), &ParamType::FixedBytes(0)).is_err());
        assert!(to_dyn_value(&Value::from(1u64), &ParamType::Uint(7)).is_err());
        assert!(to_dyn_value(&Value::from(1u64), &ParamType::Int(264)).is_err());
        assert!(sol_type(&ParamType::Array(Box::new(ParamType::FixedBytes(33)))).is_err());
        assert_eq!(sol_type(&ParamType::FixedBytes(32)).unwrap(), DynSolType::FixedBytes(32));
    }

    #[test]
    fn wrong_arg_count_returns_error() {
        let f = Fragment::parse(ERC20[0]).unwrap();
        assert!(encode_function_data(&f, &[Value::from(1u64)]).is_err());
    }

    #[test]
    fn deploy_appends_constructor_args() {
        let data = encode_deploy(&[0x60, 0x80], &[(Value::from(1u64), ParamType::Uint(256))]).unwrap();
        assert_eq!(data.len(), 2 + 32);
        assert_eq!(data[..2], [0x60, 0x80]);
    }
}
