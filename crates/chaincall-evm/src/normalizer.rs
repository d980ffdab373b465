//! Converts alloy `DynSolValue` → ChainCall `Value`.
//!
//! The inverse of [`crate::encoder::to_dyn_value`]: decoded ABI words are
//! mapped back onto the loosely-typed value model so results can be shown,
//! compared and fed into further calls.

use alloy_core::dyn_abi::DynSolValue;
use chaincall_core::value::Value;

/// Convert a decoded `DynSolValue` into a `Value`.
pub fn normalize(val: DynSolValue) -> Value {
    match val {
        DynSolValue::Bool(b) => Value::Bool(b),
        DynSolValue::Int(i, _bits) => Value::Int(i),
        DynSolValue::Uint(u, _bits) => Value::Uint(u),
        DynSolValue::Address(a) => Value::Address(a),

        // Only the first `size` bytes of the word are meaningful
        DynSolValue::FixedBytes(word, size) => Value::Bytes(word[..size].to_vec().into()),
        DynSolValue::Function(f) => Value::Bytes(f.to_vec().into()),
        DynSolValue::Bytes(b) => Value::Bytes(b.into()),
        DynSolValue::String(s) => Value::Str(s),

        DynSolValue::Array(vals) | DynSolValue::FixedArray(vals) => {
            Value::Array(vals.into_iter().map(normalize).collect())
        }
        DynSolValue::Tuple(fields) => Value::Tuple(fields.into_iter().map(normalize).collect()),
    }
}
