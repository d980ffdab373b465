//! Call-site and decoded ABI values.
//!
//! A plain `Value` is loosely typed: a string may later become an
//! address, a number or a byte string depending on the parameter it is
//! matched against. [`Value::is_assignable_to`] decides which parameter
//! types a value could stand for; overload resolution is built on it.

use alloy_primitives::{Address, Bytes, I256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::EncodeError;
use crate::types::ParamType;

/// A loosely-typed ABI value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    Bool(bool),
    Uint(U256),
    Int(I256),
    Address(Address),
    Bytes(Bytes),
    #[serde(rename = "string")]
    Str(String),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
}

impl Value {
    /// Short name of the value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Uint(_) => "unsigned integer",
            Self::Int(_) => "signed integer",
            Self::Address(_) => "address",
            Self::Bytes(_) => "bytes",
            Self::Str(_) => "string",
            Self::Array(_) => "array",
            Self::Tuple(_) => "tuple",
        }
    }

    pub fn to_address(&self) -> Option<Address> {
        match self {
            Self::Address(a) => Some(*a),
            Self::Str(s) => parse_address(s),
            _ => None,
        }
    }

    /// Interpret as an unsigned 256-bit integer. Addresses are 160-bit
    /// quantities and convert too.
    pub fn to_unsigned(&self) -> Option<U256> {
        match self {
            Self::Uint(v) => Some(*v),
            Self::Int(v) if !v.is_negative() => Some(v.unsigned_abs()),
            Self::Address(a) => Some(U256::from_be_slice(a.as_slice())),
            Self::Str(s) => parse_unsigned(s),
            _ => None,
        }
    }

    pub fn to_signed(&self) -> Option<I256> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Uint(v) => I256::try_from(*v).ok(),
            Self::Str(s) => parse_signed(s),
            _ => None,
        }
    }

    pub fn to_byte_vec(&self) -> Option<Vec<u8>> {
        match self {
            Self::Bytes(b) => Some(b.to_vec()),
            Self::Str(s) => decode_prefixed_hex(s),
            _ => None,
        }
    }

    /// Members of an array or tuple value.
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) | Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this plain value could be passed for a parameter of type `ty`.
    pub fn is_assignable_to(&self, ty: &ParamType) -> bool {
        match (self, ty) {
            (Self::Bool(_), ParamType::Bool) => true,

            (Self::Uint(v), ParamType::Uint(bits)) => v.bit_len() <= *bits,
            (Self::Uint(v), ParamType::Int(bits)) => v.bit_len() < *bits,
            (Self::Int(v), ParamType::Int(bits)) => signed_fits(*v, *bits),
            (Self::Int(v), ParamType::Uint(bits)) => {
                !v.is_negative() && v.unsigned_abs().bit_len() <= *bits
            }

            (Self::Address(_), ParamType::Address) => true,
            (Self::Address(_), ParamType::Uint(bits)) => *bits >= 160,

            (Self::Bytes(_), ParamType::Bytes) => true,
            (Self::Bytes(b), ParamType::FixedBytes(n)) => b.len() == *n,
            (Self::Bytes(b), ParamType::Function) => b.len() == 24,

            (Self::Str(_), ParamType::String) => true,
            (Self::Str(s), ParamType::Address) => parse_address(s).is_some(),
            (Self::Str(s), ParamType::Uint(bits)) => {
                parse_unsigned(s).is_some_and(|v| v.bit_len() <= *bits)
            }
            (Self::Str(s), ParamType::Int(bits)) => {
                parse_signed(s).is_some_and(|v| signed_fits(v, *bits))
            }
            (Self::Str(s), ParamType::Bytes) => decode_prefixed_hex(s).is_some(),
            (Self::Str(s), ParamType::FixedBytes(n)) => {
                decode_prefixed_hex(s).is_some_and(|b| b.len() == *n)
            }
            (Self::Str(s), ParamType::Function) => {
                decode_prefixed_hex(s).is_some_and(|b| b.len() == 24)
            }

            (Self::Array(items), ParamType::Array(inner)) => {
                items.iter().all(|v| v.is_assignable_to(inner))
            }
            (Self::Array(items), ParamType::FixedArray(inner, len)) => {
                items.len() == *len && items.iter().all(|v| v.is_assignable_to(inner))
            }
            (Self::Array(items) | Self::Tuple(items), ParamType::Tuple(members)) => {
                items.len() == members.len()
                    && items.iter().zip(members).all(|(v, t)| v.is_assignable_to(t))
            }

            _ => false,
        }
    }

    /// Build a value from JSON. Integers become numbers, strings stay
    /// strings (they are coerced when matched against a parameter type),
    /// arrays become arrays.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, EncodeError> {
        use serde_json::Value as Json;
        match json {
            Json::Bool(b) => Ok(Self::Bool(*b)),
            Json::String(s) => Ok(Self::Str(s.clone())),
            Json::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Ok(Self::Uint(U256::from(u)))
                } else if let Some(i) = n.as_i64() {
                    I256::try_from(i)
                        .map(Self::Int)
                        .map_err(|e| json_error(json, &e.to_string()))
                } else {
                    Err(json_error(json, "only integers are supported; pass large numbers as strings"))
                }
            }
            Json::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            Json::Null | Json::Object(_) => Err(json_error(json, "unsupported JSON value")),
        }
    }

    /// JSON rendering for display: numbers as decimal strings, addresses
    /// checksummed, bytes as 0x-hex.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Self::Bool(b) => Json::Bool(*b),
            Self::Uint(v) => Json::String(v.to_string()),
            Self::Int(v) => Json::String(v.to_string()),
            Self::Address(a) => Json::String(a.to_checksum(None)),
            Self::Bytes(b) => Json::String(format!("0x{}", hex::encode(b))),
            Self::Str(s) => Json::String(s.clone()),
            Self::Array(items) | Self::Tuple(items) => {
                Json::Array(items.iter().map(Self::to_json).collect())
            }
        }
    }
}

fn json_error(json: &serde_json::Value, reason: &str) -> EncodeError {
    EncodeError::Value {
        value: json.to_string(),
        ty: "value".to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Address(a) => f.write_str(&a.to_checksum(None)),
            Self::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Array(items) => write_list(f, "[", items, "]"),
            Self::Tuple(items) => write_list(f, "(", items, ")"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

macro_rules! impl_value_from {
    ($($ty:ty => |$v:ident| $conv:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $conv
                }
            }
        )*
    };
}

impl_value_from! {
    bool => |v| Value::Bool(v),
    u8 => |v| Value::Uint(U256::from(v)),
    u32 => |v| Value::Uint(U256::from(v)),
    u64 => |v| Value::Uint(U256::from(v)),
    u128 => |v| Value::Uint(U256::from(v)),
    U256 => |v| Value::Uint(v),
    i32 => |v| Value::Int(I256::unchecked_from(v)),
    i64 => |v| Value::Int(I256::unchecked_from(v)),
    i128 => |v| Value::Int(I256::unchecked_from(v)),
    I256 => |v| Value::Int(v),
    Address => |v| Value::Address(v),
    Bytes => |v| Value::Bytes(v),
    Vec<u8> => |v| Value::Bytes(Bytes::from(v)),
    &str => |v| Value::Str(v.to_string()),
    String => |v| Value::Str(v),
    Vec<Value> => |v| Value::Array(v),
}

/// Whether a signed value fits in an `intN` of the given width.
pub fn signed_fits(v: I256, bits: usize) -> bool {
    if bits >= 256 {
        return true;
    }
    let magnitude = v.unsigned_abs();
    if v.is_negative() {
        // -2^(N-1) is the most negative intN
        (magnitude - U256::from(1u8)).bit_len() < bits
    } else {
        magnitude.bit_len() < bits
    }
}

/// Parse `0x` + 40 hex digits. Mixed-case input must carry a valid EIP-55
/// checksum; all-lowercase and all-uppercase input is accepted as is.
pub fn parse_address(s: &str) -> Option<Address> {
    let digits = s.strip_prefix("0x")?;
    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let has_lower = digits.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = digits.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(s, None).ok()
    } else {
        s.parse().ok()
    }
}

/// Parse a decimal or `0x`-hex unsigned integer.
pub fn parse_unsigned(s: &str) -> Option<U256> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            U256::from_str_radix(digits, 16).ok()
        }
        None => {
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            U256::from_str_radix(s, 10).ok()
        }
    }
}

/// Parse a decimal or `0x`-hex integer with an optional leading `-`.
pub fn parse_signed(s: &str) -> Option<I256> {
    match s.strip_prefix('-') {
        Some(rest) => {
            let magnitude = parse_unsigned(rest)?;
            if magnitude == U256::from(1u8) << 255 {
                Some(I256::MIN)
            } else {
                I256::try_from(magnitude).ok()?.checked_neg()
            }
        }
        None => I256::try_from(parse_unsigned(s)?).ok(),
    }
}

/// Decode `0x`-prefixed hex. The prefix is mandatory so plain strings are
/// never mistaken for byte strings.
pub fn decode_prefixed_hex(s: &str) -> Option<Vec<u8>> {
    hex::decode(s.strip_prefix("0x")?).ok()
}
