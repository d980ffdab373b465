//! Canonical ABI parameter types.
//!
//! Every parameter type in a fragment is normalized into a `ParamType`.
//! Its `Display` output is the canonical form used in signatures:
//! `uint` becomes `uint256`, `tuple(...)` becomes `(...)`, and there is
//! never any whitespace. Type strings are parsed by alloy's
//! [`DynSolType`] resolver.

use alloy_core::dyn_abi::DynSolType;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::AbiError;

/// A canonical Solidity ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// 20-byte account address
    Address,
    Bool,
    /// UTF-8 string
    String,
    /// Variable-length byte array
    Bytes,
    /// 24-byte external function pointer (address ++ selector)
    Function,
    /// `bytes1` .. `bytes32`. Length in bytes.
    FixedBytes(usize),
    /// `uint8` .. `uint256`. Width in bits.
    Uint(usize),
    /// `int8` .. `int256`. Width in bits.
    Int(usize),
    /// `T[]`
    Array(Box<ParamType>),
    /// `T[k]`
    FixedArray(Box<ParamType>, usize),
    /// `(T1,T2,...)`
    Tuple(Vec<ParamType>),
}

impl ParamType {
    /// `uintN`; fails unless N is a multiple of 8 in `8..=256`.
    pub fn uint(bits: usize) -> Result<Self, AbiError> {
        check_int_width(bits).map(|_| Self::Uint(bits))
    }

    /// `intN`; fails unless N is a multiple of 8 in `8..=256`.
    pub fn int(bits: usize) -> Result<Self, AbiError> {
        check_int_width(bits).map(|_| Self::Int(bits))
    }

    /// `bytesN`; fails unless N is in `1..=32`.
    pub fn fixed_bytes(len: usize) -> Result<Self, AbiError> {
        check_fixed_len(len).map(|_| Self::FixedBytes(len))
    }

    /// Checks every width and length in the type tree. Types parsed from
    /// strings are always valid; hand-built ones may not be.
    pub fn validate(&self) -> Result<(), AbiError> {
        match self {
            Self::Uint(bits) | Self::Int(bits) => check_int_width(*bits),
            Self::FixedBytes(len) => check_fixed_len(*len),
            Self::Array(inner) => inner.validate(),
            Self::FixedArray(inner, len) => {
                if *len == 0 {
                    return Err(AbiError::invalid("fixed array length must be non-zero"));
                }
                inner.validate()
            }
            Self::Tuple(members) => {
                if members.is_empty() {
                    return Err(AbiError::invalid("tuple must have at least one component"));
                }
                members.iter().try_for_each(ParamType::validate)
            }
            Self::Address | Self::Bool | Self::String | Self::Bytes | Self::Function => Ok(()),
        }
    }

    /// Returns the member types if this is a tuple, looking through any
    /// array dimensions.
    pub fn tuple_base(&self) -> Option<&[ParamType]> {
        match self {
            Self::Tuple(members) => Some(members),
            Self::Array(inner) | Self::FixedArray(inner, _) => inner.tuple_base(),
            _ => None,
        }
    }

    /// The type string used in JSON ABI records, where tuple bases are
    /// spelled `tuple` and their members go in `components`.
    pub fn json_type(&self) -> String {
        match self {
            Self::Tuple(_) => "tuple".to_string(),
            Self::Array(inner) => format!("{}[]", inner.json_type()),
            Self::FixedArray(inner, len) => format!("{}[{len}]", inner.json_type()),
            other => other.to_string(),
        }
    }

    /// Returns true if the ABI encoding of this type has dynamic length.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::String | Self::Bytes | Self::Array(_) => true,
            Self::FixedArray(inner, _) => inner.is_dynamic(),
            Self::Tuple(members) => members.iter().any(ParamType::is_dynamic),
            _ => false,
        }
    }
}

fn check_int_width(bits: usize) -> Result<(), AbiError> {
    if bits % 8 == 0 && (8..=256).contains(&bits) {
        Ok(())
    } else {
        Err(AbiError::invalid(format!("invalid integer width {bits}")))
    }
}

fn check_fixed_len(len: usize) -> Result<(), AbiError> {
    if (1..=32).contains(&len) {
        Ok(())
    } else {
        Err(AbiError::invalid(format!("invalid fixed bytes length {len}")))
    }
}

impl TryFrom<&DynSolType> for ParamType {
    type Error = AbiError;

    fn try_from(ty: &DynSolType) -> Result<Self, Self::Error> {
        Ok(match ty {
            DynSolType::Address => Self::Address,
            DynSolType::Bool => Self::Bool,
            DynSolType::String => Self::String,
            DynSolType::Bytes => Self::Bytes,
            DynSolType::Function => Self::Function,
            DynSolType::FixedBytes(n) => Self::FixedBytes(*n),
            DynSolType::Uint(bits) => Self::Uint(*bits),
            DynSolType::Int(bits) => Self::Int(*bits),
            DynSolType::Array(inner) => Self::Array(Box::new(inner.as_ref().try_into()?)),
            DynSolType::FixedArray(inner, len) => {
                Self::FixedArray(Box::new(inner.as_ref().try_into()?), *len)
            }
            DynSolType::Tuple(members) => {
                if members.is_empty() {
                    return Err(AbiError::invalid("tuple must have at least one component"));
                }
                Self::Tuple(members.iter().map(Self::try_from).collect::<Result<_, _>>()?)
            }
            #[allow(unreachable_patterns)]
            other => return Err(AbiError::invalid(format!("unsupported type '{other}'"))),
        })
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => write!(f, "address"),
            Self::Bool => write!(f, "bool"),
            Self::String => write!(f, "string"),
            Self::Bytes => write!(f, "bytes"),
            Self::Function => write!(f, "function"),
            Self::FixedBytes(n) => write!(f, "bytes{n}"),
            Self::Uint(bits) => write!(f, "uint{bits}"),
            Self::Int(bits) => write!(f, "int{bits}"),
            Self::Array(inner) => write!(f, "{inner}[]"),
            Self::FixedArray(inner, len) => write!(f, "{inner}[{len}]"),
            Self::Tuple(members) => {
                f.write_str("(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for ParamType {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = DynSolType::parse(&crate::parser::tidy(s))
            .map_err(|e| AbiError::invalid(format!("invalid type '{s}': {e}")))?;
        Self::try_from(&ty)
    }
}

impl Serialize for ParamType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ParamType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
