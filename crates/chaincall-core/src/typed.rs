//! Explicitly typed call arguments.
//!
//! Wrapping a value in a [`TypedValue`] pins it to one canonical type, which
//! is how a caller picks between overloads such as `foo(address)` and
//! `foo(uint160)` without spelling out the signature.

use alloy_primitives::{Address, Bytes, I256, U256};
use serde::{Deserialize, Serialize};

use crate::error::AbiError;
use crate::types::ParamType;
use crate::value::Value;

/// A value tagged with an explicit canonical ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedValue {
    #[serde(rename = "type")]
    ty: ParamType,
    value: Value,
}

impl TypedValue {
    pub fn new(ty: ParamType, value: impl Into<Value>) -> Self {
        Self {
            ty,
            value: value.into(),
        }
    }

    /// Tag `value` with a type given as a string, e.g. `("uint160", addr)`.
    pub fn parse(ty: &str, value: impl Into<Value>) -> Result<Self, AbiError> {
        Ok(Self::new(ty.parse()?, value))
    }

    pub fn address(address: Address) -> Self {
        Self::new(ParamType::Address, address)
    }

    pub fn uint(bits: usize, value: impl Into<U256>) -> Result<Self, AbiError> {
        let ty = ParamType::uint(bits)?;
        Ok(Self::new(ty, Value::Uint(value.into())))
    }

    /// `intN`. Accepts anything convertible to a [`Value`], e.g. `i64` or `I256`.
    pub fn int(bits: usize, value: impl Into<Value>) -> Result<Self, AbiError> {
        let ty = ParamType::int(bits)?;
        Ok(Self::new(ty, value))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(ParamType::Bool, value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ParamType::String, Value::Str(value.into()))
    }

    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self::new(ParamType::Bytes, Value::Bytes(value.into()))
    }

    /// `bytesN` where N is the length of `value`.
    pub fn fixed_bytes(value: &[u8]) -> Result<Self, AbiError> {
        let ty = ParamType::fixed_bytes(value.len())?;
        Ok(Self::new(ty, Value::Bytes(Bytes::copy_from_slice(value))))
    }

    pub fn ty(&self) -> &ParamType {
        &self.ty
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_parts(self) -> (ParamType, Value) {
        (self.ty, self.value)
    }
}

/// One call-site argument: either a plain value left to overload
/// resolution, or a value pinned to an explicit type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Arg {
    Typed(TypedValue),
    Plain(Value),
}

impl Arg {
    pub fn value(&self) -> &Value {
        match self {
            Self::Plain(v) => v,
            Self::Typed(t) => t.value(),
        }
    }

    pub fn typed(&self) -> Option<&TypedValue> {
        match self {
            Self::Typed(t) => Some(t),
            Self::Plain(_) => None,
        }
    }

    /// Short description for error messages: the pinned type, or the
    /// value's shape.
    pub fn describe(&self) -> String {
        match self {
            Self::Typed(t) => t.ty().to_string(),
            Self::Plain(v) => v.kind().to_string(),
        }
    }

    /// Whether this argument can be passed for a parameter of type `ty`.
    /// Typed arguments need an exact type match.
    pub fn matches(&self, ty: &ParamType) -> bool {
        match self {
            Self::Typed(t) => t.ty() == ty,
            Self::Plain(v) => v.is_assignable_to(ty),
        }
    }
}

impl From<TypedValue> for Arg {
    fn from(t: TypedValue) -> Self {
        Self::Typed(t)
    }
}

macro_rules! impl_plain_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(v: $ty) -> Self {
                    Self::Plain(Value::from(v))
                }
            }
        )*
    };
}

impl_plain_arg!(
    Value, bool, u8, u32, u64, u128, U256, i32, i64, i128, I256, Address, Bytes, Vec<u8>, &str,
    String, Vec<Value>,
);

/// Build a `Vec<Arg>` from heterogeneous values.
///
/// ```ignore
/// let args = args![owner, 1_000u64, TypedValue::uint(160, 7u64)?];
/// ```
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::Arg>::new() };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}
