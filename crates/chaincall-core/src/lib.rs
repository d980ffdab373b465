//! # chaincall-core
//!
//! ABI fragments, canonical types, selectors and call-site values shared by
//! every ChainCall crate. Everything here is pure and synchronous; the
//! registry, dispatcher and wire codecs live in `chaincall-evm`.

pub mod error;
pub mod fragment;
pub mod json;
pub mod parser;
pub mod selector;
pub mod typed;
pub mod types;
pub mod value;

pub use error::{AbiError, CodecError, DispatchError, EncodeError, ResolveError, TransportError};
pub use fragment::{Fragment, FragmentKind, Param, StateMutability};
pub use json::{fragment_from_item, fragments_from_json_abi, parse_abi, to_abi_item};
pub use parser::normalize_signature;
pub use selector::{keccak256, selector, selector_hex, topic};
pub use typed::{Arg, TypedValue};
pub use types::ParamType;
pub use value::Value;
