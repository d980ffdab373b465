//! # chaincall-evm
//!
//! Method registry, overload resolution and dispatch for EVM contracts,
//! plus the transaction and signature wire codecs.
//!
//! ## Implementation notes
//! - ABI words are encoded and decoded with `alloy-core`'s `dyn_abi`
//! - RLP primitives come from `alloy-rlp`; secp256k1 recovery from `k256`
//! - Network I/O is delegated to a [`CallTransport`] implementation

pub mod call_decoder;
pub mod coder;
pub mod config;
pub mod contract;
pub mod encoder;
pub mod normalizer;
pub mod registry;
pub mod resolver;
mod rlp;
pub mod signature;
pub mod transaction;
pub mod transport;

pub use call_decoder::{decode_call, DecodedCall, DecodedValues};
pub use coder::AbiCoder;
pub use config::{ConfigError, DispatchConfig};
pub use contract::{CallOutcome, CallOverrides, Contract, MethodDescriptor};
pub use registry::MethodRegistry;
pub use resolver::{resolve, ResolvedCall};
pub use signature::Signature;
pub use transaction::{AccessListItem, Transaction, TxType};
pub use transport::{CallRequest, CallTransport, PendingTransaction};
