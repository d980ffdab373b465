//! Error types for the ChainCall parse → resolve → dispatch pipeline.

use thiserror::Error;

/// Errors raised while parsing fragments or building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("Invalid fragment: {reason}")]
    InvalidFragment { reason: String },

    #[error("Duplicate fragment: {signature}")]
    DuplicateFragment { signature: String },
}

impl AbiError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidFragment {
            reason: reason.into(),
        }
    }
}

/// Errors raised while resolving a method key and arguments to a fragment.
///
/// All of these are recoverable: the caller may retry with typed arguments
/// or a fully-qualified signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No such method: {name}")]
    NoSuchMethod { name: String },

    #[error("No overload of '{name}' accepts the given {count} argument(s)")]
    NoMatchingOverload { name: String, count: usize },

    #[error("Ambiguous method '{name}': matches {}", candidates.join(", "))]
    AmbiguousMethod {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Type mismatch for {signature} argument {index}: expected {expected}, got {got}")]
    TypeMismatch {
        signature: String,
        index: usize,
        expected: String,
        got: String,
    },

    #[error("Argument count mismatch for {signature}: expected {expected}, got {got}")]
    ArgumentCount {
        signature: String,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    InvalidKey(#[from] AbiError),
}

/// Errors from the transaction and signature codecs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Invalid transaction: {reason}")]
    InvalidTransaction { reason: String },

    #[error("Invalid signature: {reason}")]
    InvalidSignature { reason: String },
}

impl CodecError {
    pub fn transaction(reason: impl Into<String>) -> Self {
        Self::InvalidTransaction {
            reason: reason.into(),
        }
    }

    pub fn signature(reason: impl Into<String>) -> Self {
        Self::InvalidSignature {
            reason: reason.into(),
        }
    }
}

/// Errors converting between call-site values and ABI words.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Cannot encode {value} as {ty}: {reason}")]
    Value {
        value: String,
        ty: String,
        reason: String,
    },

    #[error("ABI decode failed: {reason}")]
    Decode { reason: String },
}

/// Errors reported by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection-level failure (refused, reset, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if this error is transient and the request may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout { .. })
    }
}

/// Errors from a dispatcher operation.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Transport failures are passed through untouched.
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Non-payable method {signature} cannot receive value")]
    NonPayableValue { signature: String },

    #[error("Could not decode result of {signature}: {reason}")]
    Decode { signature: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_lists_candidates() {
        let err = ResolveError::AmbiguousMethod {
            name: "foo".into(),
            candidates: vec!["foo(address)".into(), "foo(uint160)".into()],
        };
        assert_eq!(
            err.to_string(),
            "Ambiguous method 'foo': matches foo(address), foo(uint160)"
        );
    }

    #[test]
    fn transport_error_is_transparent() {
        let err: DispatchError = TransportError::Rpc {
            code: -32000,
            message: "execution reverted".into(),
        }
        .into();
        assert_eq!(err.to_string(), "RPC error -32000: execution reverted");
        assert!(matches!(err, DispatchError::Transport(TransportError::Rpc { .. })));
    }
}
