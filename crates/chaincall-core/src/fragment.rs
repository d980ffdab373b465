//! Parsed ABI fragments.
//!
//! A `Fragment` is one entry of a contract ABI: a function, event, error or
//! constructor. Fragments are immutable once parsed and are identified by
//! their canonical signature, `name(type1,type2,...)`.

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AbiError;
use crate::json;
use crate::parser;
use crate::selector;
use crate::types::ParamType;

/// What kind of ABI entry a fragment describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Function,
    Event,
    Error,
    Constructor,
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function => write!(f, "function"),
            Self::Event => write!(f, "event"),
            Self::Error => write!(f, "error"),
            Self::Constructor => write!(f, "constructor"),
        }
    }
}

/// Declared side-effect class of a function or constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    #[default]
    NonPayable,
    Payable,
}

impl StateMutability {
    /// Pure and view methods never change state; they are called, not sent.
    pub fn is_constant(self) -> bool {
        matches!(self, Self::Pure | Self::View)
    }

    /// Parse a human-readable mutability keyword. `constant` is the pre-0.5
    /// spelling of `view`.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "pure" => Some(Self::Pure),
            "view" | "constant" => Some(Self::View),
            "nonpayable" => Some(Self::NonPayable),
            "payable" => Some(Self::Payable),
            _ => None,
        }
    }
}

impl fmt::Display for StateMutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pure => write!(f, "pure"),
            Self::View => write!(f, "view"),
            Self::NonPayable => write!(f, "nonpayable"),
            Self::Payable => write!(f, "payable"),
        }
    }
}

/// One input or output parameter of a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    /// Parameter name; `None` when the ABI leaves it blank
    pub name: Option<String>,
    /// Canonical type
    pub ty: ParamType,
    /// Event parameters only: stored in a topic instead of the data section
    pub indexed: bool,
    /// Named members when the type's base is a tuple, in declaration order
    pub components: Vec<Param>,
}

impl Param {
    /// An unnamed, non-indexed parameter of the given type.
    pub fn new(ty: ParamType) -> Self {
        Self {
            name: None,
            ty,
            indexed: false,
            components: Vec::new(),
        }
    }

    /// Builder-style name setter.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.is_empty() { None } else { Some(name) };
        self
    }

    /// Name for display and result lookup, falling back to the position.
    pub fn display_name(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| index.to_string())
    }

    /// Full human-readable form, e.g. `address indexed from` or
    /// `(address,uint256)[] transfers`. Tuple members are written by type
    /// only; the human-readable grammar has no member names.
    pub fn format_full(&self) -> String {
        let mut out = self.ty.to_string();
        if self.indexed {
            out.push_str(" indexed");
        }
        if let Some(name) = &self.name {
            out.push(' ');
            out.push_str(name);
        }
        out
    }
}

/// A parsed ABI entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fragment {
    pub kind: FragmentKind,
    /// Method / event / error name. Constructors are named `constructor`.
    pub name: String,
    pub inputs: Vec<Param>,
    /// Functions only
    pub outputs: Vec<Param>,
    pub state_mutability: StateMutability,
    /// Events only
    pub anonymous: bool,
}

impl Fragment {
    /// Parse a human-readable fragment such as
    /// `"function balanceOf(address owner) view returns (uint256)"`.
    pub fn parse(s: &str) -> Result<Self, AbiError> {
        parser::parse_fragment(s)
    }

    /// Parse a single structured (JSON) ABI record.
    ///
    /// Returns an error for `fallback` / `receive` entries, which have no
    /// signature; use [`crate::json::parse_abi`] for whole ABIs.
    pub fn from_json(source: &str) -> Result<Self, AbiError> {
        let record: serde_json::Value = serde_json::from_str(source)
            .map_err(|e| AbiError::invalid(format!("invalid ABI JSON: {e}")))?;
        json::fragment_from_value(record)?
            .ok_or_else(|| AbiError::invalid("fragment has no callable signature"))
    }

    /// Canonical signature: `name(type1,type2,...)`, no names, no spaces.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.inputs.iter().map(|p| p.ty.to_string()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// 4-byte selector of the canonical signature.
    pub fn selector(&self) -> [u8; 4] {
        selector::selector(&self.signature())
    }

    /// Full 32-byte Keccak-256 of the canonical signature (event topic 0).
    pub fn topic(&self) -> B256 {
        selector::topic(&self.signature())
    }

    pub fn input_types(&self) -> Vec<ParamType> {
        self.inputs.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn output_types(&self) -> Vec<ParamType> {
        self.outputs.iter().map(|p| p.ty.clone()).collect()
    }

    /// True for pure / view functions.
    pub fn is_constant(&self) -> bool {
        self.state_mutability.is_constant()
    }

    pub fn is_payable(&self) -> bool {
        self.state_mutability == StateMutability::Payable
    }

    /// Human-readable form. Re-parses to an identical fragment, except that
    /// tuple member names are dropped.
    pub fn format_full(&self) -> String {
        let inputs: Vec<String> = self.inputs.iter().map(Param::format_full).collect();
        let mut out = match self.kind {
            FragmentKind::Constructor => format!("constructor({})", inputs.join(", ")),
            kind => format!("{kind} {}({})", self.name, inputs.join(", ")),
        };

        match self.kind {
            FragmentKind::Function | FragmentKind::Constructor => {
                if self.state_mutability != StateMutability::NonPayable {
                    out.push(' ');
                    out.push_str(&self.state_mutability.to_string());
                }
            }
            FragmentKind::Event if self.anonymous => out.push_str(" anonymous"),
            _ => {}
        }

        if self.kind == FragmentKind::Function && !self.outputs.is_empty() {
            let outputs: Vec<String> = self.outputs.iter().map(Param::format_full).collect();
            out.push_str(&format!(" returns ({})", outputs.join(", ")));
        }
        out
    }

    /// Structured JSON form, as emitted by solc.
    pub fn to_json(&self) -> serde_json::Value {
        // ABI items only hold strings, bools and vectors of the same.
        serde_json::to_value(json::to_abi_item(self)).unwrap_or_default()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_full())
    }
}

impl FromStr for Fragment {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
