//! Structured (JSON) ABI records.
//!
//! Records are read and written through `alloy_json_abi`, which also
//! understands the pre-0.5 `constant` / `payable` flags. This module maps
//! its items onto [`Fragment`]s. `fallback` and `receive` entries are
//! accepted but produce no fragment: they have no name and no selector.

use alloy_core::dyn_abi::{DynSolType, Specifier};
use alloy_json_abi::{
    AbiItem, Constructor, Error as ErrorItem, Event, EventParam, Function, JsonAbi,
    Param as AbiParam, StateMutability as AbiMutability,
};
use serde_json::{Map, Value as Json};

use crate::error::AbiError;
use crate::fragment::{Fragment, FragmentKind, Param, StateMutability};
use crate::parser::parse_fragment;
use crate::types::ParamType;

impl From<AbiMutability> for StateMutability {
    fn from(m: AbiMutability) -> Self {
        match m {
            AbiMutability::Pure => Self::Pure,
            AbiMutability::View => Self::View,
            AbiMutability::NonPayable => Self::NonPayable,
            AbiMutability::Payable => Self::Payable,
        }
    }
}

impl From<StateMutability> for AbiMutability {
    fn from(m: StateMutability) -> Self {
        match m {
            StateMutability::Pure => Self::Pure,
            StateMutability::View => Self::View,
            StateMutability::NonPayable => Self::NonPayable,
            StateMutability::Payable => Self::Payable,
        }
    }
}

// ─── alloy → Fragment ─────────────────────────────────────────────────────────

fn canonical_type(name: &str, resolved: alloy_core::dyn_abi::Result<DynSolType>) -> Result<ParamType, AbiError> {
    let ty = resolved.map_err(|e| AbiError::invalid(format!("parameter '{name}': {e}")))?;
    ParamType::try_from(&ty)
}

fn from_abi_param(p: &AbiParam) -> Result<Param, AbiError> {
    let ty = canonical_type(&p.name, p.resolve())?;
    let mut param = Param::new(ty).named(p.name.clone());
    param.components = from_abi_params(&p.components)?;
    Ok(param)
}

fn from_abi_params(params: &[AbiParam]) -> Result<Vec<Param>, AbiError> {
    params.iter().map(from_abi_param).collect()
}

fn from_event_param(p: &EventParam) -> Result<Param, AbiError> {
    let ty = canonical_type(&p.name, p.resolve())?;
    let mut param = Param::new(ty).named(p.name.clone());
    param.indexed = p.indexed;
    param.components = from_abi_params(&p.components)?;
    Ok(param)
}

fn require_name(kind: FragmentKind, name: &str) -> Result<String, AbiError> {
    if name.is_empty() {
        return Err(AbiError::invalid(format!("{kind} entry has no name")));
    }
    Ok(name.to_string())
}

fn from_function(f: &Function) -> Result<Fragment, AbiError> {
    Ok(Fragment {
        kind: FragmentKind::Function,
        name: require_name(FragmentKind::Function, &f.name)?,
        inputs: from_abi_params(&f.inputs)?,
        outputs: from_abi_params(&f.outputs)?,
        state_mutability: f.state_mutability.into(),
        anonymous: false,
    })
}

fn from_event(e: &Event) -> Result<Fragment, AbiError> {
    Ok(Fragment {
        kind: FragmentKind::Event,
        name: require_name(FragmentKind::Event, &e.name)?,
        inputs: e.inputs.iter().map(from_event_param).collect::<Result<_, _>>()?,
        outputs: Vec::new(),
        state_mutability: StateMutability::default(),
        anonymous: e.anonymous,
    })
}

fn from_error(e: &ErrorItem) -> Result<Fragment, AbiError> {
    Ok(Fragment {
        kind: FragmentKind::Error,
        name: require_name(FragmentKind::Error, &e.name)?,
        inputs: from_abi_params(&e.inputs)?,
        outputs: Vec::new(),
        state_mutability: StateMutability::default(),
        anonymous: false,
    })
}

fn from_constructor(c: &Constructor) -> Result<Fragment, AbiError> {
    Ok(Fragment {
        kind: FragmentKind::Constructor,
        name: "constructor".to_string(),
        inputs: from_abi_params(&c.inputs)?,
        outputs: Vec::new(),
        state_mutability: c.state_mutability.into(),
        anonymous: false,
    })
}

/// Convert one alloy ABI item. Returns `Ok(None)` for `fallback` and
/// `receive`.
pub fn fragment_from_item(item: &AbiItem<'_>) -> Result<Option<Fragment>, AbiError> {
    match item {
        AbiItem::Function(f) => from_function(f).map(Some),
        AbiItem::Event(e) => from_event(e).map(Some),
        AbiItem::Error(e) => from_error(e).map(Some),
        AbiItem::Constructor(c) => from_constructor(c).map(Some),
        AbiItem::Fallback(_) | AbiItem::Receive(_) => Ok(None),
    }
}

/// Every fragment of an already-parsed [`JsonAbi`].
pub fn fragments_from_json_abi(abi: &JsonAbi) -> Result<Vec<Fragment>, AbiError> {
    let mut fragments = Vec::with_capacity(abi.len());
    for item in abi.items() {
        fragments.extend(fragment_from_item(&item)?);
    }
    Ok(fragments)
}

/// Fills the keys solc may leave out: `type` defaults to `function`, and
/// empty `inputs` / `outputs` may be omitted.
fn fill_defaults(record: &mut Map<String, Json>) {
    let kind = record
        .entry("type")
        .or_insert_with(|| Json::from("function"))
        .as_str()
        .unwrap_or_default()
        .to_string();

    if matches!(kind.as_str(), "function" | "event" | "error" | "constructor") {
        record.entry("inputs").or_insert_with(|| Json::Array(Vec::new()));
    }
    match kind.as_str() {
        "function" => {
            record.entry("outputs").or_insert_with(|| Json::Array(Vec::new()));
        }
        "event" => {
            record.entry("anonymous").or_insert(Json::Bool(false));
        }
        _ => {}
    }
}

/// Convert one JSON record. Returns `Ok(None)` for `fallback` and `receive`.
pub(crate) fn fragment_from_value(record: Json) -> Result<Option<Fragment>, AbiError> {
    let Json::Object(mut record) = record else {
        return Err(AbiError::invalid("ABI entry must be an object"));
    };
    fill_defaults(&mut record);
    let item: AbiItem<'static> = serde_json::from_value(Json::Object(record))
        .map_err(|e| AbiError::invalid(format!("invalid ABI entry: {e}")))?;
    fragment_from_item(&item)
}

// ─── Fragment → alloy ─────────────────────────────────────────────────────────

fn to_abi_param(p: &Param) -> AbiParam {
    // Hand-built tuple params may carry no components; derive unnamed ones.
    let components = if p.components.is_empty() {
        p.ty.tuple_base()
            .map(|members| {
                members
                    .iter()
                    .map(|ty| to_abi_param(&Param::new(ty.clone())))
                    .collect()
            })
            .unwrap_or_default()
    } else {
        p.components.iter().map(to_abi_param).collect()
    };
    AbiParam {
        ty: p.ty.json_type(),
        name: p.name.clone().unwrap_or_default(),
        components,
        internal_type: None,
    }
}

fn to_event_param(p: &Param) -> EventParam {
    let AbiParam {
        ty,
        name,
        components,
        internal_type,
    } = to_abi_param(p);
    EventParam {
        ty,
        name,
        indexed: p.indexed,
        components,
        internal_type,
    }
}

/// The alloy ABI item for a fragment.
pub fn to_abi_item(f: &Fragment) -> AbiItem<'static> {
    let inputs = || f.inputs.iter().map(to_abi_param).collect();
    match f.kind {
        FragmentKind::Function => Function {
            name: f.name.clone(),
            inputs: inputs(),
            outputs: f.outputs.iter().map(to_abi_param).collect(),
            state_mutability: f.state_mutability.into(),
        }
        .into(),
        FragmentKind::Event => Event {
            name: f.name.clone(),
            inputs: f.inputs.iter().map(to_event_param).collect(),
            anonymous: f.anonymous,
        }
        .into(),
        FragmentKind::Error => ErrorItem {
            name: f.name.clone(),
            inputs: inputs(),
        }
        .into(),
        FragmentKind::Constructor => Constructor {
            inputs: inputs(),
            state_mutability: f.state_mutability.into(),
        }
        .into(),
    }
}

/// Parse a whole ABI.
///
/// Accepts a JSON array, an artifact object with an `"abi"` array, or an
/// array whose entries are human-readable fragment strings. Entries without
/// a signature (`fallback`, `receive`) are skipped.
pub fn parse_abi(source: &str) -> Result<Vec<Fragment>, AbiError> {
    let value: Json = serde_json::from_str(source)
        .map_err(|e| AbiError::invalid(format!("invalid ABI JSON: {e}")))?;

    let entries = match value {
        Json::Array(items) => items,
        Json::Object(mut obj) => match obj.remove("abi") {
            Some(Json::Array(items)) => items,
            _ => return Err(AbiError::invalid("artifact object has no \"abi\" array")),
        },
        _ => return Err(AbiError::invalid("ABI must be an array or an artifact object")),
    };

    let mut fragments = Vec::with_capacity(entries.len());
    for entry in entries {
        let fragment = match entry {
            Json::String(s) => Some(parse_fragment(&s)?),
            other => fragment_from_value(other)?,
        };
        fragments.extend(fragment);
    }
    Ok(fragments)
}
