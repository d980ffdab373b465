//! Overload resolution: method key + call-site arguments → one fragment.
//!
//! A key containing `(` is a signature and is looked up directly. A bare
//! name with a single fragment selects it outright. A bare name with
//! several overloads keeps the candidates whose arity matches and whose
//! parameters accept every argument; exactly one must survive.

use chaincall_core::{
    error::ResolveError,
    fragment::Fragment,
    parser::normalize_signature,
    typed::Arg,
    types::ParamType,
    value::Value,
};
use std::sync::Arc;
use tracing::{debug, trace};

use crate::registry::MethodRegistry;

/// A fragment paired with the arguments it will be encoded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCall {
    pub fragment: Arc<Fragment>,
    /// One entry per input, in order
    pub arguments: Vec<(Value, ParamType)>,
}

impl ResolvedCall {
    pub fn signature(&self) -> String {
        self.fragment.signature()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.arguments.iter().map(|(v, _)| v)
    }
}

/// Resolve `key` against the registry and pair each argument with its
/// parameter type.
pub fn resolve(
    registry: &MethodRegistry,
    key: &str,
    args: Vec<Arg>,
) -> Result<ResolvedCall, ResolveError> {
    let fragment = select(registry, key, &args)?;
    debug!(key, signature = %fragment.signature(), args = args.len(), "resolved method");

    let arguments = args
        .into_iter()
        .zip(&fragment.inputs)
        .map(|(arg, param)| {
            let value = match arg {
                Arg::Plain(v) => v,
                Arg::Typed(t) => t.into_parts().1,
            };
            (value, param.ty.clone())
        })
        .collect();

    Ok(ResolvedCall {
        fragment,
        arguments,
    })
}

/// Pick the fragment `key` and `args` refer to without consuming the args.
pub fn select(
    registry: &MethodRegistry,
    key: &str,
    args: &[Arg],
) -> Result<Arc<Fragment>, ResolveError> {
    let fragment = if key.contains('(') {
        let signature = normalize_signature(key)?;
        let found = registry
            .function_by_signature(&signature)
            .ok_or(ResolveError::NoSuchMethod { name: signature })?;
        Arc::clone(found)
    } else {
        match registry.functions_named(key) {
            [] => {
                return Err(ResolveError::NoSuchMethod {
                    name: key.to_string(),
                })
            }
            [only] => Arc::clone(only),
            overloads => pick_overload(key, overloads, args)?,
        }
    };

    check_arguments(&fragment, args)?;
    Ok(fragment)
}

/// Check that `key` names at least one function, without resolving
/// arguments.
pub fn lookup(registry: &MethodRegistry, key: &str) -> Result<(), ResolveError> {
    let found = if key.contains('(') {
        let signature = normalize_signature(key)?;
        if registry.function_by_signature(&signature).is_none() {
            return Err(ResolveError::NoSuchMethod { name: signature });
        }
        true
    } else {
        !registry.functions_named(key).is_empty()
    };

    if found {
        Ok(())
    } else {
        Err(ResolveError::NoSuchMethod {
            name: key.to_string(),
        })
    }
}

fn pick_overload(
    name: &str,
    overloads: &[Arc<Fragment>],
    args: &[Arg],
) -> Result<Arc<Fragment>, ResolveError> {
    let survivors: Vec<&Arc<Fragment>> = overloads
        .iter()
        .filter(|f| {
            let accepted = f.inputs.len() == args.len()
                && f.inputs.iter().zip(args).all(|(p, a)| a.matches(&p.ty));
            trace!(candidate = %f.signature(), accepted, "overload candidate");
            accepted
        })
        .collect();

    match survivors.as_slice() {
        [] => Err(ResolveError::NoMatchingOverload {
            name: name.to_string(),
            count: args.len(),
        }),
        [one] => Ok(Arc::clone(one)),
        many => Err(ResolveError::AmbiguousMethod {
            name: name.to_string(),
            candidates: many.iter().map(|f| f.signature()).collect(),
        }),
    }
}

fn check_arguments(fragment: &Fragment, args: &[Arg]) -> Result<(), ResolveError> {
    if fragment.inputs.len() != args.len() {
        return Err(ResolveError::ArgumentCount {
            signature: fragment.signature(),
            expected: fragment.inputs.len(),
            got: args.len(),
        });
    }

    for (index, (param, arg)) in fragment.inputs.iter().zip(args).enumerate() {
        if let Some(typed) = arg.typed() {
            if typed.ty() != &param.ty {
                return Err(ResolveError::TypeMismatch {
                    signature: fragment.signature(),
                    index,
                    expected: param.ty.to_string(),
                    got: typed.ty().to_string(),
                });
            }
        }
    }
    Ok(())
}
