//! Human-readable fragments.
//!
//! The grammar itself is alloy's (`alloy_json_abi::AbiItem::parse`). This
//! module adds what that grammar leaves out:
//! - `constant` (read as `view`) and an explicit `nonpayable`
//! - visibility words (`external`, `public`) before or after the mutability
//! - stray whitespace inside parameter lists
//! - `indexed` is rejected outside event parameters
//!
//! Parameter names, data locations and whitespace never affect the
//! canonical signature.

use alloy_json_abi::{parser::Parameters, AbiItem, Function};

use crate::error::AbiError;
use crate::fragment::{Fragment, FragmentKind, StateMutability};
use crate::json::fragment_from_item;

const KEYWORDS: [&str; 4] = ["function", "event", "error", "constructor"];

/// Parse a human-readable fragment. The kind keyword is mandatory.
pub fn parse_fragment(s: &str) -> Result<Fragment, AbiError> {
    parse_with_default(s, false)
}

/// Normalize a signature-like key (`"foo(address bar, uint)"`,
/// `"function foo(address) returns (bool)"`) to its canonical form.
pub fn normalize_signature(s: &str) -> Result<String, AbiError> {
    parse_with_default(s, true).map(|f| f.signature())
}

fn parse_with_default(s: &str, keyword_optional: bool) -> Result<Fragment, AbiError> {
    let tidy = tidy(s);
    let (source, mutability) = strip_modifiers(&tidy)?;
    let invalid = |e: alloy_json_abi::parser::Error| AbiError::invalid(format!("'{s}': {e}"));

    let item = if keyword_optional && !KEYWORDS.contains(&leading_word(&source).unwrap_or_default()) {
        AbiItem::from(Function::parse(&source).map_err(invalid)?)
    } else {
        AbiItem::parse(&source).map_err(invalid)?
    };
    let mut fragment = fragment_from_item(&item)?
        .ok_or_else(|| AbiError::invalid(format!("'{s}' has no callable signature")))?;

    if fragment.kind != FragmentKind::Event && declares_indexed(&source) {
        return Err(AbiError::invalid("'indexed' is only valid on event parameters"));
    }

    match (fragment.kind, mutability) {
        (_, None) => {}
        (FragmentKind::Function, Some(m)) => fragment.state_mutability = m,
        (FragmentKind::Constructor, Some(m)) if !m.is_constant() => fragment.state_mutability = m,
        (kind, Some(m)) => {
            return Err(AbiError::invalid(format!("unexpected '{m}' in {kind} fragment")))
        }
    }
    Ok(fragment)
}

/// Collapses whitespace runs and drops them where the grammar allows none:
/// after `(` `[` `,` and before `)` `[` `]` `,`.
pub(crate) fn tidy(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for c in s.trim().chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space
            && !matches!(c, ')' | '[' | ']' | ',')
            && !matches!(out.chars().last(), Some('(' | '[' | ','))
        {
            out.push(' ');
        }
        pending_space = false;
        out.push(c);
    }
    out
}

fn leading_word(s: &str) -> Option<&str> {
    let end = s
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(s.len());
    (end > 0).then(|| &s[..end])
}

/// Byte offset of the `)` closing the input parameter list.
fn inputs_end(s: &str) -> Result<usize, AbiError> {
    let open = s
        .find('(')
        .ok_or_else(|| AbiError::invalid(format!("missing parameter list in '{s}'")))?;
    let mut depth = 0usize;
    for (offset, c) in s[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(open + offset);
                }
            }
            _ => {}
        }
    }
    Err(AbiError::invalid(format!("unbalanced parentheses in '{s}'")))
}

/// Removes visibility and mutability words that follow the input list.
fn strip_modifiers(s: &str) -> Result<(String, Option<StateMutability>), AbiError> {
    let (head, tail) = s.split_at(inputs_end(s)? + 1);
    let mut rest = tail.trim_start();
    let mut mutability = None;

    while let Some(word) = leading_word(rest) {
        match word {
            "external" | "public" => {}
            w => match StateMutability::from_keyword(w) {
                Some(m) if mutability.is_none() => mutability = Some(m),
                Some(_) => {
                    return Err(AbiError::invalid(format!("repeated state mutability in '{s}'")))
                }
                None => break,
            },
        }
        rest = rest[word.len()..].trim_start();
    }

    let source = if rest.is_empty() {
        head.to_string()
    } else {
        format!("{head} {rest}")
    };
    Ok((source, mutability))
}

fn declares_indexed(source: &str) -> bool {
    let Some(open) = source.find('(') else {
        return false;
    };
    let Ok(close) = inputs_end(source) else {
        return false;
    };
    Parameters::parse(&source[open..=close])
        .map(|list| list.params.iter().any(|p| p.indexed))
        .unwrap_or(false)
}

/// Parse a single type string such as `tuple(uint,bytes)[]`.
pub fn parse_type(s: &str) -> Result<crate::types::ParamType, AbiError> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_function_with_modifiers() {
        let f = parse_fragment("function foo(address bar, uint) external view returns (uint256 baz)").unwrap();
        assert_eq!(f.kind, FragmentKind::Function);
        assert_eq!(f.name, "foo");
        assert_eq!(f.inputs[0].name.as_deref(), Some("bar"));
        assert_eq!(f.inputs[1].name, None);
        assert_eq!(f.state_mutability, StateMutability::View);
        assert_eq!(f.outputs[0].name.as_deref(), Some("baz"));

        let g = parse_fragment("function foo(address bar, uint) view external returns (uint256 baz)").unwrap();
        assert_eq!(f, g);
    }

    #[test]
    fn constant_means_view() {
        let f = parse_fragment("function totalSupply() constant returns (uint)").unwrap();
        assert_eq!(f.state_mutability, StateMutability::View);
        let f = parse_fragment("function poke() nonpayable").unwrap();
        assert_eq!(f.state_mutability, StateMutability::NonPayable);
    }

    #[test]
    fn data_locations_are_ignored() {
        let f = parse_fragment("function setName(string memory name, bytes calldata)").unwrap();
        assert_eq!(f.signature(), "setName(string,bytes)");
        assert_eq!(f.inputs[0].name.as_deref(), Some("name"));
    }

    #[test]
    fn parses_event_with_indexed() {
        let f = parse_fragment("event Approval(address indexed owner, address indexed spender, uint256 value)")
            .unwrap();
        assert!(f.inputs[0].indexed);
        assert!(!f.inputs[2].indexed);
    }

    #[test]
    fn indexed_outside_event_is_invalid() {
        assert!(parse_fragment("function foo(address indexed a)").is_err());
        assert!(parse_fragment("error Bad(uint256 indexed code)").is_err());
    }

    #[test]
    fn constructor_has_implicit_name() {
        let f = parse_fragment("constructor(address owner, uint256 supply)").unwrap();
        assert_eq!(f.kind, FragmentKind::Constructor);
        assert_eq!(f.signature(), "constructor(address,uint256)");
        assert!(parse_fragment("constructor(address owner) view").is_err());
        assert_eq!(
            parse_fragment("constructor() payable").unwrap().state_mutability,
            StateMutability::Payable
        );
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in [
            "function foo(address",
            "function foo(addr)",
            "function foo(uint256[0])",
            "function foo(uint256[]x])",
            "function foo(tuple())",
            "function (address)",
            "function foo(address) view pure",
            "function foo(address) returns (bool) returns (bool)",
            "event Foo(address) view",
            "error Bad(uint256) payable",
            "foo(address)",
            "function foo(address a b)",
            "function foo(address) #",
        ] {
            assert!(parse_fragment(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn normalizes_cosmetic_variants() {
        for variant in [
            "foo(address,uint256)",
            "foo( address , uint256 )",
            "foo(address owner, uint amount)",
            "foo(address  owner ,uint  amount )",
            "function foo(address, uint256) returns (bool)",
        ] {
            assert_eq!(normalize_signature(variant).unwrap(), "foo(address,uint256)");
        }
    }

    #[test]
    fn normalizes_event_keys() {
        assert_eq!(
            normalize_signature("event Transfer(address indexed, address indexed, uint256)").unwrap(),
            "Transfer(address,address,uint256)"
        );
    }

    #[test]
    fn tidy_keeps_word_separators() {
        assert_eq!(tidy("  function  f( uint a ,bool b ) view "), "function f(uint a,bool b) view");
        assert_eq!(parse_type(" ( uint , bytes ) [ ] ").unwrap().to_string(), "(uint256,bytes)[]");
    }
}
