//! Solidity visitor.

use super::{has_child, walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct SolidityVisitor;

const CALLABLES: &[&str] = &[
    "function_definition",
    "constructor_definition",
    "modifier_definition",
    "fallback_receive_definition",
];

impl Visitor for SolidityVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "contract_declaration" | "library_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let details = contract_details(node, cx)?;
                    cx.emit(node, name, details)?;
                    let frame = scope.push(ScopeKind::Contract, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "interface_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let mut methods = Bullets::new();
                    for_each_member(node, |member| {
                        if member.kind() == "function_definition" {
                            if let Some(method) = cx.field_text(member, "name")? {
                                methods.push(method);
                            }
                        }
                        Ok(())
                    })?;
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Interface {
                            methods: methods.finish(),
                            properties: None,
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Interface, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "struct_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let mut fields = Bullets::new();
                    for_each_member(node, |member| {
                        if member.kind() == "struct_member" {
                            if let Some(field) = cx.field_text(member, "name")? {
                                fields.push(field);
                            }
                        }
                        Ok(())
                    })?;
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Struct {
                            fields: fields.finish(),
                            methods: None,
                        },
                    )?;
                }
            }
            "enum_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let mut variants = Bullets::new();
                    for_each_member(node, |member| {
                        if member.kind() == "enum_value" {
                            variants.push(cx.text(member)?);
                        }
                        Ok(())
                    })?;
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Enum {
                            variants: variants.finish(),
                            parent_class: scope.name_of(ScopeKind::Contract),
                        },
                    )?;
                }
            }
            kind if CALLABLES.contains(&kind) => {
                let name = callable_name(node, cx)?;
                let parent_class = scope.first_of(&[ScopeKind::Contract, ScopeKind::Interface]);
                let parent_function = match parent_class {
                    Some(_) => None,
                    None => scope.name_of(ScopeKind::Function),
                };
                cx.emit(
                    node,
                    name,
                    EntityDetails::Function {
                        parent_function,
                        parent_class,
                    },
                )?;
                let frame = scope.push(ScopeKind::Function, name, node);
                return walk_children(self, node, cx, frame.scope());
            }
            _ => {}
        }

        walk_children(self, node, cx, scope)
    }
}

/// Declared name, else `constructor`, `fallback` or `receive`, else the
/// node kind.
fn callable_name<'a>(node: Node<'_>, cx: &VisitContext<'a>) -> Result<&'a str, IndexerError> {
    if let Some(name) = cx.field_text(node, "name")? {
        return Ok(name);
    }
    Ok(match node.kind() {
        "constructor_definition" => "constructor",
        "fallback_receive_definition" if has_child(node, "receive") => "receive",
        "fallback_receive_definition" if has_child(node, "fallback") => "fallback",
        kind => kind,
    })
}

fn for_each_member<'t>(
    node: Node<'t>,
    mut f: impl FnMut(Node<'t>) -> Result<(), IndexerError>,
) -> Result<(), IndexerError> {
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            f(member)?;
        }
    }
    Ok(())
}

fn contract_details(node: Node<'_>, cx: &VisitContext<'_>) -> Result<EntityDetails, IndexerError> {
    let mut functions = Bullets::new();
    let mut events = Bullets::new();
    let mut modifiers = Bullets::new();
    let mut state_variables = Bullets::new();

    for_each_member(node, |member| {
        match member.kind() {
            "function_definition" | "constructor_definition" | "fallback_receive_definition" => {
                functions.push(callable_name(member, cx)?)
            }
            "event_definition" => {
                if let Some(event) = cx.field_text(member, "name")? {
                    events.push(event);
                }
            }
            "modifier_definition" => {
                if let Some(modifier) = cx.field_text(member, "name")? {
                    modifiers.push(modifier);
                }
            }
            "state_variable_declaration" => {
                if let Some(var) = cx.field_text(member, "name")? {
                    state_variables.push(var);
                }
            }
            _ => {}
        }
        Ok(())
    })?;

    Ok(EntityDetails::Contract {
        functions: functions.finish(),
        events: events.finish(),
        modifiers: modifiers.finish(),
        state_variables: state_variables.finish(),
    })
}

#[cfg(test)]
mod tests {
    use crate::entity::{EntityDetails, EntityKind};
    use crate::scanner::Language;
    use crate::visitors::test_support::{extract_all, find, names};

    const SOURCE: &str = r#"pragma solidity ^0.8.0;

interface IToken {
    function balanceOf(address owner) external view returns (uint256);
}

library SafeMath {
    function add(uint a, uint b) internal pure returns (uint) { return a + b; }
}

contract Token is IToken {
    struct Holder {
        address account;
        uint256 amount;
    }

    enum State { Active, Paused }

    uint256 public totalSupply;
    mapping(address => uint256) balances;

    event Transfer(address indexed from, address indexed to, uint256 value);

    modifier onlyActive() {
        _;
    }

    constructor(uint256 supply) {
        totalSupply = supply;
    }

    function balanceOf(address owner) external view returns (uint256) {
        return balances[owner];
    }

    receive() external payable {}
}
"#;

    #[test]
    fn test_contract_summary() {
        let entities = extract_all(Language::Solidity, "Token.sol", SOURCE);
        let token = find(&entities, EntityKind::Contract, "Token");
        let EntityDetails::Contract {
            functions,
            events,
            modifiers,
            state_variables,
        } = &token.details
        else {
            panic!("not a contract");
        };
        assert_eq!(
            functions.as_deref(),
            Some("- constructor\n- balanceOf\n- receive")
        );
        assert_eq!(events.as_deref(), Some("- Transfer"));
        assert_eq!(modifiers.as_deref(), Some("- onlyActive"));
        assert_eq!(state_variables.as_deref(), Some("- totalSupply\n- balances"));

        assert_eq!(
            names(&entities, EntityKind::Contract),
            vec!["SafeMath", "Token"]
        );
    }

    #[test]
    fn test_struct_enum_interface() {
        let entities = extract_all(Language::Solidity, "Token.sol", SOURCE);

        let holder = find(&entities, EntityKind::Struct, "Holder");
        let EntityDetails::Struct { fields, .. } = &holder.details else {
            panic!("not a struct");
        };
        assert_eq!(fields.as_deref(), Some("- account\n- amount"));

        let state = find(&entities, EntityKind::Enum, "State");
        let EntityDetails::Enum {
            variants,
            parent_class,
        } = &state.details
        else {
            panic!("not an enum");
        };
        assert_eq!(variants.as_deref(), Some("- Active\n- Paused"));
        assert_eq!(parent_class.as_deref(), Some("Token"));

        let itoken = find(&entities, EntityKind::Interface, "IToken");
        let EntityDetails::Interface { methods, .. } = &itoken.details else {
            panic!("not an interface");
        };
        assert_eq!(methods.as_deref(), Some("- balanceOf"));
    }

    #[test]
    fn test_callables() {
        let entities = extract_all(Language::Solidity, "Token.sol", SOURCE);
        assert_eq!(
            names(&entities, EntityKind::Function),
            vec!["balanceOf", "add", "onlyActive", "constructor", "balanceOf", "receive"]
        );
        assert_eq!(
            find(&entities, EntityKind::Function, "add").parent_class(),
            Some("SafeMath")
        );
        assert_eq!(
            find(&entities, EntityKind::Function, "receive").parent_class(),
            Some("Token")
        );
    }
}
