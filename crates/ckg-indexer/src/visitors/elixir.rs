//! Elixir visitor.
//!
//! Elixir definitions are ordinary calls (`defmodule`, `def`, ...), so
//! everything keys off the call target.

use super::{first_child, walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct ElixirVisitor;

const DEFINITIONS: &[&str] = &["def", "defp", "defmacro", "defmacrop"];
const PUBLIC_DEFINITIONS: &[&str] = &["def", "defmacro"];

impl Visitor for ElixirVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        if node.kind() != "call" {
            return walk_children(self, node, cx, scope);
        }

        match call_target(node, cx)? {
            Some("defmodule") => {
                if let Some(name) = first_argument(node, cx)? {
                    let exports = definition_names(node, cx, PUBLIC_DEFINITIONS)?;
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Module {
                            exports,
                            imports: None,
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Module, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            Some("defprotocol") => {
                if let Some(name) = first_argument(node, cx)? {
                    let methods = definition_names(node, cx, DEFINITIONS)?;
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Interface {
                            methods,
                            properties: None,
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Protocol, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            Some("defstruct") => {
                // A struct takes the name of the module defining it
                if let Some(module) = scope.name_of(ScopeKind::Module) {
                    let fields = struct_fields(node, cx)?;
                    cx.emit(
                        node,
                        module,
                        EntityDetails::Struct {
                            fields,
                            methods: None,
                        },
                    )?;
                }
            }
            Some(target) if DEFINITIONS.contains(&target) => {
                if let Some(name) = definition_name(node, cx)? {
                    let parent_class = scope.first_of(&[ScopeKind::Protocol, ScopeKind::Module]);
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
            }
            _ => {}
        }

        walk_children(self, node, cx, scope)
    }
}

/// Plain identifier the call invokes; remote calls (`Mod.fun`) yield `None`.
fn call_target<'a>(node: Node<'_>, cx: &VisitContext<'a>) -> Result<Option<&'a str>, IndexerError> {
    match node.child_by_field_name("target") {
        Some(target) if target.kind() == "identifier" => Ok(Some(cx.text(target)?)),
        _ => Ok(None),
    }
}

fn first_argument<'a>(node: Node<'_>, cx: &VisitContext<'a>) -> Result<Option<&'a str>, IndexerError> {
    let Some(arguments) = first_child(node, &["arguments"]) else {
        return Ok(None);
    };
    match arguments.named_child(0) {
        Some(first) => Ok(Some(cx.text(first)?)),
        None => Ok(None),
    }
}

/// Name defined by a `def`-style call. Heads may be bare (`def new`),
/// calls (`def add(a, b)`) or guarded (`def add(a, b) when ...`).
fn definition_name<'a>(node: Node<'_>, cx: &VisitContext<'a>) -> Result<Option<&'a str>, IndexerError> {
    let Some(head) = first_child(node, &["arguments"]).and_then(|args| args.named_child(0)) else {
        return Ok(None);
    };
    let head = match head.kind() {
        "binary_operator" => match head.child_by_field_name("left") {
            Some(left) => left,
            None => return Ok(None),
        },
        _ => head,
    };
    match head.kind() {
        "identifier" => Ok(Some(cx.text(head)?)),
        "call" => call_target(head, cx),
        _ => Ok(None),
    }
}

/// Distinct names of the definitions of `kinds` directly inside a module body.
fn definition_names(
    node: Node<'_>,
    cx: &VisitContext<'_>,
    kinds: &[&str],
) -> Result<Option<String>, IndexerError> {
    let mut names = Bullets::new();
    let Some(block) = first_child(node, &["do_block"]) else {
        return Ok(None);
    };

    let mut cursor = block.walk();
    for child in block.named_children(&mut cursor) {
        if child.kind() != "call" {
            continue;
        }
        if let Some(target) = call_target(child, cx)? {
            if kinds.contains(&target) {
                if let Some(name) = definition_name(child, cx)? {
                    names.push_unique(name);
                }
            }
        }
    }
    Ok(names.finish())
}

/// `defstruct [:a, b: 1]` and `defstruct a: nil` both list field names.
fn struct_fields(node: Node<'_>, cx: &VisitContext<'_>) -> Result<Option<String>, IndexerError> {
    let mut fields = Bullets::new();
    if let Some(arguments) = first_child(node, &["arguments"]) {
        collect_fields(arguments, cx, &mut fields)?;
    }
    Ok(fields.finish())
}

fn collect_fields(node: Node<'_>, cx: &VisitContext<'_>, fields: &mut Bullets) -> Result<(), IndexerError> {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "atom" => fields.push(cx.text(child)?.trim_start_matches(':')),
            "pair" => {
                if let Some(key) = cx.field_text(child, "key")? {
                    fields.push(key.trim().trim_end_matches(':'));
                }
            }
            "list" | "keywords" => collect_fields(child, cx, fields)?,
            _ => {}
        }
    }
    Ok(())
}
