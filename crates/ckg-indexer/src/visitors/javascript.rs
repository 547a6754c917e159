//! JavaScript visitor, plus the constructs TypeScript shares with it.

use super::{walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct JavaScriptVisitor;

impl Visitor for JavaScriptVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        if visit_shared(self, node, cx, scope)? {
            return Ok(());
        }
        walk_children(self, node, cx, scope)
    }
}

/// Handle a construct common to JavaScript and TypeScript.
///
/// Returns `true` when the node was recognized and its children were
/// already walked under the new scope.
pub(super) fn visit_shared<V: Visitor + ?Sized>(
    visitor: &V,
    node: Node<'_>,
    cx: &mut VisitContext<'_>,
    scope: Scope<'_>,
) -> Result<bool, IndexerError> {
    match node.kind() {
        "class_declaration" | "abstract_class_declaration" | "class" => {
            let name = match cx.field_text(node, "name")? {
                Some(name) => name.to_string(),
                None if node.kind() == "class" => {
                    declared_name(node, cx)?.unwrap_or_else(|| "AnonymousClass".to_string())
                }
                None => return Ok(false),
            };
            let (fields, methods) = class_members(node, cx)?;
            cx.emit(node, name.as_str(), EntityDetails::Class { fields, methods })?;
            let frame = scope.push(ScopeKind::Class, name, node);
            walk_children(visitor, node, cx, frame.scope())?;
            Ok(true)
        }
        "function_declaration" | "generator_function_declaration" => {
            let Some(name) = cx.field_text(node, "name")? else {
                return Ok(false);
            };
            emit_function(visitor, node, name.to_string(), cx, scope)?;
            Ok(true)
        }
        "function_expression" | "arrow_function" | "generator_function" => {
            let name = match declared_name(node, cx)? {
                Some(name) => name,
                None => match cx.field_text(node, "name")? {
                    Some(name) => name.to_string(),
                    None => format!("anonymous_fn_line_{}", node.start_position().row + 1),
                },
            };
            emit_function(visitor, node, name, cx, scope)?;
            Ok(true)
        }
        "method_definition" => {
            let Some(name) = cx.field_text(node, "name")? else {
                return Ok(false);
            };
            cx.emit(
                node,
                name,
                EntityDetails::Function {
                    parent_function: None,
                    parent_class: scope.name_of(ScopeKind::Class),
                },
            )?;
            let frame = scope.push(ScopeKind::Function, name, node);
            walk_children(visitor, node, cx, frame.scope())?;
            Ok(true)
        }
        "jsx_element" | "jsx_self_closing_element" => {
            let tag = if node.kind() == "jsx_element" {
                node.child_by_field_name("open_tag")
            } else {
                Some(node)
            };
            let name = match tag {
                Some(tag) => cx.field_text(tag, "name")?,
                None => None,
            };
            if let Some(name) = name.filter(|n| n.starts_with(|c: char| c.is_uppercase())) {
                cx.emit(
                    node,
                    name,
                    EntityDetails::Component {
                        props: jsx_props(tag, cx)?,
                        methods: None,
                        template: None,
                    },
                )?;
            }
            Ok(false)
        }
        _ => Ok(false),
    }
}

/// Functions prefer the enclosing class, then the enclosing function.
fn emit_function<V: Visitor + ?Sized>(
    visitor: &V,
    node: Node<'_>,
    name: String,
    cx: &mut VisitContext<'_>,
    scope: Scope<'_>,
) -> Result<(), IndexerError> {
    let details = match scope.name_of(ScopeKind::Class) {
        Some(class) => EntityDetails::Function {
            parent_function: None,
            parent_class: Some(class),
        },
        None => EntityDetails::Function {
            parent_function: scope.name_of(ScopeKind::Function),
            parent_class: None,
        },
    };
    cx.emit(node, name.as_str(), details)?;
    let frame = scope.push(ScopeKind::Function, name, node);
    walk_children(visitor, node, cx, frame.scope())
}

/// Name a value-position construct after whatever it is bound to:
/// `const f = ...`, `obj.f = ...`, `{ f: ... }` or a class field.
fn declared_name(node: Node<'_>, cx: &VisitContext<'_>) -> Result<Option<String>, IndexerError> {
    let Some(parent) = node.parent() else {
        return Ok(None);
    };
    let field = match parent.kind() {
        "variable_declarator" => "name",
        "assignment_expression" => "left",
        "pair" => "key",
        "field_definition" => "property",
        "public_field_definition" => "name",
        _ => return Ok(None),
    };
    Ok(cx.field_text(parent, field)?.map(str::to_string))
}

pub(super) fn class_members(
    node: Node<'_>,
    cx: &VisitContext<'_>,
) -> Result<(Option<String>, Option<String>), IndexerError> {
    let mut fields = Bullets::new();
    let mut methods = Bullets::new();

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            match child.kind() {
                "method_definition" | "method_signature" | "abstract_method_signature" => {
                    methods.push(cx.header(child, &["statement_block"])?);
                }
                "field_definition" | "public_field_definition" | "property_signature" => {
                    fields.push(cx.text(child)?);
                }
                _ => {}
            }
        }
    }

    Ok((fields.finish(), methods.finish()))
}

fn jsx_props(tag: Option<Node<'_>>, cx: &VisitContext<'_>) -> Result<Option<String>, IndexerError> {
    let mut props = Bullets::new();
    if let Some(tag) = tag {
        let mut cursor = tag.walk();
        for attr in tag.children_by_field_name("attribute", &mut cursor) {
            if attr.kind() == "jsx_attribute" {
                if let Some(name) = attr.named_child(0) {
                    props.push(cx.text(name)?);
                }
            }
        }
    }
    Ok(props.finish())
}
