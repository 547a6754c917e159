//! Java visitor.

use super::{walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct JavaVisitor;

const BODIES: &[&str] = &["block", "constructor_body"];

impl Visitor for JavaVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "class_declaration" | "record_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let (fields, methods) = members(node.child_by_field_name("body"), cx)?;
                    cx.emit(node, name, EntityDetails::Class { fields, methods })?;
                    let frame = scope.push(ScopeKind::Class, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "interface_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let (properties, methods) = members(node.child_by_field_name("body"), cx)?;
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Interface {
                            methods,
                            properties,
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Interface, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "enum_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let mut variants = Bullets::new();
                    if let Some(body) = node.child_by_field_name("body") {
                        let mut cursor = body.walk();
                        for child in body.children(&mut cursor) {
                            if child.kind() == "enum_constant" {
                                if let Some(constant) = cx.field_text(child, "name")? {
                                    variants.push(constant);
                                }
                            }
                        }
                    }
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Enum {
                            variants: variants.finish(),
                            parent_class: scope.name_of(ScopeKind::Class),
                        },
                    )?;
                    // Enum bodies may declare methods of their own
                    let frame = scope.push(ScopeKind::Class, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "method_declaration" | "constructor_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let parent_class = scope.first_of(&[ScopeKind::Class, ScopeKind::Interface]);
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

/// Field/constant declarations and method headers of a type body.
fn members(
    body: Option<Node<'_>>,
    cx: &VisitContext<'_>,
) -> Result<(Option<String>, Option<String>), IndexerError> {
    let mut fields = Bullets::new();
    let mut methods = Bullets::new();

    if let Some(body) = body {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            match child.kind() {
                "field_declaration" | "constant_declaration" => fields.push(cx.text(child)?),
                "method_declaration" | "constructor_declaration" => {
                    methods.push(cx.header(child, BODIES)?)
                }
                _ => {}
            }
        }
    }

    Ok((fields.finish(), methods.finish()))
}
