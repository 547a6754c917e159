//! C# visitor.

use super::{walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct CSharpVisitor;

const TYPE_DECLARATIONS: &[&str] = &[
    "class_declaration",
    "struct_declaration",
    "interface_declaration",
    "enum_declaration",
    "record_declaration",
];

impl Visitor for CSharpVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "class_declaration" | "record_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let (fields, methods) = members(node, cx)?;
                    cx.emit(node, name, EntityDetails::Class { fields, methods })?;
                    let frame = scope.push(ScopeKind::Class, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "struct_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let (fields, methods) = members(node, cx)?;
                    cx.emit(node, name, EntityDetails::Struct { fields, methods })?;
                    let frame = scope.push(ScopeKind::Struct, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "interface_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let (properties, methods) = members(node, cx)?;
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
                            if child.kind() == "enum_member_declaration" {
                                if let Some(member) = cx.field_text(child, "name")? {
                                    variants.push(member);
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
                }
            }
            "namespace_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let mut members = Bullets::new();
                    if let Some(body) = node.child_by_field_name("body") {
                        let mut cursor = body.walk();
                        members_of(body.children(&mut cursor), cx, &mut members)?;
                    }
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Namespace {
                            members: members.finish(),
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Namespace, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "file_scoped_namespace_declaration" => {
                // `namespace X;` owns every declaration after it
                if let Some(name) = cx.field_text(node, "name")? {
                    let mut members = Bullets::new();
                    let mut sibling = node.next_sibling();
                    while let Some(next) = sibling {
                        members_of(std::iter::once(next), cx, &mut members)?;
                        sibling = next.next_sibling();
                    }
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Namespace {
                            members: members.finish(),
                        },
                    )?;
                }
            }
            "method_declaration" | "constructor_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let parent_class = scope.first_of(&[
                        ScopeKind::Class,
                        ScopeKind::Struct,
                        ScopeKind::Interface,
                    ]);
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
            "local_function_statement" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Function {
                            parent_function: scope.name_of(ScopeKind::Function),
                            parent_class: None,
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

/// Fields (declarations and property names) and method names of a type body.
fn members(
    node: Node<'_>,
    cx: &VisitContext<'_>,
) -> Result<(Option<String>, Option<String>), IndexerError> {
    let mut fields = Bullets::new();
    let mut methods = Bullets::new();

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            match child.kind() {
                "field_declaration" => fields.push(cx.text(child)?),
                "property_declaration" => {
                    if let Some(name) = cx.field_text(child, "name")? {
                        fields.push(name);
                    }
                }
                "method_declaration" | "constructor_declaration" => {
                    if let Some(name) = cx.field_text(child, "name")? {
                        methods.push(name);
                    }
                }
                _ => {}
            }
        }
    }

    Ok((fields.finish(), methods.finish()))
}

fn members_of<'t>(
    nodes: impl Iterator<Item = Node<'t>>,
    cx: &VisitContext<'_>,
    members: &mut Bullets,
) -> Result<(), IndexerError> {
    for child in nodes {
        if TYPE_DECLARATIONS.contains(&child.kind()) {
            if let Some(name) = cx.field_text(child, "name")? {
                members.push(format!("{}: {}", child.kind(), name));
            }
        }
    }
    Ok(())
}
