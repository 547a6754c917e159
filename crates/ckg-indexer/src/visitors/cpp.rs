//! C++ visitor.

use super::c::{body_items, function_name};
use super::{first_child, walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct CppVisitor;

impl Visitor for CppVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "class_specifier" | "struct_specifier" => {
                if let (Some(name), Some(body)) =
                    (cx.field_text(node, "name")?, node.child_by_field_name("body"))
                {
                    let (fields, methods) = members(body, cx)?;
                    let kind = if node.kind() == "class_specifier" {
                        cx.emit(node, name, EntityDetails::Class { fields, methods })?;
                        ScopeKind::Class
                    } else {
                        cx.emit(node, name, EntityDetails::Struct { fields, methods })?;
                        ScopeKind::Struct
                    };
                    let frame = scope.push(kind, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "union_specifier" => {
                if let (Some(name), Some(body)) =
                    (cx.field_text(node, "name")?, node.child_by_field_name("body"))
                {
                    let variants = body_items(body, cx, "field_declaration")?;
                    cx.emit(node, name, EntityDetails::Union { variants })?;
                }
            }
            "enum_specifier" => {
                if let (Some(name), Some(body)) =
                    (cx.field_text(node, "name")?, node.child_by_field_name("body"))
                {
                    let variants = body_items(body, cx, "enumerator")?;
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Enum {
                            variants,
                            parent_class: scope.first_of(&[ScopeKind::Class, ScopeKind::Struct]),
                        },
                    )?;
                }
            }
            "namespace_definition" => {
                // Anonymous namespaces are transparent
                if let Some(name) = cx.field_text(node, "name")? {
                    let members = namespace_members(node, cx)?;
                    cx.emit(node, name, EntityDetails::Namespace { members })?;
                    let frame = scope.push(ScopeKind::Namespace, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "template_declaration" => emit_generic(node, cx)?,
            "function_definition" => {
                if let Some(declared) = function_name(node, cx)? {
                    // Out-of-line definitions name their class: `Shape::area`
                    let (qualifier, name) = match declared.rsplit_once("::") {
                        Some((qualifier, name)) => (Some(qualifier), name),
                        None => (None, declared),
                    };
                    let parent_class = match qualifier {
                        Some(q) => q.rsplit("::").next().map(str::to_string),
                        None => scope.first_of(&[ScopeKind::Class, ScopeKind::Struct]),
                    };
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Function {
                            parent_function: None,
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

/// Data members and method headers of a class or struct body. Member
/// declarations that declare a function count as methods.
fn members(
    body: Node<'_>,
    cx: &VisitContext<'_>,
) -> Result<(Option<String>, Option<String>), IndexerError> {
    let mut fields = Bullets::new();
    let mut methods = Bullets::new();

    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        match child.kind() {
            "function_definition" => methods.push(cx.header(child, &["compound_statement"])?),
            "field_declaration" if declares_function(child) => methods.push(cx.text(child)?),
            "field_declaration" => fields.push(cx.text(child)?),
            _ => {}
        }
    }

    Ok((fields.finish(), methods.finish()))
}

/// Whether the declarator chain of `decl` ends in a function declarator.
/// Function pointers such as `void (*cb)(int)` are data members.
fn declares_function(decl: Node<'_>) -> bool {
    let mut current = decl.child_by_field_name("declarator");
    while let Some(declarator) = current {
        match declarator.kind() {
            "function_declarator" => {
                return declarator
                    .child_by_field_name("declarator")
                    .is_some_and(|inner| inner.kind() != "parenthesized_declarator");
            }
            "pointer_declarator" | "reference_declarator" => {
                current = declarator
                    .child_by_field_name("declarator")
                    .or_else(|| declarator.named_child(0));
            }
            _ => return false,
        }
    }
    false
}

fn namespace_members(node: Node<'_>, cx: &VisitContext<'_>) -> Result<Option<String>, IndexerError> {
    let mut members = Bullets::new();
    let Some(body) = node.child_by_field_name("body") else {
        return Ok(None);
    };

    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        let decl = match child.kind() {
            "template_declaration" => match first_child(
                child,
                &["class_specifier", "struct_specifier", "function_definition"],
            ) {
                Some(inner) => inner,
                None => continue,
            },
            _ => child,
        };
        let name = match decl.kind() {
            "class_specifier" | "struct_specifier" | "enum_specifier" | "union_specifier" => {
                cx.field_text(decl, "name")?
            }
            "function_definition" => function_name(decl, cx)?,
            "namespace_definition" => cx.field_text(decl, "name")?,
            _ => None,
        };
        if let Some(name) = name {
            members.push(format!("{}: {}", decl.kind(), name));
        }
    }

    Ok(members.finish())
}

/// Class and struct templates are also recorded as generic types.
fn emit_generic(node: Node<'_>, cx: &mut VisitContext<'_>) -> Result<(), IndexerError> {
    let Some(target) = first_child(node, &["class_specifier", "struct_specifier"]) else {
        return Ok(());
    };
    let Some(name) = cx.field_text(target, "name")? else {
        return Ok(());
    };

    let mut type_parameters = Bullets::new();
    let mut constraints = Bullets::new();
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            let param_name = match param.kind() {
                "type_parameter_declaration" | "variadic_type_parameter_declaration" => {
                    cx.child_text(param, &["type_identifier"])?
                }
                "optional_type_parameter_declaration" => cx.field_text(param, "name")?,
                "parameter_declaration" | "optional_parameter_declaration" => {
                    cx.field_text(param, "declarator")?
                }
                _ => Some(cx.text(param)?),
            };
            if let Some(param_name) = param_name {
                type_parameters.push(param_name);
            }
        }
    }
    if let Some(requires) = first_child(node, &["requires_clause"]) {
        if let Some(constraint) = cx.field_text(requires, "constraint")? {
            constraints.push(constraint);
        }
    }

    cx.emit(
        node,
        name,
        EntityDetails::GenericType {
            type_parameters: type_parameters.finish(),
            constraints: constraints.finish(),
        },
    )
}
