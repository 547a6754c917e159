//! TypeScript visitor.

use super::javascript::{class_members, visit_shared};
use super::{walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct TypeScriptVisitor;

impl Visitor for TypeScriptVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    emit_generic(node, name, cx)?;
                    let (fields, methods) = class_members(node, cx)?;
                    cx.emit(node, name, EntityDetails::Class { fields, methods })?;
                    let frame = scope.push(ScopeKind::Class, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "interface_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    emit_generic(node, name, cx)?;
                    let mut methods = Bullets::new();
                    let mut properties = Bullets::new();
                    if let Some(body) = node.child_by_field_name("body") {
                        let mut cursor = body.walk();
                        for child in body.children(&mut cursor) {
                            match child.kind() {
                                "method_signature" => methods.push(cx.text(child)?),
                                "property_signature" => properties.push(cx.text(child)?),
                                _ => {}
                            }
                        }
                    }
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Interface {
                            methods: methods.finish(),
                            properties: properties.finish(),
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
                        for child in body.named_children(&mut cursor) {
                            match child.kind() {
                                "enum_assignment" => {
                                    if let Some(member) = cx.field_text(child, "name")? {
                                        variants.push(member);
                                    }
                                }
                                "comment" => {}
                                _ => variants.push(cx.text(child)?),
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
            "type_alias_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    emit_generic(node, name, cx)?;
                    let target_type = cx.field_text(node, "value")?.map(str::to_string);
                    cx.emit(node, name, EntityDetails::TypeAlias { target_type })?;
                }
            }
            "internal_module" | "module" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let members = namespace_members(node, cx)?;
                    cx.emit(node, name, EntityDetails::Namespace { members })?;
                    let frame = scope.push(ScopeKind::Namespace, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            _ => {
                if visit_shared(self, node, cx, scope)? {
                    return Ok(());
                }
            }
        }

        walk_children(self, node, cx, scope)
    }
}

/// `- <node kind>: <name>` for each named declaration in the body,
/// looking through `export` wrappers.
fn namespace_members(node: Node<'_>, cx: &VisitContext<'_>) -> Result<Option<String>, IndexerError> {
    let mut members = Bullets::new();
    let Some(body) = node.child_by_field_name("body") else {
        return Ok(None);
    };

    let mut cursor = body.walk();
    for child in body.named_children(&mut cursor) {
        let decl = if child.kind() == "export_statement" {
            match child.child_by_field_name("declaration") {
                Some(decl) => decl,
                None => continue,
            }
        } else {
            child
        };
        if matches!(
            decl.kind(),
            "class_declaration"
                | "abstract_class_declaration"
                | "interface_declaration"
                | "function_declaration"
                | "enum_declaration"
                | "type_alias_declaration"
        ) {
            if let Some(name) = cx.field_text(decl, "name")? {
                members.push(format!("{}: {}", decl.kind(), name));
            }
        }
    }

    Ok(members.finish())
}

/// Declarations with type parameters are also recorded as generic types.
fn emit_generic(node: Node<'_>, name: &str, cx: &mut VisitContext<'_>) -> Result<(), IndexerError> {
    let Some(params) = node.child_by_field_name("type_parameters") else {
        return Ok(());
    };

    let mut type_parameters = Bullets::new();
    let mut constraints = Bullets::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        if param.kind() != "type_parameter" {
            continue;
        }
        if let Some(param_name) = cx.field_text(param, "name")? {
            type_parameters.push(param_name);
        }
        if param.child_by_field_name("constraint").is_some() {
            constraints.push(cx.text(param)?);
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

#[cfg(test)]
mod tests {
    use crate::entity::{EntityDetails, EntityKind};
    use crate::scanner::Language;
    use crate::visitors::test_support::{extract_all, find, names};

    const SOURCE: &str = r#"interface Shape {
  name: string;
  area(): number;
}

enum Color { Red, Green = 2, Blue }

type Pair<T extends object> = [T, T];

namespace Geometry {
  export class Circle implements Shape {
    name = "circle";
    constructor(private r: number) {}
    area(): number { return Math.PI * this.r * this.r; }
  }
  export function unit(): Circle { return new Circle(1); }
}

export const scale = (s: Shape, k: number): number => s.area() * k;
"#;

    #[test]
    fn test_interface_members() {
        let entities = extract_all(Language::TypeScript, "shapes.ts", SOURCE);
        let shape = find(&entities, EntityKind::Interface, "Shape");
        let EntityDetails::Interface {
            methods,
            properties,
        } = &shape.details
        else {
            panic!("not an interface");
        };
        assert_eq!(methods.as_deref(), Some("- area(): number"));
        assert_eq!(properties.as_deref(), Some("- name: string"));
    }

    #[test]
    fn test_enum_variants() {
        let entities = extract_all(Language::TypeScript, "shapes.ts", SOURCE);
        let color = find(&entities, EntityKind::Enum, "Color");
        let EntityDetails::Enum { variants, .. } = &color.details else {
            panic!("not an enum");
        };
        assert_eq!(variants.as_deref(), Some("- Red\n- Green\n- Blue"));
    }

    #[test]
    fn test_generic_type_alias() {
        let entities = extract_all(Language::TypeScript, "shapes.ts", SOURCE);

        let alias = find(&entities, EntityKind::TypeAlias, "Pair");
        let EntityDetails::TypeAlias { target_type } = &alias.details else {
            panic!("not a type alias");
        };
        assert_eq!(target_type.as_deref(), Some("[T, T]"));

        let generic = find(&entities, EntityKind::GenericType, "Pair");
        let EntityDetails::GenericType {
            type_parameters,
            constraints,
        } = &generic.details
        else {
            panic!("not a generic type");
        };
        assert_eq!(type_parameters.as_deref(), Some("- T"));
        assert_eq!(constraints.as_deref(), Some("- T extends object"));
    }

    #[test]
    fn test_namespace_members_and_nested_class() {
        let entities = extract_all(Language::TypeScript, "shapes.ts", SOURCE);

        let ns = find(&entities, EntityKind::Namespace, "Geometry");
        let EntityDetails::Namespace { members } = &ns.details else {
            panic!("not a namespace");
        };
        assert_eq!(
            members.as_deref(),
            Some("- class_declaration: Circle\n- function_declaration: unit")
        );

        let area = find(&entities, EntityKind::Function, "area");
        assert_eq!(area.parent_class(), Some("Circle"));
        assert!(names(&entities, EntityKind::Function).contains(&"scale"));
    }
}
