//! Dart visitor.
//!
//! The grammar keeps a function's signature and body as siblings, so
//! function entities span from the signature through the body.

use super::{
    first_child, find_descendant, has_child, lines, walk_children, Scope, ScopeKind,
    VisitContext, Visitor,
};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct DartVisitor;

const SIGNATURES: &[&str] = &[
    "function_signature",
    "getter_signature",
    "setter_signature",
    "operator_signature",
    "constructor_signature",
    "constant_constructor_signature",
    "factory_constructor_signature",
    "redirecting_factory_constructor_signature",
];

impl Visitor for DartVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "source_file" => return self.visit_top_level(node, cx, scope),
            "class_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let (fields, methods) = members(node, cx)?;
                    let kind = if has_child(node, "abstract") {
                        cx.emit(
                            node,
                            name,
                            EntityDetails::Interface {
                                methods,
                                properties: fields,
                            },
                        )?;
                        ScopeKind::Interface
                    } else {
                        cx.emit(node, name, EntityDetails::Class { fields, methods })?;
                        ScopeKind::Class
                    };
                    let frame = scope.push(kind, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "mixin_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let (fields, methods) = members(node, cx)?;
                    cx.emit(node, name, EntityDetails::Class { fields, methods })?;
                    let frame = scope.push(ScopeKind::Class, name, node);
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
                    let frame = scope.push(ScopeKind::Class, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "extension_declaration" => {
                let name = cx.field_text(node, "name")?.unwrap_or_default();
                let extended_type = cx.field_text(node, "class")?.map(str::to_string);
                let (_, methods) = members(node, cx)?;
                cx.emit(
                    node,
                    name,
                    EntityDetails::Extension {
                        extended_type,
                        methods,
                    },
                )?;
                let frame = scope.push(ScopeKind::Class, name, node);
                return walk_children(self, node, cx, frame.scope());
            }
            "class_member" => {
                if let Some(signature) = member_signature(node) {
                    if let Some(name) = signature_name(signature, cx)? {
                        cx.emit(
                            node,
                            name.as_str(),
                            EntityDetails::Function {
                                parent_function: None,
                                parent_class: scope
                                    .first_of(&[ScopeKind::Class, ScopeKind::Interface]),
                            },
                        )?;
                        let frame = scope.push(ScopeKind::Function, name, node);
                        if let Some(body) = first_child(node, &["function_body"]) {
                            walk_children(self, body, cx, frame.scope())?;
                        }
                        return Ok(());
                    }
                }
            }
            "local_function_declaration" => {
                if let Some(signature) = first_child(node, &["function_signature"]) {
                    if let Some(name) = signature_name(signature, cx)? {
                        cx.emit(
                            node,
                            name.as_str(),
                            EntityDetails::Function {
                                parent_function: scope.name_of(ScopeKind::Function),
                                parent_class: None,
                            },
                        )?;
                        let frame = scope.push(ScopeKind::Function, name, node);
                        if let Some(body) = first_child(node, &["function_body"]) {
                            walk_children(self, body, cx, frame.scope())?;
                        }
                        return Ok(());
                    }
                }
            }
            "import_or_export" => {
                if let Some(import) = first_child(node, &["library_import"]) {
                    if let Some(literal) = find_descendant(import, &["string_literal"]) {
                        let uri = cx.text(literal)?.trim_matches(|c| c == '\'' || c == '"');
                        if !uri.is_empty() && !uri.starts_with('.') {
                            cx.emit(
                                node,
                                uri,
                                EntityDetails::Module {
                                    exports: None,
                                    imports: None,
                                },
                            )?;
                        }
                    }
                }
                return Ok(());
            }
            _ => {}
        }

        walk_children(self, node, cx, scope)
    }
}

impl DartVisitor {
    /// Top-level functions are a signature followed by a sibling body.
    fn visit_top_level(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();

        let mut i = 0;
        while i < children.len() {
            let child = children[i];
            let body = children
                .get(i + 1)
                .copied()
                .filter(|next| next.kind() == "function_body");

            if SIGNATURES.contains(&child.kind()) {
                if let Some(name) = signature_name(child, cx)? {
                    let end = body.unwrap_or(child);
                    let text = span_text(child, end, cx)?;
                    let (start_line, _) = lines(child);
                    let (_, end_line) = lines(end);
                    cx.emit_span(
                        name.as_str(),
                        text,
                        start_line,
                        end_line,
                        EntityDetails::Function {
                            parent_function: None,
                            parent_class: None,
                        },
                    )?;
                    if let Some(body) = body {
                        let frame = scope.push(ScopeKind::Function, name, body);
                        walk_children(self, body, cx, frame.scope())?;
                        i += 1;
                    }
                    i += 1;
                    continue;
                }
            }

            self.visit(child, cx, scope)?;
            i += 1;
        }
        Ok(())
    }
}

/// The signature a class member declares, if it is a function.
fn member_signature(member: Node<'_>) -> Option<Node<'_>> {
    let holder = first_child(member, &["method_signature", "declaration"])?;
    first_child(holder, SIGNATURES)
}

/// Signature name; constructors keep their qualifier (`Point.origin`).
fn signature_name(signature: Node<'_>, cx: &VisitContext<'_>) -> Result<Option<String>, IndexerError> {
    if signature.kind() == "operator_signature" {
        return Ok(cx
            .field_text(signature, "operator")?
            .map(|op| format!("operator {}", op)));
    }

    let mut name = String::new();
    let mut cursor = signature.walk();
    for part in signature.children_by_field_name("name", &mut cursor) {
        name.push_str(cx.text(part)?);
    }
    Ok((!name.is_empty()).then_some(name))
}

/// Field names and method names of a class-like body.
fn members(
    node: Node<'_>,
    cx: &VisitContext<'_>,
) -> Result<(Option<String>, Option<String>), IndexerError> {
    let mut fields = Bullets::new();
    let mut methods = Bullets::new();

    let Some(body) = node.child_by_field_name("body") else {
        return Ok((None, None));
    };
    let mut cursor = body.walk();
    for member in body.children(&mut cursor) {
        if member.kind() != "class_member" {
            continue;
        }
        if let Some(signature) = member_signature(member) {
            if let Some(name) = signature_name(signature, cx)? {
                methods.push(name);
            }
        } else if let Some(decl) = first_child(member, &["declaration"]) {
            field_names(decl, cx, &mut fields)?;
        }
    }

    Ok((fields.finish(), methods.finish()))
}

fn field_names(node: Node<'_>, cx: &VisitContext<'_>, fields: &mut Bullets) -> Result<(), IndexerError> {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "initialized_identifier" | "static_final_declaration" => {
                if let Some(name) = cx.field_text(child, "name")? {
                    fields.push(name);
                }
            }
            "identifier_list" => {
                let mut inner = child.walk();
                for ident in child.named_children(&mut inner) {
                    fields.push(cx.text(ident)?);
                }
            }
            "initialized_identifier_list" | "static_final_declaration_list" => {
                field_names(child, cx, fields)?
            }
            _ => {}
        }
    }
    Ok(())
}

fn span_text(start: Node<'_>, end: Node<'_>, cx: &VisitContext<'_>) -> Result<String, IndexerError> {
    let bytes = cx
        .source()
        .get(start.start_byte()..end.end_byte())
        .ok_or_else(|| IndexerError::parse(cx.file_path(), "Node span outside source"))?;
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use crate::entity::{EntityDetails, EntityKind};
    use crate::scanner::Language;
    use crate::visitors::test_support::{extract_all, find, names};

    const SOURCE: &str = r#"import 'package:flutter/material.dart';
import 'dart:math';
import './local.dart';

abstract class Shape {
  double area();
}

class Circle extends Shape {
  final double radius;

  Circle(this.radius);

  @override
  double area() {
    double square(double x) => x * x;
    return pi * square(radius);
  }

  double get diameter => radius * 2;
}

mixin Named {
  String describe() => 'named';
}

enum Color { red, green }

extension CircleTools on Circle {
  Circle doubled() => Circle(radius * 2);
}

void main() {
  print(Circle(1).area());
}
"#;

    #[test]
    fn test_imports_skip_relative() {
        let entities = extract_all(Language::Dart, "shapes.dart", SOURCE);
        assert_eq!(
            names(&entities, EntityKind::Module),
            vec!["package:flutter/material.dart", "dart:math"]
        );
    }

    #[test]
    fn test_abstract_class_is_interface() {
        let entities = extract_all(Language::Dart, "shapes.dart", SOURCE);
        let shape = find(&entities, EntityKind::Interface, "Shape");
        let EntityDetails::Interface { methods, .. } = &shape.details else {
            panic!("not an interface");
        };
        assert_eq!(methods.as_deref(), Some("- area"));
        assert!(!names(&entities, EntityKind::Class).contains(&"Shape"));
    }

    #[test]
    fn test_class_mixin_enum_extension() {
        let entities = extract_all(Language::Dart, "shapes.dart", SOURCE);

        let circle = find(&entities, EntityKind::Class, "Circle");
        let EntityDetails::Class { fields, methods } = &circle.details else {
            panic!("not a class");
        };
        assert_eq!(fields.as_deref(), Some("- radius"));
        assert_eq!(methods.as_deref(), Some("- Circle\n- area\n- diameter"));

        assert!(names(&entities, EntityKind::Class).contains(&"Named"));

        let color = find(&entities, EntityKind::Enum, "Color");
        let EntityDetails::Enum { variants, .. } = &color.details else {
            panic!("not an enum");
        };
        assert_eq!(variants.as_deref(), Some("- red\n- green"));

        let tools = find(&entities, EntityKind::Extension, "CircleTools");
        let EntityDetails::Extension {
            extended_type,
            methods,
        } = &tools.details
        else {
            panic!("not an extension");
        };
        assert_eq!(extended_type.as_deref(), Some("Circle"));
        assert_eq!(methods.as_deref(), Some("- doubled"));
    }

    #[test]
    fn test_functions() {
        let entities = extract_all(Language::Dart, "shapes.dart", SOURCE);

        let square = find(&entities, EntityKind::Function, "square");
        assert_eq!(square.parent_function(), Some("area"));

        let doubled = find(&entities, EntityKind::Function, "doubled");
        assert_eq!(doubled.parent_class(), Some("CircleTools"));

        // Top-level functions span signature and body.
        let main = find(&entities, EntityKind::Function, "main");
        assert_eq!((main.start_line, main.end_line), (33, 35));
        assert!(main.body.starts_with("void main()"));
        assert!(main.body.ends_with('}'));
    }
}
