//! Gleam visitor.

use super::{anonymous_name, first_child, lines, walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct GleamVisitor;

impl Visitor for GleamVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "function" => {
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
            "anonymous_function" => {
                let name = anonymous_name("fn", lines(node).0);
                cx.emit(
                    node,
                    name.as_str(),
                    EntityDetails::Function {
                        parent_function: scope.name_of(ScopeKind::Function),
                        parent_class: None,
                    },
                )?;
                let frame = scope.push(ScopeKind::Function, name, node);
                return walk_children(self, node, cx, frame.scope());
            }
            "type_alias" => {
                if let Some(name) = type_name(node, cx)? {
                    let mut cursor = node.walk();
                    let target = node
                        .named_children(&mut cursor)
                        .filter(|c| {
                            !matches!(
                                c.kind(),
                                "type_name" | "visibility_modifier" | "opacity_modifier"
                            )
                        })
                        .last();
                    let target_type = match target {
                        Some(target) => Some(cx.text(target)?.to_string()),
                        None => None,
                    };
                    cx.emit(node, name, EntityDetails::TypeAlias { target_type })?;
                }
            }
            "type_definition" => {
                if let Some(name) = type_name(node, cx)? {
                    let mut variants = Bullets::new();
                    if let Some(constructors) = first_child(node, &["data_constructors"]) {
                        let mut cursor = constructors.walk();
                        for constructor in constructors.named_children(&mut cursor) {
                            if let Some(variant) = cx.field_text(constructor, "name")? {
                                variants.push(variant);
                            }
                        }
                    }
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Enum {
                            variants: variants.finish(),
                            parent_class: None,
                        },
                    )?;
                }
            }
            "import" => {
                if let Some(module) = cx.field_text(node, "module")? {
                    let mut imports = Bullets::new();
                    if let Some(unqualified) = node.child_by_field_name("imports") {
                        let mut cursor = unqualified.walk();
                        for item in unqualified.named_children(&mut cursor) {
                            if let Some(name) = cx.field_text(item, "name")? {
                                imports.push(name);
                            }
                        }
                    }
                    cx.emit(
                        node,
                        module,
                        EntityDetails::Module {
                            exports: None,
                            imports: imports.finish(),
                        },
                    )?;
                }
                return Ok(());
            }
            _ => {}
        }

        walk_children(self, node, cx, scope)
    }
}

fn type_name<'a>(node: Node<'_>, cx: &VisitContext<'a>) -> Result<Option<&'a str>, IndexerError> {
    match first_child(node, &["type_name"]) {
        Some(type_name) => cx.field_text(type_name, "name"),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use crate::entity::{EntityDetails, EntityKind};
    use crate::scanner::Language;
    use crate::visitors::test_support::{extract_all, find, names};

    const SOURCE: &str = r#"import gleam/io
import gleam/list.{map, filter}

pub type Shape {
  Circle(radius: Float)
  Square(side: Float)
}

pub type Scale = Float

pub fn area(shape: Shape) -> Float {
  case shape {
    Circle(r) -> r *. r
    Square(s) -> s *. s
  }
}

pub fn total(shapes: List(Shape)) -> Float {
  list.fold(shapes, 0.0, fn(acc, s) { acc +. area(s) })
}
"#;

    #[test]
    fn test_imports() {
        let entities = extract_all(Language::Gleam, "shapes.gleam", SOURCE);
        assert_eq!(
            names(&entities, EntityKind::Module),
            vec!["gleam/io", "gleam/list"]
        );
        let list = find(&entities, EntityKind::Module, "gleam/list");
        let EntityDetails::Module { imports, .. } = &list.details else {
            panic!("not a module");
        };
        assert_eq!(imports.as_deref(), Some("- map\n- filter"));
    }

    #[test]
    fn test_custom_type_and_alias() {
        let entities = extract_all(Language::Gleam, "shapes.gleam", SOURCE);

        let shape = find(&entities, EntityKind::Enum, "Shape");
        let EntityDetails::Enum { variants, .. } = &shape.details else {
            panic!("not an enum");
        };
        assert_eq!(variants.as_deref(), Some("- Circle\n- Square"));

        let scale = find(&entities, EntityKind::TypeAlias, "Scale");
        let EntityDetails::TypeAlias { target_type } = &scale.details else {
            panic!("not a type alias");
        };
        assert_eq!(target_type.as_deref(), Some("Float"));
    }

    #[test]
    fn test_functions() {
        let entities = extract_all(Language::Gleam, "shapes.gleam", SOURCE);
        assert_eq!(
            names(&entities, EntityKind::Function),
            vec!["area", "total", "anonymous_fn_line_19"]
        );
        let lambda = find(&entities, EntityKind::Function, "anonymous_fn_line_19");
        assert_eq!(lambda.parent_function(), Some("total"));
        assert_eq!(
            find(&entities, EntityKind::Function, "area").parent_class(),
            None
        );
    }
}
