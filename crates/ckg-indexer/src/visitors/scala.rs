//! Scala visitor.

use super::{first_child, walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct ScalaVisitor;

impl Visitor for ScalaVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "class_definition" | "object_definition" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let (fields, methods) = members(node, cx)?;
                    cx.emit(node, name, EntityDetails::Class { fields, methods })?;
                    let frame = scope.push(ScopeKind::Class, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "trait_definition" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let (_, methods) = members(node, cx)?;
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Trait {
                            methods,
                            associated_types: None,
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Trait, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "enum_definition" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let mut variants = Bullets::new();
                    if let Some(body) = node.child_by_field_name("body") {
                        let mut cursor = body.walk();
                        for cases in body.named_children(&mut cursor) {
                            if cases.kind() != "enum_case_definitions" {
                                continue;
                            }
                            let mut inner = cases.walk();
                            for case in cases.named_children(&mut inner) {
                                if let Some(case_name) = cx.field_text(case, "name")? {
                                    variants.push(case_name);
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
            "type_definition" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let target_type = cx.field_text(node, "type")?.map(str::to_string);
                    cx.emit(node, name, EntityDetails::TypeAlias { target_type })?;
                }
            }
            "function_definition" | "function_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let parent_class = scope.first_of(&[ScopeKind::Class, ScopeKind::Trait]);
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

/// `val`/`var` names and method names of a template body.
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
    for child in body.named_children(&mut cursor) {
        match child.kind() {
            "function_definition" | "function_declaration" => {
                if let Some(name) = cx.field_text(child, "name")? {
                    methods.push(name);
                }
            }
            "val_definition" | "var_definition" => {
                if let Some(pattern) = child.child_by_field_name("pattern") {
                    match pattern.kind() {
                        "identifiers" => {
                            let mut inner = pattern.walk();
                            for ident in pattern.named_children(&mut inner) {
                                fields.push(cx.text(ident)?);
                            }
                        }
                        _ => match first_child(pattern, &["identifier"]) {
                            Some(ident) => fields.push(cx.text(ident)?),
                            None => fields.push(cx.text(pattern)?),
                        },
                    }
                }
            }
            "val_declaration" | "var_declaration" => {
                if let Some(name) = cx.field_text(child, "name")? {
                    fields.push(name);
                }
            }
            _ => {}
        }
    }

    Ok((fields.finish(), methods.finish()))
}

#[cfg(test)]
mod tests {
    use crate::entity::{EntityDetails, EntityKind};
    use crate::scanner::Language;
    use crate::visitors::test_support::{extract_all, find, names};

    const SOURCE: &str = r#"package shop

type Price = BigDecimal

trait Priced {
  def price: Price
  def discounted(rate: Double): Price = price
}

enum Size {
  case Small, Large
  case Custom(n: Int)
}

class Cart(owner: String) extends Priced {
  val items = List.empty[String]
  var count = 0

  def price: Price = {
    def sum(xs: List[Int]): Int = xs.sum
    BigDecimal(sum(Nil))
  }
}

object Cart {
  def empty: Cart = new Cart("nobody")
}
"#;

    #[test]
    fn test_types() {
        let entities = extract_all(Language::Scala, "Cart.scala", SOURCE);

        let price = find(&entities, EntityKind::TypeAlias, "Price");
        let EntityDetails::TypeAlias { target_type } = &price.details else {
            panic!("not a type alias");
        };
        assert_eq!(target_type.as_deref(), Some("BigDecimal"));

        let priced = find(&entities, EntityKind::Trait, "Priced");
        let EntityDetails::Trait { methods, .. } = &priced.details else {
            panic!("not a trait");
        };
        assert_eq!(methods.as_deref(), Some("- price\n- discounted"));

        let size = find(&entities, EntityKind::Enum, "Size");
        let EntityDetails::Enum { variants, .. } = &size.details else {
            panic!("not an enum");
        };
        assert_eq!(variants.as_deref(), Some("- Small\n- Large\n- Custom"));
    }

    #[test]
    fn test_class_and_companion_object() {
        let entities = extract_all(Language::Scala, "Cart.scala", SOURCE);
        assert_eq!(names(&entities, EntityKind::Class), vec!["Cart", "Cart"]);

        let cart = find(&entities, EntityKind::Class, "Cart");
        let EntityDetails::Class { fields, methods } = &cart.details else {
            panic!("not a class");
        };
        assert_eq!(fields.as_deref(), Some("- items\n- count"));
        assert_eq!(methods.as_deref(), Some("- price"));
    }

    #[test]
    fn test_function_parents() {
        let entities = extract_all(Language::Scala, "Cart.scala", SOURCE);
        assert_eq!(
            names(&entities, EntityKind::Function),
            vec!["price", "discounted", "price", "sum", "empty"]
        );
        assert_eq!(
            find(&entities, EntityKind::Function, "discounted").parent_class(),
            Some("Priced")
        );
        assert_eq!(
            find(&entities, EntityKind::Function, "empty").parent_class(),
            Some("Cart")
        );
    }
}
