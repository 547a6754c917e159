//! Ruby visitor.

use super::{walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct RubyVisitor;

impl Visitor for RubyVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "method" | "singleton_method" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let parent_class = scope.first_of(&[ScopeKind::Class, ScopeKind::Module]);
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
            "class" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let (fields, methods) = class_members(node, cx)?;
                    cx.emit(node, name, EntityDetails::Class { fields, methods })?;
                    let frame = scope.push(ScopeKind::Class, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "module" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let mut exports = Bullets::new();
                    if let Some(body) = node.child_by_field_name("body") {
                        let mut cursor = body.walk();
                        for child in body.named_children(&mut cursor) {
                            if matches!(
                                child.kind(),
                                "method" | "singleton_method" | "class" | "module"
                            ) {
                                if let Some(item) = cx.field_text(child, "name")? {
                                    exports.push(format!("{}: {}", child.kind(), item));
                                }
                            }
                        }
                    }
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Module {
                            exports: exports.finish(),
                            imports: None,
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Module, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            _ => {}
        }

        walk_children(self, node, cx, scope)
    }
}

/// Class-level assignments and the instance variables its methods assign,
/// plus method names.
fn class_members(
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
            "assignment" => fields.push(cx.text(child)?),
            "method" | "singleton_method" => {
                if let Some(name) = cx.field_text(child, "name")? {
                    methods.push(name);
                }
                instance_variables(child, cx, &mut fields)?;
            }
            _ => {}
        }
    }

    Ok((fields.finish(), methods.finish()))
}

fn instance_variables(node: Node<'_>, cx: &VisitContext<'_>, fields: &mut Bullets) -> Result<(), IndexerError> {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "assignment" {
            if let Some(left) = child.child_by_field_name("left") {
                if left.kind() == "instance_variable" {
                    fields.push_unique(cx.text(left)?);
                }
            }
        }
        instance_variables(child, cx, fields)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::entity::{EntityDetails, EntityKind};
    use crate::scanner::Language;
    use crate::visitors::test_support::{extract_all, find, names};

    const SOURCE: &str = r#"module Shop
  VERSION = "1.0"

  class Cart
    LIMIT = 10

    def initialize(owner)
      @owner = owner
      @items = []
    end

    def add(item)
      @items << item
    end

    def self.build
      new("guest")
    end
  end

  def self.helper
    true
  end
end

def standalone
end
"#;

    #[test]
    fn test_module_exports() {
        let entities = extract_all(Language::Ruby, "cart.rb", SOURCE);
        let shop = find(&entities, EntityKind::Module, "Shop");
        let EntityDetails::Module { exports, .. } = &shop.details else {
            panic!("not a module");
        };
        assert_eq!(
            exports.as_deref(),
            Some("- class: Cart\n- singleton_method: helper")
        );
    }

    #[test]
    fn test_class_members() {
        let entities = extract_all(Language::Ruby, "cart.rb", SOURCE);
        let cart = find(&entities, EntityKind::Class, "Cart");
        let EntityDetails::Class { fields, methods } = &cart.details else {
            panic!("not a class");
        };
        assert_eq!(fields.as_deref(), Some("- LIMIT = 10\n- @owner\n- @items"));
        assert_eq!(methods.as_deref(), Some("- initialize\n- add\n- build"));
    }

    #[test]
    fn test_method_parents() {
        let entities = extract_all(Language::Ruby, "cart.rb", SOURCE);
        assert_eq!(
            names(&entities, EntityKind::Function),
            vec!["initialize", "add", "build", "helper", "standalone"]
        );
        assert_eq!(
            find(&entities, EntityKind::Function, "build").parent_class(),
            Some("Cart")
        );
        assert_eq!(
            find(&entities, EntityKind::Function, "helper").parent_class(),
            Some("Shop")
        );
        assert_eq!(
            find(&entities, EntityKind::Function, "standalone").parent_class(),
            None
        );
        let add = find(&entities, EntityKind::Function, "add");
        assert_eq!((add.start_line, add.end_line), (12, 14));
    }
}
