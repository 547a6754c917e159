//! Kotlin visitor.
//!
//! Extraction errors are recorded per node and never abort the file.

use super::{first_child, has_child, walk_children, Frame, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct KotlinVisitor;

impl Visitor for KotlinVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        let frame = match self.extract(node, cx, scope) {
            Ok(frame) => frame,
            Err(e) => {
                cx.record(node, &e);
                None
            }
        };
        match &frame {
            Some(frame) => walk_children(self, node, cx, frame.scope()),
            None => walk_children(self, node, cx, scope),
        }
    }
}

impl KotlinVisitor {
    /// Emit the entity for `node`, returning the frame to descend with.
    fn extract<'s>(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'s>,
    ) -> Result<Option<Frame<'s>>, IndexerError> {
        match node.kind() {
            "class_declaration" => {
                let Some(name) = cx.field_text(node, "name")? else {
                    return Ok(None);
                };
                if has_child(node, "interface") {
                    let (properties, methods) = members(node, cx)?;
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Interface {
                            methods,
                            properties,
                        },
                    )?;
                    return Ok(Some(scope.push(ScopeKind::Interface, name, node)));
                }
                if is_enum(node, cx)? {
                    let mut variants = Bullets::new();
                    if let Some(body) = first_child(node, &["enum_class_body"]) {
                        let mut cursor = body.walk();
                        for entry in body.named_children(&mut cursor) {
                            if entry.kind() == "enum_entry" {
                                if let Some(variant) = cx.child_text(entry, &["identifier"])? {
                                    variants.push(variant);
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
                    return Ok(Some(scope.push(ScopeKind::Class, name, node)));
                }
                let (fields, methods) = members(node, cx)?;
                cx.emit(node, name, EntityDetails::Class { fields, methods })?;
                Ok(Some(scope.push(ScopeKind::Class, name, node)))
            }
            "object_declaration" | "companion_object" => {
                let name = cx.field_text(node, "name")?.unwrap_or("Companion");
                let (fields, methods) = members(node, cx)?;
                cx.emit(node, name, EntityDetails::Class { fields, methods })?;
                Ok(Some(scope.push(ScopeKind::Class, name, node)))
            }
            "type_alias" => {
                if let Some(name) = cx.field_text(node, "type")? {
                    let target_type = match alias_target(node) {
                        Some(target) => Some(cx.text(target)?.to_string()),
                        None => None,
                    };
                    cx.emit(node, name, EntityDetails::TypeAlias { target_type })?;
                }
                Ok(None)
            }
            "function_declaration" => {
                let Some(name) = cx.field_text(node, "name")? else {
                    return Ok(None);
                };
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
                Ok(Some(scope.push(ScopeKind::Function, name, node)))
            }
            _ => Ok(None),
        }
    }
}

/// The aliased type: the first named node after `=`.
fn alias_target(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let mut children = node.children(&mut cursor);
    children.find(|child| child.kind() == "=")?;
    children.find(|child| child.is_named())
}

fn is_enum(node: Node<'_>, cx: &VisitContext<'_>) -> Result<bool, IndexerError> {
    if first_child(node, &["enum_class_body"]).is_some() {
        return Ok(true);
    }
    let Some(modifiers) = first_child(node, &["modifiers"]) else {
        return Ok(false);
    };
    let mut cursor = modifiers.walk();
    for modifier in modifiers.named_children(&mut cursor) {
        if modifier.kind() == "class_modifier" && cx.text(modifier)? == "enum" {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Property names (including `val`/`var` constructor parameters) and
/// method names of a class-like declaration.
fn members(
    node: Node<'_>,
    cx: &VisitContext<'_>,
) -> Result<(Option<String>, Option<String>), IndexerError> {
    let mut properties = Bullets::new();
    let mut methods = Bullets::new();

    if let Some(constructor) = first_child(node, &["primary_constructor"]) {
        if let Some(params) = first_child(constructor, &["class_parameters"]) {
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                if param.kind() == "class_parameter"
                    && (has_child(param, "val") || has_child(param, "var"))
                {
                    if let Some(name) = cx.child_text(param, &["identifier"])? {
                        properties.push(name);
                    }
                }
            }
        }
    }

    if let Some(body) = first_child(node, &["class_body", "enum_class_body"]) {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "property_declaration" => {
                    if let Some(decl) = first_child(member, &["variable_declaration"]) {
                        if let Some(name) = cx.child_text(decl, &["identifier"])? {
                            properties.push(name);
                        }
                    }
                }
                "function_declaration" => {
                    if let Some(name) = cx.field_text(member, "name")? {
                        methods.push(name);
                    }
                }
                _ => {}
            }
        }
    }

    Ok((properties.finish(), methods.finish()))
}

#[cfg(test)]
mod tests {
    use crate::entity::{EntityDetails, EntityKind};
    use crate::scanner::Language;
    use crate::visitors::test_support::{extract_all, find, names};

    const SOURCE: &str = r#"package shop

typealias Handler = (String) -> Unit

interface Priced {
    val price: Double
    fun discount(rate: Double): Double
}

enum class Size { SMALL, LARGE }

class Cart(val owner: String, count: Int) : Priced {
    override val price: Double = 0.0
    var items = mutableListOf<String>()

    override fun discount(rate: Double): Double {
        fun clamp(x: Double) = x.coerceIn(0.0, 1.0)
        return price * clamp(rate)
    }

    companion object {
        fun empty() = Cart("nobody", 0)
    }
}

object Registry {
    fun register(cart: Cart) {}
}

fun main() {
    println(Cart("a", 1).price)
}
"#;

    #[test]
    fn test_class_interface_enum() {
        let entities = extract_all(Language::Kotlin, "Cart.kt", SOURCE);

        let cart = find(&entities, EntityKind::Class, "Cart");
        let EntityDetails::Class { fields, methods } = &cart.details else {
            panic!("not a class");
        };
        assert_eq!(fields.as_deref(), Some("- owner\n- price\n- items"));
        assert_eq!(methods.as_deref(), Some("- discount"));

        let priced = find(&entities, EntityKind::Interface, "Priced");
        let EntityDetails::Interface {
            methods,
            properties,
        } = &priced.details
        else {
            panic!("not an interface");
        };
        assert_eq!(methods.as_deref(), Some("- discount"));
        assert_eq!(properties.as_deref(), Some("- price"));

        let size = find(&entities, EntityKind::Enum, "Size");
        let EntityDetails::Enum { variants, .. } = &size.details else {
            panic!("not an enum");
        };
        assert_eq!(variants.as_deref(), Some("- SMALL\n- LARGE"));

        assert_eq!(
            names(&entities, EntityKind::Class),
            vec!["Cart", "Companion", "Registry"]
        );
    }

    #[test]
    fn test_type_alias() {
        let entities = extract_all(Language::Kotlin, "Cart.kt", SOURCE);
        let handler = find(&entities, EntityKind::TypeAlias, "Handler");
        let EntityDetails::TypeAlias { target_type } = &handler.details else {
            panic!("not a type alias");
        };
        assert_eq!(target_type.as_deref(), Some("(String) -> Unit"));
    }

    #[test]
    fn test_generic_type_alias_target() {
        let entities = extract_all(Language::Kotlin, "Table.kt", "typealias Table<K> = Map<K, String>\n");
        let table = find(&entities, EntityKind::TypeAlias, "Table");
        let EntityDetails::TypeAlias { target_type } = &table.details else {
            panic!("not a type alias");
        };
        assert_eq!(target_type.as_deref(), Some("Map<K, String>"));
    }

    #[test]
    fn test_function_parents() {
        let entities = extract_all(Language::Kotlin, "Cart.kt", SOURCE);

        let parents: Vec<_> = entities
            .iter()
            .filter(|e| e.name == "discount")
            .filter_map(|e| e.parent_class())
            .collect();
        assert_eq!(parents, vec!["Priced", "Cart"]);

        assert_eq!(
            find(&entities, EntityKind::Function, "empty").parent_class(),
            Some("Companion")
        );
        assert_eq!(
            find(&entities, EntityKind::Function, "register").parent_class(),
            Some("Registry")
        );
        let main = find(&entities, EntityKind::Function, "main");
        assert_eq!((main.parent_class(), main.parent_function()), (None, None));
    }

    #[test]
    fn test_broken_source_does_not_abort() {
        let source = "class Ok { fun fine() {} }\nclass {{{ fun\n";
        let entities = extract_all(Language::Kotlin, "Broken.kt", source);
        assert!(names(&entities, EntityKind::Function).contains(&"fine"));
    }
}
