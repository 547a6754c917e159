//! Swift visitor.
//!
//! `class_declaration` covers classes, structs, actors, enums and
//! extensions; the `declaration_kind` keyword tells them apart.

use super::{first_child, walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct SwiftVisitor;

const CALLABLES: &[&str] = &["function_declaration", "init_declaration", "deinit_declaration"];

impl Visitor for SwiftVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "import_declaration" => {
                if let Some(module) = cx.child_text(node, &["identifier"])? {
                    cx.emit(
                        node,
                        module,
                        EntityDetails::Module {
                            exports: None,
                            imports: Some(module.to_string()),
                        },
                    )?;
                }
            }
            "class_declaration" => {
                let keyword = node
                    .child_by_field_name("declaration_kind")
                    .map(|k| k.kind())
                    .unwrap_or("class");
                let Some(name_node) = node.child_by_field_name("name") else {
                    return walk_children(self, node, cx, scope);
                };
                let name = type_name(name_node, cx)?;

                match keyword {
                    "enum" => {
                        let mut variants = Bullets::new();
                        if let Some(body) = node.child_by_field_name("body") {
                            let mut cursor = body.walk();
                            for entry in body.named_children(&mut cursor) {
                                if entry.kind() != "enum_entry" {
                                    continue;
                                }
                                let mut inner = entry.walk();
                                for case in entry.children_by_field_name("name", &mut inner) {
                                    variants.push(cx.text(case)?);
                                }
                            }
                        }
                        cx.emit(
                            node,
                            name,
                            EntityDetails::Enum {
                                variants: variants.finish(),
                                parent_class: scope.first_of(&[ScopeKind::Class, ScopeKind::Struct]),
                            },
                        )?;
                        let frame = scope.push(ScopeKind::Class, name, node);
                        return walk_children(self, node, cx, frame.scope());
                    }
                    "extension" => {
                        let (_, methods) = members(node, cx)?;
                        cx.emit(
                            node,
                            format!("Extension_{}", name),
                            EntityDetails::Extension {
                                extended_type: Some(name.to_string()),
                                methods,
                            },
                        )?;
                        // Extension members belong to the extended type
                        let frame = scope.push(ScopeKind::Class, name, node);
                        return walk_children(self, node, cx, frame.scope());
                    }
                    _ => {
                        let (fields, methods) = members(node, cx)?;
                        let (details, kind) = if keyword == "class" {
                            (EntityDetails::Class { fields, methods }, ScopeKind::Class)
                        } else {
                            (EntityDetails::Struct { fields, methods }, ScopeKind::Struct)
                        };
                        cx.emit(node, name, details)?;

                        // Actors never carry a generic entry
                        if keyword != "actor" {
                            if let Some(params) = type_parameters(node, cx)? {
                                cx.emit(
                                    node,
                                    name,
                                    EntityDetails::GenericType {
                                        type_parameters: Some(params),
                                        constraints: None,
                                    },
                                )?;
                            }
                        }
                        let frame = scope.push(kind, name, node);
                        return walk_children(self, node, cx, frame.scope());
                    }
                }
            }
            "protocol_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let (methods, properties) = requirements(node, cx)?;
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
            "typealias_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let target_type = cx.field_text(node, "value")?.map(str::to_string);
                    cx.emit(node, name, EntityDetails::TypeAlias { target_type })?;
                }
            }
            kind if CALLABLES.contains(&kind) => {
                let name = callable_name(node, cx)?;
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
            _ => {}
        }

        walk_children(self, node, cx, scope)
    }
}

/// Bare type name: `Array` for `Array<Int>`, `Outer.Inner` stays whole.
fn type_name<'a>(node: Node<'_>, cx: &VisitContext<'a>) -> Result<&'a str, IndexerError> {
    if node.kind() == "user_type" {
        if let Some(ident) = first_child(node, &["type_identifier"]) {
            if node.named_child_count() == 1 {
                return cx.text(ident);
            }
        }
    }
    cx.text(node)
}

fn callable_name<'a>(node: Node<'_>, cx: &VisitContext<'a>) -> Result<&'a str, IndexerError> {
    if let Some(name) = cx.field_text(node, "name")? {
        return Ok(name);
    }
    Ok(match node.kind() {
        "init_declaration" => "init",
        "deinit_declaration" => "deinit",
        kind => kind,
    })
}

/// Name bound by a property pattern.
fn property_name<'a>(node: Node<'_>, cx: &VisitContext<'a>) -> Result<Option<&'a str>, IndexerError> {
    let Some(pattern) = node.child_by_field_name("name") else {
        return Ok(None);
    };
    match cx.field_text(pattern, "bound_identifier")? {
        Some(name) => Ok(Some(name)),
        None => Ok(Some(cx.text(pattern)?)),
    }
}

fn members(
    node: Node<'_>,
    cx: &VisitContext<'_>,
) -> Result<(Option<String>, Option<String>), IndexerError> {
    let mut properties = Bullets::new();
    let mut methods = Bullets::new();

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "property_declaration" => {
                    if let Some(name) = property_name(member, cx)? {
                        properties.push(name);
                    }
                }
                kind if CALLABLES.contains(&kind) => methods.push(callable_name(member, cx)?),
                _ => {}
            }
        }
    }

    Ok((properties.finish(), methods.finish()))
}

/// Method requirements, then property and associated type requirements.
fn requirements(
    node: Node<'_>,
    cx: &VisitContext<'_>,
) -> Result<(Option<String>, Option<String>), IndexerError> {
    let mut methods = Bullets::new();
    let mut properties = Bullets::new();

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.named_children(&mut cursor) {
            match member.kind() {
                "protocol_function_declaration" | "init_declaration" => {
                    methods.push(callable_name(member, cx)?)
                }
                "protocol_property_declaration" => {
                    if let Some(name) = property_name(member, cx)? {
                        properties.push(name);
                    }
                }
                "associatedtype_declaration" => {
                    if let Some(name) = cx.field_text(member, "name")? {
                        properties.push(format!("associatedtype {}", name));
                    }
                }
                _ => {}
            }
        }
    }

    Ok((methods.finish(), properties.finish()))
}

/// Comma-joined generic parameter names, if any.
fn type_parameters(node: Node<'_>, cx: &VisitContext<'_>) -> Result<Option<String>, IndexerError> {
    let Some(params) = first_child(node, &["type_parameters"]) else {
        return Ok(None);
    };
    let mut names = Vec::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        if param.kind() != "type_parameter" {
            continue;
        }
        if let Some(name) = cx.child_text(param, &["type_identifier"])? {
            names.push(name);
        }
    }
    Ok((!names.is_empty()).then(|| names.join(", ")))
}

#[cfg(test)]
mod tests {
    use crate::entity::{EntityDetails, EntityKind};
    use crate::scanner::Language;
    use crate::visitors::test_support::{extract_all, find, names};

    const SOURCE: &str = r#"import Foundation

typealias Handler = (String) -> Void

protocol Shape {
    associatedtype Unit
    var area: Double { get }
    func describe() -> String
}

struct Box<T> {
    let width: Double
    var items: [T] = []

    func total() -> Int {
        return items.count
    }
}

class Cart {
    var owner: String

    enum State {
        case open, closed
        case pending
    }

    init(owner: String) {
        self.owner = owner
    }

    deinit {}
}

actor Counter {
    var value = 0
    func bump() { value += 1 }
}

extension Cart {
    func checkout() {}
}

func main() {
    func helper() {}
}
"#;

    #[test]
    fn test_type_declarations() {
        let entities = extract_all(Language::Swift, "Cart.swift", SOURCE);

        let foundation = find(&entities, EntityKind::Module, "Foundation");
        let EntityDetails::Module { imports, .. } = &foundation.details else {
            panic!("not a module");
        };
        assert_eq!(imports.as_deref(), Some("Foundation"));

        let cart = find(&entities, EntityKind::Class, "Cart");
        let EntityDetails::Class { fields, methods } = &cart.details else {
            panic!("not a class");
        };
        assert_eq!(fields.as_deref(), Some("- owner"));
        assert_eq!(methods.as_deref(), Some("- init\n- deinit"));

        assert_eq!(names(&entities, EntityKind::Struct), vec!["Box", "Counter"]);
        let generic = find(&entities, EntityKind::GenericType, "Box");
        let EntityDetails::GenericType {
            type_parameters, ..
        } = &generic.details
        else {
            panic!("not a generic type");
        };
        assert_eq!(type_parameters.as_deref(), Some("T"));

        let state = find(&entities, EntityKind::Enum, "State");
        let EntityDetails::Enum {
            variants,
            parent_class,
        } = &state.details
        else {
            panic!("not an enum");
        };
        assert_eq!(variants.as_deref(), Some("- open\n- closed\n- pending"));
        assert_eq!(parent_class.as_deref(), Some("Cart"));
    }

    #[test]
    fn test_protocol_and_extension() {
        let entities = extract_all(Language::Swift, "Cart.swift", SOURCE);

        let shape = find(&entities, EntityKind::Interface, "Shape");
        let EntityDetails::Interface {
            methods,
            properties,
        } = &shape.details
        else {
            panic!("not an interface");
        };
        assert_eq!(methods.as_deref(), Some("- describe"));
        assert_eq!(properties.as_deref(), Some("- associatedtype Unit\n- area"));

        let ext = find(&entities, EntityKind::Extension, "Extension_Cart");
        let EntityDetails::Extension {
            extended_type,
            methods,
        } = &ext.details
        else {
            panic!("not an extension");
        };
        assert_eq!(extended_type.as_deref(), Some("Cart"));
        assert_eq!(methods.as_deref(), Some("- checkout"));

        let handler = find(&entities, EntityKind::TypeAlias, "Handler");
        let EntityDetails::TypeAlias { target_type } = &handler.details else {
            panic!("not a type alias");
        };
        assert_eq!(target_type.as_deref(), Some("(String) -> Void"));
    }

    #[test]
    fn test_function_parents() {
        let entities = extract_all(Language::Swift, "Cart.swift", SOURCE);
        assert_eq!(
            names(&entities, EntityKind::Function),
            vec!["total", "init", "deinit", "bump", "checkout", "main", "helper"]
        );
        assert_eq!(
            find(&entities, EntityKind::Function, "total").parent_class(),
            Some("Box")
        );
        assert_eq!(
            find(&entities, EntityKind::Function, "checkout").parent_class(),
            Some("Cart")
        );
        assert_eq!(
            find(&entities, EntityKind::Function, "helper").parent_function(),
            Some("main")
        );
    }
}
