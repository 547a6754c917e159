//! Rust visitor.

use super::{first_child, walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct RustVisitor;

impl Visitor for RustVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "function_item" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let parent_class =
                        scope.first_of(&[ScopeKind::Impl, ScopeKind::Trait, ScopeKind::Struct]);
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
            "struct_item" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    emit_generic(node, name, cx)?;
                    let fields = body_items(node, cx, &["field_declaration"])?;
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Struct {
                            fields,
                            methods: None,
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Struct, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "enum_item" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    emit_generic(node, name, cx)?;
                    let mut variants = Bullets::new();
                    if let Some(body) = node.child_by_field_name("body") {
                        let mut cursor = body.walk();
                        for child in body.children(&mut cursor) {
                            if child.kind() == "enum_variant" {
                                if let Some(variant) = cx.field_text(child, "name")? {
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
                            parent_class: None,
                        },
                    )?;
                }
            }
            "trait_item" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    emit_generic(node, name, cx)?;
                    let mut methods = Bullets::new();
                    let mut associated_types = Bullets::new();
                    if let Some(body) = node.child_by_field_name("body") {
                        let mut cursor = body.walk();
                        for child in body.children(&mut cursor) {
                            match child.kind() {
                                "function_signature_item" => methods.push(cx.text(child)?),
                                "function_item" => methods.push(cx.header(child, &["block"])?),
                                "associated_type" => {
                                    if let Some(ty) = cx.field_text(child, "name")? {
                                        associated_types.push(ty);
                                    }
                                }
                                _ => {}
                            }
                        }
                    }
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Trait {
                            methods: methods.finish(),
                            associated_types: associated_types.finish(),
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Trait, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "impl_item" => {
                if let Some(ty) = cx.field_text(node, "type")? {
                    let name = match cx.field_text(node, "trait")? {
                        Some(trait_name) => format!("{} for {}", trait_name, ty),
                        None => ty.to_string(),
                    };
                    let mut methods = Bullets::new();
                    if let Some(body) = node.child_by_field_name("body") {
                        let mut cursor = body.walk();
                        for child in body.children(&mut cursor) {
                            if child.kind() == "function_item" {
                                if let Some(method) = cx.field_text(child, "name")? {
                                    methods.push(method);
                                }
                            }
                        }
                    }
                    cx.emit(
                        node,
                        name.as_str(),
                        EntityDetails::Class {
                            fields: None,
                            methods: methods.finish(),
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Impl, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "union_item" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let variants = body_items(node, cx, &["field_declaration"])?;
                    cx.emit(node, name, EntityDetails::Union { variants })?;
                }
            }
            "type_item" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    emit_generic(node, name, cx)?;
                    let target_type = cx.field_text(node, "type")?.map(str::to_string);
                    cx.emit(node, name, EntityDetails::TypeAlias { target_type })?;
                }
            }
            "mod_item" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let mut exports = Bullets::new();
                    if let Some(body) = node.child_by_field_name("body") {
                        let mut cursor = body.walk();
                        for child in body.children(&mut cursor) {
                            if matches!(
                                child.kind(),
                                "function_item" | "struct_item" | "enum_item" | "trait_item"
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

fn body_items(
    node: Node<'_>,
    cx: &VisitContext<'_>,
    kinds: &[&str],
) -> Result<Option<String>, IndexerError> {
    let mut items = Bullets::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            if kinds.contains(&child.kind()) {
                items.push(cx.text(child)?);
            }
        }
    }
    Ok(items.finish())
}

/// Items with type parameters are also recorded as generic types. Bounds
/// from both the parameter list and the where clause count as constraints.
fn emit_generic(node: Node<'_>, name: &str, cx: &mut VisitContext<'_>) -> Result<(), IndexerError> {
    let Some(params) = node.child_by_field_name("type_parameters") else {
        return Ok(());
    };

    let mut type_parameters = Bullets::new();
    let mut constraints = Bullets::new();
    let mut cursor = params.walk();
    for param in params.named_children(&mut cursor) {
        match param.kind() {
            "attribute_item" => {}
            "constrained_type_parameter" => {
                if let Some(left) = cx.field_text(param, "left")? {
                    type_parameters.push(left);
                }
                constraints.push(cx.text(param)?);
            }
            "type_parameter" => {
                let Some(param_name) = cx.field_text(param, "name")? else {
                    type_parameters.push(cx.text(param)?);
                    continue;
                };
                type_parameters.push(param_name);
                if let Some(bounds) = cx.field_text(param, "bounds")? {
                    let bounds = bounds.trim_start_matches(':').trim();
                    constraints.push(format!("{}: {}", param_name, bounds));
                }
            }
            "optional_type_parameter" => {
                if let Some(ty) = cx.field_text(param, "name")? {
                    type_parameters.push(ty);
                }
            }
            _ => type_parameters.push(cx.text(param)?),
        }
    }

    if let Some(where_clause) = first_child(node, &["where_clause"]) {
        let mut cursor = where_clause.walk();
        for predicate in where_clause.named_children(&mut cursor) {
            constraints.push(cx.text(predicate)?);
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

    const SOURCE: &str = r#"pub struct Point {
    x: f64,
    y: f64,
}

pub enum Shape {
    Circle(f64),
    Square { side: f64 },
}

pub trait Area {
    type Unit;
    fn area(&self) -> f64;
}

impl Area for Point {
    type Unit = f64;
    fn area(&self) -> f64 {
        fn helper() -> f64 { 0.0 }
        helper()
    }
}

pub struct Wrapper<T: Clone, U>
where
    U: Default,
{
    inner: T,
    extra: U,
}

union Bits {
    i: u32,
    f: f32,
}

type Meters = f64;

mod geometry {
    pub fn distance() -> f64 { 0.0 }
}

fn main() {}
"#;

    #[test]
    fn test_struct_enum_union() {
        let entities = extract_all(Language::Rust, "lib.rs", SOURCE);

        let point = find(&entities, EntityKind::Struct, "Point");
        let EntityDetails::Struct { fields, .. } = &point.details else {
            panic!("not a struct");
        };
        assert_eq!(fields.as_deref(), Some("- x: f64\n- y: f64"));

        let shape = find(&entities, EntityKind::Enum, "Shape");
        let EntityDetails::Enum { variants, .. } = &shape.details else {
            panic!("not an enum");
        };
        assert_eq!(variants.as_deref(), Some("- Circle\n- Square"));

        let bits = find(&entities, EntityKind::Union, "Bits");
        let EntityDetails::Union { variants } = &bits.details else {
            panic!("not a union");
        };
        assert_eq!(variants.as_deref(), Some("- i: u32\n- f: f32"));
    }

    #[test]
    fn test_trait_and_impl() {
        let entities = extract_all(Language::Rust, "lib.rs", SOURCE);

        let area = find(&entities, EntityKind::Trait, "Area");
        let EntityDetails::Trait {
            methods,
            associated_types,
        } = &area.details
        else {
            panic!("not a trait");
        };
        assert_eq!(methods.as_deref(), Some("- fn area(&self) -> f64;"));
        assert_eq!(associated_types.as_deref(), Some("- Unit"));

        let imp = find(&entities, EntityKind::Class, "Area for Point");
        let EntityDetails::Class { methods, .. } = &imp.details else {
            panic!("not an impl");
        };
        assert_eq!(methods.as_deref(), Some("- area"));

        let method = find(&entities, EntityKind::Function, "area");
        assert_eq!(method.parent_class(), Some("Area for Point"));

        // Inside an impl the impl wins over the enclosing function.
        let helper = find(&entities, EntityKind::Function, "helper");
        assert_eq!(helper.parent_class(), Some("Area for Point"));
        assert_eq!(helper.parent_function(), None);
    }

    #[test]
    fn test_generic_struct() {
        let entities = extract_all(Language::Rust, "lib.rs", SOURCE);

        let generic = find(&entities, EntityKind::GenericType, "Wrapper");
        let EntityDetails::GenericType {
            type_parameters,
            constraints,
        } = &generic.details
        else {
            panic!("not a generic type");
        };
        assert_eq!(type_parameters.as_deref(), Some("- T\n- U"));
        assert_eq!(constraints.as_deref(), Some("- T: Clone\n- U: Default"));
        assert!(names(&entities, EntityKind::Struct).contains(&"Wrapper"));
    }

    #[test]
    fn test_inline_bounds_become_constraints() {
        let source = "struct Pair<A: Copy + std::fmt::Debug, B = i32> {\n    a: A,\n    b: B,\n}\n";
        let entities = extract_all(Language::Rust, "pair.rs", source);

        let pair = find(&entities, EntityKind::GenericType, "Pair");
        let EntityDetails::GenericType {
            type_parameters,
            constraints,
        } = &pair.details
        else {
            panic!("not a generic type");
        };
        assert_eq!(type_parameters.as_deref(), Some("- A\n- B"));
        assert_eq!(constraints.as_deref(), Some("- A: Copy + std::fmt::Debug"));
    }

    #[test]
    fn test_alias_module_and_free_function() {
        let entities = extract_all(Language::Rust, "lib.rs", SOURCE);

        let meters = find(&entities, EntityKind::TypeAlias, "Meters");
        let EntityDetails::TypeAlias { target_type } = &meters.details else {
            panic!("not a type alias");
        };
        assert_eq!(target_type.as_deref(), Some("f64"));

        let module = find(&entities, EntityKind::Module, "geometry");
        let EntityDetails::Module { exports, .. } = &module.details else {
            panic!("not a module");
        };
        assert_eq!(exports.as_deref(), Some("- function_item: distance"));

        let main = find(&entities, EntityKind::Function, "main");
        assert_eq!(main.parent_class(), None);
        assert_eq!(main.parent_function(), None);
    }
}
