//! Python visitor.

use super::{walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct PythonVisitor;

impl Visitor for PythonVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "function_definition" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let (parent_function, parent_class) = function_parents(scope);
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
            "class_definition" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let (fields, methods) = class_members(node, cx)?;
                    cx.emit(node, name, EntityDetails::Class { fields, methods })?;
                    let frame = scope.push(ScopeKind::Class, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "import_statement" => {
                let mut cursor = node.walk();
                for child in node.children_by_field_name("name", &mut cursor) {
                    let module = match child.kind() {
                        "aliased_import" => child.child_by_field_name("name"),
                        _ => Some(child),
                    };
                    if let Some(module) = module {
                        let name = cx.text(module)?;
                        cx.emit(node, name, module_details())?;
                    }
                }
            }
            "import_from_statement" => {
                if let Some(name) = cx.field_text(node, "module_name")? {
                    cx.emit(node, name, module_details())?;
                }
            }
            _ => {}
        }

        walk_children(self, node, cx, scope)
    }
}

/// A function directly inside a class is a method. Inside both a class and
/// a function, it is nested in the function only when that function itself
/// lies within the class.
fn function_parents(scope: Scope<'_>) -> (Option<String>, Option<String>) {
    match (
        scope.nearest(ScopeKind::Function),
        scope.nearest(ScopeKind::Class),
    ) {
        (Some(func), Some(class)) if func.within(class) => (Some(func.name.clone()), None),
        (Some(_), Some(class)) => (None, Some(class.name.clone())),
        (Some(func), None) => (Some(func.name.clone()), None),
        (None, Some(class)) => (None, Some(class.name.clone())),
        (None, None) => (None, None),
    }
}

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
    for child in body.children(&mut cursor) {
        match child.kind() {
            "function_definition" => methods.push(method_signature(child, cx)?),
            "decorated_definition" => {
                if let Some(def) = child
                    .child_by_field_name("definition")
                    .filter(|d| d.kind() == "function_definition")
                {
                    methods.push(method_signature(def, cx)?);
                }
            }
            "expression_statement" => {
                let mut inner = child.walk();
                for expr in child.children(&mut inner) {
                    if expr.kind() == "assignment" {
                        if let Some(left) = cx.field_text(expr, "left")? {
                            fields.push(left);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Ok((fields.finish(), methods.finish()))
}

/// `name(params) -> ret`
fn method_signature(func: Node<'_>, cx: &VisitContext<'_>) -> Result<String, IndexerError> {
    let mut signature = cx.field_text(func, "name")?.unwrap_or_default().to_string();
    if let Some(params) = cx.field_text(func, "parameters")? {
        signature.push_str(params);
    }
    if let Some(ret) = cx.field_text(func, "return_type")? {
        signature.push_str(" -> ");
        signature.push_str(ret);
    }
    Ok(signature)
}

fn module_details() -> EntityDetails {
    EntityDetails::Module {
        exports: None,
        imports: None,
    }
}
