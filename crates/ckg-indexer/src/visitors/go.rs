//! Go visitor.

use super::{first_child, walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct GoVisitor;

impl Visitor for GoVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "function_declaration" => {
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
            "method_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Function {
                            parent_function: None,
                            parent_class: receiver_type(node, cx)?,
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Function, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "type_spec" => {
                if let (Some(name), Some(ty)) =
                    (cx.field_text(node, "name")?, node.child_by_field_name("type"))
                {
                    emit_generic(node, name, cx)?;
                    match ty.kind() {
                        "struct_type" => {
                            let mut fields = Bullets::new();
                            if let Some(list) = first_child(ty, &["field_declaration_list"]) {
                                let mut cursor = list.walk();
                                for field in list.children(&mut cursor) {
                                    if field.kind() == "field_declaration" {
                                        fields.push(cx.text(field)?);
                                    }
                                }
                            }
                            cx.emit(
                                node,
                                name,
                                EntityDetails::Struct {
                                    fields: fields.finish(),
                                    methods: None,
                                },
                            )?;
                        }
                        "interface_type" => {
                            let mut methods = Bullets::new();
                            let mut cursor = ty.walk();
                            for elem in ty.children(&mut cursor) {
                                if matches!(elem.kind(), "method_elem" | "type_elem") {
                                    methods.push(cx.text(elem)?);
                                }
                            }
                            cx.emit(
                                node,
                                name,
                                EntityDetails::Interface {
                                    methods: methods.finish(),
                                    properties: None,
                                },
                            )?;
                        }
                        _ => {
                            cx.emit(
                                node,
                                name,
                                EntityDetails::TypeAlias {
                                    target_type: Some(cx.text(ty)?.to_string()),
                                },
                            )?;
                        }
                    }
                }
            }
            "type_alias" => {
                if let (Some(name), Some(target)) =
                    (cx.field_text(node, "name")?, cx.field_text(node, "type")?)
                {
                    cx.emit(
                        node,
                        name,
                        EntityDetails::TypeAlias {
                            target_type: Some(target.to_string()),
                        },
                    )?;
                }
            }
            "package_clause" => {
                if let Some(name) = cx.child_text(node, &["package_identifier"])? {
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Module {
                            exports: None,
                            imports: None,
                        },
                    )?;
                }
            }
            "import_spec" => {
                if let Some(path) = cx.field_text(node, "path")? {
                    let path = path.trim_matches(|c| c == '"' || c == '`');
                    if !path.is_empty() {
                        cx.emit(
                            node,
                            path,
                            EntityDetails::Module {
                                exports: None,
                                imports: None,
                            },
                        )?;
                    }
                }
            }
            _ => {}
        }

        walk_children(self, node, cx, scope)
    }
}

/// Receiver base type with pointer and package qualifiers removed:
/// `(s *pkg.Server)` gives `Server`.
fn receiver_type(node: Node<'_>, cx: &VisitContext<'_>) -> Result<Option<String>, IndexerError> {
    let Some(receiver) = node.child_by_field_name("receiver") else {
        return Ok(None);
    };
    let Some(param) = first_child(receiver, &["parameter_declaration"]) else {
        return Ok(None);
    };
    let Some(ty) = cx.field_text(param, "type")? else {
        return Ok(None);
    };

    let cleaned = ty.replace('*', "");
    // Generic receivers such as `List[T]` keep only the base name
    let base = cleaned.split('[').next().unwrap_or_default();
    let name = base.rsplit('.').next().unwrap_or_default().trim();
    Ok((!name.is_empty()).then(|| name.to_string()))
}

fn emit_generic(node: Node<'_>, name: &str, cx: &mut VisitContext<'_>) -> Result<(), IndexerError> {
    let Some(params) = node.child_by_field_name("type_parameters") else {
        return Ok(());
    };

    let mut type_parameters = Bullets::new();
    let mut constraints = Bullets::new();
    let mut cursor = params.walk();
    for decl in params.named_children(&mut cursor) {
        if decl.kind() != "type_parameter_declaration" {
            continue;
        }
        let mut names = decl.walk();
        for ident in decl.children_by_field_name("name", &mut names) {
            type_parameters.push(cx.text(ident)?);
        }
        constraints.push(cx.text(decl)?);
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
