//! Zig visitor.
//!
//! Containers are anonymous in Zig; a `const Name = struct { ... };`
//! declaration gives them their name. Extraction errors are recorded per
//! node and never abort the file.

use super::{first_child, walk_children, Frame, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct ZigVisitor;

const MAX_FIELDS: usize = 20;
const MAX_VARIANTS: usize = 15;

const CONTAINERS: &[&str] = &["struct_declaration", "enum_declaration", "union_declaration"];

impl Visitor for ZigVisitor {
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

impl ZigVisitor {
    fn extract<'s>(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'s>,
    ) -> Result<Option<Frame<'s>>, IndexerError> {
        match node.kind() {
            "function_declaration" => {
                let Some(name) = cx.field_text(node, "name")? else {
                    return Ok(None);
                };
                let parent_class = scope.name_of(ScopeKind::Struct);
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
            "variable_declaration" => {
                let Some(container) = first_child(node, CONTAINERS) else {
                    return Ok(None);
                };
                let Some(name) = cx.child_text(node, &["identifier"])? else {
                    return Ok(None);
                };
                let details = match container.kind() {
                    "enum_declaration" => EntityDetails::Enum {
                        variants: container_fields(container, cx, MAX_VARIANTS)?,
                        parent_class: scope.name_of(ScopeKind::Struct),
                    },
                    "union_declaration" => EntityDetails::Union {
                        variants: container_fields(container, cx, MAX_FIELDS)?,
                    },
                    _ => EntityDetails::Struct {
                        fields: container_fields(container, cx, MAX_FIELDS)?,
                        methods: None,
                    },
                };
                cx.emit(node, name, details)?;
                Ok(Some(scope.push(ScopeKind::Struct, name, node)))
            }
            _ => Ok(None),
        }
    }
}

/// Unique field names of a container, at most `limit` of them.
fn container_fields(
    container: Node<'_>,
    cx: &VisitContext<'_>,
    limit: usize,
) -> Result<Option<String>, IndexerError> {
    let mut fields = Bullets::new();
    let mut cursor = container.walk();
    for member in container.named_children(&mut cursor) {
        if fields.len() >= limit {
            break;
        }
        if member.kind() == "container_field" {
            if let Some(name) = cx.field_text(member, "name")? {
                fields.push_unique(name);
            }
        }
    }
    Ok(fields.finish())
}
