//! Vue single-file component visitor.

use super::embedded::{script_blocks, ComponentScan, Flavor};
use super::{first_child, Scope, VisitContext, Visitor};
use crate::IndexerError;
use tree_sitter::Node;

pub struct VueVisitor;

impl Visitor for VueVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        _scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        // Only the document is recognized; script blocks are scanned from here, so there is no descent
        if node.kind() != "document" || node.named_child_count() == 0 {
            return Ok(());
        }

        let mut scan = ComponentScan::default();
        for block in script_blocks(node, cx)? {
            scan.add_script(&block, Flavor::Vue)?;
        }

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "template_element" => {
                    let start = first_child(child, &["start_tag"]).map(|t| t.end_byte());
                    let end = first_child(child, &["end_tag"]).map(|t| t.start_byte());
                    let inner = cx
                        .source()
                        .get(start.unwrap_or(child.start_byte())..end.unwrap_or(child.end_byte()))
                        .unwrap_or_default();
                    scan.template.push(String::from_utf8_lossy(inner).into_owned());
                }
                "element" | "text" | "interpolation" => scan.template.push(cx.text(child)?.to_string()),
                _ => {}
            }
        }

        scan.emit(node, cx)
    }
}
