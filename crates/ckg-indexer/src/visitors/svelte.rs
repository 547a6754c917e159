//! Svelte component visitor.

use super::embedded::{script_blocks, ComponentScan, Flavor};
use super::{Scope, VisitContext, Visitor};
use crate::IndexerError;
use tree_sitter::Node;

pub struct SvelteVisitor;

impl Visitor for SvelteVisitor {
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
            scan.add_script(&block, Flavor::Svelte)?;
        }

        // Markup is everything outside script and style
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if !matches!(child.kind(), "script_element" | "style_element" | "comment") {
                scan.template.push(cx.text(child)?.to_string());
            }
        }

        scan.emit(node, cx)
    }
}
