//! C visitor.

use super::{walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct CVisitor;

impl Visitor for CVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "function_definition" => {
                if let Some(name) = function_name(node, cx)? {
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Function {
                            parent_function: None,
                            parent_class: None,
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Function, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "struct_specifier" => {
                if let (Some(name), Some(body)) =
                    (cx.field_text(node, "name")?, node.child_by_field_name("body"))
                {
                    let fields = body_items(body, cx, "field_declaration")?;
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
            "union_specifier" => {
                if let (Some(name), Some(body)) =
                    (cx.field_text(node, "name")?, node.child_by_field_name("body"))
                {
                    let variants = body_items(body, cx, "field_declaration")?;
                    cx.emit(node, name, EntityDetails::Union { variants })?;
                }
            }
            "enum_specifier" => {
                if let (Some(name), Some(body)) =
                    (cx.field_text(node, "name")?, node.child_by_field_name("body"))
                {
                    let variants = body_items(body, cx, "enumerator")?;
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Enum {
                            variants,
                            parent_class: None,
                        },
                    )?;
                }
            }
            "type_definition" => {
                if let (Some(declarator), Some(target)) = (
                    node.child_by_field_name("declarator"),
                    node.child_by_field_name("type"),
                ) {
                    if declarator.kind() == "type_identifier" {
                        let name = cx.text(declarator)?;
                        let target_type = Some(type_text(target, cx)?);
                        cx.emit(node, name, EntityDetails::TypeAlias { target_type })?;
                    }
                }
            }
            _ => {}
        }

        walk_children(self, node, cx, scope)
    }
}

/// Name declared by a function definition, looking through pointer and
/// reference declarators: `static char *name(void)` gives `name`.
pub(super) fn function_name<'a>(
    node: Node<'_>,
    cx: &VisitContext<'a>,
) -> Result<Option<&'a str>, IndexerError> {
    let mut current = node.child_by_field_name("declarator");
    while let Some(declarator) = current {
        if declarator.kind() == "function_declarator" {
            return match declarator.child_by_field_name("declarator") {
                Some(name) => Ok(Some(cx.text(name)?)),
                None => Ok(None),
            };
        }
        current = declarator
            .child_by_field_name("declarator")
            .or_else(|| declarator.named_child(0));
    }
    Ok(None)
}

pub(super) fn body_items(
    body: Node<'_>,
    cx: &VisitContext<'_>,
    kind: &str,
) -> Result<Option<String>, IndexerError> {
    let mut items = Bullets::new();
    let mut cursor = body.walk();
    for child in body.children(&mut cursor) {
        if child.kind() == kind {
            items.push(cx.text(child)?);
        }
    }
    Ok(items.finish())
}

/// `struct point { ... }` aliased by a typedef reads as `struct point`.
fn type_text(target: Node<'_>, cx: &VisitContext<'_>) -> Result<String, IndexerError> {
    match target.kind() {
        "struct_specifier" | "union_specifier" | "enum_specifier"
            if target.child_by_field_name("body").is_some() =>
        {
            cx.header(target, &["field_declaration_list", "enumerator_list"])
        }
        _ => Ok(cx.text(target)?.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use crate::entity::{EntityDetails, EntityKind};
    use crate::scanner::Language;
    use crate::visitors::test_support::{extract_all, find, names};

    const SOURCE: &str = r#"#include <stdio.h>

struct point {
    int x;
    int y;
};

union value {
    int i;
    float f;
};

enum color { RED, GREEN = 2 };

typedef struct point point_t;
typedef unsigned long size_type;

static char *describe(struct point p) {
    return "point";
}

int main(void) {
    struct point p = {1, 2};
    printf("%s\n", describe(p));
    return 0;
}
"#;

    #[test]
    fn test_functions() {
        let entities = extract_all(Language::C, "main.c", SOURCE);
        assert_eq!(
            names(&entities, EntityKind::Function),
            vec!["describe", "main"]
        );
        let main = find(&entities, EntityKind::Function, "main");
        assert_eq!((main.start_line, main.end_line), (22, 26));
    }

    #[test]
    fn test_struct_union_enum() {
        let entities = extract_all(Language::C, "main.c", SOURCE);

        // Only the defining specifier counts, not later `struct point` uses.
        assert_eq!(names(&entities, EntityKind::Struct), vec!["point"]);
        let point = find(&entities, EntityKind::Struct, "point");
        let EntityDetails::Struct { fields, .. } = &point.details else {
            panic!("not a struct");
        };
        assert_eq!(fields.as_deref(), Some("- int x;\n- int y;"));

        let value = find(&entities, EntityKind::Union, "value");
        let EntityDetails::Union { variants } = &value.details else {
            panic!("not a union");
        };
        assert_eq!(variants.as_deref(), Some("- int i;\n- float f;"));

        let color = find(&entities, EntityKind::Enum, "color");
        let EntityDetails::Enum { variants, .. } = &color.details else {
            panic!("not an enum");
        };
        assert_eq!(variants.as_deref(), Some("- RED\n- GREEN = 2"));
    }

    #[test]
    fn test_typedefs() {
        let entities = extract_all(Language::C, "main.c", SOURCE);
        let alias = find(&entities, EntityKind::TypeAlias, "size_type");
        let EntityDetails::TypeAlias { target_type } = &alias.details else {
            panic!("not a type alias");
        };
        assert_eq!(target_type.as_deref(), Some("unsigned long"));
        assert!(names(&entities, EntityKind::TypeAlias).contains(&"point_t"));
    }
}
