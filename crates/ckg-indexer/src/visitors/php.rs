//! PHP visitor.

use super::{walk_children, Scope, ScopeKind, VisitContext, Visitor};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use tree_sitter::Node;

pub struct PhpVisitor;

const NAMESPACE_MEMBERS: &[&str] = &[
    "class_declaration",
    "interface_declaration",
    "trait_declaration",
    "enum_declaration",
    "function_definition",
];

impl Visitor for PhpVisitor {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError> {
        match node.kind() {
            "function_definition" | "method_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let parent_class = scope.first_of(&[
                        ScopeKind::Class,
                        ScopeKind::Trait,
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
            }
            "class_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let mut fields = Bullets::new();
                    let mut methods = Bullets::new();
                    if let Some(body) = node.child_by_field_name("body") {
                        let mut cursor = body.walk();
                        for child in body.children(&mut cursor) {
                            match child.kind() {
                                "property_declaration" => fields.push(cx.text(child)?),
                                "method_declaration" => {
                                    if let Some(method) = cx.field_text(child, "name")? {
                                        methods.push(method);
                                    }
                                }
                                _ => {}
                            }
                        }
                    }
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Class {
                            fields: fields.finish(),
                            methods: methods.finish(),
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Class, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "interface_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let methods = method_names(node, cx)?;
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Interface {
                            methods,
                            properties: None,
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Interface, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "trait_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let methods = method_names(node, cx)?;
                    cx.emit(
                        node,
                        name,
                        EntityDetails::Trait {
                            methods,
                            associated_types: None,
                        },
                    )?;
                    let frame = scope.push(ScopeKind::Trait, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "enum_declaration" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let mut variants = Bullets::new();
                    if let Some(body) = node.child_by_field_name("body") {
                        let mut cursor = body.walk();
                        for child in body.children(&mut cursor) {
                            if child.kind() == "enum_case" {
                                if let Some(case) = cx.field_text(child, "name")? {
                                    variants.push(case);
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
                    // Enum methods belong to the enum
                    let frame = scope.push(ScopeKind::Class, name, node);
                    return walk_children(self, node, cx, frame.scope());
                }
            }
            "namespace_definition" => {
                if let Some(name) = cx.field_text(node, "name")? {
                    let members = namespace_members(node, cx)?;
                    cx.emit(node, name, EntityDetails::Namespace { members })?;
                }
            }
            _ => {}
        }

        walk_children(self, node, cx, scope)
    }
}

fn method_names(node: Node<'_>, cx: &VisitContext<'_>) -> Result<Option<String>, IndexerError> {
    let mut methods = Bullets::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            if child.kind() == "method_declaration" {
                if let Some(method) = cx.field_text(child, "name")? {
                    methods.push(method);
                }
            }
        }
    }
    Ok(methods.finish())
}

/// Members of a braced namespace, or of a `namespace X;` statement up to
/// the next namespace statement.
fn namespace_members(node: Node<'_>, cx: &VisitContext<'_>) -> Result<Option<String>, IndexerError> {
    let mut members = Bullets::new();
    let mut push = |decl: Node<'_>| -> Result<(), IndexerError> {
        if NAMESPACE_MEMBERS.contains(&decl.kind()) {
            if let Some(name) = cx.field_text(decl, "name")? {
                members.push(format!("{}: {}", decl.kind(), name));
            }
        }
        Ok(())
    };

    match node.child_by_field_name("body") {
        Some(body) => {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                push(child)?;
            }
        }
        None => {
            let mut sibling = node.next_sibling();
            while let Some(next) = sibling {
                if next.kind() == "namespace_definition" {
                    break;
                }
                push(next)?;
                sibling = next.next_sibling();
            }
        }
    }

    Ok(members.finish())
}

#[cfg(test)]
mod tests {
    use crate::entity::{EntityDetails, EntityKind};
    use crate::scanner::Language;
    use crate::visitors::test_support::{extract_all, find, names};

    const SOURCE: &str = r#"<?php

namespace App\Billing;

interface Payable
{
    public function pay(float $amount): bool;
}

trait Loggable
{
    public function log(string $msg): void {}
}

enum Status: string
{
    case Paid = 'paid';
    case Due = 'due';
}

class Invoice implements Payable
{
    use Loggable;

    private float $total = 0.0;

    public function pay(float $amount): bool
    {
        $this->total -= $amount;
        return true;
    }
}

function helper(): void
{
    function inner(): void {}
}
"#;

    #[test]
    fn test_statement_namespace_members() {
        let entities = extract_all(Language::Php, "Invoice.php", SOURCE);
        let ns = find(&entities, EntityKind::Namespace, "App\\Billing");
        let EntityDetails::Namespace { members } = &ns.details else {
            panic!("not a namespace");
        };
        assert_eq!(
            members.as_deref(),
            Some(
                "- interface_declaration: Payable\n- trait_declaration: Loggable\n\
                 - enum_declaration: Status\n- class_declaration: Invoice\n\
                 - function_definition: helper"
            )
        );
    }

    #[test]
    fn test_types() {
        let entities = extract_all(Language::Php, "Invoice.php", SOURCE);

        let invoice = find(&entities, EntityKind::Class, "Invoice");
        let EntityDetails::Class { fields, methods } = &invoice.details else {
            panic!("not a class");
        };
        assert_eq!(fields.as_deref(), Some("- private float $total = 0.0;"));
        assert_eq!(methods.as_deref(), Some("- pay"));

        let loggable = find(&entities, EntityKind::Trait, "Loggable");
        let EntityDetails::Trait { methods, .. } = &loggable.details else {
            panic!("not a trait");
        };
        assert_eq!(methods.as_deref(), Some("- log"));

        let status = find(&entities, EntityKind::Enum, "Status");
        let EntityDetails::Enum { variants, .. } = &status.details else {
            panic!("not an enum");
        };
        assert_eq!(variants.as_deref(), Some("- Paid\n- Due"));

        assert_eq!(names(&entities, EntityKind::Interface), vec!["Payable"]);
    }

    #[test]
    fn test_function_parents() {
        let entities = extract_all(Language::Php, "Invoice.php", SOURCE);
        assert_eq!(
            names(&entities, EntityKind::Function),
            vec!["pay", "log", "pay", "helper", "inner"]
        );

        let parents: Vec<_> = entities
            .iter()
            .filter(|e| e.name == "pay")
            .filter_map(|e| e.parent_class())
            .collect();
        assert_eq!(parents, vec!["Payable", "Invoice"]);
        assert_eq!(
            find(&entities, EntityKind::Function, "log").parent_class(),
            Some("Loggable")
        );
        assert_eq!(
            find(&entities, EntityKind::Function, "inner").parent_function(),
            Some("helper")
        );
    }
}
