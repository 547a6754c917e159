//! Table layout for the entity store.
//!
//! Each kind gets its own table: the shared header columns followed by the
//! kind's summary columns, in the field order of [`EntityDetails`].

use crate::entity::{EntityDetails, EntityKind};

/// Header columns shared by every table, after `id`.
pub(crate) const HEADER: [&str; 5] = ["name", "file_path", "body", "start_line", "end_line"];

/// Summary columns of `kind`.
pub(crate) fn columns(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Function => &["parent_function", "parent_class"],
        EntityKind::Class | EntityKind::Struct => &["fields", "methods"],
        EntityKind::Enum => &["variants", "parent_class"],
        EntityKind::Interface => &["methods", "properties"],
        EntityKind::Trait => &["methods", "associated_types"],
        EntityKind::Module => &["exports", "imports"],
        EntityKind::Namespace => &["members"],
        EntityKind::TypeAlias => &["target_type"],
        EntityKind::Component => &["props", "methods", "template"],
        EntityKind::Contract => &["functions", "events", "modifiers", "state_variables"],
        EntityKind::Extension => &["extended_type", "methods"],
        EntityKind::Union => &["variants"],
        EntityKind::GenericType => &["type_parameters", "constraints"],
    }
}

pub(crate) fn create_table(kind: EntityKind) -> String {
    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS {} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            file_path TEXT NOT NULL,
            body TEXT NOT NULL,
            start_line INTEGER NOT NULL,
            end_line INTEGER NOT NULL",
        kind.table()
    );
    for column in columns(kind) {
        sql.push_str(&format!(",\n            {} TEXT", column));
    }
    sql.push_str("\n        )");
    sql
}

pub(crate) fn insert(kind: EntityKind) -> String {
    let names: Vec<&str> = HEADER.iter().chain(columns(kind)).copied().collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        kind.table(),
        names.join(", "),
        placeholders.join(", ")
    )
}

pub(crate) fn select(kind: EntityKind) -> String {
    let names: Vec<&str> = HEADER.iter().chain(columns(kind)).copied().collect();
    format!("SELECT {} FROM {}", names.join(", "), kind.table())
}

/// Summary values in column order.
pub(crate) fn values(details: &EntityDetails) -> Vec<Option<&str>> {
    let fields: Vec<&Option<String>> = match details {
        EntityDetails::Function {
            parent_function,
            parent_class,
        } => vec![parent_function, parent_class],
        EntityDetails::Class { fields, methods } | EntityDetails::Struct { fields, methods } => {
            vec![fields, methods]
        }
        EntityDetails::Enum {
            variants,
            parent_class,
        } => vec![variants, parent_class],
        EntityDetails::Interface {
            methods,
            properties,
        } => vec![methods, properties],
        EntityDetails::Trait {
            methods,
            associated_types,
        } => vec![methods, associated_types],
        EntityDetails::Module { exports, imports } => vec![exports, imports],
        EntityDetails::Namespace { members } => vec![members],
        EntityDetails::TypeAlias { target_type } => vec![target_type],
        EntityDetails::Component {
            props,
            methods,
            template,
        } => vec![props, methods, template],
        EntityDetails::Contract {
            functions,
            events,
            modifiers,
            state_variables,
        } => vec![functions, events, modifiers, state_variables],
        EntityDetails::Extension {
            extended_type,
            methods,
        } => vec![extended_type, methods],
        EntityDetails::Union { variants } => vec![variants],
        EntityDetails::GenericType {
            type_parameters,
            constraints,
        } => vec![type_parameters, constraints],
    };
    // Empty summaries are stored as NULL
    fields
        .into_iter()
        .map(|v| v.as_deref().filter(|s| !s.is_empty()))
        .collect()
}

/// Rebuild details of `kind` from its summary values in column order.
pub(crate) fn details(kind: EntityKind, values: Vec<Option<String>>) -> EntityDetails {
    let mut values = values.into_iter();
    let mut next = || values.next().flatten();
    match kind {
        EntityKind::Function => EntityDetails::Function {
            parent_function: next(),
            parent_class: next(),
        },
        EntityKind::Class => EntityDetails::Class {
            fields: next(),
            methods: next(),
        },
        EntityKind::Struct => EntityDetails::Struct {
            fields: next(),
            methods: next(),
        },
        EntityKind::Enum => EntityDetails::Enum {
            variants: next(),
            parent_class: next(),
        },
        EntityKind::Interface => EntityDetails::Interface {
            methods: next(),
            properties: next(),
        },
        EntityKind::Trait => EntityDetails::Trait {
            methods: next(),
            associated_types: next(),
        },
        EntityKind::Module => EntityDetails::Module {
            exports: next(),
            imports: next(),
        },
        EntityKind::Namespace => EntityDetails::Namespace { members: next() },
        EntityKind::TypeAlias => EntityDetails::TypeAlias {
            target_type: next(),
        },
        EntityKind::Component => EntityDetails::Component {
            props: next(),
            methods: next(),
            template: next(),
        },
        EntityKind::Contract => EntityDetails::Contract {
            functions: next(),
            events: next(),
            modifiers: next(),
            state_variables: next(),
        },
        EntityKind::Extension => EntityDetails::Extension {
            extended_type: next(),
            methods: next(),
        },
        EntityKind::Union => EntityDetails::Union { variants: next() },
        EntityKind::GenericType => EntityDetails::GenericType {
            type_parameters: next(),
            constraints: next(),
        },
    }
}
