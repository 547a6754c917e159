//! Entity model for the code knowledge graph.
//!
//! Every extracted construct shares an [`Entity`] header (name, file, span,
//! raw text) and carries kind-specific summaries in [`EntityDetails`].
//! Summaries are newline-joined `- item` bullet lists; an empty summary is
//! `None`, never an empty string.

use serde::{Deserialize, Serialize};

/// The fourteen entity kinds, one table each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Function,
    Class,
    Struct,
    Enum,
    Interface,
    Trait,
    Module,
    Namespace,
    TypeAlias,
    Component,
    Contract,
    Extension,
    Union,
    GenericType,
}

impl EntityKind {
    pub const ALL: [EntityKind; 14] = [
        EntityKind::Function,
        EntityKind::Class,
        EntityKind::Struct,
        EntityKind::Enum,
        EntityKind::Interface,
        EntityKind::Trait,
        EntityKind::Module,
        EntityKind::Namespace,
        EntityKind::TypeAlias,
        EntityKind::Component,
        EntityKind::Contract,
        EntityKind::Extension,
        EntityKind::Union,
        EntityKind::GenericType,
    ];

    /// Store table holding this kind.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Function => "functions",
            EntityKind::Class => "classes",
            EntityKind::Struct => "structs",
            EntityKind::Enum => "enums",
            EntityKind::Interface => "interfaces",
            EntityKind::Trait => "traits",
            EntityKind::Module => "modules",
            EntityKind::Namespace => "namespaces",
            EntityKind::TypeAlias => "type_aliases",
            EntityKind::Component => "components",
            EntityKind::Contract => "contracts",
            EntityKind::Extension => "extensions",
            EntityKind::Union => "unions",
            EntityKind::GenericType => "generic_types",
        }
    }

    /// Plural used in reports ("Found 2 type aliases named ...").
    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Function => "functions",
            EntityKind::Class => "classes",
            EntityKind::Struct => "structs",
            EntityKind::Enum => "enums",
            EntityKind::Interface => "interfaces",
            EntityKind::Trait => "traits",
            EntityKind::Module => "modules",
            EntityKind::Namespace => "namespaces",
            EntityKind::TypeAlias => "type aliases",
            EntityKind::Component => "components",
            EntityKind::Contract => "contracts",
            EntityKind::Extension => "extensions",
            EntityKind::Union => "unions",
            EntityKind::GenericType => "generic types",
        }
    }

    /// Query command that searches this kind.
    pub fn command(&self) -> &'static str {
        match self {
            EntityKind::Function => "search_function",
            EntityKind::Class => "search_class",
            EntityKind::Struct => "search_struct",
            EntityKind::Enum => "search_enum",
            EntityKind::Interface => "search_interface",
            EntityKind::Trait => "search_trait",
            EntityKind::Module => "search_module",
            EntityKind::Namespace => "search_namespace",
            EntityKind::TypeAlias => "search_type_alias",
            EntityKind::Component => "search_component",
            EntityKind::Contract => "search_contract",
            EntityKind::Extension => "search_extension",
            EntityKind::Union => "search_union",
            EntityKind::GenericType => "search_generic_type",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Function => "function",
            EntityKind::Class => "class",
            EntityKind::Struct => "struct",
            EntityKind::Enum => "enum",
            EntityKind::Interface => "interface",
            EntityKind::Trait => "trait",
            EntityKind::Module => "module",
            EntityKind::Namespace => "namespace",
            EntityKind::TypeAlias => "type_alias",
            EntityKind::Component => "component",
            EntityKind::Contract => "contract",
            EntityKind::Extension => "extension",
            EntityKind::Union => "union",
            EntityKind::GenericType => "generic_type",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An extracted code entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Declared or synthesized name, never empty
    pub name: String,
    /// Absolute path of the defining file
    pub file_path: String,
    /// Raw source text of the node's span
    pub body: String,
    /// Start line (1-indexed, inclusive)
    pub start_line: usize,
    /// End line (1-indexed, inclusive)
    pub end_line: usize,
    /// Kind-specific summaries
    pub details: EntityDetails,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        self.details.kind()
    }

    /// Parent class of a function or enum, if any.
    pub fn parent_class(&self) -> Option<&str> {
        match &self.details {
            EntityDetails::Function { parent_class, .. } => parent_class.as_deref(),
            EntityDetails::Enum { parent_class, .. } => parent_class.as_deref(),
            _ => None,
        }
    }

    /// Parent function of a nested function, if any.
    pub fn parent_function(&self) -> Option<&str> {
        match &self.details {
            EntityDetails::Function {
                parent_function, ..
            } => parent_function.as_deref(),
            _ => None,
        }
    }
}

/// Kind-specific entity summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityDetails {
    Function {
        parent_function: Option<String>,
        parent_class: Option<String>,
    },
    Class {
        fields: Option<String>,
        methods: Option<String>,
    },
    Struct {
        fields: Option<String>,
        methods: Option<String>,
    },
    Enum {
        variants: Option<String>,
        parent_class: Option<String>,
    },
    Interface {
        methods: Option<String>,
        properties: Option<String>,
    },
    Trait {
        methods: Option<String>,
        associated_types: Option<String>,
    },
    Module {
        exports: Option<String>,
        imports: Option<String>,
    },
    Namespace {
        members: Option<String>,
    },
    TypeAlias {
        target_type: Option<String>,
    },
    Component {
        props: Option<String>,
        methods: Option<String>,
        template: Option<String>,
    },
    Contract {
        functions: Option<String>,
        events: Option<String>,
        modifiers: Option<String>,
        state_variables: Option<String>,
    },
    Extension {
        extended_type: Option<String>,
        methods: Option<String>,
    },
    Union {
        variants: Option<String>,
    },
    GenericType {
        type_parameters: Option<String>,
        constraints: Option<String>,
    },
}

impl EntityDetails {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityDetails::Function { .. } => EntityKind::Function,
            EntityDetails::Class { .. } => EntityKind::Class,
            EntityDetails::Struct { .. } => EntityKind::Struct,
            EntityDetails::Enum { .. } => EntityKind::Enum,
            EntityDetails::Interface { .. } => EntityKind::Interface,
            EntityDetails::Trait { .. } => EntityKind::Trait,
            EntityDetails::Module { .. } => EntityKind::Module,
            EntityDetails::Namespace { .. } => EntityKind::Namespace,
            EntityDetails::TypeAlias { .. } => EntityKind::TypeAlias,
            EntityDetails::Component { .. } => EntityKind::Component,
            EntityDetails::Contract { .. } => EntityKind::Contract,
            EntityDetails::Extension { .. } => EntityKind::Extension,
            EntityDetails::Union { .. } => EntityKind::Union,
            EntityDetails::GenericType { .. } => EntityKind::GenericType,
        }
    }

    /// Labelled, non-empty summary sections in report order.
    pub fn sections(&self) -> Vec<(&'static str, &str)> {
        let candidates: Vec<(&'static str, &Option<String>)> = match self {
            EntityDetails::Function { .. } => vec![],
            EntityDetails::Class { fields, methods } | EntityDetails::Struct { fields, methods } => {
                vec![("Fields", fields), ("Methods", methods)]
            }
            EntityDetails::Enum { variants, .. } => vec![("Variants", variants)],
            EntityDetails::Interface {
                methods,
                properties,
            } => vec![("Properties", properties), ("Methods", methods)],
            EntityDetails::Trait {
                methods,
                associated_types,
            } => vec![("Associated Types", associated_types), ("Methods", methods)],
            EntityDetails::Module { exports, imports } => {
                vec![("Imports", imports), ("Exports", exports)]
            }
            EntityDetails::Namespace { members } => vec![("Members", members)],
            EntityDetails::TypeAlias { target_type } => vec![("Target Type", target_type)],
            EntityDetails::Component {
                props,
                methods,
                template,
            } => vec![
                ("Props", props),
                ("Methods", methods),
                ("Template", template),
            ],
            EntityDetails::Contract {
                functions,
                events,
                modifiers,
                state_variables,
            } => vec![
                ("State Variables", state_variables),
                ("Functions", functions),
                ("Events", events),
                ("Modifiers", modifiers),
            ],
            EntityDetails::Extension {
                extended_type,
                methods,
            } => vec![("Extended Type", extended_type), ("Methods", methods)],
            EntityDetails::Union { variants } => vec![("Variants", variants)],
            EntityDetails::GenericType {
                type_parameters,
                constraints,
            } => vec![
                ("Type Parameters", type_parameters),
                ("Constraints", constraints),
            ],
        };

        candidates
            .into_iter()
            .filter_map(|(label, value)| {
                value
                    .as_deref()
                    .filter(|v| !v.is_empty())
                    .map(|v| (label, v))
            })
            .collect()
    }
}

/// Accumulates `- item` lines for a summary field.
#[derive(Debug, Default, Clone)]
pub struct Bullets {
    lines: Vec<String>,
}

impl Bullets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `- item`. Blank items are dropped.
    pub fn push(&mut self, item: impl AsRef<str>) {
        let item = item.as_ref().trim();
        if !item.is_empty() {
            self.lines.push(format!("- {}", item));
        }
    }

    /// Append `- item` unless an identical line is already present.
    pub fn push_unique(&mut self, item: impl AsRef<str>) {
        let line = format!("- {}", item.as_ref().trim());
        if line.len() > 2 && !self.lines.contains(&line) {
            self.lines.push(line);
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Joined text, or `None` when nothing was pushed.
    pub fn finish(self) -> Option<String> {
        if self.lines.is_empty() {
            None
        } else {
            Some(self.lines.join("\n"))
        }
    }
}

/// Wrap a single value as a one-item bullet list.
pub fn bullet(item: impl AsRef<str>) -> Option<String> {
    let mut b = Bullets::new();
    b.push(item);
    b.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullets_join_and_empty() {
        let mut b = Bullets::new();
        b.push("first");
        b.push("  ");
        b.push("second ");
        assert_eq!(b.finish().as_deref(), Some("- first\n- second"));
        assert_eq!(Bullets::new().finish(), None);
    }

    #[test]
    fn test_bullets_unique() {
        let mut b = Bullets::new();
        b.push_unique("x");
        b.push_unique("x");
        b.push_unique("y");
        assert_eq!(b.len(), 2);
    }

    #[test]
    fn test_kind_tables_are_distinct() {
        let mut tables: Vec<_> = EntityKind::ALL.iter().map(|k| k.table()).collect();
        tables.sort();
        tables.dedup();
        assert_eq!(tables.len(), 14);
    }

    #[test]
    fn test_sections_skip_empty_fields() {
        let details = EntityDetails::Class {
            fields: None,
            methods: Some("- run()".into()),
        };
        assert_eq!(details.sections(), vec![("Methods", "- run()")]);

        let details = EntityDetails::Contract {
            functions: Some("- f".into()),
            events: None,
            modifiers: Some(String::new()),
            state_variables: Some("- uint x".into()),
        };
        let labels: Vec<_> = details.sections().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["State Variables", "Functions"]);
    }

    #[test]
    fn test_parent_accessors() {
        let entity = Entity {
            name: "m".into(),
            file_path: "/a.py".into(),
            body: "def m(self): pass".into(),
            start_line: 2,
            end_line: 2,
            details: EntityDetails::Function {
                parent_function: None,
                parent_class: Some("A".into()),
            },
        };
        assert_eq!(entity.kind(), EntityKind::Function);
        assert_eq!(entity.parent_class(), Some("A"));
        assert_eq!(entity.parent_function(), None);
    }
}
