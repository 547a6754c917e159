//! Query commands of the ckg tool.

use ckg_indexer::{EntityKind, FunctionFilter};
use std::fmt;

/// One of the fifteen search commands.
///
/// Every entity kind has a command of its own; functions additionally split
/// into free functions and class methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Search `kind`'s table; functions are restricted to free functions
    Search(EntityKind),
    /// Search functions that have a parent class
    SearchClassMethod,
}

impl Command {
    /// All commands in tool-definition order.
    pub fn all() -> Vec<Command> {
        let mut commands = vec![
            Command::Search(EntityKind::Function),
            Command::Search(EntityKind::Class),
            Command::SearchClassMethod,
        ];
        commands.extend(
            EntityKind::ALL
                .iter()
                .filter(|k| !matches!(k, EntityKind::Function | EntityKind::Class))
                .map(|k| Command::Search(*k)),
        );
        commands
    }

    pub fn parse(name: &str) -> Option<Command> {
        if name == "search_class_method" {
            return Some(Command::SearchClassMethod);
        }
        EntityKind::ALL
            .iter()
            .find(|k| k.command() == name)
            .map(|k| Command::Search(*k))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Search(kind) => kind.command(),
            Command::SearchClassMethod => "search_class_method",
        }
    }

    /// Table the command reads.
    pub fn kind(&self) -> EntityKind {
        match self {
            Command::Search(kind) => *kind,
            Command::SearchClassMethod => EntityKind::Function,
        }
    }

    pub fn filter(&self) -> FunctionFilter {
        match self {
            Command::Search(EntityKind::Function) => FunctionFilter::Free,
            Command::SearchClassMethod => FunctionFilter::Method,
            Command::Search(_) => FunctionFilter::Any,
        }
    }

    /// Plural used in reports.
    pub fn plural(&self) -> &'static str {
        match self {
            Command::Search(kind) => kind.plural(),
            Command::SearchClassMethod => "class methods",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifteen_distinct_commands() {
        let all = Command::all();
        assert_eq!(all.len(), 15);
        let mut names: Vec<_> = all.iter().map(|c| c.name()).collect();
        assert_eq!(&names[..3], &["search_function", "search_class", "search_class_method"]);
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 15);
    }

    #[test]
    fn test_parse_round_trip() {
        for command in Command::all() {
            assert_eq!(Command::parse(command.name()), Some(command));
        }
        assert_eq!(Command::parse("search_everything"), None);
    }

    #[test]
    fn test_function_commands() {
        let free = Command::parse("search_function").unwrap();
        assert_eq!(free.kind(), EntityKind::Function);
        assert_eq!(free.filter(), FunctionFilter::Free);
        assert_eq!(free.plural(), "functions");

        let methods = Command::parse("search_class_method").unwrap();
        assert_eq!(methods.kind(), EntityKind::Function);
        assert_eq!(methods.filter(), FunctionFilter::Method);
        assert_eq!(methods.plural(), "class methods");
    }

    #[test]
    fn test_each_kind_reads_its_own_table() {
        let structs = Command::parse("search_struct").unwrap();
        assert_eq!(structs.kind(), EntityKind::Struct);
        assert_eq!(structs.filter(), FunctionFilter::Any);
        assert_eq!(
            Command::parse("search_generic_type").unwrap().plural(),
            "generic types"
        );
    }
}
