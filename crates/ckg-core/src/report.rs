//! Plain-text search reports.

use crate::Command;
use ckg_indexer::Entity;

/// Render matches of `command` for `identifier`.
///
/// Once the report grows past `max_len` characters it is cut to exactly
/// `max_len` and a clip marker with the number of unshown entries is
/// appended.
pub fn render(
    command: Command,
    identifier: &str,
    entries: &[Entity],
    print_body: bool,
    max_len: usize,
) -> String {
    let plural = command.plural();
    if entries.is_empty() {
        return format!("No {} named {} found.", plural, identifier);
    }

    let mut output = format!("Found {} {} named {}:\n", entries.len(), plural, identifier);
    let mut chars = output.chars().count();

    for (i, entry) in entries.iter().enumerate() {
        let index = i + 1;
        let mut piece = format!(
            "{}. {}:{}-{}",
            index, entry.file_path, entry.start_line, entry.end_line
        );
        if command == Command::SearchClassMethod {
            if let Some(parent) = entry.parent_class() {
                piece.push_str(&format!(" within class {}", parent));
            }
        }
        piece.push('\n');
        for (title, text) in entry.details.sections() {
            piece.push_str(&format!("{}:\n{}\n", title, text));
        }
        if print_body {
            piece.push_str(&format!("{}\n\n", entry.body));
        }

        chars += piece.chars().count();
        output.push_str(&piece);

        if chars > max_len {
            let clipped: String = output.chars().take(max_len).collect();
            return format!(
                "{}\n<response clipped> {} more entries not shown",
                clipped,
                entries.len() - index
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use ckg_indexer::{EntityDetails, EntityKind};

    fn method(name: &str, class: &str, line: usize) -> Entity {
        Entity {
            name: name.to_string(),
            file_path: "/src/shop.py".to_string(),
            body: format!("def {}(self):\n        return 1", name),
            start_line: line,
            end_line: line + 1,
            details: EntityDetails::Function {
                parent_function: None,
                parent_class: Some(class.to_string()),
            },
        }
    }

    #[test]
    fn test_zero_matches() {
        let command = Command::Search(EntityKind::TypeAlias);
        assert_eq!(
            render(command, "Missing", &[], true, 16000),
            "No type aliases named Missing found."
        );
    }

    #[test]
    fn test_class_method_lines() {
        let entries = vec![method("total", "Cart", 3), method("total", "Invoice", 10)];
        let report = render(Command::SearchClassMethod, "total", &entries, false, 16000);
        assert_eq!(
            report,
            "Found 2 class methods named total:\n\
             1. /src/shop.py:3-4 within class Cart\n\
             2. /src/shop.py:10-11 within class Invoice\n"
        );
    }

    #[test]
    fn test_sections_and_body() {
        let class = Entity {
            name: "Cart".to_string(),
            file_path: "/src/shop.py".to_string(),
            body: "class Cart:\n    items = []".to_string(),
            start_line: 1,
            end_line: 2,
            details: EntityDetails::Class {
                fields: Some("- items".to_string()),
                methods: None,
            },
        };
        let command = Command::Search(EntityKind::Class);

        let with_body = render(command, "Cart", std::slice::from_ref(&class), true, 16000);
        assert_eq!(
            with_body,
            "Found 1 classes named Cart:\n\
             1. /src/shop.py:1-2\n\
             Fields:\n- items\n\
             class Cart:\n    items = []\n\n"
        );

        let without = render(command, "Cart", &[class], false, 16000);
        assert!(!without.contains("items = []"));
        assert!(!without.contains("Methods:"));
    }

    #[test]
    fn test_truncation_marker() {
        let entries: Vec<Entity> = (0..10).map(|i| method("run", "Job", i * 10 + 1)).collect();
        let report = render(Command::SearchClassMethod, "run", &entries, true, 120);

        let (head, marker) = report
            .split_once("\n<response clipped> ")
            .expect("report should be clipped");
        assert_eq!(head.chars().count(), 120);
        // 104 characters after the first entry, 176 after the second
        assert_eq!(marker, "8 more entries not shown");
    }

    #[test]
    fn test_no_truncation_at_limit() {
        let entries = vec![method("run", "Job", 1)];
        let full = render(Command::SearchClassMethod, "run", &entries, true, 16000);
        let exact = render(
            Command::SearchClassMethod,
            "run",
            &entries,
            true,
            full.chars().count(),
        );
        assert_eq!(exact, full);
    }
}
