//! Heuristic scanning for single-file components (Vue, Svelte).
//!
//! The component grammars stop at `<script>` boundaries and hand back the
//! script as one `raw_text` node, so functions and props inside it are
//! recovered with regular expressions. Brackets inside string literals are
//! not understood; spans of such functions may be cut short.

use super::{lines, VisitContext};
use crate::entity::{Bullets, EntityDetails};
use crate::IndexerError;
use regex::Regex;
use std::sync::OnceLock;
use tree_sitter::Node;

/// Names the method pattern picks up that are really statements.
const KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "with", "function", "return",
];

struct Patterns {
    function: Regex,
    arrow: Regex,
    method: Regex,
    keyed_function: Regex,
    props_option: Regex,
    define_props_call: Regex,
    define_props_type: Regex,
    methods_option: Regex,
    export_let: Regex,
    rune_props: Regex,
    key: Regex,
    quoted: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            function: Regex::new(r"\b(?:async\s+)?function\s*\*?\s*(\w+)\s*\([^)]*\)\s*\{")?,
            arrow: Regex::new(
                r"\b(?:const|let|var)\s+(\w+)\s*(?::[^=]+)?=\s*(?:async\s*)?(?:\([^)]*\)|\w+)\s*(?::[^=]+?)?=>",
            )?,
            method: Regex::new(r"(?m)^[ \t]*(?:async\s+)?(\w+)\s*\([^)]*\)\s*\{")?,
            keyed_function: Regex::new(
                r"(\w+)\s*:\s*(?:async\s*)?(?:function\b|\([^)]*\)\s*=>)",
            )?,
            props_option: Regex::new(r"\bprops\s*:\s*")?,
            define_props_call: Regex::new(r"\bdefineProps\s*\(\s*")?,
            define_props_type: Regex::new(r"\bdefineProps\s*<\s*")?,
            methods_option: Regex::new(r"\bmethods\s*:\s*")?,
            export_let: Regex::new(r"\bexport\s+let\s+(\w+)")?,
            rune_props: Regex::new(r"\blet\s*\{([^}]*)\}\s*(?::[^=]+)?=\s*\$props\s*\(")?,
            key: Regex::new(r"(\w+)\??\s*:")?,
            quoted: Regex::new(r#"['"](\w+)['"]"#)?,
        })
    }
}

fn patterns() -> Result<&'static Patterns, IndexerError> {
    static PATTERNS: OnceLock<Result<Patterns, regex::Error>> = OnceLock::new();
    PATTERNS
        .get_or_init(Patterns::compile)
        .as_ref()
        .map_err(|e| IndexerError::Pattern(e.clone()))
}

/// Which framework conventions to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flavor {
    Vue,
    Svelte,
}

/// The text of one `<script>` element and the line it starts on.
pub(super) struct ScriptBlock<'a> {
    pub text: &'a str,
    pub first_line: usize,
}

/// A function found by scanning a script block.
#[derive(Debug)]
pub(super) struct ScriptFunction {
    pub name: String,
    pub body: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// What a component document yields before it is emitted.
#[derive(Default)]
pub(super) struct ComponentScan {
    pub props: Bullets,
    pub methods: Bullets,
    pub template: Vec<String>,
    pub functions: Vec<ScriptFunction>,
}

impl ComponentScan {
    /// Scan one script block into this component.
    pub fn add_script(&mut self, block: &ScriptBlock<'_>, flavor: Flavor) -> Result<(), IndexerError> {
        let p = patterns()?;
        match flavor {
            Flavor::Vue => {
                for prop in vue_props(block.text, p) {
                    self.props.push_unique(prop);
                }
                for method in options_methods(block.text, p) {
                    self.methods.push_unique(method);
                }
            }
            Flavor::Svelte => {
                for prop in svelte_props(block.text, p) {
                    self.props.push_unique(prop);
                }
            }
        }

        let functions = script_functions(block, flavor, p);
        for function in &functions {
            self.methods.push_unique(&function.name);
        }
        self.functions.extend(functions);
        Ok(())
    }

    /// Emit the component for `root`, then its script functions.
    pub fn emit(self, root: Node<'_>, cx: &mut VisitContext<'_>) -> Result<(), IndexerError> {
        let name = cx.file_stem();
        let template = self.template.join("\n");
        let template = template.trim();
        cx.emit(
            root,
            name.as_str(),
            EntityDetails::Component {
                props: self.props.finish(),
                methods: self.methods.finish(),
                template: (!template.is_empty()).then(|| template.to_string()),
            },
        )?;

        for function in self.functions {
            cx.emit_span(
                function.name,
                function.body,
                function.start_line,
                function.end_line,
                EntityDetails::Function {
                    parent_function: None,
                    parent_class: Some(name.clone()),
                },
            )?;
        }
        Ok(())
    }
}

/// Script blocks that are direct children of `root`.
pub(super) fn script_blocks<'a>(
    root: Node<'_>,
    cx: &VisitContext<'a>,
) -> Result<Vec<ScriptBlock<'a>>, IndexerError> {
    let mut blocks = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if child.kind() != "script_element" {
            continue;
        }
        let mut inner = child.walk();
        for part in child.named_children(&mut inner) {
            if part.kind() == "raw_text" {
                blocks.push(ScriptBlock {
                    text: cx.text(part)?,
                    first_line: lines(part).0,
                });
            }
        }
    }
    Ok(blocks)
}

fn script_functions(block: &ScriptBlock<'_>, flavor: Flavor, p: &Patterns) -> Vec<ScriptFunction> {
    let text = block.text;
    let mut found: Vec<(usize, String, usize)> = Vec::new();

    for caps in p.function.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        found.push((whole.start(), name.as_str().to_string(), block_end(text, whole.end() - 1)));
    }
    for caps in p.arrow.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        found.push((whole.start(), name.as_str().to_string(), arrow_end(text, whole.end())));
    }
    if flavor == Flavor::Vue {
        for caps in p.method.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if KEYWORDS.contains(&name.as_str()) {
                continue;
            }
            let start = name.start();
            found.push((start, name.as_str().to_string(), block_end(text, whole.end() - 1)));
        }
    }

    found.sort_by_key(|(start, _, _)| *start);
    found.dedup_by(|a, b| a.0 == b.0);

    found
        .into_iter()
        .map(|(start, name, end)| {
            let body = text.get(start..end).unwrap_or_default().trim_end().to_string();
            let start_line = block.first_line + text[..start].matches('\n').count();
            ScriptFunction {
                end_line: start_line + body.matches('\n').count(),
                name,
                body,
                start_line,
            }
        })
        .collect()
}

/// Byte offset just past the bracket matching the one at `open`, or the
/// end of `text` when unbalanced.
fn block_end(text: &str, open: usize) -> usize {
    match enclosed(text, open) {
        Some(inner) => open + inner.len() + 2,
        None => text.len(),
    }
}

/// End of an arrow function body starting after `=>` at `from`.
fn arrow_end(text: &str, from: usize) -> usize {
    let rest = &text[from..];
    let skipped = rest.len() - rest.trim_start().len();
    let body_start = from + skipped;
    if text.as_bytes().get(body_start) == Some(&b'{') {
        return block_end(text, body_start);
    }
    match rest.find(['\n', ';']) {
        Some(i) => from + i + 1,
        None => text.len(),
    }
}

/// Contents between the bracket at `open` and its match.
fn enclosed(text: &str, open: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let (opening, closing) = match bytes.get(open)? {
        b'{' => (b'{', b'}'),
        b'[' => (b'[', b']'),
        b'(' => (b'(', b')'),
        _ => return None,
    };
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if b == opening {
            depth += 1;
        } else if b == closing {
            depth -= 1;
            if depth == 0 {
                return text.get(open + 1..i);
            }
        }
    }
    None
}

/// `content` with everything nested inside brackets blanked out, keeping
/// the outermost brackets themselves.
fn top_level(content: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(content.len());
    for ch in content.chars() {
        match ch {
            '{' | '[' | '(' => {
                out.push(if depth == 0 { ch } else { ' ' });
                depth += 1;
            }
            '}' | ']' | ')' => {
                depth = depth.saturating_sub(1);
                out.push(if depth == 0 { ch } else { ' ' });
            }
            _ if depth == 0 => out.push(ch),
            _ => out.push(' '),
        }
    }
    out
}

/// Prop names from an array (`['a', 'b']`) or object (`{ a: String }`)
/// declaration whose opening bracket sits at `open`.
fn declared_names(text: &str, open: usize, p: &Patterns) -> Vec<String> {
    let Some(inner) = enclosed(text, open) else {
        return Vec::new();
    };
    let re = match text.as_bytes().get(open) {
        Some(b'[') => &p.quoted,
        _ => &p.key,
    };
    let flat = top_level(inner);
    re.captures_iter(&flat)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

fn vue_props(text: &str, p: &Patterns) -> Vec<String> {
    let mut props = Vec::new();
    for re in [&p.props_option, &p.define_props_call, &p.define_props_type] {
        for m in re.find_iter(text) {
            props.extend(declared_names(text, m.end(), p));
        }
    }
    props
}

/// Methods declared in an options-API `methods: { ... }` block.
fn options_methods(text: &str, p: &Patterns) -> Vec<String> {
    let mut methods = Vec::new();
    for m in p.methods_option.find_iter(text) {
        let Some(inner) = enclosed(text, m.end()) else {
            continue;
        };
        let flat = top_level(inner);
        let mut found: Vec<(usize, String)> = Vec::new();
        for re in [&p.method, &p.keyed_function] {
            for caps in re.captures_iter(&flat) {
                if let Some(name) = caps.get(1) {
                    if !KEYWORDS.contains(&name.as_str()) {
                        found.push((name.start(), name.as_str().to_string()));
                    }
                }
            }
        }
        found.sort();
        methods.extend(found.into_iter().map(|(_, name)| name));
    }
    methods
}

/// `export let x` props, plus names destructured from `$props()`.
fn svelte_props(text: &str, p: &Patterns) -> Vec<String> {
    let mut props: Vec<String> = p
        .export_let
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect();

    for caps in p.rune_props.captures_iter(text) {
        let Some(list) = caps.get(1) else {
            continue;
        };
        for binding in list.as_str().split(',') {
            let name = binding
                .split(['=', ':'])
                .next()
                .unwrap_or_default()
                .trim()
                .trim_start_matches("...");
            if !name.is_empty() {
                props.push(name.to_string());
            }
        }
    }
    props
}
