//! Per-language AST visitors.
//!
//! A visitor walks one file's syntax tree depth-first, recognizes the node
//! categories its language defines, and inserts [`Entity`] records into an
//! [`EntitySink`]. Parent linkage comes from the ambient [`Scope`], a chain
//! of frames living on the call stack. Every child is visited whether or
//! not its parent produced an entity, so nested declarations at any depth
//! are found.

mod c;
mod cpp;
mod csharp;
mod dart;
mod elixir;
mod embedded;
mod gleam;
mod go;
mod java;
mod javascript;
mod kotlin;
mod php;
mod python;
mod ruby;
mod rust;
mod scala;
mod solidity;
mod svelte;
mod swift;
mod typescript;
mod vue;
mod zig;

use crate::entity::{Entity, EntityDetails};
use crate::scanner::Language;
use crate::IndexerError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tree_sitter::Node;

/// Destination for extracted entities.
pub trait EntitySink {
    fn insert(&mut self, entity: Entity) -> Result<(), IndexerError>;
}

impl EntitySink for Vec<Entity> {
    fn insert(&mut self, entity: Entity) -> Result<(), IndexerError> {
        self.push(entity);
        Ok(())
    }
}

/// A recoverable extraction failure recorded by error-tolerant visitors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub file_path: String,
    pub line: usize,
    pub message: String,
}

/// Per-file state shared by every node visit.
pub struct VisitContext<'a> {
    source: &'a [u8],
    file_path: &'a str,
    sink: &'a mut dyn EntitySink,
    /// Diagnostics swallowed during the walk
    pub diagnostics: Vec<Diagnostic>,
    /// Entities inserted so far
    pub inserted: usize,
}

impl<'a> VisitContext<'a> {
    pub fn new(source: &'a [u8], file_path: &'a str, sink: &'a mut dyn EntitySink) -> Self {
        Self {
            source,
            file_path,
            sink,
            diagnostics: Vec::new(),
            inserted: 0,
        }
    }

    pub fn file_path(&self) -> &'a str {
        self.file_path
    }

    /// File name without extension, used to name single-file components.
    pub fn file_stem(&self) -> String {
        Path::new(self.file_path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.to_string())
    }

    pub fn source(&self) -> &'a [u8] {
        self.source
    }

    /// Source text of `node`.
    pub fn text(&self, node: Node<'_>) -> Result<&'a str, IndexerError> {
        let bytes = self
            .source
            .get(node.start_byte()..node.end_byte())
            .ok_or_else(|| IndexerError::parse(self.file_path, "Node span outside source"))?;
        std::str::from_utf8(bytes).map_err(|e| {
            IndexerError::parse(
                self.file_path,
                format!("Invalid UTF-8 at line {}: {}", node.start_position().row + 1, e),
            )
        })
    }

    /// Text of the named field child, if present.
    pub fn field_text(&self, node: Node<'_>, field: &str) -> Result<Option<&'a str>, IndexerError> {
        match node.child_by_field_name(field) {
            Some(child) => Ok(Some(self.text(child)?)),
            None => Ok(None),
        }
    }

    /// Text of the first direct child of one of `kinds`, if present.
    pub fn child_text(&self, node: Node<'_>, kinds: &[&str]) -> Result<Option<&'a str>, IndexerError> {
        match first_child(node, kinds) {
            Some(child) => Ok(Some(self.text(child)?)),
            None => Ok(None),
        }
    }

    /// Text from the start of `node` up to its first child of one of
    /// `body_kinds`, whitespace collapsed. Yields declaration headers such
    /// as `public int add(int a, int b)`.
    pub fn header(&self, node: Node<'_>, body_kinds: &[&str]) -> Result<String, IndexerError> {
        let end = first_child(node, body_kinds)
            .map(|b| b.start_byte())
            .unwrap_or_else(|| node.end_byte());
        let bytes = self
            .source
            .get(node.start_byte()..end)
            .ok_or_else(|| IndexerError::parse(self.file_path, "Node span outside source"))?;
        let text = String::from_utf8_lossy(bytes);
        Ok(collapse_whitespace(&text))
    }

    /// Build an entity spanning `node` and hand it to the sink.
    pub fn emit(
        &mut self,
        node: Node<'_>,
        name: impl Into<String>,
        details: EntityDetails,
    ) -> Result<(), IndexerError> {
        let body = self.text(node)?.to_string();
        let (start_line, end_line) = lines(node);
        self.emit_span(name, body, start_line, end_line, details)
    }

    /// Hand an entity with an explicit span to the sink.
    pub fn emit_span(
        &mut self,
        name: impl Into<String>,
        body: String,
        start_line: usize,
        end_line: usize,
        details: EntityDetails,
    ) -> Result<(), IndexerError> {
        let name = name.into();
        let name = if name.trim().is_empty() {
            anonymous_name(details.kind().as_str(), start_line)
        } else {
            name
        };
        self.sink.insert(Entity {
            name,
            file_path: self.file_path.to_string(),
            body,
            start_line,
            end_line: end_line.max(start_line),
            details,
        })?;
        self.inserted += 1;
        Ok(())
    }

    /// Record a swallowed error against `node`.
    pub fn record(&mut self, node: Node<'_>, error: &IndexerError) {
        self.diagnostics.push(Diagnostic {
            file_path: self.file_path.to_string(),
            line: node.start_position().row + 1,
            message: error.to_string(),
        });
    }
}

/// Kinds of enclosing constructs tracked while walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Class,
    Function,
    Interface,
    Struct,
    Trait,
    Impl,
    Module,
    Namespace,
    Protocol,
    Contract,
    Component,
}

/// One enclosing construct.
#[derive(Debug)]
pub struct Frame<'s> {
    pub kind: ScopeKind,
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    parent: Scope<'s>,
}

impl<'s> Frame<'s> {
    /// Scope whose innermost frame is `self`.
    pub fn scope(&self) -> Scope<'_> {
        Scope { frame: Some(self) }
    }

    /// Whether `self` lies within `outer`'s line range.
    pub fn within(&self, outer: &Frame<'_>) -> bool {
        self.start_line >= outer.start_line && self.end_line <= outer.end_line
    }
}

/// Immutable chain of enclosing frames, innermost first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scope<'s> {
    frame: Option<&'s Frame<'s>>,
}

impl<'s> Scope<'s> {
    pub fn root() -> Self {
        Self { frame: None }
    }

    /// Create a child frame for `node`. Descend with `frame.scope()`.
    pub fn push(&self, kind: ScopeKind, name: impl Into<String>, node: Node<'_>) -> Frame<'s> {
        let (start_line, end_line) = lines(node);
        Frame {
            kind,
            name: name.into(),
            start_line,
            end_line,
            parent: *self,
        }
    }

    /// Innermost frame of `kind`.
    pub fn nearest(&self, kind: ScopeKind) -> Option<&'s Frame<'s>> {
        let mut current = self.frame;
        while let Some(frame) = current {
            if frame.kind == kind {
                return Some(frame);
            }
            current = frame.parent.frame;
        }
        None
    }

    /// Name of the innermost frame of `kind`.
    pub fn name_of(&self, kind: ScopeKind) -> Option<String> {
        self.nearest(kind).map(|f| f.name.clone())
    }

    /// Name of the innermost frame matching any of `kinds`, searched in
    /// order of preference.
    pub fn first_of(&self, kinds: &[ScopeKind]) -> Option<String> {
        kinds.iter().find_map(|k| self.name_of(*k))
    }

    pub fn innermost(&self) -> Option<&'s Frame<'s>> {
        self.frame
    }
}

/// A language's extraction walk.
pub trait Visitor: Sync {
    fn visit(
        &self,
        node: Node<'_>,
        cx: &mut VisitContext<'_>,
        scope: Scope<'_>,
    ) -> Result<(), IndexerError>;
}

/// Visit every child of `node` under `scope`.
///
/// Anonymous leaf tokens are skipped: keywords such as `class` share their
/// kind string with the named node they introduce.
pub fn walk_children<V: Visitor + ?Sized>(
    visitor: &V,
    node: Node<'_>,
    cx: &mut VisitContext<'_>,
    scope: Scope<'_>,
) -> Result<(), IndexerError> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if !child.is_named() && child.child_count() == 0 {
            continue;
        }
        visitor.visit(child, cx, scope)?;
    }
    Ok(())
}

/// The visitor registered for `language`.
pub fn visitor_for(language: Language) -> &'static dyn Visitor {
    match language {
        Language::C => &c::CVisitor,
        Language::Cpp => &cpp::CppVisitor,
        Language::CSharp => &csharp::CSharpVisitor,
        Language::Dart => &dart::DartVisitor,
        Language::Elixir => &elixir::ElixirVisitor,
        Language::Gleam => &gleam::GleamVisitor,
        Language::Go => &go::GoVisitor,
        Language::Java => &java::JavaVisitor,
        Language::JavaScript => &javascript::JavaScriptVisitor,
        Language::Kotlin => &kotlin::KotlinVisitor,
        Language::Php => &php::PhpVisitor,
        Language::Python => &python::PythonVisitor,
        Language::Ruby => &ruby::RubyVisitor,
        Language::Rust => &rust::RustVisitor,
        Language::Scala => &scala::ScalaVisitor,
        Language::Solidity => &solidity::SolidityVisitor,
        Language::Svelte => &svelte::SvelteVisitor,
        Language::Swift => &swift::SwiftVisitor,
        Language::TypeScript => &typescript::TypeScriptVisitor,
        Language::Vue => &vue::VueVisitor,
        Language::Zig => &zig::ZigVisitor,
    }
}

/// Walk a parsed file and insert its entities into `sink`.
///
/// Returns the number of inserted entities and any diagnostics swallowed
/// along the way.
pub fn extract(
    language: Language,
    tree: &tree_sitter::Tree,
    source: &[u8],
    file_path: &str,
    sink: &mut dyn EntitySink,
) -> Result<(usize, Vec<Diagnostic>), IndexerError> {
    let mut cx = VisitContext::new(source, file_path, sink);
    visitor_for(language).visit(tree.root_node(), &mut cx, Scope::root())?;
    Ok((cx.inserted, cx.diagnostics))
}

/// 1-indexed inclusive line span of `node`.
pub fn lines(node: Node<'_>) -> (usize, usize) {
    (node.start_position().row + 1, node.end_position().row + 1)
}

/// Synthesized name for a construct without one.
pub fn anonymous_name(kind: &str, line: usize) -> String {
    format!("anonymous_{}_line_{}", kind, line)
}

/// First direct child whose kind is one of `kinds`.
pub fn first_child<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|c| kinds.contains(&c.kind()));
    found
}

/// Direct children whose kind is one of `kinds`.
pub fn children_of<'t>(node: Node<'t>, kinds: &[&str]) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor)
        .filter(|c| kinds.contains(&c.kind()))
        .collect()
}

/// All direct children.
pub fn children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

/// Whether `node` has a direct (possibly anonymous) child of `kind`.
pub fn has_child(node: Node<'_>, kind: &str) -> bool {
    first_child(node, &[kind]).is_some()
}

/// Depth-first search below `node` for the first descendant of `kind`.
pub fn find_descendant<'t>(node: Node<'t>, kinds: &[&str]) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if kinds.contains(&child.kind()) {
            return Some(child);
        }
        if let Some(found) = find_descendant(child, kinds) {
            return Some(found);
        }
    }
    None
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::entity::EntityKind;
    use crate::scanner::ParserRegistry;

    /// Parse `source` as `language` and collect everything the visitor emits.
    pub fn extract_all(language: Language, file_name: &str, source: &str) -> Vec<Entity> {
        let mut registry = ParserRegistry::new();
        let tree = registry
            .parse(language, source.as_bytes(), Path::new(file_name))
            .unwrap();
        let mut entities: Vec<Entity> = Vec::new();
        extract(
            language,
            &tree,
            source.as_bytes(),
            &format!("/src/{}", file_name),
            &mut entities,
        )
        .unwrap();
        entities
    }

    pub fn find<'e>(entities: &'e [Entity], kind: EntityKind, name: &str) -> &'e Entity {
        entities
            .iter()
            .find(|e| e.kind() == kind && e.name == name)
            .unwrap_or_else(|| {
                let seen: Vec<_> = entities
                    .iter()
                    .map(|e| format!("{}:{}", e.kind(), e.name))
                    .collect();
                panic!("no {} named {} in {:?}", kind, name, seen)
            })
    }

    pub fn names(entities: &[Entity], kind: EntityKind) -> Vec<&str> {
        entities
            .iter()
            .filter(|e| e.kind() == kind)
            .map(|e| e.name.as_str())
            .collect()
    }
}
