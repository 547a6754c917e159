//! Language detection for source files.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Languages the graph builder can index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    CSharp,
    Dart,
    Elixir,
    Gleam,
    Go,
    Java,
    JavaScript,
    Kotlin,
    Php,
    Python,
    Ruby,
    Rust,
    Scala,
    Solidity,
    Svelte,
    Swift,
    TypeScript,
    Vue,
    Zig,
}

impl Language {
    /// Every supported language, in identifier order.
    pub const ALL: [Language; 21] = [
        Language::C,
        Language::Cpp,
        Language::CSharp,
        Language::Dart,
        Language::Elixir,
        Language::Gleam,
        Language::Go,
        Language::Java,
        Language::JavaScript,
        Language::Kotlin,
        Language::Php,
        Language::Python,
        Language::Ruby,
        Language::Rust,
        Language::Scala,
        Language::Solidity,
        Language::Svelte,
        Language::Swift,
        Language::TypeScript,
        Language::Vue,
        Language::Zig,
    ];

    pub fn all() -> &'static [Language] {
        &Self::ALL
    }

    /// Get the display name for this language.
    pub fn name(&self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cpp => "C++",
            Language::CSharp => "C#",
            Language::Dart => "Dart",
            Language::Elixir => "Elixir",
            Language::Gleam => "Gleam",
            Language::Go => "Go",
            Language::Java => "Java",
            Language::JavaScript => "JavaScript",
            Language::Kotlin => "Kotlin",
            Language::Php => "PHP",
            Language::Python => "Python",
            Language::Ruby => "Ruby",
            Language::Rust => "Rust",
            Language::Scala => "Scala",
            Language::Solidity => "Solidity",
            Language::Svelte => "Svelte",
            Language::Swift => "Swift",
            Language::TypeScript => "TypeScript",
            Language::Vue => "Vue",
            Language::Zig => "Zig",
        }
    }

    /// Lowercase identifier, as used in logs and diagnostics.
    pub fn id(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Dart => "dart",
            Language::Elixir => "elixir",
            Language::Gleam => "gleam",
            Language::Go => "go",
            Language::Java => "java",
            Language::JavaScript => "javascript",
            Language::Kotlin => "kotlin",
            Language::Php => "php",
            Language::Python => "python",
            Language::Ruby => "ruby",
            Language::Rust => "rust",
            Language::Scala => "scala",
            Language::Solidity => "solidity",
            Language::Svelte => "svelte",
            Language::Swift => "swift",
            Language::TypeScript => "typescript",
            Language::Vue => "vue",
            Language::Zig => "zig",
        }
    }

    /// The tree-sitter grammar for this language.
    pub fn grammar(&self) -> tree_sitter::Language {
        let lang_fn = match self {
            Language::C => tree_sitter_c::LANGUAGE,
            Language::Cpp => tree_sitter_cpp::LANGUAGE,
            Language::CSharp => tree_sitter_c_sharp::LANGUAGE,
            Language::Dart => tree_sitter_dart::LANGUAGE,
            Language::Elixir => tree_sitter_elixir::LANGUAGE,
            Language::Gleam => tree_sitter_gleam::LANGUAGE,
            Language::Go => tree_sitter_go::LANGUAGE,
            Language::Java => tree_sitter_java::LANGUAGE,
            Language::JavaScript => tree_sitter_javascript::LANGUAGE,
            Language::Kotlin => tree_sitter_kotlin_ng::LANGUAGE,
            Language::Php => tree_sitter_php::LANGUAGE_PHP,
            Language::Python => tree_sitter_python::LANGUAGE,
            Language::Ruby => tree_sitter_ruby::LANGUAGE,
            Language::Rust => tree_sitter_rust::LANGUAGE,
            Language::Scala => tree_sitter_scala::LANGUAGE,
            Language::Solidity => tree_sitter_solidity::LANGUAGE,
            Language::Svelte => tree_sitter_svelte_ng::LANGUAGE,
            Language::Swift => tree_sitter_swift::LANGUAGE,
            // .tsx shares the plain TypeScript grammar
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT,
            Language::Vue => tree_sitter_vue_next::LANGUAGE,
            Language::Zig => tree_sitter_zig::LANGUAGE,
        };
        lang_fn.into()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Detect the language of a file based on its extension.
pub fn detect_language(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?.to_lowercase();

    match ext.as_str() {
        "c" | "h" => Some(Language::C),
        "c++" | "cc" | "cpp" | "cxx" | "hpp" | "hxx" => Some(Language::Cpp),
        "cs" => Some(Language::CSharp),
        "dart" => Some(Language::Dart),
        "ex" | "exs" => Some(Language::Elixir),
        "gleam" => Some(Language::Gleam),
        "go" => Some(Language::Go),
        "java" => Some(Language::Java),
        "cjs" | "js" | "jsx" | "mjs" => Some(Language::JavaScript),
        "kt" | "kts" => Some(Language::Kotlin),
        "php" | "php3" | "php4" | "php5" | "phtml" => Some(Language::Php),
        "py" | "pyw" => Some(Language::Python),
        "rb" | "rbw" => Some(Language::Ruby),
        "rs" => Some(Language::Rust),
        "sc" | "scala" => Some(Language::Scala),
        "sol" => Some(Language::Solidity),
        "svelte" => Some(Language::Svelte),
        "swift" => Some(Language::Swift),
        "ts" | "tsx" => Some(Language::TypeScript),
        "vue" => Some(Language::Vue),
        "zig" => Some(Language::Zig),
        _ => None,
    }
}
