use serde::{Deserialize, Serialize};
use std::path::Path;

/// Language or data-format label attached to a fragment
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    Ruby,
    Swift,
    Kotlin,
    Php,
    Bash,
    Sql,
    Html,
    Css,
    Json,
    Yaml,
    Toml,
    Ini,
    Markdown,
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" | "pyw" => Language::Python,
            "js" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "tsx" => Language::TypeScript,
            "go" => Language::Go,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "rb" => Language::Ruby,
            "swift" => Language::Swift,
            "kt" | "kts" => Language::Kotlin,
            "php" => Language::Php,
            "sh" | "bash" | "zsh" => Language::Bash,
            "sql" => Language::Sql,
            "html" | "htm" => Language::Html,
            "css" | "scss" => Language::Css,
            "json" | "jsonc" => Language::Json,
            "yaml" | "yml" => Language::Yaml,
            "toml" => Language::Toml,
            "ini" | "cfg" | "conf" | "env" => Language::Ini,
            "md" | "markdown" => Language::Markdown,
            _ => Language::Unknown,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Resolve a human-written label (fence tag, feedback correction)
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "rust" | "rs" => Language::Rust,
            "python" | "python3" | "py" => Language::Python,
            "javascript" | "js" | "node" | "jsx" => Language::JavaScript,
            "typescript" | "ts" | "tsx" => Language::TypeScript,
            "go" | "golang" => Language::Go,
            "java" => Language::Java,
            "c" => Language::C,
            "cpp" | "c++" | "cxx" => Language::Cpp,
            "csharp" | "c#" | "cs" => Language::CSharp,
            "ruby" | "rb" => Language::Ruby,
            "swift" => Language::Swift,
            "kotlin" | "kt" => Language::Kotlin,
            "php" => Language::Php,
            "bash" | "sh" | "shell" | "zsh" | "console" => Language::Bash,
            "sql" => Language::Sql,
            "html" => Language::Html,
            "css" | "scss" => Language::Css,
            "json" | "jsonc" => Language::Json,
            "yaml" | "yml" => Language::Yaml,
            "toml" => Language::Toml,
            "ini" | "cfg" | "conf" | "properties" | "dotenv" => Language::Ini,
            "markdown" | "md" => Language::Markdown,
            _ => Language::Unknown,
        }
    }

    /// Get language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Php => "php",
            Language::Bash => "bash",
            Language::Sql => "sql",
            Language::Html => "html",
            Language::Css => "css",
            Language::Json => "json",
            Language::Yaml => "yaml",
            Language::Toml => "toml",
            Language::Ini => "ini",
            Language::Markdown => "markdown",
            Language::Unknown => "unknown",
        }
    }

    /// Check if this language has a compiled grammar for AST validation
    pub fn supports_ast(self) -> bool {
        matches!(
            self,
            Language::Rust
                | Language::Python
                | Language::JavaScript
                | Language::TypeScript
        )
    }

    /// Tree-sitter grammar for this language, if one is compiled in
    pub fn grammar(self) -> Option<tree_sitter::Language> {
        match self {
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => {
                Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            }
            _ => None,
        }
    }

    /// Whether this label names a structured data format (JSON-like)
    pub fn is_data_format(self) -> bool {
        matches!(self, Language::Json | Language::Yaml | Language::Toml)
    }

    /// Whether this label names a key/value configuration format
    pub fn is_config_format(self) -> bool {
        matches!(self, Language::Ini)
    }

    /// Content markers used for heuristic voting
    ///
    /// Each marker counts at most once per fragment; the number of distinct
    /// markers hit becomes the heuristic vote weight (capped below the
    /// shebang weight, so content alone never outvotes a shebang line).
    pub fn content_markers(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["fn ", "let mut ", "impl ", "pub fn ", "-> ", "::"],
            Language::Python => {
                &["def ", "import ", "elif ", "self.", "lambda ", "():", "print("]
            }
            Language::JavaScript => {
                &["function ", "const ", "=> ", "console.log", "require(", "var "]
            }
            Language::TypeScript => {
                &["interface ", ": string", ": number", "export type ", "readonly "]
            }
            Language::Go => &["func ", "package ", ":= ", "fmt.", "go func"],
            Language::Java => {
                &["public class ", "public static void", "System.out", "@Override"]
            }
            Language::C => &["#include <", "printf(", "int main(", "void "],
            Language::Cpp => &["#include <", "std::", "template<", "nullptr"],
            Language::CSharp => &["namespace ", "using System", "public class "],
            Language::Ruby => &["puts ", "require '", "attr_", "do |", "@"],
            Language::Swift => &["func ", "guard let ", "import Foundation"],
            Language::Kotlin => &["fun ", "val ", "data class ", "companion object"],
            Language::Php => &["<?php", "->", "$this", "echo "],
            Language::Bash => &["echo ", "fi", "esac", "#!/bin/", "$(", "||"],
            Language::Sql => &["SELECT ", "INSERT INTO ", "CREATE TABLE ", "WHERE "],
            Language::Html => &["<html", "<div", "</", "<!DOCTYPE"],
            Language::Css => &["@media", "px;", "color:", "margin:"],
            _ => &[],
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
