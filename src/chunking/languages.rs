//! Tree-sitter grammar registry: maps a [`Language`] to its parser and to
//! the AST node kinds the structural splitter extracts as chunks.

use crate::domain::types::Language;
use tree_sitter::Language as TsLanguage;

/// Node kinds considered "definitions" worth extracting as their own chunk,
/// for a given source language. Chosen to match top-level functions,
/// types and their direct methods — not every grammar production.
pub fn definition_node_kinds(language: Language) -> &'static [&'static str] {
    match language {
        Language::Rust => &[
            "function_item",
            "impl_item",
            "trait_item",
            "struct_item",
            "enum_item",
            "mod_item",
        ],
        Language::Python => &["function_definition", "class_definition"],
        Language::JavaScript | Language::TypeScript => &[
            "function_declaration",
            "class_declaration",
            "method_definition",
            "arrow_function",
        ],
        Language::Java => &["class_declaration", "interface_declaration", "method_declaration"],
        Language::Go => &["function_declaration", "method_declaration", "type_declaration"],
        Language::C => &["function_definition", "struct_specifier"],
        Language::Cpp => &["function_definition", "class_specifier", "struct_specifier"],
        Language::CSharp => &["class_declaration", "interface_declaration", "method_declaration"],
        Language::Ruby => &["method", "class", "module"],
        Language::Php => &["function_definition", "class_declaration", "method_declaration"],
        Language::Swift => &["function_declaration", "class_declaration", "protocol_declaration"],
        Language::Kotlin => &["function_declaration", "class_declaration", "object_declaration"],
        Language::Markdown | Language::Unknown => &[],
    }
}

/// Load the tree-sitter grammar for `language`, or `None` when there is no
/// grammar (e.g. Markdown, or an unrecognized extension) — such languages
/// always use the character-based fallback splitter.
pub fn grammar_for(language: Language) -> Option<TsLanguage> {
    match language {
        Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
        Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
        Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
        Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
        Language::Java => Some(tree_sitter_java::LANGUAGE.into()),
        Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
        Language::C => Some(tree_sitter_c::LANGUAGE.into()),
        Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
        Language::CSharp => Some(tree_sitter_c_sharp::LANGUAGE.into()),
        Language::Ruby => Some(tree_sitter_ruby::LANGUAGE.into()),
        Language::Php => Some(tree_sitter_php::LANGUAGE_PHP.into()),
        Language::Swift => Some(tree_sitter_swift::LANGUAGE.into()),
        Language::Kotlin => Some(tree_sitter_kotlin_ng::LANGUAGE.into()),
        Language::Markdown | Language::Unknown => None,
    }
}
