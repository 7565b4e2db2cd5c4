//! Ignore-rules engine: decides which files a codebase scan should see.
//!
//! Combines three sources, any of which can exclude a path:
//! 1. built-in defaults (`.git`, `node_modules`, build output directories)
//! 2. `.gitignore`-style files discovered under the codebase root
//! 3. user-supplied glob overrides
//!
//! A file also has to carry one of the recognized source extensions to be
//! included at all — binary assets and lockfiles never reach the splitter.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Directories excluded unconditionally, regardless of `.gitignore` content.
const BUILTIN_IGNORES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "dist",
    "build",
    ".venv",
    "venv",
    "__pycache__",
    ".next",
    ".turbo",
];

/// Extensions the engine will ever hand to a splitter. Kept in sync with
/// the languages [`crate::chunking::languages`] knows how to parse, plus a
/// few plain-text formats handled by the fallback splitter.
const ALLOWED_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "jsx", "mjs", "cjs", "ts", "tsx", "java", "go", "c", "h", "cc", "cpp", "cxx",
    "hpp", "hh", "cs", "rb", "php", "swift", "kt", "kts", "md", "markdown", "json", "yaml", "yml",
    "toml", "txt",
];

/// Compiled ignore rules for one codebase root.
pub struct IgnoreRules {
    matcher: Gitignore,
}

impl IgnoreRules {
    /// Build rules for `root`: built-in defaults, any `.gitignore` files
    /// discovered under `root`, and `extra_patterns` supplied by the
    /// caller (e.g. from engine configuration).
    pub fn build(root: &Path, extra_patterns: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        for pattern in BUILTIN_IGNORES {
            let _ = builder.add_line(None, pattern);
        }
        for pattern in extra_patterns {
            let _ = builder.add_line(None, pattern);
        }

        let gitignore_path = root.join(".gitignore");
        if gitignore_path.exists() {
            builder.add(gitignore_path);
        }

        let matcher = builder.build().unwrap_or_else(|_| Gitignore::empty());
        Self { matcher }
    }

    /// True if `path` should be scanned: not matched by any ignore rule,
    /// and carries an allowed extension.
    pub fn include(&self, path: &Path) -> bool {
        if self.matcher.matched(path, path.is_dir()).is_ignore() {
            return false;
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn excludes_builtin_directories() {
        let dir = tempdir().unwrap();
        let rules = IgnoreRules::build(dir.path(), &[]);
        assert!(!rules.include(&dir.path().join("node_modules/lib.js")));
    }

    #[test]
    fn includes_allowed_source_extension() {
        let dir = tempdir().unwrap();
        let rules = IgnoreRules::build(dir.path(), &[]);
        assert!(rules.include(&dir.path().join("src/main.rs")));
    }

    #[test]
    fn excludes_disallowed_extension() {
        let dir = tempdir().unwrap();
        let rules = IgnoreRules::build(dir.path(), &[]);
        assert!(!rules.include(&dir.path().join("image.png")));
    }

    #[test]
    fn respects_gitignore_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".gitignore"), "generated/\n").unwrap();
        let rules = IgnoreRules::build(dir.path(), &[]);
        assert!(!rules.include(&dir.path().join("generated/code.rs")));
    }

    #[test]
    fn respects_user_override_patterns() {
        let dir = tempdir().unwrap();
        let rules = IgnoreRules::build(dir.path(), &["*.test.ts".to_string()]);
        assert!(!rules.include(&dir.path().join("widget.test.ts")));
    }
}
