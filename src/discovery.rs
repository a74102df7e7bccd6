//! Document discovery.
//!
//! Recursively scans a source root for markup documents matching the
//! configured include globs and none of the exclude globs. Paths come back
//! relative to the root, `/`-separated and sorted.

use std::path::Path;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use walkdir::WalkDir;

use crate::validate::{CompilerError, ERR_SOURCE_IO};

lazy_static! {
    static ref GLOB_TOKEN: Regex = Regex::new(r"\*\*/|\*\*|\*|\?|[^*?]+").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// GLOBS
// ═══════════════════════════════════════════════════════════════════════════════

/// A compiled `/`-separated glob: `**/` spans directories, `*` and `?` stay
/// inside one segment.
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    regex: Regex,
}

impl Glob {
    pub fn new(pattern: &str) -> Result<Self, CompilerError> {
        let mut source = String::from("^");
        for token in GLOB_TOKEN.find_iter(pattern) {
            match token.as_str() {
                "**/" => source.push_str("(?:.*/)?"),
                "**" => source.push_str(".*"),
                "*" => source.push_str("[^/]*"),
                "?" => source.push_str("[^/]"),
                literal => source.push_str(&regex::escape(literal)),
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| {
            CompilerError::syntax(format!("Invalid glob '{}': {}", pattern, e))
        })?;
        Ok(Glob {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Glob>, CompilerError> {
    patterns.iter().map(|p| Glob::new(p)).collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISCOVERY
// ═══════════════════════════════════════════════════════════════════════════════

/// Finds documents under `root`.
pub fn discover_documents(
    root: &Path,
    includes: &[String],
    excludes: &[String],
) -> Result<Vec<String>, CompilerError> {
    if !root.is_dir() {
        return Err(CompilerError::new(
            ERR_SOURCE_IO,
            format!("Source root {} is not a directory", root.display()),
        ));
    }

    let includes = compile_globs(includes)?;
    let excludes = compile_globs(excludes)?;
    let mut documents = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| {
            CompilerError::new(ERR_SOURCE_IO, format!("Failed to scan {}: {}", root.display(), e))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/");

        if includes.iter().any(|g| g.is_match(&relative)) && !excludes.iter().any(|g| g.is_match(&relative)) {
            documents.push(relative);
        }
    }

    documents.sort();
    debug!("Discovered {} documents under {}", documents.len(), root.display());
    Ok(documents)
}
