//! Compiler configuration.
//!
//! Read from `fxmlc.json`; every field has a default so an empty object is a
//! valid configuration. Command-line flags override file values.

use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::validate::{CompilerError, ERR_SOURCE_IO};

pub const CONFIG_FILE: &str = "fxmlc.json";
pub const DEFAULT_ROOT_PACKAGE: &str = "fxml.builder";
pub const DEFAULT_BUILDER_INTERFACE: &str = "fxml.api.FxmlBuilder";
pub const DEFAULT_FINDER_INTERFACE: &str = "fxml.api.FxmlBuilderFinder";
pub const DEFAULT_FINDER_CLASS: &str = "BuilderFinder";

lazy_static! {
    static ref QUALIFIED_NAME: Regex =
        Regex::new(r"^[A-Za-z_$][\w$]*(\.[A-Za-z_$][\w$]*)*$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    pub source_root: PathBuf,
    pub output_dir: PathBuf,
    pub root_package: String,
    /// Abort the whole batch on the first failing document.
    pub strict: bool,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    /// Component library tables (JSON) loaded on top of the built-in table.
    pub metadata: Vec<PathBuf>,
    pub builder_interface: String,
    pub finder_interface: String,
    pub finder_class: String,
    pub cache_dir: Option<PathBuf>,
    pub parallel: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            source_root: PathBuf::from("src/main/resources"),
            output_dir: PathBuf::from("build/generated/fxml"),
            root_package: DEFAULT_ROOT_PACKAGE.to_string(),
            strict: false,
            includes: vec!["**/*.fxml".to_string()],
            excludes: vec![],
            metadata: vec![],
            builder_interface: DEFAULT_BUILDER_INTERFACE.to_string(),
            finder_interface: DEFAULT_FINDER_INTERFACE.to_string(),
            finder_class: DEFAULT_FINDER_CLASS.to_string(),
            cache_dir: None,
            parallel: true,
        }
    }
}

impl CompilerConfig {
    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        let data = fs::read_to_string(path).map_err(|e| {
            CompilerError::new(
                ERR_SOURCE_IO,
                format!("Failed to read config {}: {}", path.display(), e),
            )
        })?;
        Self::from_json(&data).map_err(|e| e.in_file(&path.to_string_lossy()))
    }

    pub fn from_json(json: &str) -> Result<Self, CompilerError> {
        let config: CompilerConfig = serde_json::from_str(json)
            .map_err(|e| CompilerError::structural(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// `fxmlc.json` in `dir` when present, defaults otherwise.
    pub fn discover(dir: &Path) -> Result<Self, CompilerError> {
        let path = dir.join(CONFIG_FILE);
        match path.is_file() {
            true => Self::load(&path),
            false => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), CompilerError> {
        if !QUALIFIED_NAME.is_match(&self.root_package) {
            return Err(CompilerError::structural(format!(
                "Root package '{}' is not a valid package name",
                self.root_package
            )));
        }
        for (field, value) in [
            ("builderInterface", &self.builder_interface),
            ("finderInterface", &self.finder_interface),
            ("finderClass", &self.finder_class),
        ] {
            if !QUALIFIED_NAME.is_match(value) {
                return Err(CompilerError::structural(format!(
                    "{} '{}' is not a valid class name",
                    field, value
                )));
            }
        }
        Ok(())
    }
}
