//! Per-document resolver context and document sources.
//!
//! A `ResolverContext` is created for each document compilation and
//! threaded through the generator; nothing in it is shared between
//! documents except the read-only `CompileEnv`.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use encoding_rs::Encoding;

use crate::classify::DEFAULT_CHARSET;
use crate::metadata::{TypeMetadataProvider, TypeRef};
use crate::names::NameResolver;
use crate::types::TypeResolver;
use crate::validate::{CompilerError, ERR_INCLUDE_CYCLE, ERR_SOURCE_IO};
use crate::values::ValueResolver;

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCES
// ═══════════════════════════════════════════════════════════════════════════════

/// Reads documents by their `/`-separated path relative to the source root.
pub trait SourceLoader: Send + Sync {
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>, CompilerError>;

    fn load(&self, path: &str) -> Result<String, CompilerError> {
        self.load_with_charset(path, DEFAULT_CHARSET)
    }

    /// Reads and decodes a document. `charset` is any encoding label
    /// (`UTF-8`, `ISO-8859-1`, `Shift_JIS`, ...).
    fn load_with_charset(&self, path: &str, charset: &str) -> Result<String, CompilerError> {
        let encoding = find_charset(charset).map_err(|e| e.in_file(path))?;
        let bytes = self.load_bytes(path)?;
        decode_source(path, &bytes, encoding)
    }
}

pub fn find_charset(charset: &str) -> Result<&'static Encoding, CompilerError> {
    Encoding::for_label(charset.trim().as_bytes()).ok_or_else(|| {
        CompilerError::new(ERR_SOURCE_IO, format!("Unknown charset '{}'", charset))
    })
}

/// Decodes with BOM removal. Malformed input is an error, never replaced.
fn decode_source(path: &str, bytes: &[u8], encoding: &'static Encoding) -> Result<String, CompilerError> {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    match had_errors {
        true => Err(CompilerError::new(
            ERR_SOURCE_IO,
            format!("{} is not valid {}", path, encoding.name()),
        )
        .in_file(path)),
        false => Ok(text.into_owned()),
    }
}

#[derive(Debug, Clone)]
pub struct FsSourceLoader {
    root: PathBuf,
}

impl FsSourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsSourceLoader { root: root.into() }
    }
}

impl SourceLoader for FsSourceLoader {
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>, CompilerError> {
        let full = self.root.join(path);
        fs::read(&full).map_err(|e| {
            CompilerError::new(
                ERR_SOURCE_IO,
                format!("Failed to read {}: {}", full.display(), e),
            )
            .in_file(path)
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySourceLoader {
    sources: HashMap<String, Vec<u8>>,
}

impl MemorySourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, path: &str, source: &str) -> Self {
        self.insert(path, source);
        self
    }

    pub fn insert(&mut self, path: &str, source: &str) {
        self.insert_bytes(path, source.as_bytes());
    }

    /// Registers raw document bytes, for sources in a charset other than UTF-8.
    pub fn insert_bytes(&mut self, path: &str, bytes: &[u8]) {
        self.sources.insert(path.to_string(), bytes.to_vec());
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.sources.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl SourceLoader for MemorySourceLoader {
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>, CompilerError> {
        self.sources.get(path).cloned().ok_or_else(|| {
            CompilerError::new(ERR_SOURCE_IO, format!("No source registered for {}", path))
                .in_file(path)
        })
    }
}

/// Resolves an include `source` against the including document. A leading
/// `/` means relative to the source root.
pub fn resolve_include_path(current: &str, source: &str) -> String {
    let joined = match source.strip_prefix('/') {
        Some(absolute) => PathBuf::from(absolute),
        None => Path::new(current)
            .parent()
            .map(|dir| dir.join(source))
            .unwrap_or_else(|| PathBuf::from(source)),
    };

    let mut parts: Vec<String> = Vec::new();
    for component in joined.components() {
        match component {
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            _ => {}
        }
    }
    parts.join("/")
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENVIRONMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-only inputs shared by every document of a batch.
pub struct CompileEnv<'a> {
    pub provider: &'a dyn TypeMetadataProvider,
    pub loader: &'a dyn SourceLoader,
    pub root_package: String,
    pub builder_interface: String,
}

impl<'a> CompileEnv<'a> {
    pub fn new(
        provider: &'a dyn TypeMetadataProvider,
        loader: &'a dyn SourceLoader,
        root_package: &str,
        builder_interface: &str,
    ) -> Self {
        CompileEnv {
            provider,
            loader,
            root_package: root_package.to_string(),
            builder_interface: builder_interface.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLVER CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

pub const CONTROLLER: &str = "controller";
pub const RESOURCES: &str = crate::values::RESOURCES;
pub const CONTROLLER_FACTORY: &str = "controllerFactory";
pub const PROVIDED_CONTROLLER: &str = "builderProvidedController";
pub const PROVIDED_ROOT: &str = "builderProvidedRoot";

pub struct ResolverContext<'a> {
    pub env: &'a CompileEnv<'a>,
    pub types: TypeResolver<'a>,
    pub names: NameResolver,
    /// Path of the document being compiled, relative to the source root.
    pub document: String,
    /// Documents currently being compiled above this one.
    pub include_stack: Vec<String>,
    pub controller_type: Option<TypeRef>,
}

impl<'a> ResolverContext<'a> {
    pub fn new(env: &'a CompileEnv<'a>, document: &str, include_stack: Vec<String>) -> Self {
        let mut names = NameResolver::new();
        for reserved in [CONTROLLER_FACTORY, PROVIDED_CONTROLLER, PROVIDED_ROOT] {
            names.claim_name(reserved);
        }
        ResolverContext {
            env,
            types: TypeResolver::new(env.provider),
            names,
            document: document.to_string(),
            include_stack,
            controller_type: None,
        }
    }

    pub fn values(&self) -> ValueResolver<'_, 'a> {
        ValueResolver::new(&self.types, &self.names)
    }

    /// Registers the resources bundle and, when declared, the controller.
    pub fn register_builtins(&mut self, controller: Option<TypeRef>) -> Result<(), CompilerError> {
        self.names
            .store_id_type(RESOURCES, ValueResolver::resources_type())?;
        if let Some(controller) = &controller {
            self.names.store_id_type(CONTROLLER, controller.clone())?;
        } else {
            self.names.claim_name(CONTROLLER);
        }
        self.controller_type = controller;
        Ok(())
    }

    /// Path of an included document, failing when it would recurse.
    pub fn enter_include(&self, source: &str) -> Result<(String, Vec<String>), CompilerError> {
        let target = resolve_include_path(&self.document, source);
        if target == self.document || self.include_stack.contains(&target) {
            let mut chain = self.include_stack.clone();
            chain.push(self.document.clone());
            chain.push(target.clone());
            return Err(CompilerError::new(
                ERR_INCLUDE_CYCLE,
                format!("Include cycle: {}", chain.join(" -> ")),
            ));
        }
        let mut stack = self.include_stack.clone();
        stack.push(self.document.clone());
        Ok((target, stack))
    }
}
