//! # FXML Compiler
//!
//! Compiles declarative FXML markup into Java builder classes that construct
//! the same object graph a runtime loader would, without reflection.
//!
//! ## Pipeline
//!
//! 1. **Read**: `parse` turns markup into a tag tree plus processing
//!    instructions (imports, controller type, language, compile flag).
//! 2. **Classify**: `classify` sorts every element and attribute into its
//!    semantic variant (declarations, property elements, static properties,
//!    event handlers, `fx:` forms).
//! 3. **Resolve + generate**: `codegen` walks the tree once, resolving types,
//!    members and values through the resolver trio (`names`, `types`,
//!    `values`) and emitting ordered statements.
//! 4. **Emit**: `unit` renders one builder class per document; `registry`
//!    renders the finder that maps document paths to builders.
//!
//! ## Invariants
//!
//! 1. **Document order**: statements are emitted in document order and an id
//!    must be declared before it is referenced.
//! 2. **Isolation**: each document compiles with its own `ResolverContext`;
//!    only read-only metadata is shared, so batches parallelize freely.
//! 3. **No silent downgrade**: every resolution or coercion failure is fatal
//!    for its document and carries the offending node's path.
//! 4. **Unique output**: two documents mapping to one builder class fail the
//!    batch in every mode.

mod batch;
mod bind;
mod cache;
mod classify;
mod code;
mod codegen;
mod config;
mod context;
mod discovery;
mod expression;
mod metadata;
mod names;
mod parse;
mod registry;
mod syntax;
mod types;
mod unit;
mod validate;
mod values;

#[cfg(test)]
mod test_support;

#[cfg(test)]
mod batch_tests;
#[cfg(test)]
mod expression_tests;

pub use batch::{compile_batch, compile_document, write_output, BatchError, BatchOutput};
pub use cache::IncrementalCache;
pub use classify::{classify_document, ClassifiedDocument};
pub use code::{CodeValue, Statement};
pub use codegen::{generate_document, generate_encoded_document, generate_source, GeneratedDocument};
pub use config::{CompilerConfig, CONFIG_FILE};
pub use context::{CompileEnv, FsSourceLoader, MemorySourceLoader, SourceLoader};
pub use discovery::{discover_documents, Glob};
pub use expression::{parse_expression, BindExpression};
pub use metadata::{
    BuilderInfo, ConstructorInfo, FieldInfo, LibraryTable, MethodInfo, ParamInfo, TableProvider,
    TypeInfo, TypeMetadataProvider, TypeRef,
};
pub use names::NameResolver;
pub use parse::{parse_markup, ParsedDocument};
pub use registry::{render_finder, RegistryArtifact};
pub use unit::{render_unit, ClassIdentity, CompilationUnit};
pub use validate::*;
