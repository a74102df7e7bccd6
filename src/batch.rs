//! Batch compilation.
//!
//! Documents compile independently (in parallel with rayon when enabled).
//! After every document finishes, one collision check runs over all output
//! identities. Non-strict batches drop failing documents and keep going;
//! strict batches fail on the first error in document order.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::cache::IncrementalCache;
use crate::codegen::generate_document;
use crate::config::CompilerConfig;
use crate::context::{CompileEnv, SourceLoader};
use crate::metadata::TypeMetadataProvider;
use crate::registry::{render_finder, service_descriptor, service_descriptor_path, RegistryArtifact};
use crate::unit::{render_unit, ClassIdentity, CompilationUnit};
use crate::validate::{CompilerError, ERR_CLASS_NAME_COLLISION};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("compilation failed: {0}")]
    Compilation(CompilerError),
    #[error("class name collision: {0}")]
    ClassNameCollision(CompilerError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a (possibly partially) successful batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub units: Vec<CompilationUnit>,
    pub registry: RegistryArtifact,
    /// Documents that opted out with `<?compile false?>`.
    pub skipped: Vec<String>,
    /// Per-document failures tolerated in non-strict mode.
    pub failures: Vec<CompilerError>,
    pub finder_source: String,
}

enum Outcome {
    Compiled(CompilationUnit),
    Skipped,
    Failed(CompilerError),
}

// ═══════════════════════════════════════════════════════════════════════════════
// SINGLE DOCUMENT
// ═══════════════════════════════════════════════════════════════════════════════

/// Compiles one document to its unit. `Ok(None)` when compilation is
/// disabled for it.
pub fn compile_document(env: &CompileEnv<'_>, path: &str) -> Result<Option<CompilationUnit>, CompilerError> {
    Ok(generate_document(env, path, vec![])?
        .map(|document| render_unit(&document, &env.builder_interface)))
}

fn compile_cached(
    env: &CompileEnv<'_>,
    path: &str,
    cache: Option<&IncrementalCache>,
    fingerprint: &str,
) -> Outcome {
    if let Some(unit) = cache.and_then(|c| c.get(path, fingerprint, env.loader)) {
        return Outcome::Compiled(unit);
    }

    debug!("Compiling {}", path);
    match generate_document(env, path, vec![]) {
        Ok(Some(document)) => {
            let unit = render_unit(&document, &env.builder_interface);
            if let Some(cache) = cache {
                cache.set(path, fingerprint, &document.dependencies, env.loader, &unit);
            }
            Outcome::Compiled(unit)
        }
        Ok(None) => Outcome::Skipped,
        Err(e) => Outcome::Failed(e.in_file(path)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH
// ═══════════════════════════════════════════════════════════════════════════════

pub fn compile_batch(
    documents: &[String],
    provider: &dyn TypeMetadataProvider,
    loader: &dyn SourceLoader,
    config: &CompilerConfig,
    cache: Option<&IncrementalCache>,
) -> Result<BatchOutput, BatchError> {
    let env = CompileEnv::new(provider, loader, &config.root_package, &config.builder_interface);
    let fingerprint = IncrementalCache::compute_fingerprint(&[
        env!("CARGO_PKG_VERSION"),
        &provider.fingerprint(),
        &config.root_package,
        &config.builder_interface,
    ]);

    let outcomes: Vec<Outcome> = match config.parallel {
        true => documents
            .par_iter()
            .map(|path| compile_cached(&env, path, cache, &fingerprint))
            .collect(),
        false => documents
            .iter()
            .map(|path| compile_cached(&env, path, cache, &fingerprint))
            .collect(),
    };

    let mut output = BatchOutput::default();
    for (path, outcome) in documents.iter().zip(outcomes) {
        match outcome {
            Outcome::Compiled(unit) => output.units.push(unit),
            Outcome::Skipped => {
                debug!("Skipped {}: compilation disabled", path);
                output.skipped.push(path.clone());
            }
            Outcome::Failed(error) => {
                if config.strict {
                    return Err(BatchError::Compilation(error));
                }
                warn!("Failed to compile {}: {}", path, error);
                output.failures.push(error);
            }
        }
    }

    check_collisions(&output.units)?;

    for unit in &output.units {
        output.registry.insert(&unit.document, unit.identity.clone());
    }
    output.finder_source = render_finder(
        &output.registry,
        &config.root_package,
        &config.finder_class,
        &config.finder_interface,
        &config.builder_interface,
    );

    info!("{} out of {} files compiled", output.units.len(), documents.len());
    Ok(output)
}

/// Two documents mapping to the same builder class fail the batch
/// regardless of mode.
fn check_collisions(units: &[CompilationUnit]) -> Result<(), BatchError> {
    let mut owners: BTreeMap<&ClassIdentity, &str> = BTreeMap::new();
    for unit in units {
        if let Some(previous) = owners.insert(&unit.identity, &unit.document) {
            return Err(BatchError::ClassNameCollision(
                CompilerError::new(
                    ERR_CLASS_NAME_COLLISION,
                    format!(
                        "{} and {} both compile to {}",
                        previous,
                        unit.document,
                        unit.identity.qualified_name()
                    ),
                )
                .in_file(&unit.document)
                .with_hint("Rename one of the documents"),
            ));
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Writes units, the finder class and its service descriptor under `out_dir`.
pub fn write_output(output: &BatchOutput, config: &CompilerConfig, out_dir: &Path) -> Result<(), BatchError> {
    for unit in &output.units {
        write_file(&out_dir.join(unit.identity.source_path()), &unit.source)?;
    }

    let finder = ClassIdentity {
        package: config.root_package.clone(),
        class_name: config.finder_class.clone(),
    };
    write_file(&out_dir.join(finder.source_path()), &output.finder_source)?;
    write_file(
        &out_dir.join(service_descriptor_path(&config.finder_interface)),
        &service_descriptor(&config.root_package, &config.finder_class),
    )?;
    debug!("Wrote {} units to {}", output.units.len(), out_dir.display());
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), BatchError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}
