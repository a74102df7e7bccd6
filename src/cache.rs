use crate::context::SourceLoader;
use crate::unit::CompilationUnit;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A cached unit and the content hashes it was produced from. `fingerprint`
/// covers everything outside the documents (metadata, package, interfaces).
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub fingerprint: String,
    /// Document and its includes → sha256 of their source.
    pub sources: BTreeMap<String, String>,
    pub unit: CompilationUnit,
}

pub struct IncrementalCache {
    cache_dir: PathBuf,
}

impl IncrementalCache {
    pub fn new(cache_dir: &Path) -> Self {
        if !cache_dir.exists() {
            fs::create_dir_all(cache_dir).ok();
        }
        Self {
            cache_dir: cache_dir.to_path_buf(),
        }
    }

    pub fn compute_hash(source: impl AsRef<[u8]>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_ref());
        format!("{:x}", hasher.finalize())
    }

    /// Hash over several labelled parts, order-sensitive.
    pub fn compute_fingerprint(parts: &[&str]) -> String {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.len().to_le_bytes());
            hasher.update(part.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    fn get_cache_path(&self, file_path: &str) -> PathBuf {
        // Stable file name per document
        let safe_name = file_path
            .replace('/', "_")
            .replace('\\', "_")
            .replace(':', "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    /// The cached unit when the fingerprint and every recorded source still
    /// match.
    pub fn get(&self, file_path: &str, fingerprint: &str, loader: &dyn SourceLoader) -> Option<CompilationUnit> {
        let cache_path = self.get_cache_path(file_path);
        if !cache_path.exists() {
            return None;
        }

        let data = fs::read_to_string(&cache_path).ok()?;
        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(e) => {
                warn!("Cache entry for {} is corrupt: {}", file_path, e);
                fs::remove_file(cache_path).ok();
                return None;
            }
        };

        if entry.fingerprint != fingerprint || !entry.sources.contains_key(file_path) {
            return None;
        }
        for (path, hash) in &entry.sources {
            match loader.load_bytes(path) {
                Ok(source) if Self::compute_hash(&source) == *hash => {}
                _ => return None,
            }
        }
        debug!("Cache hit for {}", file_path);
        Some(entry.unit)
    }

    pub fn set(
        &self,
        file_path: &str,
        fingerprint: &str,
        dependencies: &[String],
        loader: &dyn SourceLoader,
        unit: &CompilationUnit,
    ) {
        let mut sources = BTreeMap::new();
        for path in std::iter::once(file_path).chain(dependencies.iter().map(String::as_str)) {
            let Ok(source) = loader.load_bytes(path) else {
                return;
            };
            sources.insert(path.to_string(), Self::compute_hash(&source));
        }

        let entry = CacheEntry {
            fingerprint: fingerprint.to_string(),
            sources,
            unit: unit.clone(),
        };
        if let Ok(data) = serde_json::to_string(&entry) {
            fs::write(self.get_cache_path(file_path), data).ok();
        }
    }
}
