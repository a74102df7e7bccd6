//! Registry artifact.
//!
//! Maps every compiled document's relative path to its builder class. The
//! runtime side looks builders up by whole-segment path-suffix match, longest
//! path first, and falls back to dynamic loading when nothing matches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::code::{ImportSet, INDENT};
use crate::metadata::TypeRef;
use crate::unit::ClassIdentity;

const COMPARATOR: &str = "java.util.Comparator";
const HASH_MAP: &str = "java.util.HashMap";
const MAP: &str = "java.util.Map";
const SUPPLIER: &str = "java.util.function.Supplier";
const URL: &str = "java.net.URL";
const LOAD_FACTOR: f64 = 0.75;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryArtifact {
    /// Relative document path → builder class, ordered by path.
    pub entries: BTreeMap<String, ClassIdentity>,
}

impl RegistryArtifact {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, identity: ClassIdentity) {
        self.entries.insert(normalize_path(path), identity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builder for `location`. A registered path matches when it equals the
    /// location or ends it on a segment boundary; the longest match wins.
    pub fn lookup(&self, location: &str) -> Option<&ClassIdentity> {
        let location = normalize_path(location);
        self.entries
            .iter()
            .filter(|(path, _)| matches_location(&location, path))
            .max_by_key(|(path, _)| path.len())
            .map(|(_, identity)| identity)
    }
}

fn matches_location(location: &str, path: &str) -> bool {
    match location.strip_suffix(path) {
        Some(rest) => rest.is_empty() || rest.ends_with('/'),
        None => false,
    }
}

/// Forward slashes, no leading `./` or `/`.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let mut trimmed = path.as_str();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }
    trimmed.to_string()
}

fn initial_capacity(entries: usize) -> usize {
    (entries as f64 / LOAD_FACTOR) as usize + 1
}

/// Java source of the finder class, placed in the root package.
pub fn render_finder(
    registry: &RegistryArtifact,
    root_package: &str,
    finder_class: &str,
    finder_interface: &str,
    builder_interface: &str,
) -> String {
    let mut imports = ImportSet::new(root_package, finder_class);
    let interface = imports.type_name(&TypeRef::class(finder_interface));
    let builder = imports.class_name(builder_interface);
    let comparator = imports.class_name(COMPARATOR);
    let hash_map = imports.class_name(HASH_MAP);
    let map = imports.class_name(MAP);
    let supplier = imports.class_name(SUPPLIER);
    let url = imports.class_name(URL);

    let mut puts = String::new();
    for (path, identity) in &registry.entries {
        let class = imports.class_name(&identity.qualified_name());
        puts.push_str(&format!(
            "{}BUILDER_PATH_MAP.put(\"{}\", {}::new);\n",
            INDENT.repeat(2),
            crate::code::escape_string(path),
            class
        ));
    }

    let i1 = INDENT;
    let i2 = INDENT.repeat(2);
    let i3 = INDENT.repeat(3);
    let mut out = String::new();
    if !root_package.is_empty() {
        out.push_str(&format!("package {};\n\n", root_package));
    }
    for import in imports.imports() {
        out.push_str(&format!("import {};\n", import));
    }
    out.push('\n');

    out.push_str(&format!(
        "public class {} implements {} {{\n",
        finder_class, interface
    ));
    out.push_str(&format!(
        "{}private static final {}<String, {}<? extends {}<?, ?>>> BUILDER_PATH_MAP = new {}<>({}, {}f);\n\n",
        i1,
        hash_map,
        supplier,
        builder,
        hash_map,
        initial_capacity(registry.len()),
        LOAD_FACTOR
    ));
    out.push_str(&format!("{}static {{\n{}{}}}\n\n", i1, puts, i1));

    out.push_str(&format!("{}public {}<?, ?> findBuilder({} location) {{\n", i1, builder, url));
    out.push_str(&format!("{}if (location == null) {{\n{}return null;\n{}}}\n", i2, i3, i2));
    out.push_str(&format!("{}String path = location.getPath();\n", i2));
    out.push_str(&format!(
        "{}return BUILDER_PATH_MAP.entrySet().stream().filter(entry -> path.equals(entry.getKey()) || path.endsWith(\"/\" + entry.getKey())).max({}.comparingInt(entry -> entry.getKey().length())).map({}.Entry::getValue).map({}::get).orElse(null);\n",
        i2, comparator, map, supplier
    ));
    out.push_str(&format!("{}}}\n}}\n", i1));
    out
}

/// Relative path of the service descriptor announcing the finder.
pub fn service_descriptor_path(finder_interface: &str) -> String {
    format!("META-INF/services/{}", finder_interface)
}

/// Content of the service descriptor: the finder's qualified name.
pub fn service_descriptor(root_package: &str, finder_class: &str) -> String {
    match root_package.is_empty() {
        true => format!("{}\n", finder_class),
        false => format!("{}.{}\n", root_package, finder_class),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RegistryArtifact {
        let mut registry = RegistryArtifact::new();
        registry.insert(
            "com/example/sample/hello-view.fxml",
            ClassIdentity::for_document("fxml.builder", "com/example/sample/hello-view.fxml"),
        );
        registry.insert("./main.fxml", ClassIdentity::for_document("fxml.builder", "main.fxml"));
        registry
    }

    #[test]
    fn test_lookup_by_suffix() {
        let registry = registry();
        let found = registry
            .lookup("/opt/app/classes/com/example/sample/hello-view.fxml")
            .unwrap();
        assert_eq!(found.qualified_name(), "fxml.builder.com.example.sample.HelloViewBuilder");
        assert_eq!(registry.lookup("file:/x/main.fxml").unwrap().class_name, "MainBuilder");
        assert!(registry.lookup("/x/other.fxml").is_none());
    }

    #[test]
    fn test_finder_source() {
        let source = render_finder(
            &registry(),
            "fxml.builder",
            "BuilderFinder",
            "fxml.api.FxmlBuilderFinder",
            "fxml.api.FxmlBuilder",
        );
        assert!(source.starts_with("package fxml.builder;\n\n"));
        assert!(source.contains("import fxml.builder.com.example.sample.HelloViewBuilder;\n"));
        assert!(source.contains("public class BuilderFinder implements FxmlBuilderFinder {"));
        assert!(source.contains(
            "BUILDER_PATH_MAP = new HashMap<>(3, 0.75f);"
        ));
        assert!(source.contains("    BUILDER_PATH_MAP.put(\"main.fxml\", MainBuilder::new);\n"));
        assert!(source.contains("public FxmlBuilder<?, ?> findBuilder(URL location) {"));
        assert!(source.contains("import java.util.Comparator;\n"));
        assert!(source.contains(
            ".filter(entry -> path.equals(entry.getKey()) || path.endsWith(\"/\" + entry.getKey()))"
        ));
        assert!(source.contains(".max(Comparator.comparingInt(entry -> entry.getKey().length()))"));
    }

    #[test]
    fn test_lookup_prefers_longest_segment_match() {
        let mut registry = RegistryArtifact::new();
        registry.insert("main.fxml", ClassIdentity::for_document("fxml.builder", "main.fxml"));
        registry.insert("sub/main.fxml", ClassIdentity::for_document("fxml.builder", "sub/main.fxml"));

        let found = registry.lookup("/app/res/sub/main.fxml").unwrap();
        assert_eq!(found.qualified_name(), "fxml.builder.sub.MainBuilder");
        assert_eq!(
            registry.lookup("/app/res/main.fxml").unwrap().qualified_name(),
            "fxml.builder.MainBuilder"
        );
        assert_eq!(registry.lookup("main.fxml").unwrap().qualified_name(), "fxml.builder.MainBuilder");
        assert!(registry.lookup("/app/res/domain.fxml").is_none());
        assert_eq!(
            registry.lookup("/app/res/xsub/main.fxml").map(|id| id.qualified_name()),
            Some("fxml.builder.MainBuilder".to_string())
        );
    }

    #[test]
    fn test_finder_interface_sharing_simple_name_stays_qualified() {
        let source = render_finder(
            &RegistryArtifact::new(),
            "fxml.builder",
            "FxmlBuilderFinder",
            "fxml.api.FxmlBuilderFinder",
            "fxml.api.FxmlBuilder",
        );
        assert!(source.contains("public class FxmlBuilderFinder implements fxml.api.FxmlBuilderFinder {"));
    }

    #[test]
    fn test_service_descriptor() {
        assert_eq!(
            service_descriptor_path("fxml.api.FxmlBuilderFinder"),
            "META-INF/services/fxml.api.FxmlBuilderFinder"
        );
        assert_eq!(service_descriptor("fxml.builder", "BuilderFinder"), "fxml.builder.BuilderFinder\n");
    }
}
