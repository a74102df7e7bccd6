//! Compilation-unit emission.
//!
//! Turns a `GeneratedDocument` into the Java source of its builder class and
//! derives the class identity (package + simple name) from the document path.

use serde::{Deserialize, Serialize};

use crate::code::{render_statements, ImportSet, INDENT};
use crate::codegen::GeneratedDocument;
use crate::context::{CONTROLLER_FACTORY, PROVIDED_CONTROLLER, PROVIDED_ROOT, RESOURCES};
use crate::metadata::{TypeRef, RESOURCE_BUNDLE};
use crate::names::capitalize;

pub const BUILDER_SUFFIX: &str = "Builder";
const FUNCTION: &str = "java.util.function.Function";
const CLASS: &str = "java.lang.Class";

// ═══════════════════════════════════════════════════════════════════════════════
// CLASS IDENTITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Output identity of a document's builder class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassIdentity {
    pub package: String,
    pub class_name: String,
}

impl ClassIdentity {
    /// `views/main-view.fxml` under `fxml.builder` becomes
    /// `fxml.builder.views.MainViewBuilder`.
    pub fn for_document(root_package: &str, path: &str) -> Self {
        let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let file = segments.pop().unwrap_or_default();
        let stem = file.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(file);

        let mut package = root_package.to_string();
        for segment in segments {
            if !package.is_empty() {
                package.push('.');
            }
            package.push_str(&java_identifier(&segment.to_lowercase()));
        }

        ClassIdentity {
            package,
            class_name: format!("{}{}", class_stem(stem), BUILDER_SUFFIX),
        }
    }

    pub fn qualified_name(&self) -> String {
        match self.package.is_empty() {
            true => self.class_name.clone(),
            false => format!("{}.{}", self.package, self.class_name),
        }
    }

    /// Relative path of the emitted `.java` file.
    pub fn source_path(&self) -> String {
        let mut path = self.package.replace('.', "/");
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(&self.class_name);
        path.push_str(".java");
        path
    }
}

fn class_stem(stem: &str) -> String {
    let joined: String = stem
        .split(|c| c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect();
    java_identifier(&joined)
}

/// Replaces characters Java identifiers cannot hold.
fn java_identifier(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    if out.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// UNIT RENDERING
// ═══════════════════════════════════════════════════════════════════════════════

/// Emitted source for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationUnit {
    pub document: String,
    pub identity: ClassIdentity,
    pub source: String,
}

pub fn render_unit(document: &GeneratedDocument, builder_interface: &str) -> CompilationUnit {
    let identity = &document.identity;
    let mut imports = ImportSet::new(&identity.package, &identity.class_name);

    let controller_ty = document
        .controller_type
        .clone()
        .unwrap_or_else(TypeRef::object);
    let root_ty = &document.root_type;
    let controller = imports.type_name(&controller_ty);
    let controller_raw = imports.type_name(&controller_ty.raw());
    let root = imports.type_name(root_ty);
    let interface = imports.type_name(&TypeRef::generic(
        builder_interface,
        vec![controller_ty.clone(), root_ty.clone()],
    ));
    let bundle = imports.class_name(RESOURCE_BUNDLE);
    let factory = format!(
        "{}<{}<?>, Object>",
        imports.class_name(FUNCTION),
        imports.class_name(CLASS)
    );

    let mut body = String::new();
    render_statements(&document.statements, 2, &mut imports, &mut body);

    let i1 = INDENT;
    let i2 = INDENT.repeat(2);
    let i3 = INDENT.repeat(3);
    let mut out = String::new();
    if !identity.package.is_empty() {
        out.push_str(&format!("package {};\n\n", identity.package));
    }
    for import in imports.imports() {
        out.push_str(&format!("import {};\n", import));
    }
    if imports.imports().next().is_some() {
        out.push('\n');
    }

    out.push_str(&format!(
        "public class {} implements {} {{\n",
        identity.class_name, interface
    ));
    out.push_str(&format!("{}private {} controller;\n\n", i1, controller));
    out.push_str(&format!("{}private {} root;\n\n", i1, root));

    out.push_str(&format!("{}public {} getController() {{\n", i1, controller));
    out.push_str(&format!("{}return controller;\n{}}}\n\n", i2, i1));

    out.push_str(&format!(
        "{}private void setController({} {}, {} {}) {{\n",
        i1, controller, PROVIDED_CONTROLLER, factory, CONTROLLER_FACTORY
    ));
    out.push_str(&format!("{}if ({} != null) {{\n", i2, PROVIDED_CONTROLLER));
    out.push_str(&format!("{}controller = {};\n", i3, PROVIDED_CONTROLLER));
    out.push_str(&format!("{}}} else if ({} != null) {{\n", i2, CONTROLLER_FACTORY));
    out.push_str(&format!(
        "{}controller = ({}) {}.apply({}.class);\n",
        i3, controller, CONTROLLER_FACTORY, controller_raw
    ));
    if document.controller_constructible {
        out.push_str(&format!("{}}} else {{\n", i2));
        out.push_str(&format!("{}controller = new {}();\n", i3, controller_raw));
    }
    out.push_str(&format!("{}}}\n{}}}\n\n", i2, i1));

    out.push_str(&format!("{}public {} getRoot() {{\n", i1, root));
    out.push_str(&format!("{}return root;\n{}}}\n\n", i2, i1));
    out.push_str(&format!("{}private void setRoot({} root) {{\n", i1, root));
    out.push_str(&format!("{}this.root = root;\n{}}}\n\n", i2, i1));

    out.push_str(&format!(
        "{}public void build({} {}, {} {}, {} {}, {} {}) {{\n",
        i1,
        controller,
        PROVIDED_CONTROLLER,
        root,
        PROVIDED_ROOT,
        bundle,
        RESOURCES,
        factory,
        CONTROLLER_FACTORY
    ));
    out.push_str(&format!(
        "{}setController({}, {});\n",
        i2, PROVIDED_CONTROLLER, CONTROLLER_FACTORY
    ));
    out.push_str(&body);
    out.push_str(&format!("{}}}\n}}\n", i1));

    CompilationUnit {
        document: document.path.clone(),
        identity: identity.clone(),
        source: out,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{CodeValue, Statement};

    #[test]
    fn test_identity_from_path() {
        let identity = ClassIdentity::for_document("fxml.builder", "com/example/Sample/hello-view.fxml");
        assert_eq!(identity.package, "fxml.builder.com.example.sample");
        assert_eq!(identity.class_name, "HelloViewBuilder");
        assert_eq!(
            identity.source_path(),
            "fxml/builder/com/example/sample/HelloViewBuilder.java"
        );
    }

    #[test]
    fn test_identity_sanitizes_names() {
        assert_eq!(ClassIdentity::for_document("p", "main_window.fxml").class_name, "MainWindowBuilder");
        assert_eq!(ClassIdentity::for_document("p", "2d-view.fxml").class_name, "_2dViewBuilder");
        assert_eq!(ClassIdentity::for_document("p", "my dir/a.fxml").package, "p.my_dir");
        assert_eq!(ClassIdentity::for_document("", "a.fxml").qualified_name(), "ABuilder");
    }

    #[test]
    fn test_unit_without_controller() {
        let document = GeneratedDocument {
            path: "a.fxml".into(),
            identity: ClassIdentity::for_document("fxml.builder", "a.fxml"),
            root_type: TypeRef::class("javafx.scene.layout.VBox"),
            controller_type: None,
            controller_constructible: true,
            dependencies: vec![],
            statements: vec![
                Statement::Blank,
                Statement::assign(
                    &TypeRef::class("javafx.scene.layout.VBox"),
                    "vBox0",
                    CodeValue::new_instance(&TypeRef::class("javafx.scene.layout.VBox"), vec![]),
                ),
                Statement::Blank,
                Statement::expression(CodeValue::MethodCall {
                    target: None,
                    method: "setRoot".into(),
                    args: vec![CodeValue::var("vBox0")],
                }),
            ],
        };
        let unit = render_unit(&document, "fxml.api.FxmlBuilder");
        assert!(unit.source.starts_with("package fxml.builder;\n\nimport fxml.api.FxmlBuilder;\n"));
        assert!(unit
            .source
            .contains("public class ABuilder implements FxmlBuilder<Object, VBox> {"));
        assert!(unit.source.contains("      controller = new Object();\n"));
        assert!(unit.source.contains("    VBox vBox0 = new VBox();\n\n    setRoot(vBox0);\n  }\n}\n"));
    }
}
