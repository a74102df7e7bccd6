#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use crate::batch::{compile_batch, compile_document, write_output, BatchError};
    use crate::cache::IncrementalCache;
    use crate::config::CompilerConfig;
    use crate::context::{CompileEnv, MemorySourceLoader};
    use crate::test_support::component_library;
    use crate::validate::*;

    const GOOD: &str = r#"<?import javafx.scene.control.Label?>
<Label xmlns:fx="http://javafx.com/fxml" text="Good"/>"#;

    const BAD: &str = r#"<?import javafx.scene.control.Label?>
<Label xmlns:fx="http://javafx.com/fxml" text="$missing"/>"#;

    const OFF: &str = r#"<?compile false?>
<?import javafx.scene.control.Label?>
<Label xmlns:fx="http://javafx.com/fxml"/>"#;

    fn documents(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    fn mixed_loader() -> MemorySourceLoader {
        MemorySourceLoader::new()
            .with("good.fxml", GOOD)
            .with("bad.fxml", BAD)
            .with("off.fxml", OFF)
    }

    #[test]
    fn test_compile_document() {
        let provider = component_library();
        let loader = mixed_loader();
        let env = CompileEnv::new(&provider, &loader, "fxml.builder", "fxml.api.FxmlBuilder");

        let unit = compile_document(&env, "good.fxml").unwrap().unwrap();
        assert_eq!(unit.identity.qualified_name(), "fxml.builder.GoodBuilder");
        assert!(unit.source.contains("Label label0 = new Label(\"Good\");"));
        assert!(compile_document(&env, "off.fxml").unwrap().is_none());
    }

    #[test]
    fn test_non_strict_batch_keeps_going() {
        let provider = component_library();
        let loader = mixed_loader();
        let config = CompilerConfig::default();

        let output = compile_batch(
            &documents(&["bad.fxml", "good.fxml", "off.fxml"]),
            &provider,
            &loader,
            &config,
            None,
        )
        .unwrap();

        assert_eq!(output.units.len(), 1);
        assert_eq!(output.units[0].document, "good.fxml");
        assert_eq!(output.skipped, vec!["off.fxml".to_string()]);
        assert_eq!(output.failures.len(), 1);
        assert_eq!(output.failures[0].code, ERR_UNKNOWN_ID);
        assert_eq!(output.failures[0].file, "bad.fxml");

        assert_eq!(output.registry.len(), 1);
        assert_eq!(
            output.registry.lookup("good.fxml").map(|id| id.qualified_name()),
            Some("fxml.builder.GoodBuilder".to_string())
        );
        assert!(output.finder_source.contains("GoodBuilder"));
    }

    #[test]
    fn test_strict_batch_fails_on_first_error() {
        let provider = component_library();
        let loader = mixed_loader();
        let config = CompilerConfig {
            strict: true,
            parallel: false,
            ..CompilerConfig::default()
        };

        let err = compile_batch(&documents(&["good.fxml", "bad.fxml"]), &provider, &loader, &config, None)
            .unwrap_err();
        match err {
            BatchError::Compilation(error) => {
                assert_eq!(error.code, ERR_UNKNOWN_ID);
                assert_eq!(error.file, "bad.fxml");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_class_name_collision_is_always_fatal() {
        let provider = component_library();
        let loader = MemorySourceLoader::new()
            .with("a/main.fxml", GOOD)
            .with("A/main.fxml", GOOD);
        let config = CompilerConfig::default();
        assert!(!config.strict);

        let err = compile_batch(
            &documents(&["a/main.fxml", "A/main.fxml"]),
            &provider,
            &loader,
            &config,
            None,
        )
        .unwrap_err();
        match err {
            BatchError::ClassNameCollision(error) => {
                assert_eq!(error.code, ERR_CLASS_NAME_COLLISION);
                assert!(error.message.contains("fxml.builder.a.MainBuilder"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_write_output() {
        let provider = component_library();
        let loader = MemorySourceLoader::new()
            .with("good.fxml", GOOD)
            .with("views/main-view.fxml", GOOD);
        let config = CompilerConfig::default();
        let output = compile_batch(
            &documents(&["good.fxml", "views/main-view.fxml"]),
            &provider,
            &loader,
            &config,
            None,
        )
        .unwrap();

        let out = TempDir::new().unwrap();
        write_output(&output, &config, out.path()).unwrap();

        let unit = fs::read_to_string(out.path().join("fxml/builder/views/MainViewBuilder.java")).unwrap();
        assert!(unit.starts_with("package fxml.builder.views;"));
        assert!(out.path().join("fxml/builder/GoodBuilder.java").exists());

        let finder = fs::read_to_string(out.path().join("fxml/builder/BuilderFinder.java")).unwrap();
        assert!(finder.contains("\"views/main-view.fxml\""));
        assert_eq!(
            fs::read_to_string(out.path().join("META-INF/services/fxml.api.FxmlBuilderFinder")).unwrap(),
            "fxml.builder.BuilderFinder\n"
        );
    }

    #[test]
    fn test_cache_tracks_included_documents() {
        let provider = component_library();
        let config = CompilerConfig::default();
        let cache_dir = TempDir::new().unwrap();
        let cache = IncrementalCache::new(cache_dir.path());
        let main = r#"<?import javafx.scene.layout.VBox?>
<VBox xmlns:fx="http://javafx.com/fxml">
    <fx:include fx:id="header" source="header.fxml"/>
</VBox>"#;
        let documents = documents(&["main.fxml"]);

        let loader = MemorySourceLoader::new()
            .with("main.fxml", main)
            .with("header.fxml", GOOD);
        let first = compile_batch(&documents, &provider, &loader, &config, Some(&cache)).unwrap();
        assert!(first.units[0].source.contains("Label header = headerBuilder.getRoot();"));
        assert!(cache_dir.path().join("main.fxml.json").exists());

        let second = compile_batch(&documents, &provider, &loader, &config, Some(&cache)).unwrap();
        assert_eq!(first.units, second.units);

        let changed = MemorySourceLoader::new().with("main.fxml", main).with(
            "header.fxml",
            r#"<?import javafx.scene.control.Button?>
<Button xmlns:fx="http://javafx.com/fxml"/>"#,
        );
        let third = compile_batch(&documents, &provider, &changed, &config, Some(&cache)).unwrap();
        assert!(third.units[0].source.contains("Button header = headerBuilder.getRoot();"));
    }
}
