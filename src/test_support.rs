//! Small component library shared by resolver and generator tests.

use crate::metadata::{MethodInfo, ParamInfo, TableProvider, TypeInfo, OBJECT, STRING};

const OBSERVABLE_VALUE: &str = "javafx.beans.value.ObservableValue";
const OBSERVABLE_LIST: &str = "javafx.collections.ObservableList";
const BOOLEAN_BINDING: &str = "javafx.beans.binding.BooleanBinding";
const INTEGER_BINDING: &str = "javafx.beans.binding.IntegerBinding";
const NODE: &str = "javafx.scene.Node";
const INSETS: &str = "javafx.geometry.Insets";
const POS: &str = "javafx.geometry.Pos";
const EVENT_HANDLER: &str = "javafx.event.EventHandler";

fn beans() -> Vec<TypeInfo> {
    vec![
        TypeInfo::interface("javafx.beans.Observable"),
        TypeInfo::interface(OBSERVABLE_VALUE)
            .implements("javafx.beans.Observable")
            .method(MethodInfo::new(
                "addListener",
                &["javafx.beans.value.ChangeListener"],
                "void",
            ))
            .method(MethodInfo::new("getValue", &[], OBJECT)),
        TypeInfo::interface("javafx.beans.value.ChangeListener"),
        TypeInfo::interface("javafx.beans.value.ObservableNumberValue").implements(OBSERVABLE_VALUE),
        TypeInfo::interface("javafx.beans.value.ObservableBooleanValue").implements(OBSERVABLE_VALUE),
        TypeInfo::interface("javafx.beans.value.ObservableStringValue").implements(OBSERVABLE_VALUE),
        TypeInfo::interface("javafx.beans.property.Property")
            .implements(OBSERVABLE_VALUE)
            .method(MethodInfo::new("bind", &[OBSERVABLE_VALUE], "void")),
        TypeInfo::class("javafx.beans.binding.Binding").abstract_class().implements(OBSERVABLE_VALUE),
        TypeInfo::class(BOOLEAN_BINDING)
            .abstract_class()
            .extends("javafx.beans.binding.Binding")
            .implements("javafx.beans.value.ObservableBooleanValue")
            .method(MethodInfo::new("not", &[], BOOLEAN_BINDING))
            .method(MethodInfo::new("and", &["javafx.beans.value.ObservableBooleanValue"], BOOLEAN_BINDING))
            .method(MethodInfo::new("or", &["javafx.beans.value.ObservableBooleanValue"], BOOLEAN_BINDING)),
        TypeInfo::class(INTEGER_BINDING)
            .abstract_class()
            .extends("javafx.beans.binding.Binding")
            .implements("javafx.beans.value.ObservableNumberValue")
            .method(MethodInfo::new("add", &["int"], INTEGER_BINDING))
            .method(MethodInfo::new("greaterThan", &["int"], BOOLEAN_BINDING)),
        TypeInfo::class("javafx.beans.binding.StringBinding")
            .abstract_class()
            .extends("javafx.beans.binding.Binding")
            .implements("javafx.beans.value.ObservableStringValue"),
        TypeInfo::class("javafx.beans.binding.ObjectBinding")
            .abstract_class()
            .extends("javafx.beans.binding.Binding"),
        TypeInfo::class("javafx.beans.property.StringProperty")
            .abstract_class()
            .implements("javafx.beans.property.Property")
            .implements("javafx.beans.value.ObservableStringValue")
            .method(MethodInfo::new("concat", &[OBJECT], "javafx.beans.binding.StringBinding"))
            .method(MethodInfo::new("isEqualTo", &[STRING], BOOLEAN_BINDING)),
        TypeInfo::class("javafx.beans.property.BooleanProperty")
            .abstract_class()
            .implements("javafx.beans.property.Property")
            .implements("javafx.beans.value.ObservableBooleanValue")
            .method(MethodInfo::new("not", &[], BOOLEAN_BINDING))
            .method(MethodInfo::new("and", &["javafx.beans.value.ObservableBooleanValue"], BOOLEAN_BINDING))
            .method(MethodInfo::new("or", &["javafx.beans.value.ObservableBooleanValue"], BOOLEAN_BINDING)),
        TypeInfo::class("javafx.beans.binding.IntegerExpression")
            .abstract_class()
            .implements("javafx.beans.value.ObservableNumberValue")
            .method(MethodInfo::new("add", &["int"], INTEGER_BINDING))
            .method(MethodInfo::new("subtract", &["int"], INTEGER_BINDING))
            .method(MethodInfo::new("multiply", &["int"], INTEGER_BINDING))
            .method(MethodInfo::new("divide", &["int"], INTEGER_BINDING))
            .method(MethodInfo::new("negate", &[], INTEGER_BINDING))
            .method(MethodInfo::new("greaterThan", &["int"], BOOLEAN_BINDING))
            .method(MethodInfo::new("isEqualTo", &["int"], BOOLEAN_BINDING)),
        TypeInfo::class("javafx.beans.property.IntegerProperty")
            .abstract_class()
            .extends("javafx.beans.binding.IntegerExpression")
            .implements("javafx.beans.property.Property"),
        TypeInfo::class("javafx.beans.property.DoubleProperty")
            .abstract_class()
            .implements("javafx.beans.property.Property")
            .implements("javafx.beans.value.ObservableNumberValue"),
        TypeInfo::class("javafx.beans.binding.Bindings")
            .method(MethodInfo::static_method(
                "greaterThan",
                &["javafx.beans.value.ObservableNumberValue", "int"],
                BOOLEAN_BINDING,
            ))
            .method(MethodInfo::static_method(
                "add",
                &["javafx.beans.value.ObservableNumberValue", "javafx.beans.value.ObservableNumberValue"],
                "javafx.beans.binding.NumberBinding",
            ))
            .method(MethodInfo::static_method(
                "equal",
                &["javafx.beans.value.ObservableNumberValue", "int"],
                BOOLEAN_BINDING,
            ))
            .method(MethodInfo::static_method(
                "not",
                &["javafx.beans.value.ObservableBooleanValue"],
                BOOLEAN_BINDING,
            ))
            .method(MethodInfo::static_method(
                "negate",
                &["javafx.beans.value.ObservableNumberValue"],
                "javafx.beans.binding.NumberBinding",
            ))
            .method(MethodInfo::static_method(
                "valueAt",
                &[OBSERVABLE_LIST, "int"],
                "javafx.beans.binding.ObjectBinding",
            )),
        TypeInfo::class("javafx.beans.binding.NumberBinding")
            .abstract_class()
            .extends("javafx.beans.binding.Binding")
            .implements("javafx.beans.value.ObservableNumberValue"),
    ]
}

fn collections() -> Vec<TypeInfo> {
    vec![
        TypeInfo::interface(OBSERVABLE_LIST)
            .implements("java.util.List")
            .implements("javafx.beans.Observable")
            .method(MethodInfo::new(
                "addListener",
                &["javafx.collections.ListChangeListener"],
                "void",
            )),
        TypeInfo::interface("javafx.collections.ListChangeListener"),
        TypeInfo::class("javafx.collections.ListChangeListener$Change").abstract_class(),
        TypeInfo::interface("javafx.collections.ObservableMap")
            .implements("java.util.Map")
            .implements("javafx.beans.Observable")
            .method(MethodInfo::new(
                "addListener",
                &["javafx.collections.MapChangeListener"],
                "void",
            )),
        TypeInfo::interface("javafx.collections.MapChangeListener"),
        TypeInfo::class("javafx.collections.MapChangeListener$Change").abstract_class(),
        TypeInfo::class("javafx.collections.FXCollections").method(MethodInfo::static_method(
            "observableArrayList",
            &[],
            OBSERVABLE_LIST,
        )),
    ]
}

fn events() -> Vec<TypeInfo> {
    vec![
        TypeInfo::class("javafx.event.Event"),
        TypeInfo::class("javafx.event.ActionEvent").extends("javafx.event.Event"),
        TypeInfo::class("javafx.scene.input.MouseEvent").extends("javafx.event.Event"),
        TypeInfo::interface(EVENT_HANDLER),
        TypeInfo::class("java.io.IOException").extends("java.lang.Exception"),
    ]
}

fn scene() -> Vec<TypeInfo> {
    vec![
        TypeInfo::class(NODE)
            .abstract_class()
            .method(MethodInfo::new("setId", &[STRING], "void"))
            .method(MethodInfo::new("getId", &[], STRING))
            .method(MethodInfo::new("setVisible", &["boolean"], "void"))
            .method(MethodInfo::new("isVisible", &[], "boolean"))
            .method(MethodInfo::new("visibleProperty", &[], "javafx.beans.property.BooleanProperty"))
            .method(MethodInfo::new(
                "getProperties",
                &[],
                "javafx.collections.ObservableMap<java.lang.Object, java.lang.Object>",
            ))
            .method(MethodInfo::new(
                "getStyleClass",
                &[],
                "javafx.collections.ObservableList<java.lang.String>",
            ))
            .method(MethodInfo::new(
                "setOnMouseClicked",
                &["javafx.event.EventHandler<? super javafx.scene.input.MouseEvent>"],
                "void",
            )),
        TypeInfo::class("javafx.scene.Parent").abstract_class().extends(NODE),
        TypeInfo::class("javafx.scene.layout.Pane")
            .extends("javafx.scene.Parent")
            .constructor(vec![])
            .method(MethodInfo::new(
                "getChildren",
                &[],
                "javafx.collections.ObservableList<javafx.scene.Node>",
            ))
            .default_property("children"),
        TypeInfo::class("javafx.scene.layout.VBox")
            .extends("javafx.scene.layout.Pane")
            .constructor(vec![])
            .constructor(vec![ParamInfo::named("spacing", "double", "0")])
            .method(MethodInfo::new("setSpacing", &["double"], "void"))
            .method(MethodInfo::new("getSpacing", &[], "double"))
            .method(MethodInfo::new("spacingProperty", &[], "javafx.beans.property.DoubleProperty"))
            .method(MethodInfo::new("setPadding", &[INSETS], "void"))
            .method(MethodInfo::new("setAlignment", &[POS], "void"))
            .method(MethodInfo::static_method("setMargin", &[NODE, INSETS], "void"))
            .method(MethodInfo::static_method(
                "setVgrow",
                &[NODE, "javafx.scene.layout.Priority"],
                "void",
            )),
        TypeInfo::enumeration("javafx.scene.layout.Priority", &["ALWAYS", "NEVER", "SOMETIMES"]),
        TypeInfo::class("javafx.scene.layout.GridPane")
            .extends("javafx.scene.layout.Pane")
            .constructor(vec![])
            .method(MethodInfo::static_method("setRowIndex", &[NODE, "java.lang.Integer"], "void"))
            .method(MethodInfo::static_method("setColumnIndex", &[NODE, "java.lang.Integer"], "void")),
        TypeInfo::class(INSETS)
            .constructor(vec![
                ParamInfo::named("top", "double", "0"),
                ParamInfo::named("right", "double", "0"),
                ParamInfo::named("bottom", "double", "0"),
                ParamInfo::named("left", "double", "0"),
            ])
            .constructor(vec![ParamInfo::named("topRightBottomLeft", "double", "0")])
            .method(MethodInfo::new("getTop", &[], "double")),
        TypeInfo::enumeration(POS, &["CENTER", "TOP_LEFT", "BOTTOM_RIGHT"]),
        TypeInfo::enumeration("javafx.scene.text.TextAlignment", &["LEFT", "CENTER", "RIGHT"]),
        TypeInfo::class("javafx.scene.paint.Color")
            .method(MethodInfo::static_method("web", &[STRING], "javafx.scene.paint.Color"))
            .field("RED", "javafx.scene.paint.Color", true),
    ]
}

fn controls() -> Vec<TypeInfo> {
    vec![
        TypeInfo::class("javafx.scene.control.Control")
            .abstract_class()
            .extends("javafx.scene.Parent"),
        TypeInfo::class("javafx.scene.control.Labeled")
            .abstract_class()
            .extends("javafx.scene.control.Control")
            .method(MethodInfo::new("setText", &[STRING], "void"))
            .method(MethodInfo::new("getText", &[], STRING))
            .method(MethodInfo::new("textProperty", &[], "javafx.beans.property.StringProperty"))
            .method(MethodInfo::new(
                "setTextAlignment",
                &["javafx.scene.text.TextAlignment"],
                "void",
            ))
            .method(MethodInfo::new("setAlignment", &[POS], "void"))
            .default_property("text"),
        TypeInfo::class("javafx.scene.control.Label")
            .extends("javafx.scene.control.Labeled")
            .constructor(vec![])
            .constructor(vec![ParamInfo::named("text", STRING, "")]),
        TypeInfo::class("javafx.scene.control.Button")
            .extends("javafx.scene.control.Labeled")
            .constructor(vec![])
            .constructor(vec![ParamInfo::named("text", STRING, "")])
            .method(MethodInfo::new(
                "setOnAction",
                &["javafx.event.EventHandler<javafx.event.ActionEvent>"],
                "void",
            )),
        TypeInfo::class("javafx.scene.control.TextField")
            .extends("javafx.scene.control.Control")
            .constructor(vec![])
            .method(MethodInfo::new("setText", &[STRING], "void"))
            .method(MethodInfo::new("getText", &[], STRING))
            .method(MethodInfo::new("textProperty", &[], "javafx.beans.property.StringProperty")),
        TypeInfo::class("javafx.scene.control.ListView")
            .extends("javafx.scene.control.Control")
            .constructor(vec![])
            .method(MethodInfo::new(
                "getItems",
                &[],
                "javafx.collections.ObservableList<java.lang.String>",
            )),
    ]
}

fn application() -> Vec<TypeInfo> {
    vec![
        TypeInfo::class("com.example.Gauge")
            .method(MethodInfo::new("getValue", &[], "double"))
            .built_by("com.example.GaugeBuilder"),
        TypeInfo::class("com.example.GaugeBuilder")
            .method(MethodInfo::static_method("create", &[], "com.example.GaugeBuilder"))
            .method(MethodInfo::new("value", &["double"], "com.example.GaugeBuilder"))
            .method(MethodInfo::new("title", &[STRING], "com.example.GaugeBuilder"))
            .method(MethodInfo::new("build", &[], "com.example.Gauge")),
        TypeInfo::class("com.example.Point")
            .constructor(vec![
                ParamInfo::named("x", "int", "0"),
                ParamInfo::named("y", "int", "0"),
            ])
            .constructor(vec![ParamInfo::of("com.example.Point")])
            .method(MethodInfo::new("getX", &[], "int")),
        TypeInfo::class("com.example.Settings")
            .field("DEFAULT_TITLE", STRING, true)
            .method(MethodInfo::static_method("defaults", &[], "java.util.HashMap")),
        TypeInfo::class("com.example.MainController")
            .constructor(vec![])
            .field("welcomeText", "javafx.scene.control.Label", false)
            .method(MethodInfo::new("setSubmitButton", &["javafx.scene.control.Button"], "void"))
            .method(MethodInfo::new("onHelloButtonClick", &[], "void"))
            .method(MethodInfo::new("onSave", &["javafx.event.ActionEvent"], "void"))
            .method(MethodInfo::new("onLoad", &["javafx.event.ActionEvent"], "void").throwing("java.io.IOException"))
            .method(MethodInfo::new("onReset", &[], "void").throwing("java.io.IOException"))
            .method(MethodInfo::new("initialize", &[], "void"))
            .method(MethodInfo::new(
                "onTextChange",
                &[
                    "javafx.beans.value.ObservableValue<? extends java.lang.String>",
                    STRING,
                    STRING,
                ],
                "void",
            ))
            .method(MethodInfo::new(
                "onItemsChange",
                &["javafx.collections.ListChangeListener$Change<? extends java.lang.String>"],
                "void",
            )),
        TypeInfo::class("com.example.HeaderController")
            .constructor(vec![])
            .method(MethodInfo::new("initialize", &[], "void")),
    ]
}

/// Platform builtins plus a trimmed-down scene graph and controllers.
pub fn component_library() -> TableProvider {
    let mut provider = TableProvider::with_builtins();
    for info in beans()
        .into_iter()
        .chain(collections())
        .chain(events())
        .chain(scene())
        .chain(controls())
        .chain(application())
    {
        provider.insert(info);
    }
    provider
}
