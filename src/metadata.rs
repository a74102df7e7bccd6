//! Component-type metadata.
//!
//! The resolvers never introspect a runtime; they ask a
//! [`TypeMetadataProvider`] for precomputed type tables. [`TableProvider`] is
//! the in-memory implementation, loadable from JSON library tables and
//! seeded with the `java.lang` / `java.util` types every document relies on.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::validate::{CompilerError, ERR_SOURCE_IO};

pub const OBJECT: &str = "java.lang.Object";
pub const STRING: &str = "java.lang.String";
pub const ENUM: &str = "java.lang.Enum";
pub const COLLECTION: &str = "java.util.Collection";
pub const MAP: &str = "java.util.Map";
pub const RESOURCE_BUNDLE: &str = "java.util.ResourceBundle";

// ═══════════════════════════════════════════════════════════════════════════════
// PRIMITIVES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
}

impl Primitive {
    pub const ALL: [Primitive; 8] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
        Primitive::Char,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::Char => "char",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Primitive::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn boxed(self) -> &'static str {
        match self {
            Primitive::Boolean => "java.lang.Boolean",
            Primitive::Byte => "java.lang.Byte",
            Primitive::Short => "java.lang.Short",
            Primitive::Int => "java.lang.Integer",
            Primitive::Long => "java.lang.Long",
            Primitive::Float => "java.lang.Float",
            Primitive::Double => "java.lang.Double",
            Primitive::Char => "java.lang.Character",
        }
    }

    pub fn from_boxed(name: &str) -> Option<Self> {
        Primitive::ALL.into_iter().find(|p| p.boxed() == name)
    }

    /// `parseInt`, `parseDouble`, ... on the boxed type. Characters have none.
    pub fn parse_method(self) -> Option<&'static str> {
        Some(match self {
            Primitive::Boolean => "parseBoolean",
            Primitive::Byte => "parseByte",
            Primitive::Short => "parseShort",
            Primitive::Int => "parseInt",
            Primitive::Long => "parseLong",
            Primitive::Float => "parseFloat",
            Primitive::Double => "parseDouble",
            Primitive::Char => return None,
        })
    }

    pub fn is_floating(self) -> bool {
        matches!(self, Primitive::Float | Primitive::Double)
    }

    /// Widening primitive conversion.
    pub fn widens_to(self, target: Primitive) -> bool {
        use Primitive::*;
        if self == target {
            return true;
        }
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short | Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => target == Double,
            Double | Boolean => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPE REFERENCES
// ═══════════════════════════════════════════════════════════════════════════════

/// A use of a type: primitive, class with type arguments, or array.
///
/// Serialized as Java source text (`java.util.List<javafx.scene.Node>`,
/// `double[]`). Wildcards collapse to their bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    Void,
    Primitive(Primitive),
    Class { name: String, args: Vec<TypeRef> },
    Array(Box<TypeRef>),
}

impl TypeRef {
    pub fn class(name: &str) -> Self {
        TypeRef::Class {
            name: name.to_string(),
            args: vec![],
        }
    }

    pub fn generic(name: &str, args: Vec<TypeRef>) -> Self {
        TypeRef::Class {
            name: name.to_string(),
            args,
        }
    }

    pub fn object() -> Self {
        Self::class(OBJECT)
    }

    pub fn string() -> Self {
        Self::class(STRING)
    }

    pub fn array_of(component: TypeRef) -> Self {
        TypeRef::Array(Box::new(component))
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        let text = text.trim();
        if text.is_empty() {
            return Err("empty type".to_string());
        }
        if let Some(component) = text.strip_suffix("[]") {
            return Ok(TypeRef::array_of(Self::parse(component)?));
        }
        if text == "void" {
            return Ok(TypeRef::Void);
        }
        if text == "?" {
            return Ok(Self::object());
        }
        if let Some(bound) = text
            .strip_prefix("? extends ")
            .or_else(|| text.strip_prefix("? super "))
        {
            return Self::parse(bound);
        }
        if let Some(primitive) = Primitive::from_name(text) {
            return Ok(TypeRef::Primitive(primitive));
        }

        let Some(open) = text.find('<') else {
            return Ok(Self::class(text));
        };
        let inner = text[open + 1..]
            .strip_suffix('>')
            .ok_or_else(|| format!("unbalanced type arguments in '{}'", text))?;

        let mut args = Vec::new();
        let mut depth = 0usize;
        let mut start = 0;
        for (i, c) in inner.char_indices() {
            match c {
                '<' => depth += 1,
                '>' => depth = depth.saturating_sub(1),
                ',' if depth == 0 => {
                    args.push(Self::parse(&inner[start..i])?);
                    start = i + 1;
                }
                _ => {}
            }
        }
        args.push(Self::parse(&inner[start..])?);

        Ok(Self::generic(text[..open].trim(), args))
    }

    pub fn primitive(&self) -> Option<Primitive> {
        match self {
            TypeRef::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeRef::Primitive(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    pub fn component(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(component) => Some(component),
            _ => None,
        }
    }

    pub fn args(&self) -> &[TypeRef] {
        match self {
            TypeRef::Class { args, .. } => args,
            _ => &[],
        }
    }

    /// Class name without type arguments, `None` for primitives and arrays.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeRef::Class { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_class(&self, name: &str) -> bool {
        self.class_name() == Some(name)
    }

    /// Erased form, used as the key for assignability and naming.
    pub fn raw(&self) -> TypeRef {
        match self {
            TypeRef::Class { name, .. } => Self::class(name),
            TypeRef::Array(component) => TypeRef::array_of(component.raw()),
            other => other.clone(),
        }
    }

    /// Primitives become their boxed class; everything else is unchanged.
    pub fn boxed(&self) -> TypeRef {
        match self {
            TypeRef::Primitive(p) => Self::class(p.boxed()),
            other => other.clone(),
        }
    }

    pub fn simple_name(&self) -> String {
        match self {
            TypeRef::Void => "void".to_string(),
            TypeRef::Primitive(p) => p.name().to_string(),
            TypeRef::Class { name, .. } => simple_name(name).to_string(),
            TypeRef::Array(component) => format!("{}Array", component.simple_name()),
        }
    }
}

/// Last segment of a binary class name (`a.b.Outer$Inner` → `Inner`).
pub fn simple_name(name: &str) -> &str {
    name.rsplit(|c| c == '.' || c == '$').next().unwrap_or(name)
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => write!(f, "void"),
            TypeRef::Primitive(p) => write!(f, "{}", p.name()),
            TypeRef::Array(component) => write!(f, "{}[]", component),
            TypeRef::Class { name, args } => {
                write!(f, "{}", name)?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{}", arg)?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
        }
    }
}

impl TryFrom<String> for TypeRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TypeRef::parse(&value)
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPE TABLES
// ═══════════════════════════════════════════════════════════════════════════════

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TypeKind {
    #[default]
    Class,
    Interface,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamInfo {
    /// Named-argument name, present when the parameter can be fed by a property.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Named-argument default literal, blank meaning the zero value.
    #[serde(default)]
    pub default_value: Option<String>,
}

impl ParamInfo {
    pub fn of(ty: &str) -> Self {
        ParamInfo {
            name: None,
            ty: type_ref(ty),
            default_value: None,
        }
    }

    pub fn named(name: &str, ty: &str, default_value: &str) -> Self {
        ParamInfo {
            name: Some(name.to_string()),
            ty: type_ref(ty),
            default_value: Some(default_value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorInfo {
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(default)]
    pub params: Vec<ParamInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInfo {
    pub name: String,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(default)]
    pub params: Vec<ParamInfo>,
    #[serde(default = "void_type")]
    pub returns: TypeRef,
    #[serde(default)]
    pub throws: Vec<String>,
}

fn void_type() -> TypeRef {
    TypeRef::Void
}

impl MethodInfo {
    pub fn new(name: &str, params: &[&str], returns: &str) -> Self {
        MethodInfo {
            name: name.to_string(),
            is_static: false,
            public: true,
            params: params.iter().map(|p| ParamInfo::of(p)).collect(),
            returns: type_ref(returns),
            throws: vec![],
        }
    }

    pub fn static_method(name: &str, params: &[&str], returns: &str) -> Self {
        MethodInfo {
            is_static: true,
            ..Self::new(name, params, returns)
        }
    }

    pub fn throwing(mut self, exception: &str) -> Self {
        self.throws.push(exception.to_string());
        self
    }

    pub fn param_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.params.iter().map(|p| &p.ty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(default)]
    pub is_final: bool,
}

/// Staged construction: `Builder.create().prop(v)...build()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderInfo {
    pub builder: String,
    #[serde(default = "default_create")]
    pub create: String,
    #[serde(default = "default_build")]
    pub build: String,
}

fn default_create() -> String {
    "create".to_string()
}

fn default_build() -> String {
    "build".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInfo {
    pub name: String,
    #[serde(default)]
    pub kind: TypeKind,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub constructors: Vec<ConstructorInfo>,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    #[serde(default)]
    pub enum_constants: Vec<String>,
    #[serde(default)]
    pub default_property: Option<String>,
    #[serde(default)]
    pub builder: Option<BuilderInfo>,
}

impl TypeInfo {
    pub fn class(name: &str) -> Self {
        TypeInfo {
            name: name.to_string(),
            kind: TypeKind::Class,
            is_abstract: false,
            superclass: None,
            interfaces: vec![],
            constructors: vec![],
            methods: vec![],
            fields: vec![],
            enum_constants: vec![],
            default_property: None,
            builder: None,
        }
    }

    pub fn interface(name: &str) -> Self {
        TypeInfo {
            kind: TypeKind::Interface,
            ..Self::class(name)
        }
    }

    pub fn enumeration(name: &str, constants: &[&str]) -> Self {
        TypeInfo {
            kind: TypeKind::Enum,
            enum_constants: constants.iter().map(|c| c.to_string()).collect(),
            ..Self::class(name)
        }
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        self.interfaces.push(interface.to_string());
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn constructor(mut self, params: Vec<ParamInfo>) -> Self {
        self.constructors.push(ConstructorInfo {
            public: true,
            params,
        });
        self
    }

    pub fn method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn field(mut self, name: &str, ty: &str, is_static: bool) -> Self {
        self.fields.push(FieldInfo {
            name: name.to_string(),
            ty: type_ref(ty),
            is_static,
            public: true,
            is_final: is_static,
        });
        self
    }

    pub fn default_property(mut self, property: &str) -> Self {
        self.default_property = Some(property.to_string());
        self
    }

    pub fn built_by(mut self, builder: &str) -> Self {
        self.builder = Some(BuilderInfo {
            builder: builder.to_string(),
            create: default_create(),
            build: default_build(),
        });
        self
    }

    /// Direct supertypes, with the implicit `Object`/`Enum` parents filled in.
    pub fn supertypes(&self) -> Vec<String> {
        let mut supertypes = Vec::new();
        match (&self.superclass, self.kind) {
            (Some(superclass), _) => supertypes.push(superclass.clone()),
            (None, TypeKind::Enum) => supertypes.push(ENUM.to_string()),
            (None, _) if self.name != OBJECT => supertypes.push(OBJECT.to_string()),
            _ => {}
        }
        supertypes.extend(self.interfaces.iter().cloned());
        supertypes
    }
}

/// Parses a type written in builder helpers. Panics are avoided by falling
/// back to a raw class name for text the parser rejects.
fn type_ref(text: &str) -> TypeRef {
    TypeRef::parse(text).unwrap_or_else(|_| TypeRef::class(text))
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROVIDERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-only source of component-type metadata, shared across parallel
/// document compilations.
pub trait TypeMetadataProvider: Send + Sync {
    fn find_type(&self, name: &str) -> Option<&TypeInfo>;

    /// Packages every document imports implicitly.
    fn implicit_imports(&self) -> Vec<String> {
        vec!["java.lang.*".to_string()]
    }

    /// Stable digest of the metadata, part of incremental cache keys.
    fn fingerprint(&self) -> String {
        String::new()
    }
}

/// On-disk JSON form of a component library.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LibraryTable {
    #[serde(default)]
    pub implicit_imports: Vec<String>,
    #[serde(default)]
    pub types: Vec<TypeInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct TableProvider {
    types: HashMap<String, TypeInfo>,
    implicit_imports: Vec<String>,
}

impl TableProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider pre-populated with the platform types.
    pub fn with_builtins() -> Self {
        let mut provider = Self::new();
        provider.implicit_imports.push("java.lang.*".to_string());
        for info in builtin_types() {
            provider.insert(info);
        }
        provider
    }

    pub fn insert(&mut self, info: TypeInfo) {
        self.types.insert(info.name.clone(), info);
    }

    pub fn extend(&mut self, table: LibraryTable) {
        for import in table.implicit_imports {
            if !self.implicit_imports.contains(&import) {
                self.implicit_imports.push(import);
            }
        }
        for info in table.types {
            self.insert(info);
        }
    }

    pub fn extend_from_json(&mut self, json: &str) -> Result<(), CompilerError> {
        let table: LibraryTable = serde_json::from_str(json).map_err(|e| {
            CompilerError::new(ERR_SOURCE_IO, format!("Invalid library table: {}", e))
        })?;
        self.extend(table);
        Ok(())
    }

    pub fn load(&mut self, path: &Path) -> Result<(), CompilerError> {
        let json = fs::read_to_string(path).map_err(|e| {
            CompilerError::new(
                ERR_SOURCE_IO,
                format!("Failed to read library table {}: {}", path.display(), e),
            )
        })?;
        self.extend_from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeMetadataProvider for TableProvider {
    fn find_type(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }

    fn implicit_imports(&self) -> Vec<String> {
        if self.implicit_imports.is_empty() {
            vec!["java.lang.*".to_string()]
        } else {
            self.implicit_imports.clone()
        }
    }

    fn fingerprint(&self) -> String {
        let mut names: Vec<&String> = self.types.keys().collect();
        names.sort();
        let mut hasher = Sha256::new();
        for name in names {
            if let Ok(json) = serde_json::to_string(&self.types[name]) {
                hasher.update(json.as_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILT-IN PLATFORM TYPES
// ═══════════════════════════════════════════════════════════════════════════════

fn boxed_numeric(primitive: Primitive) -> TypeInfo {
    let boxed = primitive.boxed();
    let mut info = TypeInfo::class(boxed)
        .extends("java.lang.Number")
        .implements("java.lang.Comparable")
        .method(MethodInfo::static_method("valueOf", &[STRING], boxed))
        .field("MIN_VALUE", primitive.name(), true)
        .field("MAX_VALUE", primitive.name(), true);
    if let Some(parse) = primitive.parse_method() {
        info = info.method(MethodInfo::static_method(parse, &[STRING], primitive.name()));
    }
    if primitive.is_floating() {
        info = info
            .field("POSITIVE_INFINITY", primitive.name(), true)
            .field("NEGATIVE_INFINITY", primitive.name(), true)
            .field("NaN", primitive.name(), true);
    }
    info
}

fn builtin_types() -> Vec<TypeInfo> {
    let mut types = vec![
        TypeInfo::class(OBJECT)
            .constructor(vec![])
            .method(MethodInfo::new("toString", &[], STRING))
            .method(MethodInfo::new("equals", &[OBJECT], "boolean"))
            .method(MethodInfo::new("hashCode", &[], "int")),
        TypeInfo::interface("java.lang.CharSequence"),
        TypeInfo::interface("java.lang.Comparable"),
        TypeInfo::interface("java.lang.Iterable"),
        TypeInfo::interface("java.lang.Runnable").method(MethodInfo::new("run", &[], "void")),
        TypeInfo::class(STRING)
            .implements("java.lang.CharSequence")
            .implements("java.lang.Comparable")
            .constructor(vec![])
            .constructor(vec![ParamInfo::of(STRING)])
            .method(MethodInfo::static_method("valueOf", &[OBJECT], STRING))
            .method(MethodInfo::new("length", &[], "int"))
            .method(MethodInfo::new("concat", &[STRING], STRING)),
        TypeInfo::class("java.lang.Number").abstract_class(),
        TypeInfo::class("java.lang.Boolean")
            .implements("java.lang.Comparable")
            .method(MethodInfo::static_method("parseBoolean", &[STRING], "boolean"))
            .method(MethodInfo::static_method("valueOf", &[STRING], "java.lang.Boolean"))
            .field("TRUE", "java.lang.Boolean", true)
            .field("FALSE", "java.lang.Boolean", true),
        TypeInfo::class("java.lang.Character")
            .implements("java.lang.Comparable")
            .method(MethodInfo::static_method("valueOf", &["char"], "java.lang.Character")),
        TypeInfo::class(ENUM)
            .abstract_class()
            .implements("java.lang.Comparable")
            .method(MethodInfo::new("name", &[], STRING)),
        TypeInfo::class("java.lang.Class"),
        TypeInfo::class("java.lang.Throwable"),
        TypeInfo::class("java.lang.Exception").extends("java.lang.Throwable"),
        TypeInfo::class("java.lang.RuntimeException")
            .extends("java.lang.Exception")
            .constructor(vec![ParamInfo::of("java.lang.Throwable")]),
        TypeInfo::interface(COLLECTION)
            .implements("java.lang.Iterable")
            .method(MethodInfo::new("add", &[OBJECT], "boolean"))
            .method(MethodInfo::new("size", &[], "int")),
        TypeInfo::interface("java.util.List").implements(COLLECTION),
        TypeInfo::interface("java.util.Set").implements(COLLECTION),
        TypeInfo::interface(MAP).method(MethodInfo::new("put", &[OBJECT, OBJECT], OBJECT)),
        TypeInfo::class("java.util.ArrayList")
            .implements("java.util.List")
            .constructor(vec![]),
        TypeInfo::class("java.util.HashSet")
            .implements("java.util.Set")
            .constructor(vec![]),
        TypeInfo::class("java.util.HashMap").implements(MAP).constructor(vec![]),
        TypeInfo::class(RESOURCE_BUNDLE)
            .abstract_class()
            .method(MethodInfo::new("getString", &[STRING], STRING))
            .method(MethodInfo::static_method("getBundle", &[STRING], RESOURCE_BUNDLE)),
        TypeInfo::interface("java.util.function.Function"),
        TypeInfo::interface("java.util.function.Supplier"),
        TypeInfo::class("java.net.URL").method(MethodInfo::new("getPath", &[], STRING)),
    ];
    for primitive in [
        Primitive::Byte,
        Primitive::Short,
        Primitive::Int,
        Primitive::Long,
        Primitive::Float,
        Primitive::Double,
    ] {
        types.push(boxed_numeric(primitive));
    }
    types
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generic_type() {
        let ty = TypeRef::parse("java.util.Map<java.lang.String, java.util.List<int[]>>").unwrap();
        assert_eq!(
            ty,
            TypeRef::generic(
                MAP,
                vec![
                    TypeRef::string(),
                    TypeRef::generic(
                        "java.util.List",
                        vec![TypeRef::array_of(TypeRef::Primitive(Primitive::Int))]
                    )
                ]
            )
        );
        assert_eq!(
            ty.to_string(),
            "java.util.Map<java.lang.String, java.util.List<int[]>>"
        );
    }

    #[test]
    fn test_wildcards_collapse_to_bound() {
        let ty = TypeRef::parse("javafx.event.EventHandler<? super javafx.event.ActionEvent>").unwrap();
        assert_eq!(ty.args(), &[TypeRef::class("javafx.event.ActionEvent")]);
    }

    #[test]
    fn test_simple_name_handles_nested_classes() {
        assert_eq!(simple_name("javafx.collections.ListChangeListener$Change"), "Change");
        assert_eq!(TypeRef::parse("int[]").unwrap().simple_name(), "intArray");
    }

    #[test]
    fn test_widening() {
        assert!(Primitive::Int.widens_to(Primitive::Double));
        assert!(Primitive::Char.widens_to(Primitive::Int));
        assert!(!Primitive::Double.widens_to(Primitive::Float));
        assert!(!Primitive::Boolean.widens_to(Primitive::Int));
    }

    #[test]
    fn test_library_table_from_json() {
        let mut provider = TableProvider::with_builtins();
        provider
            .extend_from_json(
                r#"{
                    "types": [{
                        "name": "com.example.Gauge",
                        "superclass": "java.lang.Object",
                        "constructors": [{"params": [{"name": "max", "type": "double", "defaultValue": "100"}]}],
                        "methods": [{"name": "setValue", "params": [{"type": "double"}]}]
                    }]
                }"#,
            )
            .unwrap();
        let gauge = provider.find_type("com.example.Gauge").unwrap();
        assert_eq!(gauge.constructors[0].params[0].name.as_deref(), Some("max"));
        assert!(gauge.methods[0].public);
        assert!(gauge.methods[0].returns.is_void());
        assert!(provider.find_type("java.lang.Double").is_some());
    }

    #[test]
    fn test_fingerprint_changes_with_types() {
        let mut provider = TableProvider::with_builtins();
        let before = provider.fingerprint();
        provider.insert(TypeInfo::class("com.example.Extra"));
        assert_ne!(before, provider.fingerprint());
    }
}
