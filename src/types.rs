//! Class and member resolution against the metadata provider.
//!
//! Class names resolve through the document's imports plus the provider's
//! implicit packages. Member lookups walk the superclass and interface chain
//! nearest-first, so an override shadows its parent.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::metadata::{
    ConstructorInfo, FieldInfo, MethodInfo, Primitive, TypeInfo, TypeKind, TypeMetadataProvider,
    TypeRef, BuilderInfo, COLLECTION, MAP, OBJECT,
};
use crate::names::capitalize;
use crate::validate::CompilerError;

pub struct TypeResolver<'a> {
    provider: &'a dyn TypeMetadataProvider,
    /// Simple name → qualified name, from single-class imports.
    explicit: HashMap<String, String>,
    /// Package prefixes from `pkg.*` imports, implicit ones first.
    wildcards: Vec<String>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(provider: &'a dyn TypeMetadataProvider) -> Self {
        let mut resolver = TypeResolver {
            provider,
            explicit: HashMap::new(),
            wildcards: Vec::new(),
        };
        for import in provider.implicit_imports() {
            if let Some(prefix) = import.strip_suffix(".*") {
                resolver.add_wildcard(prefix);
            }
        }
        resolver
    }

    fn add_wildcard(&mut self, prefix: &str) {
        if !self.wildcards.iter().any(|w| w == prefix) {
            self.wildcards.push(prefix.to_string());
        }
    }

    pub fn add_import(&mut self, import: &str) -> Result<(), CompilerError> {
        let import = import.trim();
        if let Some(prefix) = import.strip_suffix(".*") {
            self.add_wildcard(prefix);
            return Ok(());
        }

        let simple = import.rsplit('.').next().unwrap_or(import).to_string();
        match self.explicit.get(&simple) {
            Some(existing) if existing != import => Err(CompilerError::class_resolution(format!(
                "Ambiguous import of '{}': both {} and {} are imported",
                simple, existing, import
            ))),
            _ => {
                self.explicit.insert(simple, import.to_string());
                Ok(())
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CLASS RESOLUTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Looks a canonical name up, retrying nested-class spellings
    /// (`a.Outer.Inner` → `a.Outer$Inner`).
    fn lookup_binary(&self, name: &str) -> Option<&'a TypeInfo> {
        let mut candidate = name.to_string();
        loop {
            if let Some(info) = self.provider.find_type(&candidate) {
                return Some(info);
            }
            let index = candidate.rfind('.')?;
            candidate.replace_range(index..index + 1, "$");
        }
    }

    fn lookup_simple(&self, simple: &str) -> Result<Option<&'a TypeInfo>, CompilerError> {
        if let Some(qualified) = self.explicit.get(simple) {
            return Ok(self.lookup_binary(qualified));
        }

        let mut matches: Vec<&'a TypeInfo> = Vec::new();
        for prefix in &self.wildcards {
            if let Some(info) = self.lookup_binary(&format!("{}.{}", prefix, simple)) {
                if !matches.iter().any(|m| m.name == info.name) {
                    matches.push(info);
                }
            }
        }
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0])),
            _ => Err(CompilerError::class_resolution(format!(
                "Ambiguous class name '{}': matches {}",
                simple,
                matches
                    .iter()
                    .map(|m| m.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }

    pub fn resolve_info(&self, name: &str) -> Result<&'a TypeInfo, CompilerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CompilerError::class_resolution("Class name must not be blank"));
        }

        if let Some(info) = self.lookup_binary(name) {
            return Ok(info);
        }

        let (head, tail) = match name.find('.') {
            Some(index) => (&name[..index], Some(&name[index + 1..])),
            None => (name, None),
        };
        if let Some(outer) = self.lookup_simple(head)? {
            match tail {
                None => return Ok(outer),
                Some(tail) => {
                    let nested = format!("{}${}", outer.name, tail.replace('.', "$"));
                    if let Some(info) = self.provider.find_type(&nested) {
                        return Ok(info);
                    }
                }
            }
        }

        Err(CompilerError::class_resolution(format!(
            "Cannot resolve class '{}'",
            name
        ))
        .with_hint("Add an <?import?> instruction or load the library table declaring it"))
    }

    /// Resolves a class name to a raw type reference.
    pub fn resolve(&self, name: &str) -> Result<TypeRef, CompilerError> {
        if let Some(primitive) = Primitive::from_name(name.trim()) {
            return Ok(TypeRef::Primitive(primitive));
        }
        self.resolve_info(name).map(|info| TypeRef::class(&info.name))
    }

    pub fn info(&self, ty: &TypeRef) -> Option<&'a TypeInfo> {
        ty.class_name().and_then(|name| self.provider.find_type(name))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // HIERARCHY
    // ═══════════════════════════════════════════════════════════════════════════

    /// The type and all its supertypes, nearest first.
    fn hierarchy(&self, name: &str) -> Vec<&'a TypeInfo> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([name.to_string()]);
        let mut chain = Vec::new();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(info) = self.provider.find_type(&current) {
                queue.extend(info.supertypes());
                chain.push(info);
            }
        }
        chain
    }

    fn is_subclass(&self, source: &str, target: &str) -> bool {
        if source == target || target == OBJECT {
            return true;
        }
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([source.to_string()]);
        while let Some(current) = queue.pop_front() {
            if current == target {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(info) = self.provider.find_type(&current) {
                queue.extend(info.supertypes());
            }
        }
        false
    }

    /// Reference assignability (`target = source` without conversions).
    pub fn is_assignable(&self, target: &TypeRef, source: &TypeRef) -> bool {
        match (target, source) {
            (_, TypeRef::Void) | (TypeRef::Void, _) => false,
            (TypeRef::Primitive(t), TypeRef::Primitive(s)) => t == s,
            (TypeRef::Primitive(_), _) | (_, TypeRef::Primitive(_)) => false,
            (TypeRef::Array(t), TypeRef::Array(s)) => match (t.as_ref(), s.as_ref()) {
                (TypeRef::Primitive(tp), TypeRef::Primitive(sp)) => tp == sp,
                _ => self.is_assignable(t, s),
            },
            (TypeRef::Class { name, .. }, TypeRef::Array(_)) => name == OBJECT,
            (TypeRef::Array(_), TypeRef::Class { .. }) => false,
            (TypeRef::Class { name: t, .. }, TypeRef::Class { name: s, .. }) => {
                self.is_subclass(s, t)
            }
        }
    }

    /// Method-invocation compatibility: assignability plus primitive widening
    /// and boxing conversions.
    pub fn is_invocation_compatible(&self, param: &TypeRef, arg: &TypeRef) -> bool {
        if self.is_assignable(param, arg) {
            return true;
        }
        match (param, arg) {
            (TypeRef::Primitive(p), TypeRef::Primitive(a)) => a.widens_to(*p),
            (TypeRef::Primitive(p), TypeRef::Class { name, .. }) => Primitive::from_boxed(name)
                .map(|a| a.widens_to(*p))
                .unwrap_or(false),
            (_, TypeRef::Primitive(_)) => self.is_assignable(param, &arg.boxed()),
            _ => false,
        }
    }

    pub fn is_collection(&self, ty: &TypeRef) -> bool {
        self.is_assignable(&TypeRef::class(COLLECTION), ty)
    }

    pub fn is_map(&self, ty: &TypeRef) -> bool {
        self.is_assignable(&TypeRef::class(MAP), ty)
    }

    pub fn is_enum(&self, ty: &TypeRef) -> bool {
        self.info(ty).map(|info| info.kind == TypeKind::Enum).unwrap_or(false)
    }

    pub fn enum_constant(&self, ty: &TypeRef, name: &str) -> bool {
        self.info(ty)
            .map(|info| info.enum_constants.iter().any(|c| c == name))
            .unwrap_or(false)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MEMBERS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Public methods visible on the type, overrides shadowing their parents.
    pub fn methods(&self, ty: &TypeRef) -> Vec<&'a MethodInfo> {
        let Some(name) = ty.class_name() else {
            return vec![];
        };
        let mut seen: HashSet<(String, Vec<TypeRef>)> = HashSet::new();
        let mut methods = Vec::new();
        for info in self.hierarchy(name) {
            for method in info.methods.iter().filter(|m| m.public) {
                let key = (method.name.clone(), method.param_types().cloned().collect());
                if seen.insert(key) {
                    methods.push(method);
                }
            }
        }
        methods
    }

    fn find_method_where(
        &self,
        ty: &TypeRef,
        predicate: impl Fn(&MethodInfo) -> bool,
    ) -> Option<&'a MethodInfo> {
        self.methods(ty).into_iter().find(|m| predicate(m))
    }

    pub fn find_setter(&self, ty: &TypeRef, property: &str) -> Option<&'a MethodInfo> {
        let name = format!("set{}", capitalize(property));
        self.find_method_where(ty, |m| !m.is_static && m.name == name && m.params.len() == 1)
    }

    pub fn find_getter(&self, ty: &TypeRef, property: &str) -> Option<&'a MethodInfo> {
        let capitalized = capitalize(property);
        let get = format!("get{}", capitalized);
        let is = format!("is{}", capitalized);
        self.find_method_where(ty, |m| {
            !m.is_static
                && m.params.is_empty()
                && !m.returns.is_void()
                && (m.name == get || m.name == is)
        })
    }

    /// `<property>Property()` accessor of an observable property.
    pub fn find_property_method(&self, ty: &TypeRef, property: &str) -> Option<&'a MethodInfo> {
        let name = format!("{}Property", property);
        self.find_method_where(ty, |m| !m.is_static && m.name == name && m.params.is_empty())
    }

    pub fn find_static_setter(&self, owner: &TypeRef, property: &str) -> Option<&'a MethodInfo> {
        let name = format!("set{}", capitalize(property));
        self.find_method_where(owner, |m| m.is_static && m.name == name && m.params.len() == 2)
    }

    pub fn find_no_arg_method(&self, ty: &TypeRef, name: &str) -> Option<&'a MethodInfo> {
        self.find_method_where(ty, |m| !m.is_static && m.name == name && m.params.is_empty())
    }

    pub fn find_static_no_arg_method(&self, ty: &TypeRef, name: &str) -> Option<&'a MethodInfo> {
        self.find_method_where(ty, |m| m.is_static && m.name == name && m.params.is_empty())
    }

    /// First method named `name` whose parameters accept `args`.
    pub fn find_compatible_method(
        &self,
        ty: &TypeRef,
        name: &str,
        is_static: bool,
        args: &[TypeRef],
    ) -> Option<&'a MethodInfo> {
        self.find_method_where(ty, |m| {
            m.is_static == is_static
                && m.name == name
                && m.params.len() == args.len()
                && m
                    .param_types()
                    .zip(args)
                    .all(|(param, arg)| self.is_invocation_compatible(param, arg))
        })
    }

    /// Methods named `name` taking exactly the given number of parameters.
    pub fn find_methods(&self, ty: &TypeRef, name: &str, arity: usize) -> Vec<&'a MethodInfo> {
        self.methods(ty)
            .into_iter()
            .filter(|m| !m.is_static && m.name == name && m.params.len() == arity)
            .collect()
    }

    pub fn find_field(&self, ty: &TypeRef, name: &str) -> Option<&'a FieldInfo> {
        let class_name = ty.class_name()?;
        self.hierarchy(class_name)
            .into_iter()
            .flat_map(|info| info.fields.iter())
            .find(|f| f.public && !f.is_static && f.name == name)
    }

    pub fn find_static_field(&self, ty: &TypeRef, name: &str) -> Option<&'a FieldInfo> {
        let class_name = ty.class_name()?;
        self.hierarchy(class_name)
            .into_iter()
            .flat_map(|info| info.fields.iter())
            .find(|f| f.public && f.is_static && f.name == name)
    }

    /// Whether a property can be assigned or mutated through its getter.
    pub fn property_is_mutable(&self, ty: &TypeRef, property: &str) -> bool {
        if self.is_map(ty) || self.find_setter(ty, property).is_some() {
            return true;
        }
        self.find_getter(ty, property)
            .map(|getter| self.is_collection(&getter.returns) || self.is_map(&getter.returns))
            .unwrap_or(false)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONSTRUCTION
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn constructors(&self, ty: &TypeRef) -> Vec<&'a ConstructorInfo> {
        self.info(ty)
            .map(|info| info.constructors.iter().filter(|c| c.public).collect())
            .unwrap_or_default()
    }

    pub fn has_default_constructor(&self, ty: &TypeRef) -> bool {
        self.info(ty).map(|info| !info.is_abstract && info.kind == TypeKind::Class).unwrap_or(false)
            && self.constructors(ty).iter().any(|c| c.params.is_empty())
    }

    /// A single-argument constructor accepting the type itself.
    pub fn has_copy_constructor(&self, ty: &TypeRef) -> bool {
        self.constructors(ty)
            .iter()
            .any(|c| c.params.len() == 1 && self.is_assignable(&c.params[0].ty, ty))
    }

    /// Constructors whose every parameter is named, the only ones properties
    /// can feed. A no-arg constructor qualifies.
    pub fn named_constructors(&self, ty: &TypeRef) -> Vec<&'a ConstructorInfo> {
        self.constructors(ty)
            .into_iter()
            .filter(|c| c.params.iter().all(|p| p.name.is_some()))
            .collect()
    }

    pub fn default_property(&self, ty: &TypeRef) -> Option<&'a str> {
        let name = ty.class_name()?;
        self.hierarchy(name)
            .into_iter()
            .find_map(|info| info.default_property.as_deref())
    }

    pub fn builder(&self, ty: &TypeRef) -> Option<&'a BuilderInfo> {
        self.info(ty).and_then(|info| info.builder.as_ref())
    }

    /// Type argument `index` of a parameterized type, `Object` when erased.
    pub fn type_argument(&self, ty: &TypeRef, index: usize) -> TypeRef {
        ty.args().get(index).cloned().unwrap_or_else(TypeRef::object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ParamInfo, TableProvider};

    fn provider() -> TableProvider {
        let mut provider = TableProvider::with_builtins();
        provider.insert(
            TypeInfo::class("javafx.scene.Node")
                .abstract_class()
                .method(MethodInfo::new("setId", &["java.lang.String"], "void")),
        );
        provider.insert(
            TypeInfo::class("javafx.scene.control.Label")
                .extends("javafx.scene.Node")
                .constructor(vec![])
                .constructor(vec![ParamInfo::named("text", "java.lang.String", "")])
                .method(MethodInfo::new("setText", &["java.lang.String"], "void"))
                .method(MethodInfo::new("getText", &[], "java.lang.String")),
        );
        provider.insert(
            TypeInfo::class("com.a.Point")
                .constructor(vec![ParamInfo::of("double"), ParamInfo::of("double")])
                .constructor(vec![
                    ParamInfo::named("x", "double", "0"),
                    ParamInfo::named("y", "double", "0"),
                ]),
        );
        provider.insert(TypeInfo::class("com.a.Shape"));
        provider.insert(TypeInfo::class("com.b.Shape"));
        provider.insert(TypeInfo::class("com.a.Outer"));
        provider.insert(TypeInfo::enumeration("com.a.Outer$Kind", &["ONE"]));
        provider
    }

    #[test]
    fn test_import_resolution_order() {
        let provider = provider();
        let mut resolver = TypeResolver::new(&provider);
        resolver.add_import("javafx.scene.control.*").unwrap();
        assert_eq!(
            resolver.resolve("Label").unwrap(),
            TypeRef::class("javafx.scene.control.Label")
        );
        assert_eq!(resolver.resolve("String").unwrap(), TypeRef::string());
        assert_eq!(
            resolver.resolve("javafx.scene.control.Label").unwrap(),
            TypeRef::class("javafx.scene.control.Label")
        );
    }

    #[test]
    fn test_wildcard_ambiguity_is_fatal() {
        let provider = provider();
        let mut resolver = TypeResolver::new(&provider);
        resolver.add_import("com.a.*").unwrap();
        resolver.add_import("com.b.*").unwrap();
        let err = resolver.resolve("Shape").unwrap_err();
        assert_eq!(err.code, crate::validate::ERR_CLASS_RESOLUTION);
        assert!(err.message.contains("Ambiguous"));
    }

    #[test]
    fn test_explicit_import_conflict() {
        let provider = provider();
        let mut resolver = TypeResolver::new(&provider);
        resolver.add_import("com.a.Shape").unwrap();
        assert!(resolver.add_import("com.b.Shape").is_err());
    }

    #[test]
    fn test_nested_class_resolution() {
        let provider = provider();
        let mut resolver = TypeResolver::new(&provider);
        resolver.add_import("com.a.Outer").unwrap();
        assert_eq!(
            resolver.resolve("Outer.Kind").unwrap(),
            TypeRef::class("com.a.Outer$Kind")
        );
        assert_eq!(
            resolver.resolve("com.a.Outer.Kind").unwrap(),
            TypeRef::class("com.a.Outer$Kind")
        );
    }

    #[test]
    fn test_inherited_members_and_assignability() {
        let provider = provider();
        let resolver = TypeResolver::new(&provider);
        let label = TypeRef::class("javafx.scene.control.Label");
        assert!(resolver.find_setter(&label, "id").is_some());
        assert!(resolver.find_getter(&label, "text").is_some());
        assert!(resolver.is_assignable(&TypeRef::class("javafx.scene.Node"), &label));
        assert!(resolver.is_assignable(&TypeRef::object(), &label));
        assert!(!resolver.is_assignable(&label, &TypeRef::class("javafx.scene.Node")));
        assert!(resolver.has_default_constructor(&label));
        assert_eq!(resolver.named_constructors(&label).len(), 2);
    }

    #[test]
    fn test_named_constructors_skip_positional_parameters() {
        let provider = provider();
        let resolver = TypeResolver::new(&provider);
        let point = TypeRef::class("com.a.Point");
        assert_eq!(resolver.constructors(&point).len(), 2);
        let named = resolver.named_constructors(&point);
        assert_eq!(named.len(), 1);
        assert_eq!(named[0].params[0].name.as_deref(), Some("x"));
        assert!(!resolver.has_default_constructor(&point));
    }

    #[test]
    fn test_invocation_compatibility() {
        let provider = provider();
        let resolver = TypeResolver::new(&provider);
        let double = TypeRef::Primitive(Primitive::Double);
        assert!(resolver.is_invocation_compatible(&double, &TypeRef::Primitive(Primitive::Int)));
        assert!(resolver.is_invocation_compatible(&double, &TypeRef::class("java.lang.Integer")));
        assert!(resolver.is_invocation_compatible(&TypeRef::object(), &double));
        assert!(!resolver.is_invocation_compatible(&TypeRef::string(), &double));
    }
}
