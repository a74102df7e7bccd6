//! Code generator.
//!
//! Walks a classified document depth-first and lowers every declaration to
//! ordered construction statements. Per node the order is fixed:
//! initialization, defined children, default property, instance properties,
//! static properties, then event handlers. Generation is a single pass, so an
//! id has to be declared before anything refers to it.

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::bind::{is_observable, resolve_expression, OBSERVABLE_VALUE};
use crate::classify::{
    classify_document, Attribute, Declaration, Element, Initializer, PropertyElement, DEFAULT_CHARSET,
};
use crate::code::{CodeValue, Statement};
use crate::context::{CompileEnv, ResolverContext, CONTROLLER, CONTROLLER_FACTORY, PROVIDED_ROOT, RESOURCES};
use crate::metadata::{ConstructorInfo, MethodInfo, TypeRef, RESOURCE_BUNDLE, STRING};
use crate::names::{capitalize, decapitalize};
use crate::parse::parse_markup;
use crate::syntax::{Handler, Value};
use crate::unit::ClassIdentity;
use crate::validate::CompilerError;

pub const EVENT_HANDLER: &str = "javafx.event.EventHandler";
pub const INITIALIZE: &str = "initialize";
pub const SET_ROOT: &str = "setRoot";
const ON_CHANGE: &str = "onChange";
const EXCEPTION: &str = "java.lang.Exception";
const RUNTIME_EXCEPTION: &str = "java.lang.RuntimeException";

/// Observable containers and the change type their listeners receive.
const COLLECTION_LISTENERS: [(&str, &str); 3] = [
    ("javafx.collections.ObservableList", "javafx.collections.ListChangeListener$Change"),
    ("javafx.collections.ObservableSet", "javafx.collections.SetChangeListener$Change"),
    ("javafx.collections.ObservableMap", "javafx.collections.MapChangeListener$Change"),
];

lazy_static! {
    static ref CHANGE_EVENT: Regex = Regex::new(r"^on(\w+)Change$").unwrap();
    static ref LIST_SEPARATOR: Regex = Regex::new(r",\s*").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything the unit emitter needs from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDocument {
    pub path: String,
    pub identity: ClassIdentity,
    pub root_type: TypeRef,
    pub controller_type: Option<TypeRef>,
    /// Whether `setController` may fall back to the no-arg constructor.
    pub controller_constructible: bool,
    pub statements: Vec<Statement>,
    /// Documents included directly or transitively.
    pub dependencies: Vec<String>,
}

/// Identifier and type of a generated node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCode {
    pub identifier: String,
    pub ty: TypeRef,
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOCUMENT ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Loads and generates a document. `Ok(None)` means the document opted out
/// with `<?compile false?>`.
pub fn generate_document<'a>(
    env: &'a CompileEnv<'a>,
    path: &str,
    include_stack: Vec<String>,
) -> Result<Option<GeneratedDocument>, CompilerError> {
    generate_encoded_document(env, path, DEFAULT_CHARSET, include_stack)
}

/// Like `generate_document`, reading the source in `charset`.
pub fn generate_encoded_document<'a>(
    env: &'a CompileEnv<'a>,
    path: &str,
    charset: &str,
    include_stack: Vec<String>,
) -> Result<Option<GeneratedDocument>, CompilerError> {
    let source = env.loader.load_with_charset(path, charset)?;
    generate_source(env, path, &source, include_stack)
}

pub fn generate_source<'a>(
    env: &'a CompileEnv<'a>,
    path: &str,
    source: &str,
    include_stack: Vec<String>,
) -> Result<Option<GeneratedDocument>, CompilerError> {
    debug!("Generating {}", path);
    generate_inner(env, path, source, include_stack).map_err(|e| e.in_file(path))
}

fn generate_inner<'a>(
    env: &'a CompileEnv<'a>,
    path: &str,
    source: &str,
    include_stack: Vec<String>,
) -> Result<Option<GeneratedDocument>, CompilerError> {
    let parsed = parse_markup(source, path)?;
    let document = classify_document(&parsed)?;
    if !document.compile {
        debug!("Skipping {}: compilation disabled", path);
        return Ok(None);
    }

    let mut ctx = ResolverContext::new(env, path, include_stack);
    for import in &document.imports {
        ctx.types.add_import(import)?;
    }
    let controller_type = document
        .controller_type
        .as_deref()
        .map(|name| ctx.types.resolve(name))
        .transpose()?;
    ctx.register_builtins(controller_type.clone())?;

    let mut generator = Generator::new(&mut ctx);
    let root = generator.build_declaration(&document.root)?;
    generator.push(Statement::expression(CodeValue::MethodCall {
        target: None,
        method: SET_ROOT.to_string(),
        args: vec![CodeValue::var(&root.identifier)],
    }));
    let dependencies = generator.dependencies;
    let mut statements = generator.statements;

    let controller_constructible = match &controller_type {
        Some(controller) => {
            if ctx.types.find_no_arg_method(controller, INITIALIZE).is_some() {
                statements.push(Statement::expression(CodeValue::call(
                    CodeValue::var(CONTROLLER),
                    INITIALIZE,
                    vec![],
                )));
            }
            ctx.types.has_default_constructor(controller)
        }
        None => true,
    };

    Ok(Some(GeneratedDocument {
        path: path.to_string(),
        identity: ClassIdentity::for_document(&env.root_package, path),
        root_type: root.ty,
        controller_type,
        controller_constructible,
        statements,
        dependencies,
    }))
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE STATE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
enum PropertySource<'d> {
    Attribute(&'d Value),
    Element(&'d PropertyElement),
}

#[derive(Clone, Copy)]
enum StaticSource<'d> {
    Attribute {
        owner: &'d str,
        name: &'d str,
        value: &'d Value,
    },
    Element(&'d PropertyElement),
}

/// A declaration's content sorted into the buckets processed in order.
struct NodeParts<'d> {
    id: Option<&'d str>,
    properties: Vec<(&'d str, PropertySource<'d>)>,
    statics: Vec<StaticSource<'d>>,
    handlers: Vec<(&'d str, &'d Handler)>,
    defined: Vec<&'d Declaration>,
    children: Vec<&'d Declaration>,
    text: &'d Value,
}

fn collect_parts(declaration: &Declaration) -> Result<NodeParts<'_>, CompilerError> {
    let content = &declaration.content;
    let mut parts = NodeParts {
        id: content.id(),
        properties: Vec::new(),
        statics: Vec::new(),
        handlers: Vec::new(),
        defined: Vec::new(),
        children: Vec::new(),
        text: &content.text,
    };

    for attribute in &content.attributes {
        match attribute {
            Attribute::InstanceProperty { name, value } => {
                parts.properties.push((name.as_str(), PropertySource::Attribute(value)))
            }
            Attribute::StaticProperty { owner, name, value } => parts.statics.push(StaticSource::Attribute {
                owner: owner.as_str(),
                name: name.as_str(),
                value,
            }),
            Attribute::EventHandler { name, handler } => parts.handlers.push((name.as_str(), handler)),
            _ => {}
        }
    }

    for child in &content.children {
        match child {
            Element::InstanceProperty(property) => {
                if parts.properties.iter().any(|(name, _)| *name == property.name) {
                    return Err(CompilerError::structural(format!(
                        "Property '{}' is set more than once",
                        property.name
                    ))
                    .at_node(&property.location.path));
                }
                parts
                    .properties
                    .push((property.name.as_str(), PropertySource::Element(property)));
            }
            Element::StaticProperty(property) => parts.statics.push(StaticSource::Element(property)),
            Element::Define { children, .. } => parts.defined.extend(children.iter()),
            Element::Declaration(declaration) => parts.children.push(declaration),
            Element::Script { location, .. } => {
                return Err(CompilerError::unsupported("Scripts are not supported").at_node(&location.path))
            }
        }
    }

    Ok(parts)
}

/// Per-node generation state.
struct ObjectNode<'d> {
    identifier: String,
    ty: TypeRef,
    /// Type arguments learned from the controller member the node is
    /// injected into.
    type_args: Vec<TypeRef>,
    properties: Vec<(&'d str, PropertySource<'d>)>,
    /// Property name → cached getter local.
    getter_locals: HashMap<String, String>,
}

impl ObjectNode<'_> {
    fn target(&self) -> CodeValue {
        CodeValue::var(&self.identifier)
    }

    fn type_arg(&self, index: usize) -> TypeRef {
        self.type_args.get(index).cloned().unwrap_or_else(TypeRef::object)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATOR
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Generator<'c, 'a> {
    ctx: &'c mut ResolverContext<'a>,
    statements: Vec<Statement>,
    dependencies: Vec<String>,
}

impl<'c, 'a> Generator<'c, 'a> {
    pub fn new(ctx: &'c mut ResolverContext<'a>) -> Self {
        Generator {
            ctx,
            statements: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    fn push(&mut self, statement: Statement) {
        if statement == Statement::Blank && matches!(self.statements.last(), Some(Statement::Blank)) {
            return;
        }
        self.statements.push(statement);
    }

    fn push_call(&mut self, target: CodeValue, method: &str, args: Vec<CodeValue>) {
        self.push(Statement::expression(CodeValue::call(target, method, args)));
    }

    /// Generates one declaration, attributing failures to its node.
    pub fn build_declaration(&mut self, declaration: &Declaration) -> Result<NodeCode, CompilerError> {
        self.build_node(declaration)
            .map_err(|e| e.at_node(&declaration.content.location.path))
    }

    fn build_node(&mut self, declaration: &Declaration) -> Result<NodeCode, CompilerError> {
        let parts = collect_parts(declaration)?;
        self.push(Statement::Blank);

        let mut node = self.initialize(declaration, &parts)?;

        for defined in &parts.defined {
            self.build_declaration(defined)?;
        }
        self.apply_default_property(&mut node, &parts)?;
        self.apply_instance_properties(&mut node)?;
        for source in &parts.statics {
            self.apply_static_property(&node, *source)?;
        }
        for (name, handler) in &parts.handlers {
            self.apply_handler(&mut node, name, handler)?;
        }

        self.push(Statement::Blank);
        Ok(NodeCode {
            identifier: node.identifier,
            ty: node.ty,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INITIALIZATION
    // ═══════════════════════════════════════════════════════════════════════════

    fn resolve_identifier(&mut self, id: Option<&str>, ty: &TypeRef) -> Result<String, CompilerError> {
        match id {
            Some(id) => {
                self.ctx.names.store_id_type(id, ty.clone())?;
                Ok(id.to_string())
            }
            None => Ok(self.ctx.names.unique_name(ty)),
        }
    }

    fn initialize<'d>(
        &mut self,
        declaration: &'d Declaration,
        parts: &NodeParts<'d>,
    ) -> Result<ObjectNode<'d>, CompilerError> {
        let mut node = ObjectNode {
            identifier: String::new(),
            ty: TypeRef::object(),
            type_args: Vec::new(),
            properties: parts.properties.clone(),
            getter_locals: HashMap::new(),
        };

        match &declaration.init {
            Initializer::Root { type_name } => {
                node.ty = self.ctx.types.resolve(type_name)?;
                node.identifier = match parts.id {
                    Some(id) => {
                        self.ctx.names.store_id_type(id, node.ty.clone())?;
                        self.push(Statement::assign(&node.ty, id, CodeValue::var(PROVIDED_ROOT)));
                        id.to_string()
                    }
                    None => PROVIDED_ROOT.to_string(),
                };
            }
            Initializer::Reference { source } => {
                let content = &declaration.content;
                if !content.attributes.is_empty() || !content.children.is_empty() {
                    return Err(CompilerError::unsupported(
                        "References with attributes or children are not supported",
                    ));
                }
                node.ty = self.ctx.names.resolve_type_by_id(source)?.clone();
                node.identifier = source.clone();
                return Ok(node);
            }
            Initializer::Copy { source } => {
                node.ty = self.ctx.names.resolve_type_by_id(source)?.clone();
                if !self.ctx.types.has_copy_constructor(&node.ty) {
                    return Err(CompilerError::member_resolution(format!(
                        "No copy constructor found for {}",
                        node.ty
                    )));
                }
                node.identifier = match parts.id {
                    Some(id) => self.resolve_identifier(Some(id), &node.ty)?,
                    None => self.ctx.names.claim_name(&format!("{}Copy", source)),
                };
                let value = CodeValue::new_instance(&node.ty, vec![CodeValue::var(source)]);
                self.push(Statement::assign(&node.ty, &node.identifier, value));
            }
            Initializer::Include { source, resources, charset } => {
                let code = self.include(source, resources.as_deref(), charset, parts.id)?;
                node.identifier = code.identifier;
                node.ty = code.ty;
            }
            Initializer::Factory { class_name, factory } => {
                let owner = self.ctx.types.resolve(class_name)?;
                let method = self
                    .ctx
                    .types
                    .find_static_no_arg_method(&owner, factory)
                    .ok_or_else(|| {
                        CompilerError::member_resolution(format!(
                            "Factory method {}.{}() not found",
                            owner, factory
                        ))
                    })?;
                node.ty = method.returns.clone();
                node.identifier = self.resolve_identifier(parts.id, &node.ty)?;
                let value = CodeValue::static_call(&owner, &method.name, vec![]);
                self.push(Statement::assign(&node.ty, &node.identifier, value));
            }
            Initializer::Constant { class_name, constant } => {
                let owner = self.ctx.types.resolve(class_name)?;
                let field = self
                    .ctx
                    .types
                    .find_static_field(&owner, constant)
                    .ok_or_else(|| {
                        CompilerError::member_resolution(format!(
                            "Constant {}.{} not found",
                            owner, constant
                        ))
                    })?;
                node.ty = field.ty.clone();
                node.identifier = self.resolve_identifier(parts.id, &node.ty)?;
                let value = CodeValue::static_field(&owner, &field.name);
                self.push(Statement::assign(&node.ty, &node.identifier, value));
            }
            Initializer::Value { class_name, value } => {
                node.ty = self.ctx.types.resolve(class_name)?;
                node.identifier = self.resolve_identifier(parts.id, &node.ty)?;
                let string = TypeRef::string();
                if !node.ty.is_class(STRING)
                    && self
                        .ctx
                        .types
                        .find_compatible_method(&node.ty, "valueOf", true, std::slice::from_ref(&string))
                        .is_none()
                {
                    return Err(CompilerError::member_resolution(format!(
                        "{} does not have a valueOf method",
                        node.ty
                    )));
                }
                let value = self.ctx.values().coerce_value(value, &node.ty)?;
                self.push(Statement::assign(&node.ty, &node.identifier, value));
            }
            Initializer::Instance { class_name } => {
                node.ty = self.ctx.types.resolve(class_name)?;
                node.identifier = self.resolve_identifier(parts.id, &node.ty)?;
                if self.ctx.types.builder(&node.ty).is_some() {
                    self.build_with_builder(&mut node)?;
                } else {
                    self.construct(&mut node)?;
                }
            }
        }

        if let Some(id) = parts.id {
            node.type_args = self.inject_controller(&node.identifier, &node.ty);
            if let Some(setter) = self.ctx.types.find_setter(&node.ty, "id") {
                if setter.params[0].ty.is_class(STRING) {
                    self.push_call(node.target(), &setter.name, vec![CodeValue::string(id)]);
                }
            }
        }
        Ok(node)
    }

    /// Injects `identifier` into the controller through a public setter or
    /// an assignable public field. Returns the member's type arguments.
    fn inject_controller(&mut self, identifier: &str, ty: &TypeRef) -> Vec<TypeRef> {
        let Some(controller) = self.ctx.controller_type.clone() else {
            return vec![];
        };

        let setter_name = format!("set{}", capitalize(identifier));
        let setter = self
            .ctx
            .types
            .find_compatible_method(&controller, &setter_name, false, std::slice::from_ref(ty));
        if let Some(setter) = setter {
            self.push_call(CodeValue::var(CONTROLLER), &setter.name, vec![CodeValue::var(identifier)]);
            return setter.params[0].ty.args().to_vec();
        }

        if let Some(field) = self.ctx.types.find_field(&controller, identifier) {
            if !field.is_final && self.ctx.types.is_assignable(&field.ty, ty) {
                self.push(Statement::Store {
                    target: CodeValue::field(CodeValue::var(CONTROLLER), &field.name),
                    value: CodeValue::var(identifier),
                });
                return field.ty.args().to_vec();
            }
        }
        vec![]
    }

    fn include(
        &mut self,
        source: &str,
        resources: Option<&str>,
        charset: &str,
        id: Option<&str>,
    ) -> Result<NodeCode, CompilerError> {
        let (target, stack) = self.ctx.enter_include(source)?;
        let included = generate_encoded_document(self.ctx.env, &target, charset, stack)?.ok_or_else(|| {
            CompilerError::class_resolution(format!(
                "Included document {} is not compiled",
                target
            ))
        })?;

        for dependency in std::iter::once(&target).chain(&included.dependencies) {
            if !self.dependencies.contains(dependency) {
                self.dependencies.push(dependency.clone());
            }
        }

        let ty = included.root_type.clone();
        let identifier = self.resolve_identifier(id, &ty)?;
        let builder_ty = TypeRef::class(&included.identity.qualified_name());
        let builder = self.ctx.names.claim_name(&format!("{}Builder", identifier));
        self.push(Statement::assign(
            &builder_ty,
            &builder,
            CodeValue::new_instance(&builder_ty, vec![]),
        ));

        let bundle = match resources {
            Some(name) => CodeValue::static_call(
                &TypeRef::class(RESOURCE_BUNDLE),
                "getBundle",
                vec![CodeValue::string(name)],
            ),
            None => CodeValue::var(RESOURCES),
        };
        self.push_call(
            CodeValue::var(&builder),
            "build",
            vec![CodeValue::Null, CodeValue::Null, bundle, CodeValue::var(CONTROLLER_FACTORY)],
        );
        self.push(Statement::assign(
            &ty,
            &identifier,
            CodeValue::call(CodeValue::var(&builder), "getRoot", vec![]),
        ));

        if let (Some(controller), Some(id)) = (included.controller_type, id) {
            let controller_id = format!("{}Controller", id);
            self.ctx.names.store_id_type(&controller_id, controller.clone())?;
            self.push(Statement::assign(
                &controller,
                &controller_id,
                CodeValue::call(CodeValue::var(&builder), "getController", vec![]),
            ));
            self.inject_controller(&controller_id, &controller);
        }

        Ok(NodeCode { identifier, ty })
    }

    /// `T id = Builder.create().prop(v)...build();`
    fn build_with_builder(&mut self, node: &mut ObjectNode<'_>) -> Result<(), CompilerError> {
        let Some(info) = self.ctx.types.builder(&node.ty) else {
            return Ok(());
        };
        let builder_ty = self.ctx.types.resolve(&info.builder)?;
        let create = self
            .ctx
            .types
            .find_static_no_arg_method(&builder_ty, &info.create)
            .ok_or_else(|| {
                CompilerError::member_resolution(format!(
                    "Builder {} has no static {}()",
                    builder_ty, info.create
                ))
            })?;
        let build = self
            .ctx
            .types
            .find_no_arg_method(&builder_ty, &info.build)
            .ok_or_else(|| {
                CompilerError::member_resolution(format!(
                    "Builder {} has no {}()",
                    builder_ty, info.build
                ))
            })?;

        let mut chain = CodeValue::static_call(&builder_ty, &create.name, vec![]);
        let mut consumed = Vec::new();
        for (name, source) in &node.properties {
            let PropertySource::Attribute(value) = source else {
                continue;
            };
            if matches!(value, Value::Expression(_)) {
                continue;
            }
            let Some(stage) = self.ctx.types.find_methods(&builder_ty, name, 1).into_iter().next() else {
                continue;
            };
            let arg = self.ctx.values().coerce_value(value, &stage.params[0].ty)?;
            chain = CodeValue::call(chain, &stage.name, vec![arg]);
            consumed.push(*name);
        }
        chain = CodeValue::call(chain, &build.name, vec![]);

        node.properties.retain(|(name, _)| !consumed.contains(name));
        self.push(Statement::assign(&node.ty, &node.identifier, chain));
        Ok(())
    }

    /// Constructor matching over constructors whose parameters are all named.
    /// Candidates must cover every defined property that cannot be set
    /// afterwards; they rank by fewest undefined parameters, then fewest
    /// properties left to set. Ties are tried in declaration order.
    fn construct(&mut self, node: &mut ObjectNode<'_>) -> Result<(), CompilerError> {
        // Bound properties are applied after construction and never feed a parameter.
        let defined: Vec<&str> = node
            .properties
            .iter()
            .filter(|(_, source)| !matches!(source, PropertySource::Attribute(Value::Expression(_))))
            .map(|(name, _)| *name)
            .collect();
        let (mutable, immutable): (Vec<&str>, Vec<&str>) = defined
            .iter()
            .copied()
            .partition(|name| self.ctx.types.property_is_mutable(&node.ty, name));

        let mut best: Vec<&ConstructorInfo> = Vec::new();
        let mut best_rank = (usize::MAX, usize::MAX);
        for constructor in self.ctx.types.named_constructors(&node.ty) {
            let params: Vec<&str> = constructor.params.iter().filter_map(|p| p.name.as_deref()).collect();
            if !immutable.iter().all(|name| params.contains(name)) {
                continue;
            }
            let undefined = params.iter().filter(|p| !defined.contains(*p)).count();
            let remaining = mutable.iter().filter(|p| !params.contains(*p)).count();
            let rank = (undefined, remaining);
            if rank < best_rank {
                best_rank = rank;
                best.clear();
                best.push(constructor);
            } else if rank == best_rank {
                best.push(constructor);
            }
        }

        let mut last_error = None;
        for constructor in best {
            let statements = self.statements.len();
            let names = self.ctx.names.clone();
            match self.construct_with(node, constructor) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    self.statements.truncate(statements);
                    self.ctx.names = names;
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            CompilerError::member_resolution(format!(
                "No constructor of {} matches properties [{}]",
                node.ty,
                defined.join(", ")
            ))
        }))
    }

    fn construct_with(
        &mut self,
        node: &mut ObjectNode<'_>,
        constructor: &ConstructorInfo,
    ) -> Result<(), CompilerError> {
        let mut args = Vec::with_capacity(constructor.params.len());
        let mut consumed = Vec::new();
        for param in &constructor.params {
            let name = param.name.as_deref().unwrap_or_default();
            let source = node
                .properties
                .iter()
                .find(|(property, source)| {
                    *property == name && !matches!(source, PropertySource::Attribute(Value::Expression(_)))
                })
                .map(|(_, source)| *source);
            let value = match source {
                Some(PropertySource::Attribute(value)) => {
                    consumed.push(name.to_string());
                    self.ctx.values().coerce_value(value, &param.ty)?
                }
                Some(PropertySource::Element(element)) => {
                    consumed.push(name.to_string());
                    self.element_value(element, &param.ty)?
                }
                None => self
                    .ctx
                    .values()
                    .coerce_default(param.default_value.as_deref(), &param.ty)?,
            };
            args.push(value);
        }

        node.properties.retain(|(name, _)| !consumed.iter().any(|c| c == name));
        let value = CodeValue::new_instance(&node.ty, args);
        self.push(Statement::assign(&node.ty, &node.identifier, value));
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CHILD VALUES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Builds a child declaration that must be usable as `target`.
    fn child_value(&mut self, declaration: &Declaration, target: &TypeRef) -> Result<CodeValue, CompilerError> {
        let child = self.build_declaration(declaration)?;
        if !self.ctx.types.is_invocation_compatible(target, &child.ty) {
            return Err(CompilerError::unsupported(format!(
                "Cannot assign {} to {}",
                child.ty, target
            ))
            .at_node(&declaration.content.location.path));
        }
        Ok(CodeValue::var(&child.identifier))
    }

    /// Value of a property element holding text or exactly one object.
    fn element_value(&mut self, element: &PropertyElement, target: &TypeRef) -> Result<CodeValue, CompilerError> {
        let value = &element.value;
        if value.elements.is_empty() && value.attributes.is_empty() {
            return self.ctx.values().coerce_value(&value.text, target);
        }
        match (value.elements.as_slice(), value.attributes.is_empty()) {
            ([Element::Declaration(declaration)], true) => self.child_value(declaration, target),
            _ => Err(CompilerError::unsupported(format!(
                "Property element '{}' must hold a single value",
                element.name
            ))
            .at_node(&element.location.path)),
        }
    }

    /// Local caching `node.getX()`, created on first use.
    fn getter_local(&mut self, node: &mut ObjectNode<'_>, property: &str, getter: &MethodInfo) -> CodeValue {
        if let Some(local) = node.getter_locals.get(property) {
            return CodeValue::var(local);
        }
        let local = self
            .ctx
            .names
            .claim_name(&format!("{}{}", node.identifier, capitalize(property)));
        self.push(Statement::assign(
            &getter.returns,
            &local,
            CodeValue::call(node.target(), &getter.name, vec![]),
        ));
        node.getter_locals.insert(property.to_string(), local.clone());
        CodeValue::var(&local)
    }

    fn require_getter(&self, node: &ObjectNode<'_>, property: &str) -> Result<&'a MethodInfo, CompilerError> {
        self.ctx.types.find_getter(&node.ty, property).ok_or_else(|| {
            CompilerError::member_resolution(format!(
                "{} has no setter or getter for property '{}'",
                node.ty, property
            ))
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PROPERTIES
    // ═══════════════════════════════════════════════════════════════════════════

    fn apply_default_property<'d>(
        &mut self,
        node: &mut ObjectNode<'d>,
        parts: &NodeParts<'d>,
    ) -> Result<(), CompilerError> {
        if parts.children.is_empty() && parts.text.is_empty() {
            return Ok(());
        }

        if self.ctx.types.is_collection(&node.ty) {
            let bound = node.type_arg(0);
            for child in &parts.children {
                let value = self.child_value(child, &bound)?;
                self.push_call(node.target(), "add", vec![value]);
            }
            if !parts.text.is_empty() {
                let value = self.ctx.values().coerce_value(parts.text, &bound)?;
                self.push_call(node.target(), "add", vec![value]);
            }
            return Ok(());
        }

        if self.ctx.types.is_map(&node.ty) {
            return Err(CompilerError::structural(format!(
                "Map {} may only contain property elements",
                node.ty
            )));
        }

        let Some(property) = self.ctx.types.default_property(&node.ty) else {
            return Err(CompilerError::member_resolution(format!(
                "{} has no default property to receive its children",
                node.ty
            )));
        };
        self.apply_property_content(node, property, &[], &parts.children, &[], parts.text)
    }

    fn apply_instance_properties(&mut self, node: &mut ObjectNode<'_>) -> Result<(), CompilerError> {
        let properties = node.properties.clone();

        if self.ctx.types.is_map(&node.ty) {
            let key_bound = node.type_arg(0);
            let value_bound = node.type_arg(1);
            for (name, source) in properties {
                let key = self.ctx.values().coerce_literal(name, &key_bound)?;
                let value = match source {
                    PropertySource::Attribute(value) => self.ctx.values().coerce_value(value, &value_bound)?,
                    PropertySource::Element(element) => self.element_value(element, &value_bound)?,
                };
                self.push_call(node.target(), "put", vec![key, value]);
            }
            return Ok(());
        }

        for (name, source) in properties {
            match source {
                PropertySource::Attribute(value) => self.apply_single(node, name, value)?,
                PropertySource::Element(element) => self
                    .apply_property_element(node, element)
                    .map_err(|e| e.at_node(&element.location.path))?,
            }
        }
        Ok(())
    }

    fn apply_property_element(
        &mut self,
        node: &mut ObjectNode<'_>,
        element: &PropertyElement,
    ) -> Result<(), CompilerError> {
        let mut declarations = Vec::new();
        let mut nested = Vec::new();
        for child in &element.value.elements {
            match child {
                Element::Declaration(declaration) => declarations.push(declaration),
                Element::InstanceProperty(property) => nested.push(property),
                other => {
                    return Err(CompilerError::structural(format!(
                        "Property element '{}' may only contain objects and properties",
                        element.name
                    ))
                    .at_node(&other.location().path))
                }
            }
        }
        self.apply_property_content(
            node,
            &element.name,
            &element.value.attributes,
            &declarations,
            &nested,
            &element.value.text,
        )
    }

    /// Applies text, object children and attributes given for one property.
    fn apply_property_content(
        &mut self,
        node: &mut ObjectNode<'_>,
        property: &str,
        attributes: &[Attribute],
        declarations: &[&Declaration],
        nested: &[&PropertyElement],
        text: &Value,
    ) -> Result<(), CompilerError> {
        if !text.is_empty() {
            self.apply_single(node, property, text)?;
        }

        if !declarations.is_empty() {
            let setter = self.ctx.types.find_setter(&node.ty, property);
            match (setter, declarations) {
                (Some(setter), [declaration]) => {
                    let value = self.child_value(declaration, &setter.params[0].ty)?;
                    self.push_call(node.target(), &setter.name, vec![value]);
                }
                _ => self.append_elements(node, property, declarations)?,
            }
        }

        if !attributes.is_empty() || !nested.is_empty() {
            self.apply_properties_on_property(node, property, attributes, nested)?;
        }
        Ok(())
    }

    /// Appends objects to a read-only collection property.
    fn append_elements(
        &mut self,
        node: &mut ObjectNode<'_>,
        property: &str,
        declarations: &[&Declaration],
    ) -> Result<(), CompilerError> {
        let getter = self.require_getter(node, property)?;
        if !self.ctx.types.is_collection(&getter.returns) {
            return Err(CompilerError::unsupported(format!(
                "Read-only property '{}' of type {} cannot hold elements",
                property, getter.returns
            )));
        }
        let bound = self.ctx.types.type_argument(&getter.returns, 0);
        for declaration in declarations {
            let value = self.child_value(declaration, &bound)?;
            let local = self.getter_local(node, property, getter);
            self.push_call(local, "add", vec![value]);
        }
        Ok(())
    }

    fn apply_single(&mut self, node: &mut ObjectNode<'_>, property: &str, value: &Value) -> Result<(), CompilerError> {
        match value {
            Value::Empty => Ok(()),
            Value::Expression(expression) => {
                let result = resolve_expression(self.ctx, expression)?;
                for statement in result.statements {
                    self.push(statement);
                }

                if is_observable(self.ctx, &result.ty) {
                    let method = self
                        .ctx
                        .types
                        .find_property_method(&node.ty, property)
                        .ok_or_else(|| {
                            CompilerError::member_resolution(format!(
                                "No property found for expression binding '{}' on {}",
                                property, node.ty
                            ))
                        })?;
                    let bound = CodeValue::call(node.target(), &method.name, vec![]);
                    self.push_call(bound, "bind", vec![result.value]);
                    return Ok(());
                }

                let setter = self.ctx.types.find_setter(&node.ty, property).ok_or_else(|| {
                    CompilerError::member_resolution(format!(
                        "{} has no setter for property '{}'",
                        node.ty, property
                    ))
                })?;
                if !self.ctx.types.is_invocation_compatible(&setter.params[0].ty, &result.ty) {
                    return Err(CompilerError::unsupported(format!(
                        "Expression of type {} cannot set property '{}' of type {}",
                        result.ty, property, setter.params[0].ty
                    )));
                }
                self.push_call(node.target(), &setter.name, vec![result.value]);
                Ok(())
            }
            _ => {
                if let Some(setter) = self.ctx.types.find_setter(&node.ty, property) {
                    let value = self.ctx.values().coerce_value(value, &setter.params[0].ty)?;
                    self.push_call(node.target(), &setter.name, vec![value]);
                    return Ok(());
                }

                let getter = self.require_getter(node, property)?;
                match value {
                    Value::Literal(raw) if self.ctx.types.is_collection(&getter.returns) => {
                        let bound = self.ctx.types.type_argument(&getter.returns, 0);
                        let local = self.getter_local(node, property, getter);
                        for part in LIST_SEPARATOR.split(raw) {
                            let value = self.ctx.values().coerce_literal(part, &bound)?;
                            self.push_call(local.clone(), "add", vec![value]);
                        }
                        Ok(())
                    }
                    _ => Err(CompilerError::unsupported(format!(
                        "Unable to set read-only property '{}' of type {}",
                        property, getter.returns
                    ))),
                }
            }
        }
    }

    /// Attributes and nested properties on a property element: `onChange`
    /// listeners and entries of a map-valued property.
    fn apply_properties_on_property(
        &mut self,
        node: &mut ObjectNode<'_>,
        property: &str,
        attributes: &[Attribute],
        nested: &[&PropertyElement],
    ) -> Result<(), CompilerError> {
        for attribute in attributes {
            match attribute {
                Attribute::EventHandler { name, handler } if name == ON_CHANGE => {
                    if self.ctx.types.find_property_method(&node.ty, property).is_some() {
                        self.add_property_listener(node, property, handler)?;
                    } else {
                        self.add_container_listener(node, property, handler)?;
                    }
                }
                Attribute::InstanceProperty { name, value } => {
                    let getter = self.require_map_getter(node, property)?;
                    let value_bound = self.ctx.types.type_argument(&getter.returns, 1);
                    let value = self.ctx.values().coerce_value(value, &value_bound)?;
                    self.put_entry(node, property, getter, name, value)?;
                }
                _ => {
                    return Err(CompilerError::unsupported(format!(
                        "Attribute not supported on property element '{}'",
                        property
                    )))
                }
            }
        }

        for element in nested {
            let getter = self.require_map_getter(node, property)?;
            let value_bound = self.ctx.types.type_argument(&getter.returns, 1);
            let value = self.element_value(element, &value_bound)?;
            self.put_entry(node, property, getter, &element.name, value)?;
        }
        Ok(())
    }

    fn require_map_getter(&self, node: &ObjectNode<'_>, property: &str) -> Result<&'a MethodInfo, CompilerError> {
        let getter = self.require_getter(node, property)?;
        if !self.ctx.types.is_map(&getter.returns) {
            return Err(CompilerError::unsupported(format!(
                "Property '{}' of type {} is not a map",
                property, getter.returns
            )));
        }
        Ok(getter)
    }

    fn put_entry(
        &mut self,
        node: &mut ObjectNode<'_>,
        property: &str,
        getter: &MethodInfo,
        key: &str,
        value: CodeValue,
    ) -> Result<(), CompilerError> {
        let key_bound = self.ctx.types.type_argument(&getter.returns, 0);
        let key = self.ctx.values().coerce_literal(key, &key_bound)?;
        let local = self.getter_local(node, property, getter);
        self.push_call(local, "put", vec![key, value]);
        Ok(())
    }

    fn apply_static_property(&mut self, node: &ObjectNode<'_>, source: StaticSource<'_>) -> Result<(), CompilerError> {
        let (owner, name) = match source {
            StaticSource::Attribute { owner, name, .. } => (owner, name),
            StaticSource::Element(element) => (
                element.owner.as_deref().unwrap_or_default(),
                element.name.as_str(),
            ),
        };
        let owner_ty = self.ctx.types.resolve(owner)?;
        let setter = self
            .ctx
            .types
            .find_static_setter(&owner_ty, name)
            .ok_or_else(|| {
                CompilerError::member_resolution(format!(
                    "Unable to find static setter for '{}' on {}",
                    name, owner_ty
                ))
            })?;
        if !self.ctx.types.is_assignable(&setter.params[0].ty, &node.ty) {
            return Err(CompilerError::member_resolution(format!(
                "First parameter of {}.{} does not accept {}",
                owner_ty, setter.name, node.ty
            )));
        }

        let value_ty = &setter.params[1].ty;
        let value = match source {
            StaticSource::Attribute { value, .. } => self.static_value(value, value_ty)?,
            StaticSource::Element(element) => {
                let content = &element.value;
                if content.elements.is_empty() && content.attributes.is_empty() {
                    self.static_value(&content.text, value_ty)?
                } else {
                    self.element_value(element, value_ty)
                        .map_err(|e| e.at_node(&element.location.path))?
                }
            }
        };
        self.push(Statement::expression(CodeValue::static_call(
            &owner_ty,
            &setter.name,
            vec![node.target(), value],
        )));
        Ok(())
    }

    fn static_value(&self, value: &Value, target: &TypeRef) -> Result<CodeValue, CompilerError> {
        if let Value::Expression(expression) = value {
            return Err(CompilerError::unsupported(format!(
                "Cannot set a static property from expression '{}'",
                expression
            )));
        }
        self.ctx.values().coerce_value(value, target)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EVENT HANDLERS
    // ═══════════════════════════════════════════════════════════════════════════

    fn require_controller(&self) -> Result<TypeRef, CompilerError> {
        self.ctx.controller_type.clone().ok_or_else(|| {
            CompilerError::member_resolution("Controller method handlers require a controller")
                .with_hint("Declare fx:controller on the root element")
        })
    }

    fn apply_handler(&mut self, node: &mut ObjectNode<'_>, event: &str, handler: &Handler) -> Result<(), CompilerError> {
        let handler_type = TypeRef::class(EVENT_HANDLER);
        let setter = self
            .ctx
            .types
            .find_setter(&node.ty, event)
            .filter(|s| self.ctx.types.is_assignable(&s.params[0].ty.raw(), &handler_type));

        if let Some(setter) = setter {
            let param = setter.params[0].ty.clone();
            let event_type = self.ctx.types.type_argument(&param, 0);
            if let Some(value) = self.handler_value(handler, &event_type, &param)? {
                self.push_call(node.target(), &setter.name, vec![value]);
            }
            return Ok(());
        }

        if let Some(captures) = CHANGE_EVENT.captures(event) {
            let property = decapitalize(&captures[1]);
            return self.add_property_listener(node, &property, handler);
        }

        Err(CompilerError::member_resolution(format!(
            "Unknown event '{}' for {}",
            event, node.ty
        )))
    }

    /// Forwarding closure for an event handler, preferring an overload that
    /// takes the event over a no-arg one.
    fn handler_value(
        &self,
        handler: &Handler,
        event_type: &TypeRef,
        param: &TypeRef,
    ) -> Result<Option<CodeValue>, CompilerError> {
        let method_name = match handler {
            Handler::Empty => return Ok(None),
            Handler::Reference(id) => return self.ctx.values().resolve_reference(id, param).map(Some),
            Handler::Script(script) => {
                return Err(CompilerError::unsupported(format!(
                    "Script event handlers are not supported: '{}'",
                    script
                )))
            }
            Handler::Method(name) => name,
        };

        let controller = self.require_controller()?;
        let controller_var = CodeValue::var(CONTROLLER);
        if let Some(method) = self.ctx.types.find_compatible_method(
            &controller,
            method_name,
            false,
            std::slice::from_ref(event_type),
        ) {
            let call = CodeValue::call(controller_var.clone(), &method.name, vec![CodeValue::var("event")]);
            return Ok(Some(match method.throws.is_empty() {
                true => CodeValue::method_reference(controller_var, &method.name),
                false => rethrowing_lambda(call),
            }));
        }

        if let Some(method) = self.ctx.types.find_no_arg_method(&controller, method_name) {
            let call = CodeValue::call(controller_var, &method.name, vec![]);
            return Ok(Some(match method.throws.is_empty() {
                true => CodeValue::lambda(&["event"], call),
                false => rethrowing_lambda(call),
            }));
        }

        Err(CompilerError::member_resolution(format!(
            "No method {} on {} accepting {} or no arguments",
            method_name, controller, event_type
        )))
    }

    /// `node.xProperty().addListener(controller::m)` for a change method
    /// taking `(ObservableValue, old, new)`.
    fn add_property_listener(
        &mut self,
        node: &mut ObjectNode<'_>,
        property: &str,
        handler: &Handler,
    ) -> Result<(), CompilerError> {
        let Handler::Method(method_name) = handler else {
            return Err(CompilerError::unsupported(
                "Change listeners must reference a controller method",
            ));
        };
        let controller = self.require_controller()?;
        let property_method = self
            .ctx
            .types
            .find_property_method(&node.ty, property)
            .ok_or_else(|| {
                CompilerError::member_resolution(format!(
                    "Unable to find property method for '{}' on {}",
                    property, node.ty
                ))
            })?;
        let value_ty = self
            .ctx
            .types
            .find_getter(&node.ty, property)
            .map(|getter| getter.returns.clone())
            .ok_or_else(|| {
                CompilerError::member_resolution(format!(
                    "Unable to determine the type of property '{}' on {}",
                    property, node.ty
                ))
            })?;

        let args = [TypeRef::class(OBSERVABLE_VALUE), value_ty.clone(), value_ty.clone()];
        let method = self
            .ctx
            .types
            .find_compatible_method(&controller, method_name, false, &args)
            .ok_or_else(|| {
                CompilerError::member_resolution(format!(
                    "Unable to find change method {} for property type {}",
                    method_name, value_ty
                ))
            })?;

        let observable = CodeValue::call(node.target(), &property_method.name, vec![]);
        self.push_call(
            observable,
            "addListener",
            vec![CodeValue::method_reference(CodeValue::var(CONTROLLER), &method.name)],
        );
        Ok(())
    }

    /// `node.getX().addListener(controller::m)` for an observable list, set
    /// or map property.
    fn add_container_listener(
        &mut self,
        node: &mut ObjectNode<'_>,
        property: &str,
        handler: &Handler,
    ) -> Result<(), CompilerError> {
        let Handler::Method(method_name) = handler else {
            return Err(CompilerError::unsupported(
                "Change listeners must reference a controller method",
            ));
        };
        let controller = self.require_controller()?;
        let getter = self.require_getter(node, property)?;
        let change = COLLECTION_LISTENERS
            .iter()
            .find(|(container, _)| {
                self.ctx
                    .types
                    .is_assignable(&TypeRef::class(container), &getter.returns)
            })
            .map(|(_, change)| TypeRef::class(change))
            .ok_or_else(|| {
                CompilerError::unsupported(format!(
                    "Property '{}' of type {} is not an observable collection",
                    property, getter.returns
                ))
            })?;
        let method = self
            .ctx
            .types
            .find_compatible_method(&controller, method_name, false, std::slice::from_ref(&change))
            .ok_or_else(|| {
                CompilerError::member_resolution(format!(
                    "Unable to find change method {} accepting {}",
                    method_name, change
                ))
            })?;

        let local = self.getter_local(node, property, getter);
        self.push_call(
            local,
            "addListener",
            vec![CodeValue::method_reference(CodeValue::var(CONTROLLER), &method.name)],
        );
        Ok(())
    }
}

/// `event -> { try { call; } catch (Exception e) { throw new RuntimeException(e); } }`
fn rethrowing_lambda(call: CodeValue) -> CodeValue {
    CodeValue::block_lambda(
        &["event"],
        vec![Statement::TryCatch {
            body: vec![Statement::expression(call)],
            exception: TypeRef::class(EXCEPTION),
            name: "e".to_string(),
            handler: vec![Statement::Throw {
                value: CodeValue::new_instance(
                    &TypeRef::class(RUNTIME_EXCEPTION),
                    vec![CodeValue::var("e")],
                ),
            }],
        }],
    )
}
