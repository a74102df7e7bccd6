//! Code intermediate representation.
//!
//! `CodeValue` is a pure expression tree; every side effect of a build is an
//! explicit `Statement`, and statement order alone encodes evaluation order.
//! Rendering targets Java source and collects the imports it needs on the way.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::metadata::TypeRef;

pub const INDENT: &str = "  ";

// ═══════════════════════════════════════════════════════════════════════════════
// IR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CodeValue {
    Null,
    Bool { value: bool },
    Char { value: char },
    /// Pre-rendered numeric literal (`20.0`, `5L`, `(byte) 3`).
    Literal { text: String },
    Str { value: String },
    Type { ty: TypeRef },
    ClassLiteral { ty: TypeRef },
    Enum { ty: TypeRef, member: String },
    Variable { name: String },
    FieldAccess { target: Box<CodeValue>, field: String },
    MethodCall {
        target: Option<Box<CodeValue>>,
        method: String,
        args: Vec<CodeValue>,
    },
    New { ty: TypeRef, args: Vec<CodeValue> },
    Array(ArrayInitialization),
    MethodReference { target: Box<CodeValue>, method: String },
    Lambda { params: Vec<String>, body: LambdaBody },
    Cast { ty: TypeRef, value: Box<CodeValue> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "camelCase")]
pub enum ArrayInitialization {
    Declared { component: TypeRef, values: Vec<CodeValue> },
    Sized { component: TypeRef, size: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form", content = "body", rename_all = "camelCase")]
pub enum LambdaBody {
    Expression(Box<CodeValue>),
    Block(Vec<Statement>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Statement {
    /// Declares and initializes a local: `T identifier = value;`.
    Assignment {
        ty: TypeRef,
        identifier: String,
        value: CodeValue,
    },
    /// Assigns to an existing location: `controller.label = label;`.
    Store { target: CodeValue, value: CodeValue },
    Expression { value: CodeValue },
    TryCatch {
        body: Vec<Statement>,
        exception: TypeRef,
        name: String,
        handler: Vec<Statement>,
    },
    Throw { value: CodeValue },
    Blank,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTRUCTORS
// ═══════════════════════════════════════════════════════════════════════════════

impl CodeValue {
    pub fn var(name: &str) -> Self {
        CodeValue::Variable {
            name: name.to_string(),
        }
    }

    pub fn string(value: &str) -> Self {
        CodeValue::Str {
            value: value.to_string(),
        }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        CodeValue::Literal { text: text.into() }
    }

    pub fn call(target: CodeValue, method: &str, args: Vec<CodeValue>) -> Self {
        CodeValue::MethodCall {
            target: Some(Box::new(target)),
            method: method.to_string(),
            args,
        }
    }

    pub fn static_call(ty: &TypeRef, method: &str, args: Vec<CodeValue>) -> Self {
        Self::call(CodeValue::Type { ty: ty.raw() }, method, args)
    }

    pub fn new_instance(ty: &TypeRef, args: Vec<CodeValue>) -> Self {
        CodeValue::New { ty: ty.clone(), args }
    }

    pub fn field(target: CodeValue, field: &str) -> Self {
        CodeValue::FieldAccess {
            target: Box::new(target),
            field: field.to_string(),
        }
    }

    pub fn static_field(ty: &TypeRef, field: &str) -> Self {
        Self::field(CodeValue::Type { ty: ty.raw() }, field)
    }

    pub fn method_reference(target: CodeValue, method: &str) -> Self {
        CodeValue::MethodReference {
            target: Box::new(target),
            method: method.to_string(),
        }
    }

    pub fn lambda(params: &[&str], body: CodeValue) -> Self {
        CodeValue::Lambda {
            params: params.iter().map(|p| p.to_string()).collect(),
            body: LambdaBody::Expression(Box::new(body)),
        }
    }

    pub fn block_lambda(params: &[&str], body: Vec<Statement>) -> Self {
        CodeValue::Lambda {
            params: params.iter().map(|p| p.to_string()).collect(),
            body: LambdaBody::Block(body),
        }
    }

    pub fn cast(ty: &TypeRef, value: CodeValue) -> Self {
        CodeValue::Cast {
            ty: ty.clone(),
            value: Box::new(value),
        }
    }
}

impl Statement {
    pub fn assign(ty: &TypeRef, identifier: &str, value: CodeValue) -> Self {
        Statement::Assignment {
            ty: ty.clone(),
            identifier: identifier.to_string(),
            value,
        }
    }

    pub fn expression(value: CodeValue) -> Self {
        Statement::Expression { value }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Simple-name claims for one compilation unit. The first type rendered
/// under a simple name owns it; later conflicting types stay qualified.
#[derive(Debug, Clone)]
pub struct ImportSet {
    package: String,
    claimed: HashMap<String, String>,
    imports: BTreeSet<String>,
}

fn package_of(qualified: &str) -> &str {
    qualified.rsplit_once('.').map(|(p, _)| p).unwrap_or("")
}

impl ImportSet {
    pub fn new(package: &str, own_class: &str) -> Self {
        let mut claimed = HashMap::new();
        let qualified = if package.is_empty() {
            own_class.to_string()
        } else {
            format!("{}.{}", package, own_class)
        };
        claimed.insert(own_class.to_string(), qualified);
        ImportSet {
            package: package.to_string(),
            claimed,
            imports: BTreeSet::new(),
        }
    }

    /// Source text for a class name, importing its top-level class when the
    /// simple name is free.
    pub fn class_name(&mut self, qualified: &str) -> String {
        let (outer, nested) = match qualified.split_once('$') {
            Some((outer, nested)) => (outer, Some(nested.replace('$', "."))),
            None => (qualified, None),
        };
        let simple = outer.rsplit('.').next().unwrap_or(outer).to_string();
        let canonical = qualified.replace('$', ".");

        let owned = match self.claimed.get(&simple) {
            Some(owner) => owner == outer,
            None => {
                self.claimed.insert(simple.clone(), outer.to_string());
                let package = package_of(outer);
                if !package.is_empty() && package != "java.lang" && package != self.package {
                    self.imports.insert(outer.to_string());
                }
                true
            }
        };

        match (owned, nested) {
            (true, Some(nested)) => format!("{}.{}", simple, nested),
            (true, None) => simple,
            (false, _) => canonical,
        }
    }

    pub fn type_name(&mut self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Void => "void".to_string(),
            TypeRef::Primitive(p) => p.name().to_string(),
            TypeRef::Array(component) => format!("{}[]", self.type_name(component)),
            TypeRef::Class { name, args } => {
                let base = self.class_name(name);
                if args.is_empty() {
                    base
                } else {
                    let args: Vec<String> = args.iter().map(|arg| self.type_name(arg)).collect();
                    format!("{}<{}>", base, args.join(", "))
                }
            }
        }
    }

    pub fn imports(&self) -> impl Iterator<Item = &String> {
        self.imports.iter()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RENDERING
// ═══════════════════════════════════════════════════════════════════════════════

pub fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        escape_char_into(c, '"', &mut escaped);
    }
    escaped
}

fn escape_char_into(c: char, quote: char, out: &mut String) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
        c => out.push(c),
    }
}

fn render_args(args: &[CodeValue], indent: usize, imports: &mut ImportSet) -> String {
    args.iter()
        .map(|arg| render_value(arg, indent, imports))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders an expression. `indent` is the depth of the enclosing statement,
/// used for block lambdas.
pub fn render_value(value: &CodeValue, indent: usize, imports: &mut ImportSet) -> String {
    match value {
        CodeValue::Null => "null".to_string(),
        CodeValue::Bool { value } => value.to_string(),
        CodeValue::Char { value } => {
            let mut out = String::from("'");
            escape_char_into(*value, '\'', &mut out);
            out.push('\'');
            out
        }
        CodeValue::Literal { text } => text.clone(),
        CodeValue::Str { value } => format!("\"{}\"", escape_string(value)),
        CodeValue::Type { ty } => imports.type_name(ty),
        CodeValue::ClassLiteral { ty } => format!("{}.class", imports.type_name(&ty.raw())),
        CodeValue::Enum { ty, member } => format!("{}.{}", imports.type_name(&ty.raw()), member),
        CodeValue::Variable { name } => name.clone(),
        CodeValue::FieldAccess { target, field } => {
            format!("{}.{}", render_value(target, indent, imports), field)
        }
        CodeValue::MethodCall {
            target,
            method,
            args,
        } => {
            let args = render_args(args, indent, imports);
            match target {
                Some(target) => format!("{}.{}({})", render_value(target, indent, imports), method, args),
                None => format!("{}({})", method, args),
            }
        }
        CodeValue::New { ty, args } => {
            let name = match ty.args().is_empty() {
                true => imports.type_name(ty),
                false => format!("{}<>", imports.type_name(&ty.raw())),
            };
            format!("new {}({})", name, render_args(args, indent, imports))
        }
        CodeValue::Array(ArrayInitialization::Declared { component, values }) => format!(
            "new {}[]{{{}}}",
            imports.type_name(&component.raw()),
            render_args(values, indent, imports)
        ),
        CodeValue::Array(ArrayInitialization::Sized { component, size }) => {
            format!("new {}[{}]", imports.type_name(&component.raw()), size)
        }
        CodeValue::MethodReference { target, method } => {
            format!("{}::{}", render_value(target, indent, imports), method)
        }
        CodeValue::Lambda { params, body } => {
            let params = match params.len() {
                1 => params[0].clone(),
                _ => format!("({})", params.join(", ")),
            };
            match body {
                LambdaBody::Expression(body) => {
                    format!("{} -> {}", params, render_value(body, indent, imports))
                }
                LambdaBody::Block(statements) => {
                    let mut out = format!("{} -> {{\n", params);
                    render_statements(statements, indent + 1, imports, &mut out);
                    out.push_str(&INDENT.repeat(indent));
                    out.push('}');
                    out
                }
            }
        }
        CodeValue::Cast { ty, value } => {
            format!("({}) {}", imports.type_name(ty), render_value(value, indent, imports))
        }
    }
}

pub fn render_statements(
    statements: &[Statement],
    indent: usize,
    imports: &mut ImportSet,
    out: &mut String,
) {
    for statement in statements {
        render_statement(statement, indent, imports, out);
    }
}

pub fn render_statement(statement: &Statement, indent: usize, imports: &mut ImportSet, out: &mut String) {
    let pad = INDENT.repeat(indent);
    match statement {
        Statement::Blank => out.push('\n'),
        Statement::Assignment {
            ty,
            identifier,
            value,
        } => {
            let ty = imports.type_name(ty);
            let value = render_value(value, indent, imports);
            out.push_str(&format!("{}{} {} = {};\n", pad, ty, identifier, value));
        }
        Statement::Store { target, value } => {
            let target = render_value(target, indent, imports);
            let value = render_value(value, indent, imports);
            out.push_str(&format!("{}{} = {};\n", pad, target, value));
        }
        Statement::Expression { value } => {
            out.push_str(&format!("{}{};\n", pad, render_value(value, indent, imports)));
        }
        Statement::Throw { value } => {
            out.push_str(&format!("{}throw {};\n", pad, render_value(value, indent, imports)));
        }
        Statement::TryCatch {
            body,
            exception,
            name,
            handler,
        } => {
            out.push_str(&format!("{}try {{\n", pad));
            render_statements(body, indent + 1, imports, out);
            let exception = imports.type_name(exception);
            out.push_str(&format!("{}}} catch ({} {}) {{\n", pad, exception, name));
            render_statements(handler, indent + 1, imports, out);
            out.push_str(&format!("{}}}\n", pad));
        }
    }
}
