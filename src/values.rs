//! Value coercion.
//!
//! Turns raw attribute/text values into typed `CodeValue`s for a target type.
//! Primitive literals are validated and folded at compile time so an invalid
//! number fails the build instead of the generated program.

use crate::code::{ArrayInitialization, CodeValue};
use crate::metadata::{Primitive, TypeRef, OBJECT, RESOURCE_BUNDLE, STRING};
use crate::names::NameResolver;
use crate::syntax::Value;
use crate::types::TypeResolver;
use crate::validate::CompilerError;

pub const RESOURCES: &str = "resources";
pub const ARRAY_DELIMITER: char = ',';

pub struct ValueResolver<'r, 'a> {
    types: &'r TypeResolver<'a>,
    names: &'r NameResolver,
}

/// Documented zero-equivalent for a primitive kind.
pub fn zero_value(primitive: Primitive) -> CodeValue {
    match primitive {
        Primitive::Boolean => CodeValue::Bool { value: false },
        Primitive::Byte => CodeValue::literal("(byte) 0"),
        Primitive::Short => CodeValue::literal("(short) 0"),
        Primitive::Int => CodeValue::literal("0"),
        Primitive::Long => CodeValue::literal("0L"),
        Primitive::Float => CodeValue::literal("0.0f"),
        Primitive::Double => CodeValue::literal("0.0"),
        Primitive::Char => CodeValue::Char { value: '\0' },
    }
}

/// Zero for primitives, `null` for every reference type.
pub fn default_value(target: &TypeRef) -> CodeValue {
    match target.primitive() {
        Some(primitive) => zero_value(primitive),
        None => CodeValue::Null,
    }
}

/// Infinity/NaN spellings accepted by the platform float parser.
fn floating_sentinel(raw: &str) -> Option<&'static str> {
    match raw.trim() {
        "Infinity" | "+Infinity" => Some("POSITIVE_INFINITY"),
        "-Infinity" => Some("NEGATIVE_INFINITY"),
        "NaN" | "+NaN" | "-NaN" => Some("NaN"),
        _ => None,
    }
}

/// Accepts decimal floating literals with an optional `f`/`d` suffix.
fn parse_floating(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_suffix(|c| matches!(c, 'f' | 'F' | 'd' | 'D'))
        .unwrap_or(trimmed);
    if body.is_empty()
        || !body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    body.parse::<f64>().ok()
}

fn invalid(raw: &str, target: &TypeRef) -> CompilerError {
    CompilerError::invalid_literal(format!("'{}' is not a valid {} literal", raw, target))
}

/// Folds a literal for a primitive (or its boxed form) at compile time.
fn fold_primitive(raw: &str, primitive: Primitive, target: &TypeRef) -> Result<CodeValue, CompilerError> {
    let value = match primitive {
        Primitive::Boolean => CodeValue::Bool {
            value: raw.eq_ignore_ascii_case("true"),
        },
        Primitive::Byte => {
            let parsed: i8 = raw.parse().map_err(|_| invalid(raw, target))?;
            CodeValue::literal(format!("(byte) {}", parsed))
        }
        Primitive::Short => {
            let parsed: i16 = raw.parse().map_err(|_| invalid(raw, target))?;
            CodeValue::literal(format!("(short) {}", parsed))
        }
        Primitive::Int => {
            let parsed: i32 = raw.parse().map_err(|_| invalid(raw, target))?;
            CodeValue::literal(parsed.to_string())
        }
        Primitive::Long => {
            let parsed: i64 = raw.parse().map_err(|_| invalid(raw, target))?;
            CodeValue::literal(format!("{}L", parsed))
        }
        Primitive::Float | Primitive::Double => {
            let boxed = TypeRef::class(primitive.boxed());
            if let Some(field) = floating_sentinel(raw) {
                return Ok(CodeValue::static_field(&boxed, field));
            }
            let parsed = parse_floating(raw).ok_or_else(|| invalid(raw, target))?;
            if primitive == Primitive::Float {
                let narrowed = parsed as f32;
                if narrowed.is_infinite() {
                    let field = if narrowed > 0.0 { "POSITIVE_INFINITY" } else { "NEGATIVE_INFINITY" };
                    return Ok(CodeValue::static_field(&boxed, field));
                }
                CodeValue::literal(format!("{:?}f", narrowed))
            } else {
                if parsed.is_infinite() {
                    let field = if parsed > 0.0 { "POSITIVE_INFINITY" } else { "NEGATIVE_INFINITY" };
                    return Ok(CodeValue::static_field(&boxed, field));
                }
                CodeValue::literal(format!("{:?}", parsed))
            }
        }
        Primitive::Char => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.len_utf16() == 1 => CodeValue::Char { value: c },
                (Some(_), None) => {
                    return Err(CompilerError::unsupported(format!(
                        "'{}' needs a surrogate pair and cannot be a {} value",
                        raw, target
                    )))
                }
                _ => return Err(invalid(raw, target)),
            }
        }
    };
    Ok(value)
}

impl<'r, 'a> ValueResolver<'r, 'a> {
    pub fn new(types: &'r TypeResolver<'a>, names: &'r NameResolver) -> Self {
        ValueResolver { types, names }
    }

    /// Coerces raw text to `target` through the fixed strategy order.
    pub fn coerce_literal(&self, raw: &str, target: &TypeRef) -> Result<CodeValue, CompilerError> {
        if target.is_class(OBJECT) {
            return Ok(CodeValue::string(raw));
        }

        let boxed_primitive = target
            .primitive()
            .or_else(|| target.class_name().and_then(Primitive::from_boxed));

        if boxed_primitive == Some(Primitive::Char) {
            return fold_primitive(raw, Primitive::Char, target);
        }

        if self.types.is_assignable(target, &TypeRef::string()) {
            return Ok(CodeValue::string(raw));
        }

        if let Some(component) = target.component() {
            let values = raw
                .split(ARRAY_DELIMITER)
                .map(|part| self.coerce_literal(part, component))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(CodeValue::Array(ArrayInitialization::Declared {
                component: component.clone(),
                values,
            }));
        }

        if raw.trim().is_empty() {
            return Ok(default_value(target));
        }

        if let Some(primitive) = boxed_primitive {
            return fold_primitive(raw, primitive, target);
        }

        if self.types.is_enum(target) {
            if self.types.enum_constant(target, raw) {
                return Ok(CodeValue::Enum {
                    ty: target.raw(),
                    member: raw.to_string(),
                });
            }
            return Err(CompilerError::invalid_literal(format!(
                "'{}' is not a constant of enum {}",
                raw, target
            )));
        }

        let string = [TypeRef::string()];
        if let Some(method) = self
            .types
            .find_compatible_method(target, "valueOf", true, &string)
            .filter(|m| self.types.is_assignable(target, &m.returns))
        {
            return Ok(CodeValue::static_call(
                target,
                &method.name,
                vec![CodeValue::string(raw)],
            ));
        }

        let factory = self.types.methods(target).into_iter().find(|m| {
            m.is_static
                && m.params.len() == 1
                && m.params[0].ty.is_class(STRING)
                && self.types.is_assignable(target, &m.returns)
        });
        if let Some(method) = factory {
            return Ok(CodeValue::static_call(
                target,
                &method.name,
                vec![CodeValue::string(raw)],
            ));
        }

        Err(CompilerError::unsupported(format!(
            "Cannot coerce '{}' to {}",
            raw, target
        )))
    }

    /// Constructor-parameter default: blank means the zero value.
    pub fn coerce_default(&self, literal: Option<&str>, target: &TypeRef) -> Result<CodeValue, CompilerError> {
        match literal {
            Some(raw) if !raw.trim().is_empty() => self.coerce_literal(raw, target),
            _ => Ok(default_value(target)),
        }
    }

    pub fn coerce_value(&self, value: &Value, target: &TypeRef) -> Result<CodeValue, CompilerError> {
        match value {
            Value::Empty => self.coerce_literal("", target),
            Value::Literal(raw) => self.coerce_literal(raw, target),
            Value::Reference(id) => self.resolve_reference(id, target),
            Value::Resource(key) => self.resolve_resource(key, target),
            Value::Location(path) => Err(CompilerError::unsupported(format!(
                "Location value '@{}' cannot be coerced",
                path
            ))),
            Value::Expression(expression) => Err(CompilerError::unsupported(format!(
                "Expression '{}' must be bound, not coerced",
                expression
            ))),
        }
    }

    pub fn resolve_reference(&self, id: &str, target: &TypeRef) -> Result<CodeValue, CompilerError> {
        let stored = self.names.resolve_type_by_id(id)?;
        if !self.types.is_invocation_compatible(target, stored) {
            return Err(CompilerError::unsupported(format!(
                "Id '{}' of type {} is not assignable to {}",
                id, stored, target
            )));
        }
        Ok(CodeValue::var(id))
    }

    pub fn resolve_resource(&self, key: &str, target: &TypeRef) -> Result<CodeValue, CompilerError> {
        if !self.types.is_assignable(target, &TypeRef::string()) {
            return Err(CompilerError::unsupported(format!(
                "Resource '%{}' can only be used for String values, not {}",
                key, target
            )));
        }
        Ok(CodeValue::call(
            CodeValue::var(RESOURCES),
            "getString",
            vec![CodeValue::string(key)],
        ))
    }

    /// Type of the resources bundle parameter available to every build.
    pub fn resources_type() -> TypeRef {
        TypeRef::class(RESOURCE_BUNDLE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MethodInfo, TableProvider, TypeInfo};
    use crate::validate::{ERR_INVALID_LITERAL, ERR_UNSUPPORTED_COERCION};

    fn provider() -> TableProvider {
        let mut provider = TableProvider::with_builtins();
        provider.insert(TypeInfo::enumeration("javafx.geometry.Pos", &["CENTER", "TOP_LEFT"]));
        provider.insert(
            TypeInfo::class("javafx.scene.paint.Color")
                .method(MethodInfo::static_method("web", &[STRING], "javafx.scene.paint.Color")),
        );
        provider
    }

    fn coerce(raw: &str, target: &str) -> Result<CodeValue, CompilerError> {
        let provider = provider();
        let types = TypeResolver::new(&provider);
        let names = NameResolver::new();
        ValueResolver::new(&types, &names).coerce_literal(raw, &TypeRef::parse(target).unwrap())
    }

    #[test]
    fn test_blank_primitive_defaults() {
        let expected = [
            ("boolean", CodeValue::Bool { value: false }),
            ("byte", CodeValue::literal("(byte) 0")),
            ("short", CodeValue::literal("(short) 0")),
            ("int", CodeValue::literal("0")),
            ("long", CodeValue::literal("0L")),
            ("float", CodeValue::literal("0.0f")),
            ("double", CodeValue::literal("0.0")),
        ];
        for (target, value) in expected {
            assert_eq!(coerce("", target).unwrap(), value, "{}", target);
        }
        for boxed in ["java.lang.Boolean", "java.lang.Integer", "java.lang.Double"] {
            assert_eq!(coerce("", boxed).unwrap(), CodeValue::Null);
        }
    }

    #[test]
    fn test_floating_sentinels_use_constants() {
        for (target, boxed) in [("float", "java.lang.Float"), ("double", "java.lang.Double")] {
            let boxed = TypeRef::class(boxed);
            assert_eq!(
                coerce("Infinity", target).unwrap(),
                CodeValue::static_field(&boxed, "POSITIVE_INFINITY")
            );
            assert_eq!(
                coerce("-Infinity", target).unwrap(),
                CodeValue::static_field(&boxed, "NEGATIVE_INFINITY")
            );
            assert_eq!(coerce("NaN", target).unwrap(), CodeValue::static_field(&boxed, "NaN"));
        }
    }

    #[test]
    fn test_string_array_split() {
        assert_eq!(
            coerce("hello,world", "java.lang.String[]").unwrap(),
            CodeValue::Array(ArrayInitialization::Declared {
                component: TypeRef::string(),
                values: vec![CodeValue::string("hello"), CodeValue::string("world")],
            })
        );
    }

    #[test]
    fn test_numeric_folding() {
        assert_eq!(coerce("20", "double").unwrap(), CodeValue::literal("20.0"));
        assert_eq!(coerce("007", "int").unwrap(), CodeValue::literal("7"));
        assert_eq!(coerce("5", "java.lang.Long").unwrap(), CodeValue::literal("5L"));
        assert_eq!(coerce("0.5", "float").unwrap(), CodeValue::literal("0.5f"));
        assert_eq!(coerce("TRUE", "boolean").unwrap(), CodeValue::Bool { value: true });
        assert_eq!(coerce("yes", "boolean").unwrap(), CodeValue::Bool { value: false });
        assert_eq!(coerce("abc", "int").unwrap_err().code, ERR_INVALID_LITERAL);
        assert_eq!(coerce("300", "byte").unwrap_err().code, ERR_INVALID_LITERAL);
        assert_eq!(coerce("inf", "double").unwrap_err().code, ERR_INVALID_LITERAL);
    }

    #[test]
    fn test_char_requires_single_code_point() {
        assert_eq!(coerce("é", "char").unwrap(), CodeValue::Char { value: 'é' });
        assert_eq!(coerce("ab", "char").unwrap_err().code, ERR_INVALID_LITERAL);
        assert_eq!(coerce("", "java.lang.Character").unwrap_err().code, ERR_INVALID_LITERAL);
    }

    #[test]
    fn test_char_outside_basic_plane_is_unsupported() {
        assert_eq!(coerce("\u{FFFF}", "char").unwrap(), CodeValue::Char { value: '\u{FFFF}' });
        let err = coerce("😀", "char").unwrap_err();
        assert_eq!(err.code, ERR_UNSUPPORTED_COERCION);
        assert!(err.message.contains("surrogate pair"));
        assert_eq!(coerce("😀", "java.lang.Character").unwrap_err().code, ERR_UNSUPPORTED_COERCION);
    }

    #[test]
    fn test_enum_and_factory_coercion() {
        let pos = TypeRef::class("javafx.geometry.Pos");
        assert_eq!(
            coerce("CENTER", "javafx.geometry.Pos").unwrap(),
            CodeValue::Enum {
                ty: pos,
                member: "CENTER".into()
            }
        );
        assert_eq!(
            coerce("center", "javafx.geometry.Pos").unwrap_err().code,
            ERR_INVALID_LITERAL
        );
        assert_eq!(
            coerce("#ff0000", "javafx.scene.paint.Color").unwrap(),
            CodeValue::static_call(
                &TypeRef::class("javafx.scene.paint.Color"),
                "web",
                vec![CodeValue::string("#ff0000")]
            )
        );
        assert_eq!(
            coerce("x", "java.util.ArrayList").unwrap_err().code,
            ERR_UNSUPPORTED_COERCION
        );
    }

    #[test]
    fn test_object_and_string_targets_wrap() {
        assert_eq!(coerce("42", "java.lang.Object").unwrap(), CodeValue::string("42"));
        assert_eq!(coerce("42", "java.lang.CharSequence").unwrap(), CodeValue::string("42"));
    }

    #[test]
    fn test_reference_and_resource() {
        let provider = provider();
        let types = TypeResolver::new(&provider);
        let mut names = NameResolver::new();
        names.store_id_type("count", TypeRef::class("java.lang.Integer")).unwrap();
        let values = ValueResolver::new(&types, &names);

        assert_eq!(
            values.resolve_reference("count", &TypeRef::Primitive(Primitive::Int)).unwrap(),
            CodeValue::var("count")
        );
        assert_eq!(
            values.resolve_reference("count", &TypeRef::string()).unwrap_err().code,
            ERR_UNSUPPORTED_COERCION
        );
        assert_eq!(
            values.resolve_resource("title", &TypeRef::string()).unwrap(),
            CodeValue::call(CodeValue::var("resources"), "getString", vec![CodeValue::string("title")])
        );
        assert!(values
            .coerce_value(&Value::Location("a.png".into()), &TypeRef::string())
            .is_err());
        assert!(values
            .resolve_resource("n", &TypeRef::Primitive(Primitive::Int))
            .is_err());
    }
}
