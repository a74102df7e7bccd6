//! Bind-expression resolution.
//!
//! Infers the type of a bind expression and lowers it to a flat list of
//! hoisted assignments plus a final typed handle. Literals stay inline;
//! every call result is bound to a fresh local named after its type.

use serde::{Deserialize, Serialize};

use crate::code::{CodeValue, Statement};
use crate::context::ResolverContext;
use crate::expression::{BinaryOp, BindExpression};
use crate::metadata::{Primitive, TypeRef};
use crate::validate::CompilerError;

pub const BINDINGS: &str = "javafx.beans.binding.Bindings";
pub const OBSERVABLE_VALUE: &str = "javafx.beans.value.ObservableValue";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionResult {
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub value: CodeValue,
    /// Assignments that must run, in order, before `value` is usable.
    pub statements: Vec<Statement>,
}

impl ExpressionResult {
    fn inline(ty: TypeRef, value: CodeValue) -> Self {
        ExpressionResult {
            ty,
            value,
            statements: vec![],
        }
    }
}

/// Instance method names tried on the left operand, then the static
/// `Bindings` helpers.
fn operator_methods(op: BinaryOp) -> Option<(&'static [&'static str], &'static [&'static str])> {
    Some(match op {
        BinaryOp::Add => (&["add", "concat"], &["add", "concat"]),
        BinaryOp::Subtract => (&["subtract"], &["subtract"]),
        BinaryOp::Multiply => (&["multiply"], &["multiply"]),
        BinaryOp::Divide => (&["divide"], &["divide"]),
        BinaryOp::GreaterThan => (&["greaterThan"], &["greaterThan"]),
        BinaryOp::GreaterThanEqual => (&["greaterThanOrEqualTo"], &["greaterThanOrEqual"]),
        BinaryOp::LessThan => (&["lessThan"], &["lessThan"]),
        BinaryOp::LessThanEqual => (&["lessThanOrEqualTo"], &["lessThanOrEqual"]),
        BinaryOp::Equal => (&["isEqualTo"], &["equal"]),
        BinaryOp::NotEqual => (&["isNotEqualTo"], &["notEqual"]),
        BinaryOp::And => (&["and"], &["and"]),
        BinaryOp::Or => (&["or"], &["or"]),
        BinaryOp::Modulo => return None,
    })
}

pub fn is_observable(ctx: &ResolverContext<'_>, ty: &TypeRef) -> bool {
    ctx.types.is_assignable(&TypeRef::class(OBSERVABLE_VALUE), ty)
}

/// Binds a call result to a fresh local and returns the handle.
fn hoist(
    ctx: &mut ResolverContext<'_>,
    mut statements: Vec<Statement>,
    ty: TypeRef,
    value: CodeValue,
) -> ExpressionResult {
    let identifier = ctx.names.unique_name(&ty);
    statements.push(Statement::assign(&ty, &identifier, value));
    ExpressionResult {
        ty,
        value: CodeValue::var(&identifier),
        statements,
    }
}

fn whole_literal(value: i64) -> ExpressionResult {
    match i32::try_from(value) {
        Ok(int) => ExpressionResult::inline(
            TypeRef::Primitive(Primitive::Int),
            CodeValue::literal(int.to_string()),
        ),
        Err(_) => ExpressionResult::inline(
            TypeRef::Primitive(Primitive::Long),
            CodeValue::literal(format!("{}L", value)),
        ),
    }
}

fn fraction_literal(value: f64) -> ExpressionResult {
    let narrowed = value as f32;
    if narrowed.is_finite() && f64::from(narrowed) == value {
        ExpressionResult::inline(
            TypeRef::Primitive(Primitive::Float),
            CodeValue::literal(format!("{:?}f", narrowed)),
        )
    } else {
        ExpressionResult::inline(
            TypeRef::Primitive(Primitive::Double),
            CodeValue::literal(format!("{:?}", value)),
        )
    }
}

pub fn resolve_expression(
    ctx: &mut ResolverContext<'_>,
    expression: &BindExpression,
) -> Result<ExpressionResult, CompilerError> {
    match expression {
        BindExpression::Null => Ok(ExpressionResult::inline(TypeRef::object(), CodeValue::Null)),
        BindExpression::Boolean(value) => Ok(ExpressionResult::inline(
            TypeRef::Primitive(Primitive::Boolean),
            CodeValue::Bool { value: *value },
        )),
        BindExpression::Whole(value) => Ok(whole_literal(*value)),
        BindExpression::Fraction(value) => Ok(fraction_literal(*value)),
        BindExpression::String(value) => Ok(ExpressionResult::inline(
            TypeRef::string(),
            CodeValue::string(value),
        )),
        BindExpression::Variable(id) => {
            let ty = ctx.names.resolve_type_by_id(id)?.clone();
            Ok(ExpressionResult::inline(ty, CodeValue::var(id)))
        }
        BindExpression::PropertyRead(target, property) => {
            let base = resolve_expression(ctx, target)?;
            let method = ctx
                .types
                .find_property_method(&base.ty, property)
                .ok_or_else(|| {
                    CompilerError::member_resolution(format!(
                        "No property '{}' found on {} for expression binding",
                        property, base.ty
                    ))
                })?;
            let value = CodeValue::call(base.value, &method.name, vec![]);
            Ok(hoist(ctx, base.statements, method.returns.clone(), value))
        }
        BindExpression::MethodCall(target, name, args) => {
            let base = resolve_expression(ctx, target)?;
            let mut statements = base.statements;
            let mut arg_types = Vec::with_capacity(args.len());
            let mut arg_values = Vec::with_capacity(args.len());
            for arg in args {
                let resolved = resolve_expression(ctx, arg)?;
                statements.extend(resolved.statements);
                arg_types.push(resolved.ty);
                arg_values.push(resolved.value);
            }
            let method = ctx
                .types
                .find_compatible_method(&base.ty, name, false, &arg_types)
                .filter(|m| !m.returns.is_void())
                .ok_or_else(|| {
                    CompilerError::member_resolution(format!(
                        "No method {} on {} accepting ({})",
                        name,
                        base.ty,
                        arg_types
                            .iter()
                            .map(|t| t.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                })?;
            let value = CodeValue::call(base.value, &method.name, arg_values);
            Ok(hoist(ctx, statements, method.returns.clone(), value))
        }
        BindExpression::CollectionAccess(collection, key) => {
            let collection = resolve_expression(ctx, collection)?;
            let key = resolve_expression(ctx, key)?;
            let bindings = TypeRef::class(BINDINGS);
            let method = ctx
                .types
                .find_compatible_method(&bindings, "valueAt", true, &[collection.ty.clone(), key.ty.clone()])
                .ok_or_else(|| {
                    CompilerError::member_resolution(format!(
                        "Unable to access {} with key of type {}",
                        collection.ty, key.ty
                    ))
                })?;
            let mut statements = collection.statements;
            statements.extend(key.statements);
            let value = CodeValue::static_call(&bindings, &method.name, vec![collection.value, key.value]);
            Ok(hoist(ctx, statements, method.returns.clone(), value))
        }
        BindExpression::Negate(operand) => resolve_unary(ctx, operand, "negate"),
        BindExpression::Invert(operand) => resolve_unary(ctx, operand, "not"),
        other => match other.as_binary() {
            Some((op, left, right)) => resolve_binary(ctx, op, left, right),
            None => Err(CompilerError::unsupported(format!(
                "Unsupported expression {}",
                other
            ))),
        },
    }
}

fn resolve_unary(
    ctx: &mut ResolverContext<'_>,
    operand: &BindExpression,
    method_name: &str,
) -> Result<ExpressionResult, CompilerError> {
    let operand_result = resolve_expression(ctx, operand)?;
    let statements = operand_result.statements;

    if let Some(method) = ctx.types.find_no_arg_method(&operand_result.ty, method_name) {
        let value = CodeValue::call(operand_result.value, &method.name, vec![]);
        return Ok(hoist(ctx, statements, method.returns.clone(), value));
    }

    let bindings = TypeRef::class(BINDINGS);
    if let Some(method) = ctx.types.find_compatible_method(
        &bindings,
        method_name,
        true,
        std::slice::from_ref(&operand_result.ty),
    ) {
        let value = CodeValue::static_call(&bindings, &method.name, vec![operand_result.value]);
        return Ok(hoist(ctx, statements, method.returns.clone(), value));
    }

    Err(CompilerError::member_resolution(format!(
        "Cannot {} {}",
        method_name, operand
    )))
}

fn resolve_binary(
    ctx: &mut ResolverContext<'_>,
    op: BinaryOp,
    left: &BindExpression,
    right: &BindExpression,
) -> Result<ExpressionResult, CompilerError> {
    let Some((direct, indirect)) = operator_methods(op) else {
        return Err(CompilerError::unsupported(format!(
            "Operator '{}' is not supported in bind expressions",
            op.symbol()
        )));
    };

    let left_result = resolve_expression(ctx, left)?;
    let right_result = resolve_expression(ctx, right)?;
    let mut statements = left_result.statements;
    statements.extend(right_result.statements);

    let right_types = [right_result.ty.clone()];
    let direct_method = direct
        .iter()
        .find_map(|name| ctx.types.find_compatible_method(&left_result.ty, name, false, &right_types));
    if let Some(method) = direct_method {
        let value = CodeValue::call(left_result.value, &method.name, vec![right_result.value]);
        return Ok(hoist(ctx, statements, method.returns.clone(), value));
    }

    let bindings = TypeRef::class(BINDINGS);
    let both = [left_result.ty.clone(), right_result.ty.clone()];
    let indirect_method = indirect
        .iter()
        .find_map(|name| ctx.types.find_compatible_method(&bindings, name, true, &both));
    if let Some(method) = indirect_method {
        let value = CodeValue::static_call(
            &bindings,
            &method.name,
            vec![left_result.value, right_result.value],
        );
        return Ok(hoist(ctx, statements, method.returns.clone(), value));
    }

    Err(CompilerError::member_resolution(format!(
        "Cannot {} {} and {}",
        direct.join(" or "),
        left,
        right
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{CompileEnv, MemorySourceLoader};
    use crate::expression::parse_expression;
    use crate::test_support::component_library;
    use crate::validate::{ERR_MEMBER_RESOLUTION, ERR_UNKNOWN_ID, ERR_UNSUPPORTED_COERCION};

    fn resolve(setup: &[(&str, &str)], source: &str) -> Result<ExpressionResult, CompilerError> {
        let provider = component_library();
        let loader = MemorySourceLoader::new();
        let env = CompileEnv::new(&provider, &loader, "fxml.builder", "fxml.api.FxmlBuilder");
        let mut ctx = ResolverContext::new(&env, "test.fxml", vec![]);
        for (id, ty) in setup {
            ctx.names.store_id_type(id, TypeRef::parse(ty).unwrap()).unwrap();
        }
        resolve_expression(&mut ctx, &parse_expression(source)?)
    }

    #[test]
    fn test_literals_stay_inline() {
        let whole = resolve(&[], "1").unwrap();
        assert_eq!(whole.ty, TypeRef::Primitive(Primitive::Int));
        assert!(whole.statements.is_empty());
        assert_eq!(resolve(&[], "3000000000").unwrap().value, CodeValue::literal("3000000000L"));
        assert_eq!(resolve(&[], "1.0").unwrap().value, CodeValue::literal("1.0f"));
        assert_eq!(resolve(&[], "0.1").unwrap().ty, TypeRef::Primitive(Primitive::Double));
        assert_eq!(resolve(&[], "null").unwrap().ty, TypeRef::object());
    }

    #[test]
    fn test_property_read_hoists_property() {
        let result = resolve(&[("a", "javafx.scene.control.Label")], "a.text").unwrap();
        let property = TypeRef::class("javafx.beans.property.StringProperty");
        assert_eq!(result.ty, property);
        assert_eq!(result.value, CodeValue::var("stringProperty0"));
        assert_eq!(
            result.statements,
            vec![Statement::assign(
                &property,
                "stringProperty0",
                CodeValue::call(CodeValue::var("a"), "textProperty", vec![])
            )]
        );
    }

    #[test]
    fn test_binary_prefers_instance_method() {
        let result = resolve(&[("a", "javafx.beans.property.IntegerProperty")], "a + 0").unwrap();
        assert_eq!(result.value, CodeValue::var("integerBinding0"));
        assert_eq!(
            result.statements,
            vec![Statement::assign(
                &TypeRef::class("javafx.beans.binding.IntegerBinding"),
                "integerBinding0",
                CodeValue::call(CodeValue::var("a"), "add", vec![CodeValue::literal("0")])
            )]
        );
    }

    #[test]
    fn test_binary_falls_back_to_bindings() {
        let result = resolve(&[("a", "javafx.beans.value.ObservableNumberValue")], "a > 0").unwrap();
        assert_eq!(
            result.statements,
            vec![Statement::assign(
                &TypeRef::class("javafx.beans.binding.BooleanBinding"),
                "booleanBinding0",
                CodeValue::static_call(
                    &TypeRef::class(BINDINGS),
                    "greaterThan",
                    vec![CodeValue::var("a"), CodeValue::literal("0")]
                )
            )]
        );
    }

    #[test]
    fn test_nested_statements_keep_evaluation_order() {
        let result = resolve(&[("a", "javafx.scene.control.Label")], "!a.visible").unwrap();
        assert_eq!(result.statements.len(), 2);
        assert!(matches!(
            &result.statements[0],
            Statement::Assignment { identifier, .. } if identifier == "booleanProperty0"
        ));
        assert_eq!(result.value, CodeValue::var("booleanBinding0"));
    }

    #[test]
    fn test_failures() {
        assert_eq!(resolve(&[], "missing.text").unwrap_err().code, ERR_UNKNOWN_ID);
        assert_eq!(
            resolve(&[("a", "javafx.scene.control.Label")], "a.blank").unwrap_err().code,
            ERR_MEMBER_RESOLUTION
        );
        assert_eq!(
            resolve(&[("a", "javafx.beans.property.IntegerProperty")], "a % 2")
                .unwrap_err()
                .code,
            ERR_UNSUPPORTED_COERCION
        );
    }
}
