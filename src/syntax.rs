//! Attribute value micro-syntax.
//!
//! A raw attribute or text value is dispatched on its leading sentinel:
//! `@` location, `%` resource, `${...}` bind expression, `$` reference,
//! `\` escape, blank → empty, anything else a literal.

use serde::{Deserialize, Serialize};

use crate::expression::{parse_expression, BindExpression};
use crate::validate::CompilerError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Value {
    Empty,
    Literal(String),
    Reference(String),
    Resource(String),
    Location(String),
    Expression(BindExpression),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
}

/// Event handler attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Handler {
    Empty,
    /// `#name`: a controller method.
    Method(String),
    /// `$id`: a previously declared handler object.
    Reference(String),
    Script(String),
}

pub fn parse_value(raw: &str) -> Result<Value, CompilerError> {
    if raw.trim().is_empty() {
        return Ok(Value::Empty);
    }

    if let Some(rest) = raw.strip_prefix('\\') {
        return Ok(Value::Literal(rest.to_string()));
    }

    if let Some(rest) = raw.strip_prefix('@') {
        return Ok(Value::Location(rest.to_string()));
    }

    if let Some(rest) = raw.strip_prefix('%') {
        return Ok(Value::Resource(rest.to_string()));
    }

    if let Some(rest) = raw.strip_prefix("${") {
        let Some(inner) = rest.strip_suffix('}') else {
            return Err(CompilerError::syntax(format!(
                "Unterminated bind expression '{}'",
                raw
            )));
        };
        return Ok(Value::Expression(parse_expression(inner)?));
    }

    if let Some(rest) = raw.strip_prefix('$') {
        return Ok(Value::Reference(rest.to_string()));
    }

    Ok(Value::Literal(raw.to_string()))
}

pub fn parse_handler(raw: &str) -> Handler {
    if raw.trim().is_empty() {
        Handler::Empty
    } else if let Some(method) = raw.strip_prefix('#') {
        Handler::Method(method.to_string())
    } else if let Some(reference) = raw.strip_prefix('$') {
        Handler::Reference(reference.to_string())
    } else {
        Handler::Script(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_dispatch() {
        assert_eq!(parse_value("$button").unwrap(), Value::Reference("button".into()));
        assert_eq!(parse_value("%title").unwrap(), Value::Resource("title".into()));
        assert_eq!(parse_value("@img/a.png").unwrap(), Value::Location("img/a.png".into()));
        assert_eq!(parse_value("Hello").unwrap(), Value::Literal("Hello".into()));
        assert_eq!(parse_value("").unwrap(), Value::Empty);
        assert_eq!(parse_value("   ").unwrap(), Value::Empty);
    }

    #[test]
    fn test_expression_wraps_grammar() {
        assert_eq!(
            parse_value("${a.text}").unwrap(),
            Value::Expression(BindExpression::PropertyRead(
                Box::new(BindExpression::Variable("a".into())),
                "text".into()
            ))
        );
    }

    #[test]
    fn test_escape_keeps_sentinel() {
        assert_eq!(parse_value("\\$5").unwrap(), Value::Literal("$5".into()));
        assert_eq!(parse_value("\\@home").unwrap(), Value::Literal("@home".into()));
    }

    #[test]
    fn test_unterminated_expression() {
        let err = parse_value("${a.text").unwrap_err();
        assert_eq!(err.code, crate::validate::ERR_GRAMMAR_SYNTAX);
    }

    #[test]
    fn test_handler_forms() {
        assert_eq!(parse_handler("#onSave"), Handler::Method("onSave".into()));
        assert_eq!(parse_handler("$saveHandler"), Handler::Reference("saveHandler".into()));
        assert_eq!(parse_handler(""), Handler::Empty);
        assert_eq!(
            parse_handler("doIt()"),
            Handler::Script("doIt()".into())
        );
    }
}
