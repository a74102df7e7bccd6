#[cfg(test)]
mod tests {
    use crate::expression::{parse_expression, BindExpression};
    use crate::validate::ERR_GRAMMAR_SYNTAX;

    fn b(expr: BindExpression) -> Box<BindExpression> {
        Box::new(expr)
    }

    fn whole(n: i64) -> Box<BindExpression> {
        b(BindExpression::Whole(n))
    }

    #[test]
    fn test_operator_precedence() {
        let expr = parse_expression("10-10*10+10<a&&true").unwrap();
        let expected = BindExpression::And(
            b(BindExpression::LessThan(
                b(BindExpression::Add(
                    b(BindExpression::Subtract(
                        whole(10),
                        b(BindExpression::Multiply(whole(10), whole(10))),
                    )),
                    whole(10),
                )),
                b(BindExpression::Variable("a".to_string())),
            )),
            b(BindExpression::Boolean(true)),
        );
        assert_eq!(expr, expected);
        assert_eq!(expr.to_string(), "((((10 - (10 * 10)) + 10) < a) && true)");
    }

    #[test]
    fn test_quote_nesting() {
        assert_eq!(
            parse_expression(r#""'false'""#).unwrap(),
            BindExpression::String("'false'".to_string())
        );
        assert_eq!(
            parse_expression(r#"'"true"'"#).unwrap(),
            BindExpression::String("\"true\"".to_string())
        );
    }

    #[test]
    fn test_numeric_normalization() {
        for source in [".1e2", "1e1", "1.0e1"] {
            assert_eq!(
                parse_expression(source).unwrap(),
                BindExpression::Fraction(10.0),
                "{}",
                source
            );
        }
        assert_eq!(parse_expression("42").unwrap(), BindExpression::Whole(42));
    }

    #[test]
    fn test_logical_operators_share_a_tier() {
        let expr = parse_expression("a || b && c").unwrap();
        assert_eq!(expr.to_string(), "((a || b) && c)");
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expr = parse_expression("(1 + 2) * 3").unwrap();
        assert_eq!(
            expr,
            BindExpression::Multiply(b(BindExpression::Add(whole(1), whole(2))), whole(3))
        );
    }

    #[test]
    fn test_unary_and_paths() {
        assert_eq!(
            parse_expression("!user.active").unwrap(),
            BindExpression::Invert(b(BindExpression::PropertyRead(
                b(BindExpression::Variable("user".to_string())),
                "active".to_string()
            )))
        );
        assert_eq!(parse_expression("items[2]").unwrap().to_string(), "items[2]");
        assert_eq!(parse_expression("null").unwrap(), BindExpression::Null);
    }

    #[test]
    fn test_syntax_errors() {
        for source in ["1 +", "(a", "a b", "'open", ""] {
            let err = parse_expression(source).unwrap_err();
            assert_eq!(err.code, ERR_GRAMMAR_SYNTAX, "{}", source);
        }
    }
}
