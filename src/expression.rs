//! Bind expression grammar.
//!
//! Precedence, lowest first: logical (`&&`, `||`), equality, relational,
//! additive, multiplicative, unary (`-`, `!`), postfix (property read, method
//! call, collection access), primary. Binary tiers are left-associative.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::validate::CompilerError;

// ═══════════════════════════════════════════════════════════════════════════════
// AST
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", content = "args", rename_all = "camelCase")]
pub enum BindExpression {
    Null,
    Boolean(bool),
    Whole(i64),
    Fraction(f64),
    String(String),
    Variable(String),
    PropertyRead(Box<BindExpression>, String),
    MethodCall(Box<BindExpression>, String, Vec<BindExpression>),
    CollectionAccess(Box<BindExpression>, Box<BindExpression>),
    Negate(Box<BindExpression>),
    Invert(Box<BindExpression>),
    Multiply(Box<BindExpression>, Box<BindExpression>),
    Divide(Box<BindExpression>, Box<BindExpression>),
    Modulo(Box<BindExpression>, Box<BindExpression>),
    Add(Box<BindExpression>, Box<BindExpression>),
    Subtract(Box<BindExpression>, Box<BindExpression>),
    GreaterThan(Box<BindExpression>, Box<BindExpression>),
    GreaterThanEqual(Box<BindExpression>, Box<BindExpression>),
    LessThan(Box<BindExpression>, Box<BindExpression>),
    LessThanEqual(Box<BindExpression>, Box<BindExpression>),
    Equal(Box<BindExpression>, Box<BindExpression>),
    NotEqual(Box<BindExpression>, Box<BindExpression>),
    And(Box<BindExpression>, Box<BindExpression>),
    Or(Box<BindExpression>, Box<BindExpression>),
}

/// Binary operators, named after the binding method each one maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Multiply,
    Divide,
    Modulo,
    Add,
    Subtract,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanEqual => ">=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanEqual => "<=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "*" => BinaryOp::Multiply,
            "/" => BinaryOp::Divide,
            "%" => BinaryOp::Modulo,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Subtract,
            ">" => BinaryOp::GreaterThan,
            ">=" => BinaryOp::GreaterThanEqual,
            "<" => BinaryOp::LessThan,
            "<=" => BinaryOp::LessThanEqual,
            "==" => BinaryOp::Equal,
            "!=" => BinaryOp::NotEqual,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            _ => return None,
        })
    }

    pub fn build(self, left: BindExpression, right: BindExpression) -> BindExpression {
        let (l, r) = (Box::new(left), Box::new(right));
        match self {
            BinaryOp::Multiply => BindExpression::Multiply(l, r),
            BinaryOp::Divide => BindExpression::Divide(l, r),
            BinaryOp::Modulo => BindExpression::Modulo(l, r),
            BinaryOp::Add => BindExpression::Add(l, r),
            BinaryOp::Subtract => BindExpression::Subtract(l, r),
            BinaryOp::GreaterThan => BindExpression::GreaterThan(l, r),
            BinaryOp::GreaterThanEqual => BindExpression::GreaterThanEqual(l, r),
            BinaryOp::LessThan => BindExpression::LessThan(l, r),
            BinaryOp::LessThanEqual => BindExpression::LessThanEqual(l, r),
            BinaryOp::Equal => BindExpression::Equal(l, r),
            BinaryOp::NotEqual => BindExpression::NotEqual(l, r),
            BinaryOp::And => BindExpression::And(l, r),
            BinaryOp::Or => BindExpression::Or(l, r),
        }
    }
}

impl BindExpression {
    /// Splits a binary node into its operator and operands.
    pub fn as_binary(&self) -> Option<(BinaryOp, &BindExpression, &BindExpression)> {
        let (op, l, r) = match self {
            BindExpression::Multiply(l, r) => (BinaryOp::Multiply, l, r),
            BindExpression::Divide(l, r) => (BinaryOp::Divide, l, r),
            BindExpression::Modulo(l, r) => (BinaryOp::Modulo, l, r),
            BindExpression::Add(l, r) => (BinaryOp::Add, l, r),
            BindExpression::Subtract(l, r) => (BinaryOp::Subtract, l, r),
            BindExpression::GreaterThan(l, r) => (BinaryOp::GreaterThan, l, r),
            BindExpression::GreaterThanEqual(l, r) => (BinaryOp::GreaterThanEqual, l, r),
            BindExpression::LessThan(l, r) => (BinaryOp::LessThan, l, r),
            BindExpression::LessThanEqual(l, r) => (BinaryOp::LessThanEqual, l, r),
            BindExpression::Equal(l, r) => (BinaryOp::Equal, l, r),
            BindExpression::NotEqual(l, r) => (BinaryOp::NotEqual, l, r),
            BindExpression::And(l, r) => (BinaryOp::And, l, r),
            BindExpression::Or(l, r) => (BinaryOp::Or, l, r),
            _ => return None,
        };
        Some((op, l.as_ref(), r.as_ref()))
    }
}

impl fmt::Display for BindExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((op, l, r)) = self.as_binary() {
            return write!(f, "({} {} {})", l, op.symbol(), r);
        }
        match self {
            BindExpression::Null => write!(f, "null"),
            BindExpression::Boolean(b) => write!(f, "{}", b),
            BindExpression::Whole(n) => write!(f, "{}", n),
            BindExpression::Fraction(n) => write!(f, "{:?}", n),
            BindExpression::String(s) if s.contains('\'') => write!(f, "\"{}\"", s),
            BindExpression::String(s) => write!(f, "'{}'", s),
            BindExpression::Variable(name) => write!(f, "{}", name),
            BindExpression::PropertyRead(base, property) => write!(f, "{}.{}", base, property),
            BindExpression::MethodCall(base, method, args) => {
                write!(f, "{}.{}(", base, method)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            BindExpression::CollectionAccess(collection, key) => write!(f, "{}[{}]", collection, key),
            BindExpression::Negate(inner) => write!(f, "-{}", inner),
            BindExpression::Invert(inner) => write!(f, "!{}", inner),
            _ => Ok(()),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOKENIZER
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Whole(i64),
    Fraction(f64),
    Str(String),
    Ident(String),
    Op(&'static str),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Whole(n) => write!(f, "{}", n),
            Token::Fraction(n) => write!(f, "{:?}", n),
            Token::Str(s) => write!(f, "'{}'", s),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Op(op) => write!(f, "{}", op),
        }
    }
}

const OPERATORS: [&str; 20] = [
    "&&", "||", "==", "!=", ">=", "<=", ">", "<", "+", "-", "*", "/", "%", "!", ".", ",", "(",
    ")", "[", "]",
];

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn tokenize(source: &str) -> Result<Vec<Token>, CompilerError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        // A dot directly after an operand is member access, otherwise it may start a number.
        let after_operand = matches!(
            tokens.last(),
            Some(Token::Ident(_)) | Some(Token::Op(")")) | Some(Token::Op("]"))
        );
        let starts_number = c.is_ascii_digit()
            || (c == '.' && !after_operand && chars.get(i + 1).map_or(false, |n| n.is_ascii_digit()));

        if starts_number {
            let (token, next) = read_number(&chars, i)?;
            tokens.push(token);
            i = next;
            continue;
        }

        if c == '\'' || c == '"' {
            let start = i + 1;
            let Some(len) = chars[start..].iter().position(|&q| q == c) else {
                return Err(CompilerError::syntax(format!(
                    "Unterminated string literal starting at offset {} in '{}'",
                    i, source
                )));
            };
            tokens.push(Token::Str(chars[start..start + len].iter().collect()));
            i = start + len + 1;
            continue;
        }

        if is_ident_start(c) {
            let start = i;
            while i < chars.len() && is_ident_part(chars[i]) {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }

        let rest: String = chars[i..chars.len().min(i + 2)].iter().collect();
        match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            Some(&op) => {
                tokens.push(Token::Op(op));
                i += op.chars().count();
            }
            None => {
                return Err(CompilerError::syntax(format!(
                    "Unexpected token '{}' in '{}'",
                    c, source
                )))
            }
        }
    }

    Ok(tokens)
}

fn read_number(chars: &[char], start: usize) -> Result<(Token, usize), CompilerError> {
    let mut i = start;
    let mut fractional = false;

    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i < chars.len() && chars[i] == '.' && chars.get(i + 1).map_or(true, |c| !is_ident_start(*c)) {
        fractional = true;
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
        let mut j = i + 1;
        if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].is_ascii_digit() {
            fractional = true;
            i = j;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
        }
    }

    let text: String = chars[start..i].iter().collect();
    let token = if fractional {
        text.parse::<f64>()
            .map(Token::Fraction)
            .map_err(|_| CompilerError::syntax(format!("Invalid fractional literal '{}'", text)))?
    } else {
        text.parse::<i64>()
            .map(Token::Whole)
            .map_err(|_| CompilerError::syntax(format!("Invalid whole literal '{}'", text)))?
    };
    Ok((token, i))
}

// ═══════════════════════════════════════════════════════════════════════════════
// PARSER
// ═══════════════════════════════════════════════════════════════════════════════

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_op(&self) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Op(op)) => Some(op),
            _ => None,
        }
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect_op(&mut self, expected: &str) -> Result<(), CompilerError> {
        match self.advance() {
            Some(Token::Op(op)) if op == expected => Ok(()),
            Some(other) => Err(self.unexpected(&other.to_string())),
            None => Err(CompilerError::syntax(format!(
                "Expected '{}' but reached end of '{}'",
                expected, self.source
            ))),
        }
    }

    fn unexpected(&self, token: &str) -> CompilerError {
        CompilerError::syntax(format!("Unexpected token '{}' in '{}'", token, self.source))
    }

    fn binary_tier(
        &mut self,
        operators: &[&str],
        next: fn(&mut Self) -> Result<BindExpression, CompilerError>,
    ) -> Result<BindExpression, CompilerError> {
        let mut left = next(self)?;
        while let Some(op) = self.peek_op().filter(|op| operators.contains(op)) {
            self.pos += 1;
            let right = next(self)?;
            let binary = BinaryOp::from_symbol(op).ok_or_else(|| self.unexpected(op))?;
            left = binary.build(left, right);
        }
        Ok(left)
    }

    fn logical(&mut self) -> Result<BindExpression, CompilerError> {
        self.binary_tier(&["&&", "||"], Self::equality)
    }

    fn equality(&mut self) -> Result<BindExpression, CompilerError> {
        self.binary_tier(&["==", "!="], Self::relational)
    }

    fn relational(&mut self) -> Result<BindExpression, CompilerError> {
        self.binary_tier(&[">", ">=", "<", "<="], Self::additive)
    }

    fn additive(&mut self) -> Result<BindExpression, CompilerError> {
        self.binary_tier(&["+", "-"], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> Result<BindExpression, CompilerError> {
        self.binary_tier(&["*", "/", "%"], Self::unary)
    }

    fn unary(&mut self) -> Result<BindExpression, CompilerError> {
        match self.peek_op() {
            Some("-") => {
                self.pos += 1;
                Ok(BindExpression::Negate(Box::new(self.unary()?)))
            }
            Some("!") => {
                self.pos += 1;
                Ok(BindExpression::Invert(Box::new(self.unary()?)))
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<BindExpression, CompilerError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek_op() {
                Some(".") => {
                    self.pos += 1;
                    let name = match self.advance() {
                        Some(Token::Ident(name)) => name,
                        Some(other) => return Err(self.unexpected(&other.to_string())),
                        None => {
                            return Err(CompilerError::syntax(format!(
                                "Expected member name after '.' in '{}'",
                                self.source
                            )))
                        }
                    };
                    if self.peek_op() == Some("(") {
                        self.pos += 1;
                        let args = self.arguments()?;
                        expr = BindExpression::MethodCall(Box::new(expr), name, args);
                    } else {
                        expr = BindExpression::PropertyRead(Box::new(expr), name);
                    }
                }
                Some("[") => {
                    self.pos += 1;
                    let key = self.logical()?;
                    self.expect_op("]")?;
                    expr = BindExpression::CollectionAccess(Box::new(expr), Box::new(key));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn arguments(&mut self) -> Result<Vec<BindExpression>, CompilerError> {
        let mut args = Vec::new();
        if self.peek_op() == Some(")") {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.logical()?);
            match self.advance() {
                Some(Token::Op(",")) => continue,
                Some(Token::Op(")")) => return Ok(args),
                Some(other) => return Err(self.unexpected(&other.to_string())),
                None => {
                    return Err(CompilerError::syntax(format!(
                        "Unterminated argument list in '{}'",
                        self.source
                    )))
                }
            }
        }
    }

    fn primary(&mut self) -> Result<BindExpression, CompilerError> {
        match self.advance() {
            Some(Token::Whole(n)) => Ok(BindExpression::Whole(n)),
            Some(Token::Fraction(n)) => Ok(BindExpression::Fraction(n)),
            Some(Token::Str(s)) => Ok(BindExpression::String(s)),
            Some(Token::Ident(name)) => Ok(match name.as_str() {
                "null" => BindExpression::Null,
                "true" => BindExpression::Boolean(true),
                "false" => BindExpression::Boolean(false),
                _ => BindExpression::Variable(name),
            }),
            Some(Token::Op("(")) => {
                let inner = self.logical()?;
                self.expect_op(")")?;
                Ok(inner)
            }
            Some(other) => Err(self.unexpected(&other.to_string())),
            None => Err(CompilerError::syntax(format!(
                "Unexpected end of expression '{}'",
                self.source
            ))),
        }
    }
}

/// Parse the full bind grammar. The whole input must be consumed.
pub fn parse_expression(source: &str) -> Result<BindExpression, CompilerError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let expr = parser.logical()?;
    if let Some(token) = parser.peek() {
        return Err(parser.unexpected(&token.to_string()));
    }
    Ok(expr)
}
