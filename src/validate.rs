//! Error taxonomy for the markup compiler.
//!
//! Every failure carries a stable code, the guarantee that was violated and
//! the node context it originated from. Errors are never downgraded: a
//! `CompilerError` is fatal for the document it was raised in.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_STRUCTURAL_PARSE: &str = "FX-PARSE-001";
pub const ERR_GRAMMAR_SYNTAX: &str = "FX-SYNTAX-001";
pub const ERR_CLASS_RESOLUTION: &str = "FX-CLASS-001";
pub const ERR_MEMBER_RESOLUTION: &str = "FX-MEMBER-001";
pub const ERR_UNSUPPORTED_COERCION: &str = "FX-COERCE-001";
pub const ERR_INVALID_LITERAL: &str = "FX-COERCE-002";
pub const ERR_DUPLICATE_ID: &str = "FX-ID-001";
pub const ERR_UNKNOWN_ID: &str = "FX-ID-002";
pub const ERR_INCLUDE_CYCLE: &str = "FX-INCLUDE-001";
pub const ERR_CLASS_NAME_COLLISION: &str = "FX-BATCH-001";
pub const ERR_SOURCE_IO: &str = "FX-IO-001";

// ═══════════════════════════════════════════════════════════════════════════════
// GUARANTEES
// ═══════════════════════════════════════════════════════════════════════════════

fn get_guarantee(code: &str) -> &'static str {
    match code {
        ERR_STRUCTURAL_PARSE => "Documents are well-formed and every tag maps to exactly one element form.",
        ERR_GRAMMAR_SYNTAX => "Bind expressions are parsed completely or not at all.",
        ERR_CLASS_RESOLUTION => "Every class name resolves to exactly one known type.",
        ERR_MEMBER_RESOLUTION => {
            "Every property, method, field and constructor used by a document exists on its type."
        }
        ERR_UNSUPPORTED_COERCION => "Values are only coerced through a documented coercion strategy.",
        ERR_INVALID_LITERAL => "Literal values are valid for their target type at compile time.",
        ERR_DUPLICATE_ID => "Each id is registered at most once per document.",
        ERR_UNKNOWN_ID => "Ids are declared before they are referenced.",
        ERR_INCLUDE_CYCLE => "The include graph is acyclic.",
        ERR_CLASS_NAME_COLLISION => "Every document in a batch maps to a distinct generated class.",
        ERR_SOURCE_IO => "Every document and include source is readable.",
        _ => "Unknown guarantee.",
    }
}

/// Taxonomy view of an error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    StructuralParse,
    GrammarSyntax,
    ClassResolution,
    MemberResolution,
    UnsupportedCoercion,
    InvalidLiteral,
    DuplicateId,
    UnknownId,
    IncludeCycle,
    ClassNameCollision,
    SourceIo,
}

impl ErrorKind {
    pub fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            ERR_STRUCTURAL_PARSE => ErrorKind::StructuralParse,
            ERR_GRAMMAR_SYNTAX => ErrorKind::GrammarSyntax,
            ERR_CLASS_RESOLUTION => ErrorKind::ClassResolution,
            ERR_MEMBER_RESOLUTION => ErrorKind::MemberResolution,
            ERR_UNSUPPORTED_COERCION => ErrorKind::UnsupportedCoercion,
            ERR_INVALID_LITERAL => ErrorKind::InvalidLiteral,
            ERR_DUPLICATE_ID => ErrorKind::DuplicateId,
            ERR_UNKNOWN_ID => ErrorKind::UnknownId,
            ERR_INCLUDE_CYCLE => ErrorKind::IncludeCycle,
            ERR_CLASS_NAME_COLLISION => ErrorKind::ClassNameCollision,
            ERR_SOURCE_IO => ErrorKind::SourceIo,
            _ => return None,
        })
    }

    /// Both coercion failures belong to the same family.
    pub fn is_coercion(self) -> bool {
        matches!(self, ErrorKind::UnsupportedCoercion | ErrorKind::InvalidLiteral)
    }

    pub fn is_identifier(self) -> bool {
        matches!(self, ErrorKind::DuplicateId | ErrorKind::UnknownId)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq)]
#[serde(rename_all = "camelCase")]
#[error("{code}: {message}")]
pub struct CompilerError {
    pub code: String,
    pub error_type: String,
    pub message: String,
    pub guarantee: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub context: Option<String>,
    pub hints: Vec<String>,
}

impl CompilerError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self::with_details(code, message, "", 0, 0, None, vec![])
    }

    pub fn with_details(
        code: &str,
        message: impl Into<String>,
        file: &str,
        line: u32,
        column: u32,
        context: Option<String>,
        hints: Vec<String>,
    ) -> Self {
        CompilerError {
            code: code.to_string(),
            error_type: "COMPILER_RESOLUTION_FAILURE".to_string(),
            message: message.into(),
            guarantee: get_guarantee(code).to_string(),
            file: file.to_string(),
            line,
            column,
            context,
            hints,
        }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::new(ERR_STRUCTURAL_PARSE, message)
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        Self::new(ERR_GRAMMAR_SYNTAX, message)
    }

    pub fn class_resolution(message: impl Into<String>) -> Self {
        Self::new(ERR_CLASS_RESOLUTION, message)
    }

    pub fn member_resolution(message: impl Into<String>) -> Self {
        Self::new(ERR_MEMBER_RESOLUTION, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ERR_UNSUPPORTED_COERCION, message)
    }

    pub fn invalid_literal(message: impl Into<String>) -> Self {
        Self::new(ERR_INVALID_LITERAL, message)
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        ErrorKind::from_code(&self.code)
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// Sets the file unless one is already recorded (nested include errors keep theirs).
    pub fn in_file(mut self, file: &str) -> Self {
        if self.file.is_empty() {
            self.file = file.to_string();
        }
        self
    }

    /// Attributes the error to a node. The innermost node wins.
    pub fn at_node(mut self, path: &str) -> Self {
        if self.context.is_none() {
            self.context = Some(path.to_string());
        }
        self
    }
}

/// Position of a node inside the document, rendered as a slash path.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub path: String,
}

impl SourceLocation {
    pub fn root(tag: &str) -> Self {
        SourceLocation {
            path: format!("/{}", tag),
        }
    }

    pub fn child(&self, tag: &str, index: usize) -> Self {
        SourceLocation {
            path: format!("{}/{}[{}]", self.path, tag, index),
        }
    }

    pub fn attribute(&self, name: &str) -> String {
        format!("{}@{}", self.path, name)
    }
}
