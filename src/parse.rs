//! Markup reader.
//!
//! Checks document text for well-formedness with roxmltree, then parses it
//! with xml5ever into an immutable node tree plus the document-level
//! processing instructions. Tag and attribute names are kept
//! verbatim (`fx:id`, `xmlns:fx`); namespace meaning is assigned later by the
//! classifier.

use lazy_static::lazy_static;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use regex::Regex;
use serde::{Deserialize, Serialize};
use xml5ever::driver::parse_document;
use xml5ever::tendril::TendrilSink;

use crate::validate::{CompilerError, ERR_STRUCTURAL_PARSE};

lazy_static! {
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE TREE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MarkupAttribute {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MarkupNode {
    pub name: String,
    /// Document order; names are unique per node.
    pub attributes: Vec<MarkupAttribute>,
    pub children: Vec<MarkupNode>,
    /// Normalized inner text, `None` when the node carries no non-blank text.
    pub text: Option<String>,
}

impl MarkupNode {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ProcessingInstruction {
    Import { name: String },
    Language { language: String },
    Compile { enabled: bool },
    ControllerType { name: String },
    Custom { target: String, data: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    pub root: MarkupNode,
    pub imports: Vec<String>,
    pub controller_type: Option<String>,
    pub language: Option<String>,
    pub compile: bool,
    pub instructions: Vec<ProcessingInstruction>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROCESSING INSTRUCTIONS
// ═══════════════════════════════════════════════════════════════════════════════

pub const PI_IMPORT: &str = "import";
pub const PI_LANGUAGE: &str = "language";
pub const PI_COMPILE: &str = "compile";
pub const PI_CONTROLLER_TYPE: &str = "controllerType";

pub fn parse_instruction(target: &str, data: &str) -> ProcessingInstruction {
    let data = data.trim();
    match target {
        PI_IMPORT => ProcessingInstruction::Import {
            name: data.to_string(),
        },
        PI_LANGUAGE => ProcessingInstruction::Language {
            language: data.to_string(),
        },
        PI_COMPILE => ProcessingInstruction::Compile {
            enabled: !data.eq_ignore_ascii_case("false"),
        },
        PI_CONTROLLER_TYPE => ProcessingInstruction::ControllerType {
            name: data.to_string(),
        },
        _ => ProcessingInstruction::Custom {
            target: target.to_string(),
            data: data.to_string(),
        },
    }
}

/// Collapses whitespace runs into single spaces and trims.
pub fn normalize_text(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOM CONVERSION
// ═══════════════════════════════════════════════════════════════════════════════

fn qualified_name(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, local),
        _ => local.to_string(),
    }
}

/// Converts an element handle leaf-first.
fn convert_element(handle: &Handle) -> Option<MarkupNode> {
    let NodeData::Element { name, attrs, .. } = &handle.data else {
        return None;
    };

    let tag = qualified_name(name.prefix.as_ref().map(|p| &**p), &name.local);
    let attributes = attrs
        .borrow()
        .iter()
        .map(|attr| MarkupAttribute {
            name: qualified_name(attr.name.prefix.as_ref().map(|p| &**p), &attr.name.local),
            value: attr.value.to_string(),
        })
        .collect();

    let mut children = Vec::new();
    let mut text = None;
    for child in handle.children.borrow().iter() {
        match &child.data {
            NodeData::Element { .. } => {
                if let Some(node) = convert_element(child) {
                    children.push(node);
                }
            }
            NodeData::Text { contents } => {
                let normalized = normalize_text(&contents.borrow());
                if !normalized.is_empty() {
                    text = Some(normalized);
                }
            }
            _ => {}
        }
    }

    Some(MarkupNode {
        name: tag,
        attributes,
        children,
        text,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN PARSING FUNCTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Rejects text that is not well-formed XML. xml5ever recovers from
/// unclosed elements and unquoted attributes, so it cannot be the gate.
fn check_well_formed(source: &str, file_path: &str) -> Result<(), CompilerError> {
    if let Err(error) = roxmltree::Document::parse(source) {
        let pos = error.pos();
        return Err(CompilerError::with_details(
            ERR_STRUCTURAL_PARSE,
            format!("Malformed markup: {}", error),
            file_path,
            pos.row,
            pos.col,
            None,
            vec![],
        ));
    }
    Ok(())
}

/// Parse a markup document from text.
pub fn parse_markup(source: &str, file_path: &str) -> Result<ParsedDocument, CompilerError> {
    check_well_formed(source, file_path)?;

    let dom: RcDom = parse_document(RcDom::default(), Default::default()).one(source);

    if let Some(error) = dom.errors.first() {
        return Err(CompilerError::structural(format!(
            "Failed to parse markup: {}",
            error
        ))
        .in_file(file_path));
    }

    let mut instructions = Vec::new();
    let mut roots = Vec::new();
    for child in dom.document.children.borrow().iter() {
        match &child.data {
            NodeData::ProcessingInstruction { target, contents } => {
                if target.eq_ignore_ascii_case("xml") {
                    continue;
                }
                instructions.push(parse_instruction(target, contents));
            }
            NodeData::Element { .. } => {
                if let Some(node) = convert_element(child) {
                    roots.push(node);
                }
            }
            _ => {}
        }
    }

    let root = match roots.len() {
        0 => {
            return Err(
                CompilerError::structural("Document has no root element").in_file(file_path)
            )
        }
        1 => roots.remove(0),
        n => {
            return Err(CompilerError::structural(format!(
                "Document has {} root elements, expected exactly one",
                n
            ))
            .in_file(file_path))
        }
    };

    let mut imports = Vec::new();
    let mut controller_type = None;
    let mut language = None;
    let mut compile = true;
    for instruction in &instructions {
        match instruction {
            ProcessingInstruction::Import { name } if !name.is_empty() => {
                if !imports.contains(name) {
                    imports.push(name.clone());
                }
            }
            ProcessingInstruction::Language { language: lang } => language = Some(lang.clone()),
            ProcessingInstruction::Compile { enabled } => compile = *enabled,
            ProcessingInstruction::ControllerType { name } if !name.is_empty() => {
                controller_type = Some(name.clone())
            }
            _ => {}
        }
    }

    Ok(ParsedDocument {
        root,
        imports,
        controller_type,
        language,
        compile,
        instructions,
    })
}
