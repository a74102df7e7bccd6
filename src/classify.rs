//! Semantic classifier.
//!
//! Maps the raw markup tree onto typed element and attribute variants by tag
//! and attribute naming convention. Required fields are validated here so
//! the generator never sees a half-formed element.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::parse::{MarkupAttribute, MarkupNode, ParsedDocument};
use crate::syntax::{parse_handler, parse_value, Handler, Value};
use crate::validate::{CompilerError, SourceLocation};

lazy_static! {
    static ref INSTANCE_PROPERTY_TAG: Regex = Regex::new(r"^[a-z]\w*$").unwrap();
    static ref STATIC_PROPERTY_NAME: Regex =
        Regex::new(r"^(\w*\.)*[A-Z]\w*\.[a-z]\w*$").unwrap();
    static ref EVENT_HANDLER_NAME: Regex = Regex::new(r"^on[A-Z]").unwrap();
}

pub const FX_ID: &str = "fx:id";
pub const FX_CONTROLLER: &str = "fx:controller";
pub const FX_FACTORY: &str = "fx:factory";
pub const FX_VALUE: &str = "fx:value";
pub const FX_CONSTANT: &str = "fx:constant";
pub const FX_INCLUDE: &str = "fx:include";
pub const FX_REFERENCE: &str = "fx:reference";
pub const FX_COPY: &str = "fx:copy";
pub const FX_ROOT: &str = "fx:root";
pub const FX_DEFINE: &str = "fx:define";
pub const FX_SCRIPT: &str = "fx:script";
pub const DEFAULT_CHARSET: &str = "UTF-8";

// ═══════════════════════════════════════════════════════════════════════════════
// ATTRIBUTES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Attribute {
    Controller { class_name: String },
    Id { id: String },
    Namespace { prefix: String, uri: String },
    DefaultNamespace { uri: String },
    InstanceProperty { name: String, value: Value },
    StaticProperty { owner: String, name: String, value: Value },
    EventHandler { name: String, handler: Handler },
}

impl Attribute {
    /// Instance, static and handler attributes may appear on any element.
    pub fn is_common(&self) -> bool {
        matches!(
            self,
            Attribute::InstanceProperty { .. }
                | Attribute::StaticProperty { .. }
                | Attribute::EventHandler { .. }
        )
    }
}

fn split_static_name(name: &str) -> (String, String) {
    match name.rfind('.') {
        Some(index) => (name[..index].to_string(), name[index + 1..].to_string()),
        None => (String::new(), name.to_string()),
    }
}

pub fn classify_attribute(
    attribute: &MarkupAttribute,
    location: &SourceLocation,
) -> Result<Attribute, CompilerError> {
    let name = attribute.name.as_str();
    let raw = attribute.value.as_str();
    let context = location.attribute(name);

    let classified = match name {
        FX_ID => {
            if raw.trim().is_empty() {
                return Err(CompilerError::structural("fx:id must not be blank").at_node(&context));
            }
            Attribute::Id {
                id: raw.trim().to_string(),
            }
        }
        FX_CONTROLLER => {
            if raw.trim().is_empty() {
                return Err(
                    CompilerError::structural("fx:controller must not be blank").at_node(&context)
                );
            }
            Attribute::Controller {
                class_name: raw.trim().to_string(),
            }
        }
        "xmlns" => Attribute::DefaultNamespace {
            uri: raw.to_string(),
        },
        _ if name.starts_with("xmlns:") => Attribute::Namespace {
            prefix: name["xmlns:".len()..].to_string(),
            uri: raw.to_string(),
        },
        _ if EVENT_HANDLER_NAME.is_match(name) => Attribute::EventHandler {
            name: name.to_string(),
            handler: parse_handler(raw),
        },
        _ if STATIC_PROPERTY_NAME.is_match(name) => {
            let (owner, property) = split_static_name(name);
            Attribute::StaticProperty {
                owner,
                name: property,
                value: parse_value(raw).map_err(|e| e.at_node(&context))?,
            }
        }
        _ => Attribute::InstanceProperty {
            name: name.to_string(),
            value: parse_value(raw).map_err(|e| e.at_node(&context))?,
        },
    };

    Ok(classified)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ELEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Attributes, children and inner text of an object declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub attributes: Vec<Attribute>,
    pub children: Vec<Element>,
    pub text: Value,
    pub location: SourceLocation,
}

impl Content {
    pub fn id(&self) -> Option<&str> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::Id { id } => Some(id.as_str()),
            _ => None,
        })
    }

    pub fn controller(&self) -> Option<&str> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::Controller { class_name } => Some(class_name.as_str()),
            _ => None,
        })
    }

    pub fn has_common_attributes(&self) -> bool {
        self.attributes.iter().any(Attribute::is_common)
    }
}

/// How a declared object comes into existence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Initializer {
    Root { type_name: String },
    Instance { class_name: String },
    Factory { class_name: String, factory: String },
    Constant { class_name: String, constant: String },
    Value { class_name: String, value: Value },
    Copy { source: String },
    Reference { source: String },
    Include {
        source: String,
        resources: Option<String>,
        charset: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub init: Initializer,
    pub content: Content,
}

/// Value of a property element: common attributes, nested elements and
/// inner text. Text and elements never coexist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValue {
    pub attributes: Vec<Attribute>,
    pub elements: Vec<Element>,
    pub text: Value,
}

impl PropertyValue {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.elements.is_empty() && self.text.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyElement {
    /// Owner class for static (attached) properties.
    pub owner: Option<String>,
    pub name: String,
    pub value: PropertyValue,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ScriptSource {
    Inline { text: String },
    Reference { source: String, charset: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "element", rename_all = "camelCase")]
pub enum Element {
    Declaration(Declaration),
    Define {
        children: Vec<Declaration>,
        location: SourceLocation,
    },
    InstanceProperty(PropertyElement),
    StaticProperty(PropertyElement),
    Script {
        source: ScriptSource,
        location: SourceLocation,
    },
}

impl Element {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Element::Declaration(declaration) => &declaration.content.location,
            Element::Define { location, .. } | Element::Script { location, .. } => location,
            Element::InstanceProperty(property) | Element::StaticProperty(property) => {
                &property.location
            }
        }
    }
}

/// A fully classified document, ready for generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedDocument {
    pub root: Declaration,
    pub imports: Vec<String>,
    /// `fx:controller` on the root, else the `controllerType` instruction.
    pub controller_type: Option<String>,
    pub language: Option<String>,
    pub compile: bool,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLASSIFICATION
// ═══════════════════════════════════════════════════════════════════════════════

fn take_attribute<'a>(node: &'a MarkupNode, name: &str) -> Option<&'a str> {
    node.attribute(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn require_attribute<'a>(
    node: &'a MarkupNode,
    name: &str,
    location: &SourceLocation,
) -> Result<&'a str, CompilerError> {
    take_attribute(node, name).ok_or_else(|| {
        CompilerError::structural(format!("{} requires a non-blank '{}' attribute", node.name, name))
            .at_node(&location.path)
    })
}

fn classify_attributes(
    node: &MarkupNode,
    consumed: &[&str],
    location: &SourceLocation,
) -> Result<Vec<Attribute>, CompilerError> {
    let mut attributes = Vec::new();
    let mut property_names: Vec<String> = Vec::new();
    for attribute in &node.attributes {
        if consumed.contains(&attribute.name.as_str()) {
            continue;
        }
        let classified = classify_attribute(attribute, location)?;
        if let Attribute::InstanceProperty { name, .. } | Attribute::StaticProperty { name, .. } =
            &classified
        {
            let key = attribute.name.clone();
            if property_names.contains(&key) {
                return Err(CompilerError::structural(format!(
                    "Property '{}' is set more than once",
                    name
                ))
                .at_node(&location.attribute(&attribute.name)));
            }
            property_names.push(key);
        }
        attributes.push(classified);
    }
    Ok(attributes)
}

fn classify_children(
    node: &MarkupNode,
    location: &SourceLocation,
) -> Result<Vec<Element>, CompilerError> {
    node.children
        .iter()
        .enumerate()
        .map(|(index, child)| classify_element(child, &location.child(&child.name, index), false))
        .collect()
}

fn classify_text(node: &MarkupNode, location: &SourceLocation) -> Result<Value, CompilerError> {
    match &node.text {
        Some(text) => parse_value(text).map_err(|e| e.at_node(&location.path)),
        None => Ok(Value::Empty),
    }
}

fn classify_content(
    node: &MarkupNode,
    consumed: &[&str],
    location: &SourceLocation,
) -> Result<Content, CompilerError> {
    Ok(Content {
        attributes: classify_attributes(node, consumed, location)?,
        children: classify_children(node, location)?,
        text: classify_text(node, location)?,
        location: location.clone(),
    })
}

fn classify_property_value(
    node: &MarkupNode,
    location: &SourceLocation,
) -> Result<PropertyValue, CompilerError> {
    let attributes = classify_attributes(node, &[], location)?;
    if let Some(special) = attributes.iter().find(|attr| !attr.is_common()) {
        return Err(CompilerError::structural(format!(
            "Property element '{}' carries a non-property attribute: {:?}",
            node.name, special
        ))
        .at_node(&location.path));
    }

    let elements = classify_children(node, location)?;
    let text = classify_text(node, location)?;
    if !elements.is_empty() && !text.is_empty() {
        return Err(CompilerError::structural(format!(
            "Property element '{}' mixes text with child elements",
            node.name
        ))
        .at_node(&location.path));
    }

    Ok(PropertyValue {
        attributes,
        elements,
        text,
    })
}

fn classify_instance(node: &MarkupNode, location: &SourceLocation) -> Result<Declaration, CompilerError> {
    let class_name = node.name.clone();
    let factory = take_attribute(node, FX_FACTORY);
    let value = take_attribute(node, FX_VALUE);
    let constant = take_attribute(node, FX_CONSTANT);
    if [factory, value, constant].iter().filter(|v| v.is_some()).count() > 1 {
        return Err(CompilerError::structural(format!(
            "Multiple initialization attributes specified on {}",
            class_name
        ))
        .at_node(&location.path));
    }

    let init = if let Some(factory) = factory {
        Initializer::Factory {
            class_name,
            factory: factory.to_string(),
        }
    } else if let Some(value) = value {
        Initializer::Value {
            class_name,
            value: parse_value(value).map_err(|e| e.at_node(&location.attribute(FX_VALUE)))?,
        }
    } else if let Some(constant) = constant {
        Initializer::Constant {
            class_name,
            constant: constant.to_string(),
        }
    } else {
        Initializer::Instance { class_name }
    };

    Ok(Declaration {
        init,
        content: classify_content(node, &[FX_FACTORY, FX_VALUE, FX_CONSTANT], location)?,
    })
}

fn classify_declaration(
    node: &MarkupNode,
    location: &SourceLocation,
    is_document_root: bool,
) -> Result<Option<Declaration>, CompilerError> {
    let declaration = match node.name.as_str() {
        FX_INCLUDE => Declaration {
            init: Initializer::Include {
                source: require_attribute(node, "source", location)?.to_string(),
                resources: take_attribute(node, "resources").map(str::to_string),
                charset: take_attribute(node, "charset")
                    .unwrap_or(DEFAULT_CHARSET)
                    .to_string(),
            },
            content: classify_content(node, &["source", "resources", "charset"], location)?,
        },
        FX_REFERENCE => Declaration {
            init: Initializer::Reference {
                source: require_attribute(node, "source", location)?.to_string(),
            },
            content: classify_content(node, &["source"], location)?,
        },
        FX_COPY => Declaration {
            init: Initializer::Copy {
                source: require_attribute(node, "source", location)?.to_string(),
            },
            content: classify_content(node, &["source"], location)?,
        },
        FX_ROOT => {
            if !is_document_root {
                return Err(CompilerError::structural("fx:root may only be the document root")
                    .at_node(&location.path));
            }
            Declaration {
                init: Initializer::Root {
                    type_name: require_attribute(node, "type", location)?.to_string(),
                },
                content: classify_content(node, &["type"], location)?,
            }
        }
        FX_DEFINE | FX_SCRIPT => return Ok(None),
        tag if INSTANCE_PROPERTY_TAG.is_match(tag) || STATIC_PROPERTY_NAME.is_match(tag) => {
            return Ok(None)
        }
        _ => classify_instance(node, location)?,
    };

    if !is_document_root && declaration.content.controller().is_some() {
        return Err(CompilerError::structural(
            "fx:controller may only be declared on the document root",
        )
        .at_node(&location.attribute(FX_CONTROLLER)));
    }

    Ok(Some(declaration))
}

pub fn classify_element(
    node: &MarkupNode,
    location: &SourceLocation,
    is_document_root: bool,
) -> Result<Element, CompilerError> {
    if let Some(declaration) = classify_declaration(node, location, is_document_root)? {
        return Ok(Element::Declaration(declaration));
    }

    let element = match node.name.as_str() {
        FX_DEFINE => {
            let children = classify_children(node, location)?
                .into_iter()
                .map(|child| match child {
                    Element::Declaration(declaration) => Ok(declaration),
                    other => Err(CompilerError::structural(
                        "fx:define may only contain object declarations",
                    )
                    .at_node(&other.location().path)),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Element::Define {
                children,
                location: location.clone(),
            }
        }
        FX_SCRIPT => {
            let source = match take_attribute(node, "source") {
                Some(source) => ScriptSource::Reference {
                    source: source.to_string(),
                    charset: take_attribute(node, "charset")
                        .unwrap_or(DEFAULT_CHARSET)
                        .to_string(),
                },
                None => ScriptSource::Inline {
                    text: node.text.clone().unwrap_or_default(),
                },
            };
            Element::Script {
                source,
                location: location.clone(),
            }
        }
        tag if INSTANCE_PROPERTY_TAG.is_match(tag) => Element::InstanceProperty(PropertyElement {
            owner: None,
            name: tag.to_string(),
            value: classify_property_value(node, location)?,
            location: location.clone(),
        }),
        tag => {
            let (owner, name) = split_static_name(tag);
            Element::StaticProperty(PropertyElement {
                owner: Some(owner),
                name,
                value: classify_property_value(node, location)?,
                location: location.clone(),
            })
        }
    };

    Ok(element)
}

/// Classifies a parsed document. The root must be an object declaration.
pub fn classify_document(document: &ParsedDocument) -> Result<ClassifiedDocument, CompilerError> {
    let location = SourceLocation::root(&document.root.name);
    let root = match classify_element(&document.root, &location, true)? {
        Element::Declaration(declaration) => declaration,
        _ => {
            return Err(CompilerError::structural(
                "Root element is not a declaration of an object instance",
            )
            .at_node(&location.path))
        }
    };

    let controller_type = root
        .content
        .controller()
        .map(str::to_string)
        .or_else(|| document.controller_type.clone());

    Ok(ClassifiedDocument {
        root,
        imports: document.imports.clone(),
        controller_type,
        language: document.language.clone(),
        compile: document.compile,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str, value: &str) -> MarkupAttribute {
        MarkupAttribute {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_attribute_conventions() {
        let location = SourceLocation::root("VBox");
        assert_eq!(
            classify_attribute(&attr("GridPane.rowIndex", "1"), &location).unwrap(),
            Attribute::StaticProperty {
                owner: "GridPane".into(),
                name: "rowIndex".into(),
                value: Value::Literal("1".into())
            }
        );
        assert_eq!(
            classify_attribute(&attr("onAction", "#save"), &location).unwrap(),
            Attribute::EventHandler {
                name: "onAction".into(),
                handler: Handler::Method("save".into())
            }
        );
        assert!(matches!(
            classify_attribute(&attr("one", "1"), &location).unwrap(),
            Attribute::InstanceProperty { .. }
        ));
        assert_eq!(
            classify_attribute(&attr("xmlns:fx", "http://javafx.com/fxml"), &location).unwrap(),
            Attribute::Namespace {
                prefix: "fx".into(),
                uri: "http://javafx.com/fxml".into()
            }
        );
    }

    #[test]
    fn test_blank_id_is_rejected_eagerly() {
        let err = classify_attribute(&attr("fx:id", "  "), &SourceLocation::root("Label")).unwrap_err();
        assert_eq!(err.code, crate::validate::ERR_STRUCTURAL_PARSE);
        assert_eq!(err.context.as_deref(), Some("/Label@fx:id"));
    }

    #[test]
    fn test_static_name_split_at_last_dot() {
        assert_eq!(
            split_static_name("javafx.scene.layout.GridPane.columnIndex"),
            ("javafx.scene.layout.GridPane".to_string(), "columnIndex".to_string())
        );
    }
}
