// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `<MetaData>` document loader.
//!
//! OpenSplice-era middlewares describe topic types as small XML documents
//! (`<MetaData><Module name="DDS"><Struct name="..."> ...`).  This loader
//! turns such a document into the [`TypeElement`] forest the graph builder
//! consumes.  It is the description *producer*; structural validation is the
//! builder's job.

use super::{AttrValue, ElementKind, TypeElement};
use std::fmt;

/// Errors raised while loading a `<MetaData>` document.
#[derive(Debug)]
pub enum MetaError {
    /// Not well-formed XML.
    Xml(roxmltree::Error),
    /// Document root is not `<MetaData>`.
    NotMetaData,
    /// Unrecognized element tag.
    UnknownTag(String),
    /// Element is missing a required attribute.
    MissingAttr { tag: String, attr: &'static str },
    /// Attribute value failed to parse.
    BadAttr { tag: String, attr: &'static str, value: String },
}

impl fmt::Display for MetaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Xml(e) => write!(f, "malformed XML: {}", e),
            Self::NotMetaData => write!(f, "document root is not <MetaData>"),
            Self::UnknownTag(tag) => write!(f, "unknown element <{}>", tag),
            Self::MissingAttr { tag, attr } => {
                write!(f, "<{}> is missing required attribute '{}'", tag, attr)
            }
            Self::BadAttr { tag, attr, value } => {
                write!(f, "<{} {}=\"{}\">: invalid attribute value", tag, attr, value)
            }
        }
    }
}

impl std::error::Error for MetaError {}

impl From<roxmltree::Error> for MetaError {
    fn from(e: roxmltree::Error) -> Self {
        Self::Xml(e)
    }
}

/// Parse a `<MetaData>` document into a description forest.
///
/// The returned elements are the document's top-level declarations in
/// document order, ready for [`Topic::from_description`].
///
/// [`Topic::from_description`]: crate::Topic::from_description
pub fn parse_metadata(text: &str) -> Result<Vec<TypeElement>, MetaError> {
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();
    if root.tag_name().name() != "MetaData" {
        return Err(MetaError::NotMetaData);
    }
    let mut elems = Vec::new();
    for node in root.children().filter(roxmltree::Node::is_element) {
        elems.push(convert(node)?);
    }
    log::debug!("[tgraph] metadata: {} top-level declaration(s)", elems.len());
    Ok(elems)
}

fn kind_of(tag: &str) -> Option<ElementKind> {
    Some(match tag {
        "Module" => ElementKind::Module,
        "Struct" => ElementKind::Struct,
        "Member" => ElementKind::Member,
        "Union" => ElementKind::Union,
        "SwitchType" => ElementKind::UnionSwitch,
        "Case" => ElementKind::UnionCase,
        "Label" => ElementKind::UnionLabel,
        "Default" => ElementKind::UnionLabelDefault,
        "TypeDef" => ElementKind::Typedef,
        "Enum" => ElementKind::Enum,
        "Element" => ElementKind::EnumLabel,
        "Type" => ElementKind::TypeRef,
        "Array" => ElementKind::Array,
        "Sequence" => ElementKind::Sequence,
        "String" => ElementKind::String,
        "Char" => ElementKind::Char,
        "Boolean" => ElementKind::Boolean,
        "Octet" => ElementKind::Octet,
        "Short" => ElementKind::Short,
        "UShort" => ElementKind::UShort,
        "Long" => ElementKind::Long,
        "ULong" => ElementKind::ULong,
        "LongLong" => ElementKind::LongLong,
        "ULongLong" => ElementKind::ULongLong,
        "Float" => ElementKind::Float,
        "Double" => ElementKind::Double,
        "Time" => ElementKind::Time,
        _ => return None,
    })
}

fn convert(node: roxmltree::Node<'_, '_>) -> Result<TypeElement, MetaError> {
    let tag = node.tag_name().name();
    let kind = kind_of(tag).ok_or_else(|| MetaError::UnknownTag(tag.to_string()))?;
    let mut elem = TypeElement::new(kind);
    elem.name = node.attribute("name").map(str::to_string);

    match kind {
        ElementKind::Array | ElementKind::Sequence => {
            // bound / length; absent means unbounded
            if let Some(size) = node.attribute("size") {
                let n = size.parse::<i64>().map_err(|_| MetaError::BadAttr {
                    tag: tag.to_string(),
                    attr: "size",
                    value: size.to_string(),
                })?;
                elem.attrs.push(("size".to_string(), AttrValue::Number(n)));
            }
        }
        ElementKind::EnumLabel => {
            let value = node.attribute("value").ok_or_else(|| MetaError::MissingAttr {
                tag: tag.to_string(),
                attr: "value",
            })?;
            let n = value.parse::<i64>().map_err(|_| MetaError::BadAttr {
                tag: tag.to_string(),
                attr: "value",
                value: value.to_string(),
            })?;
            elem.attrs.push(("value".to_string(), AttrValue::Number(n)));
        }
        ElementKind::UnionLabel => {
            // Numeric when it parses, symbolic otherwise (resolved against the
            // discriminator's enum table by the builder).
            let value = node.attribute("value").ok_or_else(|| MetaError::MissingAttr {
                tag: tag.to_string(),
                attr: "value",
            })?;
            let attr = match value.parse::<i64>() {
                Ok(n) => AttrValue::Number(n),
                Err(_) => AttrValue::Text(value.to_string()),
            };
            elem.attrs.push(("value".to_string(), attr));
        }
        ElementKind::TypeRef => {
            if elem.name.is_none() {
                return Err(MetaError::MissingAttr {
                    tag: tag.to_string(),
                    attr: "name",
                });
            }
        }
        _ => {}
    }

    for child in node.children().filter(roxmltree::Node::is_element) {
        elem.children.push(convert(child)?);
    }
    Ok(elem)
}
