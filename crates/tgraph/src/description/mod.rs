// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Externally supplied type descriptions.
//!
//! The middleware delivers a type description as a recursive walk over
//! structural elements, each carrying a kind tag, an optional name, an
//! attribute list and a way to recurse into children.  This module flattens
//! that protocol into an explicit shape tree ([`TypeElement`]) consumed by a
//! single builder pass, which keeps the builder testable without a live
//! middleware behind it.
//!
//! The [`xml`] submodule (feature `xml`) loads OpenSplice-style `<MetaData>`
//! documents into shape trees.

use std::fmt;

#[cfg(feature = "xml")]
pub mod xml;

/// Structural element kinds of a type description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Module,
    Struct,
    Member,
    Union,
    UnionCase,
    UnionSwitch,
    UnionLabel,
    UnionLabelDefault,
    Typedef,
    Enum,
    EnumLabel,
    /// Reference to a previously declared named type.
    TypeRef,
    Array,
    Sequence,
    String,
    Char,
    Boolean,
    Octet,
    Short,
    UShort,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Float,
    Double,
    Time,
}

impl ElementKind {
    /// Human-readable kind name for diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Struct => "struct",
            Self::Member => "member",
            Self::Union => "union",
            Self::UnionCase => "unioncase",
            Self::UnionSwitch => "unionswitch",
            Self::UnionLabel => "unionlabel",
            Self::UnionLabelDefault => "unionlabeldefault",
            Self::Typedef => "typedef",
            Self::Enum => "enum",
            Self::EnumLabel => "enumlabel",
            Self::TypeRef => "type",
            Self::Array => "array",
            Self::Sequence => "sequence",
            Self::String => "string",
            Self::Char => "char",
            Self::Boolean => "boolean",
            Self::Octet => "octet",
            Self::Short => "short",
            Self::UShort => "unsigned short",
            Self::Long => "long",
            Self::ULong => "unsigned long",
            Self::LongLong => "long long",
            Self::ULongLong => "unsigned long long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Time => "time",
        }
    }
}

/// Attribute value attached to a description element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Number(i64),
    Text(String),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One element of a type description: kind, optional name, attributes and
/// child elements.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeElement {
    pub kind: ElementKind,
    pub name: Option<String>,
    pub attrs: Vec<(String, AttrValue)>,
    pub children: Vec<TypeElement>,
}

impl TypeElement {
    /// Create an anonymous element.
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            name: None,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create a named element.
    pub fn named(kind: ElementKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Attach an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.push((name.into(), value));
        self
    }

    /// Attach a numeric attribute.
    pub fn with_num(self, name: impl Into<String>, value: i64) -> Self {
        self.with_attr(name, AttrValue::Number(value))
    }

    /// Attach a child element.
    pub fn with_child(mut self, child: TypeElement) -> Self {
        self.children.push(child);
        self
    }

    /// Numeric attribute lookup, defaulting to 0 when absent.
    pub fn num_attr_or_zero(&self, name: &str) -> i64 {
        for (n, v) in &self.attrs {
            if n == name {
                if let AttrValue::Number(x) = v {
                    return *x;
                }
            }
        }
        0
    }

    fn dump(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = depth * 4;
        writeln!(
            f,
            "{:pad$}{} {}",
            "",
            self.kind.as_str(),
            self.name.as_deref().unwrap_or("(anonymous)")
        )?;
        for (name, value) in &self.attrs {
            writeln!(f, "{:pad$}  {}={}", "", name, value)?;
        }
        for child in &self.children {
            child.dump(f, depth + 1)?;
        }
        Ok(())
    }
}

/// Indented dump of the element tree, one element per line.
impl fmt::Display for TypeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f, 0)
    }
}
