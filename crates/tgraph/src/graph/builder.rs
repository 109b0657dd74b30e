// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type graph construction.
//!
//! One recursive pass over a description element produces one [`TypeNode`]
//! with fully computed layout, resolving nested elements bottom-up.  Named
//! types are entered into a dictionary of fully-qualified names
//! (`::`-separated, module-prefixed) so later `Type` references resolve by
//! name; the dictionary and module scope stack live in an explicit
//! [`BuildContext`] threaded through the recursion.
//!
//! Type descriptions are fixed at start-up, so a malformed description is
//! not a recoverable condition: construction logs a diagnostic and aborts.

use crate::description::{AttrValue, ElementKind, TypeElement};
use crate::graph::node::{
    align_up, seq_layout, ArrayType, EnumLabel, EnumType, SequenceType, StructMember, StructType,
    TypeKind, TypeNode, UnionCase, UnionLabel, UnionType,
};
use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

macro_rules! fatal {
    ($($arg:tt)*) => {{
        log::error!("[tgraph] type description error: {}", format_args!($($arg)*));
        panic!("type description error: {}", format_args!($($arg)*))
    }};
}
pub(crate) use fatal;

/// Mutable construction state: the name dictionary and the module scope
/// stack.  Discarded once a topic's graph is complete.
pub(crate) struct BuildContext {
    dict: HashMap<String, Arc<TypeNode>>,
    scope: Vec<String>,
}

impl BuildContext {
    pub(crate) fn new() -> Self {
        Self {
            dict: HashMap::new(),
            scope: Vec::new(),
        }
    }

    fn qualified(&self, name: &str) -> String {
        let mut fq = String::new();
        for part in &self.scope {
            fq.push_str("::");
            fq.push_str(part);
        }
        fq.push_str("::");
        fq.push_str(name);
        fq
    }

    fn register(&mut self, name: &str, node: &Arc<TypeNode>) {
        let fq = self.qualified(name);
        log::debug!("[tgraph] register {} ({})", fq, node.kind_name());
        self.dict.insert(fq, node.clone());
    }

    /// Resolve a name against the current scope, walking outward: try
    /// `current::name`, strip the innermost scope, retry, down to the root.
    /// A leading `::` is an exact global lookup.
    pub(crate) fn lookup(&self, name: &str) -> Option<Arc<TypeNode>> {
        if name.starts_with("::") {
            return self.dict.get(name).cloned();
        }
        let mut depth = self.scope.len();
        loop {
            let mut fq = String::new();
            for part in &self.scope[..depth] {
                fq.push_str("::");
                fq.push_str(part);
            }
            fq.push_str("::");
            fq.push_str(name);
            if let Some(t) = self.dict.get(&fq) {
                return Some(t.clone());
            }
            if depth == 0 {
                return None;
            }
            depth -= 1;
        }
    }
}

/// Build the type graph for one description element.
///
/// Module elements contribute their children to the dictionary and yield no
/// node of their own (`None`); every other element yields exactly one node.
pub(crate) fn build_type(elem: &TypeElement, cx: &mut BuildContext) -> Option<Arc<TypeNode>> {
    match elem.kind {
        ElementKind::Module => {
            let Some(name) = &elem.name else {
                fatal!("module without a name");
            };
            cx.scope.push(name.clone());
            for child in &elem.children {
                build_type(child, cx);
            }
            cx.scope.pop();
            None
        }

        ElementKind::Typedef => {
            let inner = build_children(elem, cx)
                .unwrap_or_else(|| fatal!("typedef without a referenced type"));
            let node = Arc::new(TypeNode {
                name: elem.name.clone(),
                size: inner.size,
                align: inner.align,
                kind: TypeKind::Alias(inner),
            });
            if let Some(name) = &elem.name {
                cx.register(name, &node);
            }
            Some(node)
        }

        ElementKind::TypeRef => {
            let Some(name) = &elem.name else {
                fatal!("type reference without a name");
            };
            match cx.lookup(name) {
                Some(t) => Some(t),
                None => fatal!("unresolved type reference '{}'", name),
            }
        }

        ElementKind::Struct => Some(build_struct(elem, cx)),
        ElementKind::Union => Some(build_union(elem, cx)),
        ElementKind::Enum => Some(build_enum(elem, cx)),
        ElementKind::Array | ElementKind::Sequence => Some(build_collection(elem, cx)),

        ElementKind::Boolean => Some(Arc::new(TypeNode::boolean())),
        ElementKind::Char => Some(Arc::new(TypeNode::char_())),
        ElementKind::Octet => Some(Arc::new(TypeNode::uint(1))),
        ElementKind::Short => Some(Arc::new(TypeNode::int(2))),
        ElementKind::UShort => Some(Arc::new(TypeNode::uint(2))),
        ElementKind::Long => Some(Arc::new(TypeNode::int(4))),
        ElementKind::ULong => Some(Arc::new(TypeNode::uint(4))),
        ElementKind::LongLong => Some(Arc::new(TypeNode::int(8))),
        ElementKind::ULongLong => Some(Arc::new(TypeNode::uint(8))),
        ElementKind::Float => Some(Arc::new(TypeNode::float(4))),
        ElementKind::Double => Some(Arc::new(TypeNode::float(8))),
        ElementKind::Time => Some(Arc::new(TypeNode::time())),
        ElementKind::String => Some(Arc::new(TypeNode::string())),

        ElementKind::Member
        | ElementKind::UnionCase
        | ElementKind::UnionSwitch
        | ElementKind::UnionLabel
        | ElementKind::UnionLabelDefault
        | ElementKind::EnumLabel => {
            fatal!("unexpected {} element in type position:\n{}", elem.kind.as_str(), elem)
        }
    }
}

/// Build each child in order and keep the last resulting node (modules
/// yield none; every type-position element yields one).
fn build_children(elem: &TypeElement, cx: &mut BuildContext) -> Option<Arc<TypeNode>> {
    let mut last = None;
    for child in &elem.children {
        if let Some(t) = build_type(child, cx) {
            last = Some(t);
        }
    }
    last
}

fn build_struct(elem: &TypeElement, cx: &mut BuildContext) -> Arc<TypeNode> {
    let mut members = Vec::with_capacity(elem.children.len());
    let mut size = 0usize;
    let mut align = 1usize;
    for child in &elem.children {
        if child.kind != ElementKind::Member {
            fatal!("struct child is a {}, expected a member", child.kind.as_str());
        }
        let Some(name) = &child.name else {
            fatal!("struct member without a name");
        };
        let ty = build_children(child, cx)
            .unwrap_or_else(|| fatal!("struct member '{}' without a type", name));
        let offset = align_up(size, ty.align);
        size = offset + ty.size;
        align = align.max(ty.align);
        members.push(StructMember {
            name: name.clone(),
            offset,
            ty,
        });
    }
    size = align_up(size, align);
    let node = Arc::new(TypeNode {
        name: elem.name.clone(),
        size,
        align,
        kind: TypeKind::Struct(StructType { members }),
    });
    if let Some(name) = &elem.name {
        cx.register(name, &node);
    }
    node
}

fn build_enum(elem: &TypeElement, cx: &mut BuildContext) -> Arc<TypeNode> {
    let mut labels = Vec::with_capacity(elem.children.len());
    for child in &elem.children {
        if child.kind != ElementKind::EnumLabel {
            fatal!("enum child is a {}, expected a label", child.kind.as_str());
        }
        let Some(name) = &child.name else {
            fatal!("enum label without a name");
        };
        let value = match child.attrs.iter().find(|(n, _)| n == "value") {
            Some((_, AttrValue::Number(v))) => *v as i32,
            _ => fatal!("enum label '{}' without a numeric value", name),
        };
        labels.push(EnumLabel {
            value,
            name: name.clone(),
        });
    }
    let node = Arc::new(TypeNode {
        name: elem.name.clone(),
        size: 4,
        align: mem::align_of::<i32>(),
        kind: TypeKind::Enum(EnumType { labels }),
    });
    if let Some(name) = &elem.name {
        cx.register(name, &node);
    }
    node
}

fn build_collection(elem: &TypeElement, cx: &mut BuildContext) -> Arc<TypeNode> {
    let n = elem.num_attr_or_zero("size");
    if n < 0 {
        fatal!("negative collection bound {}", n);
    }
    let n = n as u32;
    let is_seq = elem.kind == ElementKind::Sequence || n == 0;
    let ty = build_children(elem, cx)
        .unwrap_or_else(|| fatal!("{} without an element type", elem.kind.as_str()));
    let node = if is_seq {
        let (size, align) = seq_layout();
        Arc::new(TypeNode {
            name: elem.name.clone(),
            size,
            align,
            kind: TypeKind::Sequence(SequenceType { elem: ty, max: n }),
        })
    } else {
        Arc::new(TypeNode {
            name: elem.name.clone(),
            size: n as usize * ty.size,
            align: ty.align,
            kind: TypeKind::Array(ArrayType { elem: ty, len: n }),
        })
    };
    if let Some(name) = &elem.name {
        cx.register(name, &node);
    }
    node
}

fn build_union(elem: &TypeElement, cx: &mut BuildContext) -> Arc<TypeNode> {
    let mut discriminator: Option<Arc<TypeNode>> = None;
    let mut cases: Vec<UnionCase> = Vec::new();
    let mut labels: Vec<UnionLabel> = Vec::new();
    let mut default_case = None;
    let mut payload_offset = 0usize;
    let mut size = 0usize;
    let mut align = 1usize;

    for child in &elem.children {
        match child.kind {
            ElementKind::UnionSwitch => {
                let d = build_children(child, cx)
                    .unwrap_or_else(|| fatal!("union switch without a type"));
                let d = crate::graph::node::dealias(&d).clone();
                size = d.size;
                payload_offset = d.size;
                align = d.align;
                discriminator = Some(d);
            }

            ElementKind::UnionCase => {
                let Some(name) = &child.name else {
                    fatal!("union case without a name");
                };
                let case_idx = cases.len();
                let mut case_ty: Option<Arc<TypeNode>> = None;
                for part in &child.children {
                    match part.kind {
                        ElementKind::UnionLabelDefault => default_case = Some(case_idx),
                        ElementKind::UnionLabel => {
                            let Some(disc) = &discriminator else {
                                fatal!("union label before the discriminator");
                            };
                            for (_, value) in &part.attrs {
                                labels.push(UnionLabel {
                                    value: label_value(value, disc),
                                    case: case_idx,
                                });
                            }
                        }
                        _ => {
                            let ty = build_type(part, cx).unwrap_or_else(|| {
                                fatal!("union case '{}' without a type", name)
                            });
                            align = align.max(ty.align);
                            payload_offset = align_up(payload_offset, ty.align);
                            size = size.max(align_up(payload_offset + ty.size, align));
                            case_ty = Some(ty);
                        }
                    }
                }
                let ty = case_ty
                    .unwrap_or_else(|| fatal!("union case '{}' without a type", name));
                cases.push(UnionCase {
                    name: name.clone(),
                    ty,
                });
            }

            _ => fatal!(
                "union child is a {}, expected switch or case",
                child.kind.as_str()
            ),
        }
    }

    let Some(discriminator) = discriminator else {
        fatal!("union without a discriminator");
    };
    size = align_up(size, align);
    let node = Arc::new(TypeNode {
        name: elem.name.clone(),
        size,
        align,
        kind: TypeKind::Union(UnionType {
            discriminator,
            payload_offset,
            cases,
            labels,
            default_case,
        }),
    });
    if let Some(name) = &elem.name {
        cx.register(name, &node);
    }
    node
}

/// A union case label: numeric, or symbolic against an enum discriminator,
/// or decimal text against an integer discriminator.
fn label_value(value: &AttrValue, disc: &TypeNode) -> u64 {
    match value {
        AttrValue::Number(n) => *n as u64,
        AttrValue::Text(s) => match &disc.kind {
            TypeKind::Enum(e) => match e.label(s) {
                Some(l) => l.value as i64 as u64,
                None => fatal!("union label '{}' not in discriminator enum", s),
            },
            TypeKind::Int | TypeKind::UInt => {
                let parsed = if let Some(rest) = s.strip_prefix('-') {
                    rest.parse::<u64>().ok().map(|v| v.wrapping_neg())
                } else {
                    s.parse::<u64>().ok()
                };
                match parsed {
                    Some(v) => v,
                    None => fatal!("union label '{}' is not an integer", s),
                }
            }
            _ => fatal!(
                "symbolic union label '{}' against {} discriminator",
                s,
                disc.kind_name()
            ),
        },
    }
}
