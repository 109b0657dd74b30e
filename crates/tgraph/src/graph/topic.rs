// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Topic descriptors.
//!
//! A [`Topic`] ties a name to a root type graph plus the resolved key
//! descriptors, and carries the safe scan/print entry points over owned
//! [`Sample`] values as well as the raw-pointer entry points for
//! middleware-owned buffers.

use crate::description::TypeElement;
use crate::graph::builder::{build_type, fatal, BuildContext};
use crate::graph::path;
use crate::graph::node::TypeNode;
use crate::value::lexer::ScanError;
use crate::value::mem::Sample;
use crate::value::print::{print_key_fields, print_value, PrintMode, TextBuf};
use crate::value::release::release_node;
use crate::value::scan;
use std::sync::Arc;

/// One key field: name, byte offset from the start of the value, and the
/// leaf node (aliasing the root graph, never owned separately).
#[derive(Debug, Clone)]
pub struct TopicKey {
    pub name: String,
    pub offset: usize,
    pub ty: Arc<TypeNode>,
}

/// A registered topic: name, root type graph and key descriptors.
#[derive(Debug)]
pub struct Topic {
    name: String,
    size: usize,
    root: Arc<TypeNode>,
    keys: Vec<TopicKey>,
}

impl Topic {
    /// Build a topic from a type description forest.
    ///
    /// `desc` holds the description's top-level declarations in order.  The
    /// topic's root type is the last type-position declaration; if the
    /// description only declares modules, the dictionary entry for
    /// `type_name` is used instead.  `keylist` is a comma-separated list of
    /// key field paths; empty means a keyless topic.
    ///
    /// Type descriptions are fixed at start-up: any inconsistency here is
    /// fatal and panics after logging a diagnostic.
    pub fn from_description(
        name: impl Into<String>,
        type_name: &str,
        desc: &[TypeElement],
        keylist: &str,
    ) -> Self {
        let name = name.into();
        let mut cx = BuildContext::new();
        let mut root = None;
        for elem in desc {
            if let Some(t) = build_type(elem, &mut cx) {
                root = Some(t);
            }
        }
        let root = match root.or_else(|| cx.lookup(type_name)) {
            Some(t) => t,
            None => fatal!("topic {}: can't find type {}", name, type_name),
        };
        let keys = resolve_keys(&name, &root, keylist);

        log::debug!(
            "[tgraph] topic {} type {} size {} ({} key(s))",
            name,
            type_name,
            root.size,
            keys.len()
        );
        Self {
            name,
            size: root.size,
            root,
            keys,
        }
    }

    /// Build a topic directly from an already-built root node (for callers
    /// that assemble graphs by hand, e.g. tests and tools).
    pub fn from_node(name: impl Into<String>, root: Arc<TypeNode>, keylist: &str) -> Self {
        let name = name.into();
        let keys = resolve_keys(&name, &root, keylist);
        Self {
            name,
            size: root.size,
            root,
            keys,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes of one value of this topic's type.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn root(&self) -> &Arc<TypeNode> {
        &self.root
    }

    pub fn keys(&self) -> &[TopicKey] {
        &self.keys
    }

    /// Parse literal text into a freshly allocated value.  The whole input
    /// must be consumed.
    pub fn scan(&self, src: &str) -> Result<Sample, ScanError> {
        scan::scan(&self.root, src)
    }

    /// Parse one value off the front of `src`, returning the byte offset of
    /// the unconsumed remainder (e.g. to keep reading line-oriented input).
    pub fn scan_partial(&self, src: &str) -> Result<(Sample, usize), ScanError> {
        scan::scan_partial(&self.root, src)
    }

    /// Render a sample; `false` when output was chopped.
    pub fn print(&self, out: &mut TextBuf, sample: &Sample, mode: PrintMode) -> bool {
        debug_assert!(Arc::ptr_eq(sample.root(), &self.root), "sample of another topic");
        sample.print(out, mode)
    }

    /// Render only the declared key fields of a sample.
    pub fn print_key(&self, out: &mut TextBuf, sample: &Sample, mode: PrintMode) -> bool {
        debug_assert!(Arc::ptr_eq(sample.root(), &self.root), "sample of another topic");
        // Safety: the sample's buffer matches the root layout.
        unsafe { print_key_fields(out, &self.keys, sample.as_ptr(), mode) }
    }

    /// Render a middleware-owned value buffer.
    ///
    /// # Safety
    /// `data` must point at a live value whose physical layout matches this
    /// topic's computed layout (the layout agreement is assumed, not
    /// verified).
    pub unsafe fn print_raw(&self, out: &mut TextBuf, data: *const u8, mode: PrintMode) -> bool {
        print_value(out, &self.root, data, mode)
    }

    /// Render only the key fields of a middleware-owned key buffer.
    ///
    /// # Safety
    /// As [`Topic::print_raw`], for a buffer holding at least the key
    /// fields at their computed offsets.
    pub unsafe fn print_key_raw(
        &self,
        out: &mut TextBuf,
        keydata: *const u8,
        mode: PrintMode,
    ) -> bool {
        print_key_fields(out, &self.keys, keydata, mode)
    }

    /// Release the heap-owned substructures of a caller-owned value buffer.
    /// The buffer itself remains the caller's to free.
    ///
    /// # Safety
    /// As [`Topic::print_raw`]; every owned substructure must be released
    /// exactly once.
    pub unsafe fn release_raw(&self, data: *mut u8) {
        release_node(&self.root, data);
    }
}

/// Resolve a comma-separated key-field list against the root graph; key
/// paths are fixed at registration time, so failure is fatal.
fn resolve_keys(topic: &str, root: &Arc<TypeNode>, keylist: &str) -> Vec<TopicKey> {
    let mut keys = Vec::new();
    if keylist.is_empty() {
        return keys;
    }
    for key in keylist.split(',') {
        match path::resolve(root, key) {
            Ok((offset, ty)) => keys.push(TopicKey {
                name: key.to_string(),
                offset,
                ty,
            }),
            Err(e) => fatal!("topic {} key {}: {}", topic, key, e),
        }
    }
    keys
}
