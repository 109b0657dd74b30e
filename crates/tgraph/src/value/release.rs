// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value release.
//!
//! Recursively frees the heap-owned parts embedded in a value buffer: string
//! allocations and sequence element buffers (elements released first).
//! Scalar, struct and array *shape* is part of the buffer itself and is the
//! owner's to free afterward.  Freed slots are nulled, so releasing is
//! idempotent per slot even though the contract is release-exactly-once.

use crate::graph::node::{TypeKind, TypeNode};
use crate::value::mem::{self, SeqRepr};

/// Release the heap-owned substructures of a value.
///
/// # Safety
/// `data` must point at a live, writable value of `t`'s computed layout
/// whose embedded pointers were produced by this engine (or a
/// layout-compatible allocator agreement).
pub(crate) unsafe fn release_node(t: &TypeNode, data: *mut u8) {
    match &t.kind {
        TypeKind::Boolean
        | TypeKind::Char
        | TypeKind::Int
        | TypeKind::UInt
        | TypeKind::Float
        | TypeKind::Enum(_)
        | TypeKind::Time => {}

        TypeKind::String => mem::free_string(data),

        TypeKind::Alias(inner) => release_node(inner, data),

        TypeKind::Struct(ts) => {
            for m in &ts.members {
                release_node(&m.ty, data.add(m.offset));
            }
        }

        TypeKind::Array(ta) => {
            for i in 0..ta.len {
                release_node(&ta.elem, data.add(i as usize * ta.elem.size));
            }
        }

        TypeKind::Sequence(ts) => {
            let mut seq = mem::read::<SeqRepr>(data);
            if !seq.buffer.is_null() {
                for i in 0..seq.length {
                    release_node(&ts.elem, seq.buffer.add(i as usize * ts.elem.size));
                }
                mem::seq_free(&mut seq, ts.elem.size, ts.elem.align);
            } else {
                seq = SeqRepr {
                    maximum: 0,
                    length: 0,
                    buffer: std::ptr::null_mut(),
                    release: false,
                };
            }
            mem::write(data, seq);
        }

        // only the active case owns anything
        TypeKind::Union(tu) => {
            let dv = mem::load_disc(&tu.discriminator, data);
            if let Some(idx) = tu.case_for_discriminator(dv) {
                release_node(&tu.cases[idx].ty, data.add(tu.payload_offset));
            }
        }
    }
}
