// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field-path resolution.
//!
//! Resolves `member ('.' member | '[' index ']')*` expressions against a
//! type graph to a byte offset and the leaf node, used to turn a topic's
//! textual key-field list into key descriptors at registration time.

use crate::graph::node::{dealias, TypeKind, TypeNode};
use crate::value::lexer::{Lexer, ScanError, Token};
use std::sync::Arc;

// what the grammar allows at the current position
const SYMBOL: u8 = 1;
const DOT: u8 = 2;
const INDEX: u8 = 4;

/// Resolve a dotted/indexed field path to `(offset, leaf type)`.
///
/// The leaf must be a scalar-comparable key kind (char, int, uint, enum or
/// string).
pub fn resolve(root: &Arc<TypeNode>, path: &str) -> Result<(usize, Arc<TypeNode>), ScanError> {
    let mut l = Lexer::new(path);
    let mut offset = 0usize;
    let mut ty: Arc<TypeNode> = dealias(root).clone();
    let mut allowed = SYMBOL;

    loop {
        let tok = l.next()?;
        match tok {
            Token::Eof => break,
            Token::Dot => {
                if allowed & DOT == 0 {
                    return Err(l.error("'.' unexpected"));
                }
                allowed = SYMBOL;
            }
            Token::Symbol(name) => {
                if allowed & SYMBOL == 0 {
                    return Err(l.error("symbol unexpected"));
                }
                let TypeKind::Struct(ts) = &ty.kind else {
                    return Err(l.error("expected type to be a struct"));
                };
                let Some(idx) = ts.member_index(&name) else {
                    return Err(l.error("field not found in struct"));
                };
                offset += ts.members[idx].offset;
                ty = dealias(&ts.members[idx].ty).clone();
                allowed = DOT | INDEX;
            }
            Token::LBracket => {
                if allowed & INDEX == 0 {
                    return Err(l.error("index unexpected"));
                }
                let TypeKind::Array(ta) = &ty.kind else {
                    return Err(l.error("expected type to be an array"));
                };
                let tok = l.next()?;
                let Some(idx) = tok.as_int() else {
                    return Err(l.error("integer expected"));
                };
                if idx < 0 || idx as u64 >= u64::from(ta.len) {
                    return Err(l.error("index out of bounds"));
                }
                offset += idx as usize * ta.elem.size;
                ty = dealias(&ta.elem).clone();
                if l.next()? != Token::RBracket {
                    return Err(l.error("']' expected"));
                }
                allowed = DOT | INDEX;
            }
            _ => return Err(l.error("unexpected token")),
        }
    }

    if allowed == SYMBOL {
        return Err(l.error("junk at end of input"));
    }
    if !ty.is_key_kind() {
        return Err(l.error("not a valid key type"));
    }
    Ok((offset, ty))
}
