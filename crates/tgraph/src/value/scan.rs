// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Literal parsing into value buffers.
//!
//! Recursive descent driven by the type graph: each node consumes the
//! tokens its kind dictates and stores the result at its computed offset.
//! The buffer starts zeroed and stays releasable at every point (sequence
//! descriptors are written back before an element is filled), so the first
//! failure anywhere aborts the whole parse and the partially built value is
//! released internally; callers never observe a half-initialized value.

use crate::graph::node::{StructType, TypeKind, TypeNode, UnionType};
use crate::value::lexer::{Lexer, ScanError, Token};
use crate::value::mem::{self, Sample, SeqRepr, TimeRepr};
use std::sync::Arc;

/// Parse literal text into a freshly allocated value.  The whole input must
/// be consumed.
pub fn scan(root: &Arc<TypeNode>, src: &str) -> Result<Sample, ScanError> {
    let mut l = Lexer::new(src);
    let mut sample = Sample::new_zeroed(root.clone());
    // Safety: the sample buffer matches root's layout and is zeroed.
    unsafe {
        scan_node(root, sample.as_mut_ptr(), &mut l)?;
    }
    match l.next()? {
        Token::Eof => Ok(sample),
        _ => Err(l.error("junk at end of input")),
    }
}

/// Parse one value off the front of `src`; also returns the byte offset of
/// the unconsumed remainder instead of requiring end-of-input.
pub fn scan_partial(root: &Arc<TypeNode>, src: &str) -> Result<(Sample, usize), ScanError> {
    let mut l = Lexer::new(src);
    let mut sample = Sample::new_zeroed(root.clone());
    // Safety: as above.
    unsafe {
        scan_node(root, sample.as_mut_ptr(), &mut l)?;
    }
    Ok((sample, l.next_pos()))
}

fn int_token(tok: &Token, l: &mut Lexer<'_>) -> Result<i64, ScanError> {
    tok.as_int()
        .ok_or_else(|| l.error("integer or character literal expected"))
}

fn float_token(tok: &Token, l: &mut Lexer<'_>) -> Result<f64, ScanError> {
    tok.as_float()
        .ok_or_else(|| l.error("integer or floating-point literal expected"))
}

/// Booleans parse through a fixed two-entry pseudo-enum {false=0, true=1}.
fn bool_token(tok: &Token, l: &mut Lexer<'_>) -> Result<u8, ScanError> {
    match tok {
        Token::Symbol(s) if s == "false" => Ok(0),
        Token::Symbol(s) if s == "true" => Ok(1),
        Token::Int(0) => Ok(0),
        Token::Int(1) => Ok(1),
        Token::Symbol(_) | Token::Int(_) => Err(l.error("unknown enum constant")),
        _ => Err(l.error("integer literal or symbol expected")),
    }
}

fn enum_token(
    tok: &Token,
    e: &crate::graph::node::EnumType,
    l: &mut Lexer<'_>,
) -> Result<i32, ScanError> {
    let found = match tok {
        Token::Int(v) => e.labels.iter().find(|lab| i64::from(lab.value) == *v),
        Token::Symbol(s) => e.label(s),
        _ => return Err(l.error("integer literal or symbol expected")),
    };
    match found {
        Some(lab) => Ok(lab.value),
        None => Err(l.error("unknown enum constant")),
    }
}

unsafe fn scan_node(t: &TypeNode, dst: *mut u8, l: &mut Lexer<'_>) -> Result<(), ScanError> {
    let t = t.resolved();
    let tok = l.next()?;
    match &t.kind {
        TypeKind::Boolean => {
            let v = bool_token(&tok, l)?;
            mem::write::<u8>(dst, v);
        }

        TypeKind::Char => match tok {
            Token::Char(c) => mem::write::<u8>(dst, c),
            Token::Int(v) if (0..=255).contains(&v) => mem::write::<u8>(dst, v as u8),
            _ => return Err(l.error("expected character literal or integer in 0 .. 255")),
        },

        TypeKind::Int => {
            let v = int_token(&tok, l)?;
            match t.size {
                1 => mem::write::<i8>(dst, v as i8),
                2 => mem::write::<i16>(dst, v as i16),
                4 => mem::write::<i32>(dst, v as i32),
                _ => mem::write::<i64>(dst, v),
            }
        }

        TypeKind::UInt => {
            let v = int_token(&tok, l)? as u64;
            match t.size {
                1 => mem::write::<u8>(dst, v as u8),
                2 => mem::write::<u16>(dst, v as u16),
                4 => mem::write::<u32>(dst, v as u32),
                _ => mem::write::<u64>(dst, v),
            }
        }

        TypeKind::Float => {
            let v = float_token(&tok, l)?;
            match t.size {
                4 => mem::write::<f32>(dst, v as f32),
                _ => mem::write::<f64>(dst, v),
            }
        }

        TypeKind::Enum(e) => {
            let v = enum_token(&tok, e, l)?;
            mem::write::<i32>(dst, v);
        }

        TypeKind::String => match tok {
            Token::Str(bytes) => mem::store_string(dst, &bytes),
            _ => return Err(l.error("string literal expected")),
        },

        TypeKind::Time => match tok {
            Token::Symbol(ref s) if s == "inf" => {
                mem::write::<TimeRepr>(dst, TimeRepr::infinite());
            }
            Token::Symbol(_) => {
                return Err(l.error("inf, integer or floating-point literal expected"))
            }
            tok => {
                let d = float_token(&tok, l)?;
                match mem::duration_from_secs(d) {
                    Some(tv) => mem::write::<TimeRepr>(dst, tv),
                    None => return Err(l.error("invalid time/duration")),
                }
            }
        },

        TypeKind::Struct(ts) => scan_struct(ts, tok, dst, l)?,
        TypeKind::Sequence(_) | TypeKind::Array(_) => scan_collection(t, tok, dst, l)?,
        TypeKind::Union(tu) => scan_union(tu, tok, dst, l)?,

        TypeKind::Alias(_) => unreachable!("aliases are stripped above"),
    }
    Ok(())
}

/// `.name` selector after the leading dot: returns the member index.  When
/// a further `.subfield` follows, the dot is pushed back and the selected
/// member (which must itself be a struct) consumes it.
fn field_selector(ts: &StructType, l: &mut Lexer<'_>) -> Result<usize, ScanError> {
    let Token::Symbol(name) = l.next()? else {
        return Err(l.error("field name expected following '.'"));
    };
    let Some(idx) = ts.member_index(&name) else {
        return Err(l.error("field not found"));
    };
    match l.next()? {
        Token::Equals => Ok(idx),
        Token::Dot => {
            l.push_back(Token::Dot);
            if matches!(ts.members[idx].ty.resolved().kind, TypeKind::Struct(_)) {
                Ok(idx)
            } else {
                Err(l.error("preceding field not of struct type"))
            }
        }
        _ => Err(l.error("'=' or subfield expected")),
    }
}

unsafe fn scan_struct(
    ts: &StructType,
    first: Token,
    dst: *mut u8,
    l: &mut Lexer<'_>,
) -> Result<(), ScanError> {
    match first {
        // standalone `.name[.subfield...]=value` patches a single field
        Token::Dot => {
            let idx = field_selector(ts, l)?;
            let m = &ts.members[idx];
            scan_node(&m.ty, dst.add(m.offset), l)
        }
        Token::LBrace => {
            let mut cursor = 0usize;
            let mut first_field = true;
            loop {
                let mut tok = l.next()?;
                if tok == Token::RBrace {
                    return Ok(());
                }
                if tok == Token::Eof {
                    return Err(l.error("unexpected end of input"));
                }
                if !first_field {
                    if tok != Token::Comma {
                        return Err(l.error("',' expected"));
                    }
                    tok = l.next()?;
                }
                if tok == Token::Dot {
                    let idx = field_selector(ts, l)?;
                    // selectors may only move forward in declaration order
                    if idx < cursor {
                        return Err(l.error("field selector goes backward"));
                    }
                    cursor = idx;
                } else {
                    l.push_back(tok);
                }
                if cursor == ts.members.len() {
                    return Err(l.error("fields beyond end of struct present"));
                }
                let m = &ts.members[cursor];
                scan_node(&m.ty, dst.add(m.offset), l)?;
                first_field = false;
                cursor += 1;
            }
        }
        _ => Err(l.error("'{' expected at start of struct")),
    }
}

unsafe fn scan_collection(
    t: &TypeNode,
    first: Token,
    dst: *mut u8,
    l: &mut Lexer<'_>,
) -> Result<(), ScanError> {
    let (elem, maxn, is_seq) = match &t.kind {
        TypeKind::Sequence(s) => (&s.elem, s.max, true),
        TypeKind::Array(a) => (&a.elem, a.len, false),
        _ => unreachable!("collection kind"),
    };
    let stride = elem.size;
    let leaf = elem.resolved();
    // quoted strings feed char/octet sequences byte by byte, mirroring the
    // printer's printable-run rendering
    let bytewise = is_seq
        && (matches!(leaf.kind, TypeKind::Char)
            || (matches!(leaf.kind, TypeKind::UInt) && leaf.size == 1));

    if first != Token::LBrace {
        return Err(l.error("'{' expected"));
    }
    let mut n: u32 = 0;
    loop {
        let tok = l.next()?;
        if tok == Token::RBrace {
            break;
        }
        if tok == Token::Eof {
            return Err(l.error("unexpected end of input"));
        }
        if n == 0 {
            l.push_back(tok);
        } else if tok != Token::Comma {
            return Err(l.error("',' expected"));
        }

        if bytewise {
            let tok = l.next()?;
            if let Token::Str(bytes) = tok {
                for &b in &bytes {
                    if maxn != 0 && n == maxn {
                        return Err(l.error("too many elements"));
                    }
                    let mut seq = mem::read::<SeqRepr>(dst);
                    let slot = mem::seq_push_slot(&mut seq, stride, elem.align);
                    seq.length = n + 1;
                    mem::write(dst, seq);
                    mem::write::<u8>(slot, b);
                    n += 1;
                }
                continue;
            }
            l.push_back(tok);
        }

        if maxn != 0 && n == maxn {
            return Err(l.error("too many elements"));
        }
        let slot = if is_seq {
            // descriptor is written back before the element is parsed so a
            // failed fill still leaves the value releasable
            let mut seq = mem::read::<SeqRepr>(dst);
            let p = mem::seq_push_slot(&mut seq, stride, elem.align);
            seq.length = n + 1;
            mem::write(dst, seq);
            p
        } else {
            dst.add(n as usize * stride)
        };
        scan_node(elem, slot, l)?;
        n += 1;
    }
    if is_seq {
        let mut seq = mem::read::<SeqRepr>(dst);
        mem::seq_shrink(&mut seq, stride, elem.align);
        mem::write(dst, seq);
    }
    Ok(())
}

unsafe fn scan_union(
    tu: &UnionType,
    first: Token,
    dst: *mut u8,
    l: &mut Lexer<'_>,
) -> Result<(), ScanError> {
    let case_idx;
    if first == Token::Dot {
        // .MEMBER=VALUE selects the case by name
        let Token::Symbol(name) = l.next()? else {
            return Err(l.error("symbol expected"));
        };
        let Some(idx) = tu.case_index(&name) else {
            return Err(l.error("non-existent member"));
        };
        if Some(idx) != tu.default_case {
            let mut label = None;
            for lab in tu.labels.iter().filter(|lab| lab.case == idx) {
                if label.is_some() {
                    return Err(l.error("ambiguous discriminator value"));
                }
                label = Some(lab.value);
            }
            if let Some(v) = label {
                mem::store_disc(dst, &tu.discriminator, v);
            }
        }
        if l.next()? != Token::Equals {
            return Err(l.error("'=' expected"));
        }
        case_idx = idx;
    } else {
        // DISC:VALUE or DISC:.MEMBER=VALUE
        l.push_back(first);
        scan_node(&tu.discriminator, dst, l)?;
        let dv = mem::load_disc(&tu.discriminator, dst);
        let Some(idx) = tu.case_for_discriminator(dv) else {
            return Err(l.error("invalid discriminator value"));
        };
        case_idx = idx;
        if l.next()? != Token::Colon {
            return Err(l.error("':' expected"));
        }
        let tok = l.next()?;
        if tok == Token::Dot {
            let Token::Symbol(name) = l.next()? else {
                return Err(l.error("symbol expected"));
            };
            if tu.cases[idx].name != name {
                if tu.case_index(&name).is_none() {
                    return Err(l.error("non-existent member"));
                }
                return Err(l.error("mismatch between discriminator and member"));
            }
            if l.next()? != Token::Equals {
                return Err(l.error("'=' expected"));
            }
        } else {
            l.push_back(tok);
        }
    }
    scan_node(&tu.cases[case_idx].ty, dst.add(tu.payload_offset), l)
}
