// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scan/print/release integration tests.

use super::mem::{self, Sample, SeqRepr};
use super::print::{PrintMode, TextBuf};
use crate::description::{ElementKind, TypeElement};
use crate::graph::Topic;

fn member(name: &str, ty: TypeElement) -> TypeElement {
    TypeElement::named(ElementKind::Member, name).with_child(ty)
}

fn prim(kind: ElementKind) -> TypeElement {
    TypeElement::new(kind)
}

fn color_enum() -> TypeElement {
    TypeElement::named(ElementKind::Enum, "Color")
        .with_child(TypeElement::named(ElementKind::EnumLabel, "RED").with_num("value", 0))
        .with_child(TypeElement::named(ElementKind::EnumLabel, "GREEN").with_num("value", 1))
        .with_child(TypeElement::named(ElementKind::EnumLabel, "BLUE").with_num("value", 2))
}

/// struct KeyedSeq { long keyval; unsigned long seq; sequence<octet> baggage; }
fn keyedseq() -> Topic {
    let desc = [TypeElement::named(ElementKind::Struct, "KeyedSeq")
        .with_child(member("keyval", prim(ElementKind::Long)))
        .with_child(member("seq", prim(ElementKind::ULong)))
        .with_child(member(
            "baggage",
            TypeElement::new(ElementKind::Sequence).with_child(prim(ElementKind::Octet)),
        ))];
    Topic::from_description("KeyedSeq", "KeyedSeq", &desc, "keyval")
}

fn printed(tp: &Topic, sample: &Sample, mode: PrintMode) -> String {
    let mut out = TextBuf::unbounded();
    assert!(tp.print(&mut out, sample, mode));
    out.as_str().to_string()
}

fn dense(tp: &Topic, sample: &Sample) -> String {
    printed(tp, sample, PrintMode::Dense)
}

#[test]
fn keyedseq_prints_in_every_mode() {
    let tp = keyedseq();
    let v = tp.scan("{.keyval=3,.seq=7,.baggage={1,2,3}}").expect("scan");
    assert_eq!(dense(&tp, &v), "{3,7,{1,2,3}}");
    assert_eq!(printed(&tp, &v, PrintMode::Space), "{ 3, 7, {1,2,3} }");
    assert_eq!(
        printed(&tp, &v, PrintMode::Fields),
        "{ .keyval = 3, .seq = 7, .baggage = {1,2,3} }"
    );
    assert_eq!(
        printed(&tp, &v, PrintMode::Multiline),
        "{\n    .keyval = 3,\n    .seq = 7,\n    .baggage = {1,2,3} }"
    );
}

#[test]
fn fields_may_fill_in_declaration_order() {
    let tp = keyedseq();
    let v = tp.scan("{3,7,{1,2,3}}").expect("scan");
    assert_eq!(dense(&tp, &v), "{3,7,{1,2,3}}");
    // named selector may skip forward, leaving gaps zeroed
    let v = tp.scan("{.seq=7}").expect("scan");
    assert_eq!(dense(&tp, &v), "{0,7,{}}");
}

#[test]
fn field_selectors_cannot_go_backward() {
    let tp = keyedseq();
    assert!(tp.scan("{.seq=7,.keyval=3}").is_err());
    assert!(tp.scan("{.keyval=1,.keyval=2}").is_err());
    assert!(tp.scan("{1,7,{},.keyval=9}").is_err());
}

#[test]
fn extra_fields_are_rejected() {
    let tp = keyedseq();
    assert!(tp.scan("{1,2,{},3}").is_err());
}

#[test]
fn whole_input_must_be_consumed() {
    let tp = keyedseq();
    assert!(tp.scan("{1,2,{}}xx").is_err());
    assert!(tp.scan("{1,2,{}} {3,4,{}}").is_err());
}

#[test]
fn scan_partial_reports_the_remainder() {
    let tp = keyedseq();
    let src = "{1,2,{}} {9,8,{}}";
    let (v, end) = tp.scan_partial(src).expect("scan");
    assert_eq!(dense(&tp, &v), "{1,2,{}}");
    assert_eq!(end, 8);
    let (v, end) = tp.scan_partial(src[end..].trim_start()).expect("scan rest");
    assert_eq!(dense(&tp, &v), "{9,8,{}}");
    assert_eq!(end, 8);
}

#[test]
fn patch_shorthand_sets_one_nested_field() {
    let desc = [TypeElement::named(ElementKind::Struct, "S")
        .with_child(member(
            "p",
            TypeElement::named(ElementKind::Struct, "P")
                .with_child(member("x", prim(ElementKind::Long)))
                .with_child(member("y", prim(ElementKind::Long))),
        ))
        .with_child(member("q", prim(ElementKind::Long)))];
    let tp = Topic::from_description("S", "S", &desc, "");
    let v = tp.scan(".q=5").expect("scan");
    assert_eq!(dense(&tp, &v), "{{0,0},5}");
    let v = tp.scan(".p.y=3").expect("scan");
    assert_eq!(dense(&tp, &v), "{{0,3},0}");
    // q is not a struct, so it cannot have subfields
    assert!(tp.scan(".q.z=1").is_err());
}

#[test]
fn enum_fields_parse_symbols_and_raw_values() {
    let desc = [
        color_enum(),
        TypeElement::named(ElementKind::Struct, "S")
            .with_child(member("c", TypeElement::named(ElementKind::TypeRef, "Color"))),
    ];
    let tp = Topic::from_description("S", "S", &desc, "");
    let v = tp.scan("{GREEN}").expect("scan");
    // the stored value is the declared integer
    assert_eq!(unsafe { mem::read::<i32>(v.as_ptr()) }, 1);
    // and it renders symbolically, not numerically
    assert_eq!(printed(&tp, &v, PrintMode::Fields), "{ .c = GREEN }");
    let v = tp.scan("{2}").expect("scan");
    assert_eq!(dense(&tp, &v), "{BLUE}");
    assert!(tp.scan("{PURPLE}").is_err());
    assert!(tp.scan("{7}").is_err());
}

#[test]
fn booleans_parse_via_the_pseudo_enum() {
    let desc = [TypeElement::named(ElementKind::Struct, "S")
        .with_child(member("b", prim(ElementKind::Boolean)))];
    let tp = Topic::from_description("S", "S", &desc, "");
    assert_eq!(dense(&tp, &tp.scan("{true}").unwrap()), "{true}");
    assert_eq!(dense(&tp, &tp.scan("{0}").unwrap()), "{false}");
    assert_eq!(dense(&tp, &tp.scan("{1}").unwrap()), "{true}");
    assert!(tp.scan("{2}").is_err());
    assert!(tp.scan("{yes}").is_err());
}

#[test]
fn chars_accept_literals_and_small_integers() {
    let desc = [TypeElement::named(ElementKind::Struct, "S")
        .with_child(member("c", prim(ElementKind::Char)))];
    let tp = Topic::from_description("S", "S", &desc, "");
    assert_eq!(dense(&tp, &tp.scan("{'A'}").unwrap()), "{'A'}");
    assert_eq!(dense(&tp, &tp.scan("{65}").unwrap()), "{'A'}");
    assert_eq!(dense(&tp, &tp.scan(r"{'\n'}").unwrap()), r"{'\x0a'}");
    assert!(tp.scan("{256}").is_err());
    assert!(tp.scan("{sym}").is_err());
}

#[test]
fn floats_render_at_fixed_precision() {
    let desc = [TypeElement::named(ElementKind::Struct, "S")
        .with_child(member("f", prim(ElementKind::Double)))
        .with_child(member("g", prim(ElementKind::Float)))];
    let tp = Topic::from_description("S", "S", &desc, "");
    let v = tp.scan("{2.5,0.25}").expect("scan");
    assert_eq!(dense(&tp, &v), "{2.500000,0.250000}");
    // integer literals widen
    let v = tp.scan("{3,4}").expect("scan");
    assert_eq!(dense(&tp, &v), "{3.000000,4.000000}");
}

#[test]
fn strings_own_their_text_and_escape_on_output() {
    let desc = [TypeElement::named(ElementKind::Struct, "S")
        .with_child(member("s", prim(ElementKind::String)))];
    let tp = Topic::from_description("S", "S", &desc, "");
    let v = tp.scan("{\"a\\nb\"}").expect("scan");
    assert_eq!(printed(&tp, &v, PrintMode::Fields), "{ .s = \"a\\x0ab\" }");
    // escaped output re-parses to the same bytes
    let v2 = tp.scan("{\"a\\x0ab\"}").expect("rescan");
    assert_eq!(dense(&tp, &v), dense(&tp, &v2));
    // unset strings render as (null)
    let empty = Sample::new_zeroed(tp.root().clone());
    assert_eq!(dense(&tp, &empty), "{(null)}");
    assert!(tp.scan("{notquoted}").is_err());
}

#[test]
fn time_values_parse_inf_and_seconds() {
    let desc = [TypeElement::named(ElementKind::Struct, "S")
        .with_child(member("t", prim(ElementKind::Time)))];
    let tp = Topic::from_description("S", "S", &desc, "");
    assert_eq!(dense(&tp, &tp.scan("{inf}").unwrap()), "{inf}");
    assert_eq!(dense(&tp, &tp.scan("{1.5}").unwrap()), "{1.500000000}");
    assert_eq!(dense(&tp, &tp.scan("{2}").unwrap()), "{2.000000000}");
    assert!(tp.scan("{-1}").is_err());
    assert!(tp.scan("{forever}").is_err());
}

#[test]
fn bounded_sequences_enforce_their_maximum() {
    let desc = [TypeElement::named(ElementKind::Struct, "S").with_child(member(
        "q",
        TypeElement::new(ElementKind::Sequence)
            .with_num("size", 3)
            .with_child(prim(ElementKind::ULong)),
    ))];
    let tp = Topic::from_description("S", "S", &desc, "");
    let v = tp.scan("{{1,2,3}}").expect("scan");
    assert_eq!(dense(&tp, &v), "{{1,2,3}}");
    assert!(tp.scan("{{1,2,3,4}}").is_err());
}

#[test]
fn unbounded_sequences_record_their_length() {
    let desc = [TypeElement::named(ElementKind::Struct, "S").with_child(member(
        "q",
        TypeElement::new(ElementKind::Sequence).with_child(prim(ElementKind::ULong)),
    ))];
    let tp = Topic::from_description("S", "S", &desc, "");
    let v = tp.scan("{{1,2,3}}").expect("scan");
    let seq = unsafe { mem::read::<SeqRepr>(v.as_ptr()) };
    assert_eq!(seq.length, 3);
    assert_eq!(seq.maximum, 3);
    assert!(!seq.buffer.is_null());
    let v = tp.scan("{{}}").expect("scan empty");
    let seq = unsafe { mem::read::<SeqRepr>(v.as_ptr()) };
    assert_eq!(seq.length, 0);
    assert!(seq.buffer.is_null());
}

#[test]
fn arrays_reject_excess_and_zero_fill_the_tail() {
    let desc = [TypeElement::named(ElementKind::Struct, "S").with_child(member(
        "a",
        TypeElement::new(ElementKind::Array)
            .with_num("size", 3)
            .with_child(prim(ElementKind::Long)),
    ))];
    let tp = Topic::from_description("S", "S", &desc, "");
    let v = tp.scan("{{1,2}}").expect("scan");
    assert_eq!(dense(&tp, &v), "{{1,2,0}}");
    assert!(tp.scan("{{1,2,3,4}}").is_err());
}

#[test]
fn byte_sequences_render_printable_runs_as_strings() {
    let desc = [TypeElement::named(ElementKind::Struct, "S").with_child(member(
        "b",
        TypeElement::new(ElementKind::Sequence).with_child(prim(ElementKind::Octet)),
    ))];
    let tp = Topic::from_description("S", "S", &desc, "");
    // short runs stay numeric
    let v = tp.scan("{{\"abc\"}}").expect("scan");
    assert_eq!(dense(&tp, &v), "{{97,98,99}}");
    // four or more printable bytes collapse into a quoted run
    let v = tp.scan("{{1,2,\"abcd\",3}}").expect("scan");
    assert_eq!(dense(&tp, &v), "{{1,2,\"abcd\",3}}");
    // and the rendering re-parses to the same value
    let text = printed(&tp, &v, PrintMode::Fields);
    let v2 = tp.scan(&text).expect("round trip");
    assert_eq!(dense(&tp, &v), dense(&tp, &v2));
    // bounded byte sequences still enforce the maximum per byte
    let desc = [TypeElement::named(ElementKind::Struct, "S").with_child(member(
        "b",
        TypeElement::new(ElementKind::Sequence)
            .with_num("size", 3)
            .with_child(prim(ElementKind::Octet)),
    ))];
    let tp = Topic::from_description("S", "S", &desc, "");
    assert!(tp.scan("{{\"abcd\"}}").is_err());
}

fn union_topic(with_default: bool) -> Topic {
    let mut u = TypeElement::named(ElementKind::Union, "U")
        .with_child(
            TypeElement::new(ElementKind::UnionSwitch).with_child(prim(ElementKind::Long)),
        )
        .with_child(
            TypeElement::named(ElementKind::UnionCase, "a")
                .with_child(TypeElement::new(ElementKind::UnionLabel).with_num("value", 1))
                .with_child(prim(ElementKind::Long)),
        )
        .with_child(
            TypeElement::named(ElementKind::UnionCase, "b")
                .with_child(TypeElement::new(ElementKind::UnionLabel).with_num("value", 2))
                .with_child(TypeElement::new(ElementKind::UnionLabel).with_num("value", 3))
                .with_child(prim(ElementKind::String)),
        );
    if with_default {
        u = u.with_child(
            TypeElement::named(ElementKind::UnionCase, "other")
                .with_child(TypeElement::new(ElementKind::UnionLabelDefault))
                .with_child(prim(ElementKind::Boolean)),
        );
    }
    let desc = [u];
    Topic::from_description("U", "U", &desc, "")
}

#[test]
fn union_discriminator_selects_the_case() {
    let tp = union_topic(true);
    let v = tp.scan("1:5").expect("scan");
    assert_eq!(dense(&tp, &v), "1:5");
    assert_eq!(printed(&tp, &v, PrintMode::Fields), "1:.a = 5");
    let v = tp.scan("2:\"hi\"").expect("scan");
    assert_eq!(dense(&tp, &v), "2:\"hi\"");
    assert_eq!(printed(&tp, &v, PrintMode::Fields), "2:.b = \"hi\"");
    // no label matches 7, so the default case takes over
    let v = tp.scan("7:true").expect("scan");
    assert_eq!(dense(&tp, &v), "7:true");
}

#[test]
fn union_member_form_sets_an_unambiguous_discriminator() {
    let tp = union_topic(true);
    let v = tp.scan(".a=5").expect("scan");
    assert_eq!(dense(&tp, &v), "1:5");
    // two labels reach b, so the discriminator cannot be inferred
    assert!(tp.scan(".b=\"hi\"").is_err());
    // the default case needs no discriminator
    let v = tp.scan(".other=true").expect("scan");
    assert_eq!(dense(&tp, &v), "0:true");
    assert!(tp.scan(".nope=1").is_err());
}

#[test]
fn union_explicit_member_must_match_the_discriminator() {
    let tp = union_topic(true);
    let v = tp.scan("1:.a=5").expect("scan");
    assert_eq!(dense(&tp, &v), "1:5");
    assert!(tp.scan("2:.a=5").is_err());
    assert!(tp.scan("2:.zzz=5").is_err());
}

#[test]
fn union_without_default_rejects_unknown_discriminators() {
    let tp = union_topic(false);
    assert!(tp.scan("9:0").is_err());
    // a zeroed value has no active case either
    let v = Sample::new_zeroed(tp.root().clone());
    assert_eq!(dense(&tp, &v), "0:(invalid)");
}

#[test]
fn chop_bounds_output_deterministically() {
    let tp = keyedseq();
    let v = tp.scan("{.keyval=3,.seq=7,.baggage={1,2,3}}").expect("scan");
    let full = dense(&tp, &v);

    let mut out = TextBuf::new(10);
    assert!(!tp.print(&mut out, &v, PrintMode::Dense));
    assert!(out.truncated());
    assert_eq!(out.as_str(), &full[..10]);

    let mut out = TextBuf::new(full.len());
    assert!(tp.print(&mut out, &v, PrintMode::Dense));
    assert!(!out.truncated());
    assert_eq!(out.as_str(), full);

    let mut out = TextBuf::new(0);
    assert!(!tp.print(&mut out, &v, PrintMode::Dense));
    assert!(out.truncated());
    assert_eq!(out.as_str(), "");
}

#[test]
fn key_fields_print_separately() {
    let desc = [TypeElement::named(ElementKind::Struct, "S")
        .with_child(member(
            "key",
            TypeElement::new(ElementKind::Array)
                .with_num("size", 3)
                .with_child(prim(ElementKind::Long)),
        ))
        .with_child(member("name", prim(ElementKind::String)))];
    let tp = Topic::from_description("S", "S", &desc, "key[1],key[0]");
    let v = tp.scan("{{3,4,5},\"x\"}").expect("scan");
    let mut out = TextBuf::unbounded();
    assert!(tp.print_key(&mut out, &v, PrintMode::Dense));
    assert_eq!(out.as_str(), "{4,3}");
    assert!(tp.print_key(&mut out, &v, PrintMode::Fields));
    assert_eq!(out.as_str(), "{ .key[1] = 4, .key[0] = 3 }");
}

#[test]
fn raw_ownership_round_trip() {
    let desc = [TypeElement::named(ElementKind::Struct, "S")
        .with_child(member("s", prim(ElementKind::String)))];
    let tp = Topic::from_description("S", "S", &desc, "");
    let v = tp.scan("{\"hello\"}").expect("scan");
    let ptr = v.into_raw();
    unsafe {
        tp.release_raw(ptr);
        // release nulled the slot, so re-adopting and dropping only frees
        // the top-level buffer
        let readopted = Sample::from_raw(tp.root().clone(), ptr);
        assert_eq!(dense(&tp, &readopted), "{(null)}");
    }
}

#[test]
fn failed_parses_release_partial_values() {
    let desc = [TypeElement::named(ElementKind::Struct, "S")
        .with_child(member("s", prim(ElementKind::String)))
        .with_child(member(
            "q",
            TypeElement::new(ElementKind::Sequence).with_child(prim(ElementKind::String)),
        ))
        .with_child(member("n", prim(ElementKind::Long)))];
    let tp = Topic::from_description("S", "S", &desc, "");
    // fails after the string and two sequence elements own heap memory
    assert!(tp.scan("{\"abc\",{\"d\",\"e\"},oops}").is_err());
    // fails in the middle of a sequence element
    assert!(tp.scan("{\"abc\",{\"d\",17,\"e\"},1}").is_err());
    // and a successful parse of the same shape still works
    let v = tp.scan("{\"abc\",{\"d\",\"e\"},1}").expect("scan");
    assert_eq!(dense(&tp, &v), "{\"abc\",{\"d\",\"e\"},1}");
}

#[test]
fn scan_errors_carry_the_byte_offset() {
    let tp = keyedseq();
    let err = tp.scan("{.keyval=x}").unwrap_err();
    assert_eq!(err.pos, 9);
    let err = tp.scan("{.nope=1}").unwrap_err();
    assert_eq!(err.pos, 2);
}

#[test]
fn random_values_round_trip_through_fields_mode() {
    let desc = [
        color_enum(),
        TypeElement::named(ElementKind::Struct, "RT")
            .with_child(member("a", prim(ElementKind::Short)))
            .with_child(member("b", prim(ElementKind::ULong)))
            .with_child(member("c", prim(ElementKind::Boolean)))
            .with_child(member("col", TypeElement::named(ElementKind::TypeRef, "Color")))
            .with_child(member("s", prim(ElementKind::String)))
            .with_child(member(
                "arr",
                TypeElement::new(ElementKind::Array)
                    .with_num("size", 4)
                    .with_child(prim(ElementKind::Long)),
            ))
            .with_child(member(
                "q",
                TypeElement::new(ElementKind::Sequence)
                    .with_num("size", 5)
                    .with_child(prim(ElementKind::Short)),
            )),
    ];
    let tp = Topic::from_description("RT", "RT", &desc, "");
    fastrand::seed(0x5eed);
    for _ in 0..50 {
        let a = fastrand::i16(..);
        let b = fastrand::u32(..);
        let c = fastrand::bool();
        let col = ["RED", "GREEN", "BLUE"][fastrand::usize(0..3)];
        let s: String = (0..fastrand::usize(0..8))
            .map(|_| fastrand::alphanumeric())
            .collect();
        let arr: Vec<String> = (0..4).map(|_| fastrand::i32(..).to_string()).collect();
        let q: Vec<String> = (0..fastrand::usize(0..=5))
            .map(|_| fastrand::i16(..).to_string())
            .collect();
        let lit = format!(
            "{{.a={},.b={},.c={},.col={},.s=\"{}\",.arr={{{}}},.q={{{}}}}}",
            a,
            b,
            c,
            col,
            s,
            arr.join(","),
            q.join(",")
        );
        let v1 = tp.scan(&lit).unwrap_or_else(|e| panic!("scan {}: {}", lit, e));
        let text = printed(&tp, &v1, PrintMode::Fields);
        let v2 = tp
            .scan(&text)
            .unwrap_or_else(|e| panic!("rescan {}: {}", text, e));
        assert_eq!(dense(&tp, &v1), dense(&tp, &v2), "for {}", lit);
    }
}
