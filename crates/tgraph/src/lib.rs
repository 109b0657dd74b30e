// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # tgraph - runtime type graph and literal codec for DDS topic data
//!
//! Generic tools that subscribe to arbitrary topics never know their data
//! types at compile time.  This crate takes a type description supplied at
//! run time and
//!
//! - builds an immutable type graph with host-native binary layout (size,
//!   alignment, member offsets),
//! - parses a small textual literal grammar into freshly allocated value
//!   buffers honoring that layout,
//! - renders value buffers back to text in several formats with optional
//!   truncation, and
//! - recursively releases the heap-owned parts of such values.
//!
//! Entity lifecycle, QoS, transport and discovery stay with the middleware;
//! this crate only consumes its decoded type descriptions and raw value
//! buffers, and produces text or buffers for it.
//!
//! ## Quick Start
//!
//! ```rust
//! use tgraph::{ElementKind, PrintMode, TextBuf, Topic, TypeElement};
//!
//! // struct KeyedSeq { long keyval; unsigned long seq; sequence<octet> baggage; }
//! let desc = [TypeElement::named(ElementKind::Struct, "KeyedSeq")
//!     .with_child(
//!         TypeElement::named(ElementKind::Member, "keyval")
//!             .with_child(TypeElement::new(ElementKind::Long)),
//!     )
//!     .with_child(
//!         TypeElement::named(ElementKind::Member, "seq")
//!             .with_child(TypeElement::new(ElementKind::ULong)),
//!     )
//!     .with_child(
//!         TypeElement::named(ElementKind::Member, "baggage").with_child(
//!             TypeElement::new(ElementKind::Sequence)
//!                 .with_child(TypeElement::new(ElementKind::Octet)),
//!         ),
//!     )];
//!
//! let topic = Topic::from_description("KeyedSeq", "KeyedSeq", &desc, "keyval");
//! let sample = topic.scan("{.keyval=3,.seq=7,.baggage={1,2,3}}").unwrap();
//!
//! let mut out = TextBuf::unbounded();
//! topic.print(&mut out, &sample, PrintMode::Fields);
//! assert_eq!(out.as_str(), "{ .keyval = 3, .seq = 7, .baggage = {1,2,3} }");
//! ```
//!
//! ## Modules Overview
//!
//! - [`description`] - externally supplied type descriptions (shape tree,
//!   optional `<MetaData>` XML loader)
//! - [`graph`] - type nodes, layout computation, topics, field paths
//! - [`value`] - lexer, parser, printer and deallocator over raw buffers
//!
//! ## Concurrency
//!
//! Construction is single-threaded; a finished graph is immutable and may
//! be read from any number of threads.  A value buffer must not be mutated
//! concurrently with a parse, print or release call on it.  Recursion depth
//! is bounded only by the type's own nesting depth.

/// Externally supplied type descriptions.
pub mod description;
/// Type graphs with computed binary layout.
pub mod graph;
/// Value codec over raw buffers.
pub mod value;

pub use description::{AttrValue, ElementKind, TypeElement};
#[cfg(feature = "xml")]
pub use description::xml::{parse_metadata, MetaError};
pub use graph::{Topic, TopicKey, TypeKind, TypeNode};
pub use value::{PrintMode, Sample, ScanError, SeqRepr, TextBuf, TimeRepr};
