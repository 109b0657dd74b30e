// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type graphs with computed binary layout.
//!
//! The builder consumes a type description once per distinct named type (at
//! topic registration) and produces an immutable graph of [`TypeNode`]s;
//! resolver, parser, printer and deallocator consume it read-only
//! thereafter.

mod builder;
pub mod node;
pub mod path;
pub mod topic;

pub use node::{
    ArrayType, EnumLabel, EnumType, SequenceType, StructMember, StructType, TypeKind, TypeNode,
    UnionCase, UnionLabel, UnionType,
};
pub use path::resolve;
pub use topic::{Topic, TopicKey};
