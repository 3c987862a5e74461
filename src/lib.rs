//! HAMT implementation with mutable and persistent variants.
//!
//! Hash-Array Mapped Trie (HAMT) is a data structure popular as a map (a.k.a.
//! associative array or dictionary) or set. Its immutable variant is adopted
//! widely by functional programming languages like Scala and Clojure to
//! implement immutable and memory-efficient associative arrays and sets.
//!
//! This crate offers two maps over the same trie layout:
//!
//! - [`Hamt`] updates its nodes in place.
//! - [`PersistentHamt`] copies only the path to a change and shares every
//!   other sub-tree between versions, so old versions stay valid and can be
//!   read from other threads.
//!
//! Both maps hash keys with a pluggable [`KeyHasher`] and compact sparse
//! nodes into bitmap-indexed arrays, switching dense nodes to full 32-way
//! arrays.

mod bitmap;
pub mod error;
mod hasher;
mod key_value;
pub mod mutable;
pub mod persistent;
#[cfg(test)]
mod proptests;
mod walk;

pub use self::{
    bitmap::{BITS_PER_LEVEL, DEMOTION_THRESHOLD, PROMOTION_THRESHOLD},
    error::HamtError,
    hasher::{DefaultKeyHasher, FnKeyHasher, KeyHasher},
    mutable::Hamt,
    persistent::PersistentHamt,
    walk::{NodeInfo, NodeKind, Traversal},
};
