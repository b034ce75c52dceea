//! A minimal read/write tree, standing in for the "tree library" that
//! spec.md treats as an external collaborator: something that can be
//! traversed read-only (the data document) and both read and appended to
//! (the compiled document).
//!
//! Both documents share this same type. An arena (`Vec<NodeData>`) avoids
//! the lifetime gymnastics of a pointer-linked tree; [`NodeId`] is a plain
//! index, and [`NodeRef`]/[`AttrRef`] are `Copy` read handles borrowed from
//! a [`Document`].
//!
//! Index `0` of every [`Document`] is a permanent, empty **absent-node
//! sentinel**: every read performed through it returns the empty default
//! (empty name, empty text, no attributes, no children), and navigating
//! through a missing child lands back on it rather than producing an
//! `Option`. This is what spec.md §6 calls "a sentinel absent node such
//! that every operation on it returns the library's empty defaults".

mod memory;
pub mod text;

pub use memory::{AttrRef, Document, NodeId, NodeKind, NodeRef, ABSENT};
