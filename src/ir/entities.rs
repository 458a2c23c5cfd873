//! Code generator entity references.
//!
//! Nodes and instructions need to reference each other in both directions: an
//! instruction keeps the operand nodes it consumes, and a node remembers the
//! instructions that produce and consume its value. These references are not
//! implemented as Rust references both because the graph is cyclic and
//! because 64-bit pointers take up a lot of space. Instead each reference is
//! a struct wrapping a `u32` index into an arena, with a separate index type
//! per entity so we don't lose type safety.
//!
//! Compact data structures store these as
//! [`PackedOption`](cranelift_entity::packed_option::PackedOption) rather
//! than `Option`, which would double the size of the index.

use cranelift_entity::entity_impl;

/// An opaque reference to a mid-node in a [`NodePool`](crate::ir::NodePool).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Node(u32);
entity_impl!(Node, "node");

/// An opaque reference to an instruction in the in-flight stream.
///
/// The index doubles as the liveness coordinate: the stream is filled in
/// consumption order and emitted in reverse, so a *lower* index executes
/// *later* in the final program.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Inst(u32);
entity_impl!(Inst, "inst");
