//! Intermediate representation consumed by the code generator.
//!
//! The front end hands the generator a forest of *mid-nodes*: small typed
//! expression trees stored in a [`NodePool`]. During generation each tree is
//! tiled into [`InstructionData`] entries; nodes and instructions reference
//! each other by entity index, never by pointer.

pub mod entities;
pub mod instruction;
pub mod node;

pub use self::entities::{Inst, Node};
pub use self::instruction::{InstructionData, MoveList, RegMove};
pub use self::node::{MidOp, NodeData, NodePool};
