//! Tilegen code generation library.
//!
//! Tilegen turns typed expression trees into a linear sequence of target
//! machine instructions with physical registers assigned and all necessary
//! spill and reload moves inserted. Instruction selection is bottom-up tree
//! tiling over a declarative rule table supplied by the target description;
//! register allocation is expression-local and greedy over a bounded window
//! of in-flight instructions.
//!
//! The library knows nothing about any concrete target. Architectures are
//! described through the [`isa::TargetIsa`] trait (registers, rules,
//! predicates and rewriters) and receive the finished instruction stream
//! through the [`binemit::CodeSink`] trait.

#![deny(missing_docs, trivial_numeric_casts, unused_extern_crates)]
#![warn(unused_import_braces)]

pub use cranelift_entity as entity;

pub mod binemit;
pub mod ir;
pub mod isa;
pub mod regalloc;

mod context;
mod result;

pub use crate::context::{Context, NUM_INSTRUCTIONS, NUM_NODES};
pub use crate::result::{CodegenError, CodegenResult};

/// Version number of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
