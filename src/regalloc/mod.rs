//! Register allocation.
//!
//! This module contains the expression-local register allocator and the
//! parallel-move serializer it feeds.

pub mod shuffle;

pub(crate) mod allocator;

pub use self::shuffle::shuffle_registers;
