//! Instruction emission interface.
//!
//! The generator drives emission through the [`CodeSink`] trait: register
//! moves (including pushes and pops through the stack), the instructions
//! themselves, and informational comments. A sink may assemble machine code,
//! print assembly, or just record what it is told for testing.

use crate::ir::{InstructionData, NodePool};
use crate::isa::{RegMask, RuleId};
use core::fmt;

/// Abstract consumer of the emitted instruction stream.
///
/// Calls arrive in final program order: any reload moves, then the
/// instruction, then any spill moves.
pub trait CodeSink {
    /// Emit one register move. A zero `src` pops from the stack; a zero
    /// `dest` pushes onto it.
    fn emit_move(&mut self, src: RegMask, dest: RegMask);

    /// Emit an informational comment. Purely cosmetic; a sink may ignore it.
    fn emit_comment(&mut self, comment: fmt::Arguments);

    /// Emit the machine instruction bound to `rule`, reading operand
    /// registers and immediates from the instruction's surviving subnodes.
    fn emit_inst(&mut self, rule: RuleId, insn: &InstructionData, pool: &NodePool);
}
