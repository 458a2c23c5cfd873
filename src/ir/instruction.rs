//! In-flight instructions and register moves.

use crate::ir::entities::Node;
use crate::isa::registers::RegMask;
use crate::isa::rules::{RuleId, INSTRUCTION_TEMPLATE_DEPTH};
use cranelift_entity::packed_option::PackedOption;
use core::fmt;
use smallvec::SmallVec;

/// One register move in a parallel transfer.
///
/// The empty mask stands for the stack: a move with `dest == 0` pushes `src`,
/// and a move with `src == 0` pops into `dest`. A fully cleared move is inert
/// (already carried out by the shuffler).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegMove {
    /// Source register, or 0 to pop from the stack.
    pub src: RegMask,
    /// Destination register, or 0 to push onto the stack.
    pub dest: RegMask,
}

impl fmt::Display for RegMove {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.src, self.dest) {
            (0, d) => write!(f, "pop {:#x}", d),
            (s, 0) => write!(f, "push {:#x}", s),
            (s, d) => write!(f, "{:#x} -> {:#x}", s, d),
        }
    }
}

/// A set of parallel register moves attached to one instruction.
pub type MoveList = SmallVec<[RegMove; 2]>;

/// One entry in the in-flight instruction stream.
///
/// Instructions are filled in consumption order and emitted in reverse, so
/// the entry's index in the stream is also its liveness coordinate: the
/// `input_regs`/`output_regs` masks of every entry between a value's consumer
/// and producer cover the registers that value travels through.
pub struct InstructionData {
    /// The rule this instruction was generated from.
    pub rule: RuleId,

    /// Surviving operand nodes, indexed by template position. Emitters read
    /// operand registers and immediates through these.
    pub subnodes: [PackedOption<Node>; INSTRUCTION_TEMPLATE_DEPTH],

    /// Registers the instruction could produce its result into.
    pub producable_regs: RegMask,

    /// The single register bit the result was allocated to, or 0 for
    /// instructions producing no value.
    pub produced_reg: RegMask,

    /// Registers that must be live on entry to this instruction.
    pub input_regs: RegMask,

    /// Registers clobbered by this instruction, including its result.
    pub output_regs: RegMask,

    /// Moves executed immediately before the instruction.
    pub reloads: MoveList,

    /// Moves executed immediately after the instruction.
    pub spills: MoveList,
}

impl InstructionData {
    /// Create an empty instruction generated from `rule`.
    pub fn new(rule: RuleId) -> Self {
        Self {
            rule,
            subnodes: [PackedOption::default(); INSTRUCTION_TEMPLATE_DEPTH],
            producable_regs: 0,
            produced_reg: 0,
            input_regs: 0,
            output_regs: 0,
            reloads: MoveList::new(),
            spills: MoveList::new(),
        }
    }
}
