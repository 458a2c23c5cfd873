//! Result and error types representing the outcome of code generation.

use crate::ir::MidOp;
use crate::isa::{RegMask, RuleId};
use thiserror::Error;

/// A fatal code generation error.
///
/// Every variant is a programmer error rather than a user error: either a
/// compile-time capacity limit was hit, or the architecture's rule table
/// describes an impossible situation. There is no local recovery; callers are
/// expected to abort the compilation and report the message.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodegenError {
    /// The instruction stream for a single tree overflowed
    /// [`NUM_INSTRUCTIONS`](crate::NUM_INSTRUCTIONS).
    #[error("instruction tree too big")]
    InstructionLimitExceeded,

    /// The pending-node work stack overflowed [`NUM_NODES`](crate::NUM_NODES).
    #[error("ran out of nodes")]
    NodeLimitExceeded,

    /// No rule in the table matches a node. The operator, its immediate value
    /// and the desired register mask identify the offending node.
    #[error("internal compiler error: no rule matches {desired_reg:#x} := op {op} (value {value})")]
    Unmatched {
        /// Operator code of the unmatched node.
        op: MidOp,
        /// Immediate value carried by the unmatched node.
        value: i64,
        /// Register mask its consumer asked for.
        desired_reg: RegMask,
    },

    /// The register allocator could not find a register under any policy,
    /// including spilling through the stack. Always a rule table bug. The
    /// in-flight instruction window is dumped to the log before this error is
    /// returned.
    #[error("register allocation deadlock ({rule} contains impossible situation)")]
    Deadlock {
        /// The rule whose register requirements cannot be satisfied.
        rule: RuleId,
    },
}

/// A convenient alias for a `Result` that uses `CodegenError` as the error.
pub type CodegenResult<T> = Result<T, CodegenError>;
