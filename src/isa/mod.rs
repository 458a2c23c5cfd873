//! Target description interface.
//!
//! The code generator is retargetable: everything it knows about a concrete
//! machine comes through the [`TargetIsa`] trait. A target supplies its
//! register file, its ordered rule table, and three oracles the matcher calls
//! while tiling a tree: the match-buffer walk, rule predicates, and rule
//! rewriters. Emission goes through the separate
//! [`CodeSink`](crate::binemit::CodeSink) trait so that the same target
//! description can drive different output backends.

pub mod registers;
pub mod rules;

pub use self::registers::{
    find_first, mask_bits, DisplayRegMask, RegInfo, RegMask, RegisterData, REG_SAME_AS_RESULT,
};
pub use self::rules::{
    template_matches, GenRuleData, Rule, RuleId, RewriteRuleData, INSTRUCTION_TEMPLATE_DEPTH,
};

use crate::ir::{MidOp, Node, NodePool};
use cranelift_entity::packed_option::PackedOption;

/// Methods implemented by targets.
pub trait TargetIsa {
    /// The target's name, for diagnostics.
    fn name(&self) -> &'static str;

    /// The target's register description.
    fn register_info(&self) -> &RegInfo;

    /// The target's rule table, in match order.
    fn rules(&self) -> &[Rule];

    /// Walk the template-shaped prefix of the tree rooted at `slots[0]`,
    /// filling in the operator code for every present position in
    /// `matchbytes` and the corresponding node in `slots`. Absent positions
    /// stay zero/empty. The mapping from tree shape to template positions is
    /// the target's own; the core treats it as opaque.
    fn populate_match_buffer(
        &self,
        pool: &NodePool,
        slots: &mut [PackedOption<Node>; INSTRUCTION_TEMPLATE_DEPTH],
        matchbytes: &mut [MidOp; INSTRUCTION_TEMPLATE_DEPTH],
    );

    /// Check a rule's predicate against the gathered nodes. Only called for
    /// rules that declare one.
    fn match_predicate(
        &self,
        rule: RuleId,
        pool: &NodePool,
        slots: &[PackedOption<Node>; INSTRUCTION_TEMPLATE_DEPTH],
    ) -> bool {
        let _ = (rule, pool, slots);
        true
    }

    /// Apply a rewrite rule to the gathered nodes, returning the replacement
    /// tree. Only called for rewrite rules; the default panics so targets
    /// without rewrite rules need not implement it.
    ///
    /// The replacement's desired register and consumer link are fixed up by
    /// the core afterwards; the target only builds the new tree. Rewriters
    /// must eventually reach a non-rewriting match; the core does not enforce
    /// termination.
    fn rewrite_node(
        &self,
        rule: RuleId,
        pool: &mut NodePool,
        slots: &[PackedOption<Node>; INSTRUCTION_TEMPLATE_DEPTH],
    ) -> Node {
        let _ = (pool, slots);
        panic!("{} declares no rewriter for {}", self.name(), rule);
    }
}
