//! Instruction selection rules.
//!
//! A target describes its instructions as an ordered table of rules. Each
//! rule carries a fixed-depth template of operator codes that is compared
//! against the corresponding prefix of the node tree; byte 0 in a template
//! position is a wildcard. The table is searched in declaration order and the
//! first surviving rule wins, which makes rule ordering load-bearing: targets
//! list special-case rules (addressing modes, folded constants) before the
//! generic ones they shadow, and a port must never reorder the table.

use crate::ir::MidOp;
use crate::isa::registers::RegMask;
use cranelift_entity::entity_impl;

/// Number of template positions in a rule.
///
/// The mapping from tree shape to template positions belongs to the target's
/// `populate_match_buffer`; the core only fixes how many positions there are.
pub const INSTRUCTION_TEMPLATE_DEPTH: usize = 7;

/// An opaque reference to a rule in the target's table.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u32);
entity_impl!(RuleId, "rule");

/// One row of the instruction selection table.
pub enum Rule {
    /// A rule that generates one machine instruction.
    Generate(GenRuleData),
    /// A rule that replaces the matched subtree with a different one and
    /// sends the matcher back to the start of the table.
    Rewrite(RewriteRuleData),
}

/// Data for a generation rule.
pub struct GenRuleData {
    /// Operator template. Position 0 is the root; 0 bytes are wildcards.
    pub template: [MidOp; INSTRUCTION_TEMPLATE_DEPTH],

    /// Does this rule have a predicate the target must be asked about?
    pub predicate: bool,

    /// Registers this rule can be asked to produce into. A rule only matches
    /// a node whose desired mask intersects this; the empty mask marks a
    /// statement rule that produces no value and only matches nodes that
    /// want none.
    pub compatible_producable_regs: RegMask,

    /// Registers the emitted instruction can actually write its result to.
    pub producable_regs: RegMask,

    /// Other registers clobbered by the instruction.
    pub uses_regs: RegMask,

    /// Desired register mask for each template position scheduled as a
    /// sub-instruction.
    pub consumable_regs: [RegMask; INSTRUCTION_TEMPLATE_DEPTH],

    /// Bit `i` set: keep the node at template position `i` attached to the
    /// instruction (emitters read operands and immediates through it).
    pub copyable_nodes: u8,

    /// Bit `i` set: additionally schedule the node at template position `i`
    /// as a sub-instruction producing a value. Implies the copyable bit.
    pub register_nodes: u8,
}

/// Data for a rewrite rule.
pub struct RewriteRuleData {
    /// Operator template, exactly as for generation rules.
    pub template: [MidOp; INSTRUCTION_TEMPLATE_DEPTH],

    /// Does this rule have a predicate the target must be asked about?
    pub predicate: bool,
}

impl Rule {
    /// The rule's operator template.
    pub fn template(&self) -> &[MidOp; INSTRUCTION_TEMPLATE_DEPTH] {
        match self {
            Rule::Generate(g) => &g.template,
            Rule::Rewrite(r) => &r.template,
        }
    }

    /// Does the rule have a predicate?
    pub fn has_predicate(&self) -> bool {
        match self {
            Rule::Generate(g) => g.predicate,
            Rule::Rewrite(r) => r.predicate,
        }
    }

    /// The generation data, if this is a generation rule.
    pub fn as_generate(&self) -> Option<&GenRuleData> {
        match self {
            Rule::Generate(g) => Some(g),
            Rule::Rewrite(_) => None,
        }
    }
}

/// Compare gathered match bytes against a rule template.
///
/// Each template byte must be zero (wildcard) or equal to the corresponding
/// data byte.
pub fn template_matches(data: &[MidOp], template: &[MidOp]) -> bool {
    data.iter().zip(template).all(|(&d, &t)| t == 0 || d == t)
}
