//! Code generation context and the main generation loop.
//!
//! The `Context` owns the scratch storage one `generate` call works in: the
//! in-flight instruction stream and the stack of nodes still waiting to be
//! tiled. Both are reset on entry and bounded by compile-time limits, so the
//! context can be allocated once and reused for every tree in a compilation;
//! the high-water marks it keeps across calls describe the worst tree seen.
//!
//! `&mut self` on `generate` makes the one-tree-at-a-time rule a type system
//! fact rather than a convention.

use crate::binemit::CodeSink;
use crate::ir::{Inst, InstructionData, MidOp, Node, NodePool};
use crate::isa::rules::{template_matches, GenRuleData, Rule, RuleId, INSTRUCTION_TEMPLATE_DEPTH};
use crate::isa::{RegMask, TargetIsa};
use crate::regalloc::{allocator, shuffle_registers};
use crate::result::{CodegenError, CodegenResult};
use cranelift_entity::packed_option::PackedOption;
use cranelift_entity::{EntityRef, PrimaryMap};
use core::mem;
use log::trace;

/// Most instructions one tree may tile into.
pub const NUM_INSTRUCTIONS: usize = 200;

/// Most nodes that may be pending at once while tiling one tree.
pub const NUM_NODES: usize = 200;

/// Persistent storage for code generation.
///
/// Create one per compilation and reuse it for every tree; repeated use
/// recycles the allocations instead of growing them.
pub struct Context {
    insns: PrimaryMap<Inst, InstructionData>,
    pending: Vec<Node>,
    max_insns: usize,
    max_pending: usize,
}

impl Context {
    /// Create a new code generation context.
    pub fn new() -> Self {
        Self {
            insns: PrimaryMap::new(),
            pending: Vec::new(),
            max_insns: 0,
            max_pending: 0,
        }
    }

    /// Clear the per-tree storage. High-water marks are kept.
    pub fn clear(&mut self) {
        self.insns.clear();
        self.pending.clear();
    }

    /// The instruction stream left over from the last `generate` call.
    ///
    /// Mostly useful to tests and diagnostics; the stream has already been
    /// emitted and its move lists drained.
    pub fn instructions(&self) -> &PrimaryMap<Inst, InstructionData> {
        &self.insns
    }

    /// Consume one expression tree, emitting its instructions and register
    /// moves through `sink`.
    ///
    /// Tiling works root-first: the tree is reduced to instructions in
    /// consumption order, registers are allocated as each instruction is
    /// filled in, and the finished stream is then emitted in reverse, which
    /// restores program order.
    pub fn generate(
        &mut self,
        isa: &dyn TargetIsa,
        pool: &mut NodePool,
        root: Node,
        sink: &mut dyn CodeSink,
    ) -> CodegenResult<()> {
        self.clear();
        self.push_pending(root)?;

        while let Some(node) = self.pending.pop() {
            if self.insns.len() >= NUM_INSTRUCTIONS {
                return Err(CodegenError::InstructionLimitExceeded);
            }
            self.select(isa, pool, node)?;
        }

        self.emit(pool, sink);
        Ok(())
    }

    /// Emit a summary comment with the peak node and instruction counts seen
    /// over the context's lifetime.
    pub fn finalise(&self, sink: &mut dyn CodeSink) {
        sink.emit_comment(format_args!(
            "max nodes = {}, max instructions = {}",
            self.max_pending, self.max_insns
        ));
    }

    /// Match `node` against the rule table, applying rewrites until a
    /// generation rule is found, then fill in its instruction and allocate
    /// the produced value.
    fn select(
        &mut self,
        isa: &dyn TargetIsa,
        pool: &mut NodePool,
        mut node: Node,
    ) -> CodegenResult<()> {
        let (ruleid, slots) = loop {
            let mut matchbytes = [0; INSTRUCTION_TEMPLATE_DEPTH];
            let mut slots = [PackedOption::default(); INSTRUCTION_TEMPLATE_DEPTH];
            slots[0] = node.into();
            isa.populate_match_buffer(pool, &mut slots, &mut matchbytes);

            let ruleid = find_rule(isa, pool, node, &matchbytes, &slots)?;
            match &isa.rules()[ruleid.index()] {
                Rule::Generate(_) => break (ruleid, slots),
                Rule::Rewrite(_) => {
                    node = self.rewrite(isa, pool, ruleid, node, &slots);
                }
            }
        };
        let rule = isa.rules()[ruleid.index()]
            .as_generate()
            .expect("selection loop ended on a rewrite rule");
        trace!("matched {} against {}", node, ruleid);

        let producer = self.insns.push(InstructionData::new(ruleid));
        if self.insns.len() > self.max_insns {
            self.max_insns = self.insns.len();
        }
        self.insns[producer].producable_regs = rule.producable_regs;
        self.insns[producer].output_regs = rule.uses_regs;

        // Retain the operand nodes the rule asks for, and schedule the ones
        // that produce values as further sub-instructions.
        for i in 0..INSTRUCTION_TEMPLATE_DEPTH {
            if rule.copyable_nodes & (1 << i) != 0 {
                self.insns[producer].subnodes[i] = slots[i];
                if rule.register_nodes & (1 << i) != 0 {
                    let sub = slots[i].expand().expect("rule retains an absent operand");
                    self.push_pending(sub)?;
                    pool[sub].desired_reg = rule.consumable_regs[i];
                    pool[sub].consumer = producer.into();
                }
            }
        }
        pool[node].producer = producer.into();

        if rule.producable_regs != 0 {
            allocator::allocate(isa.register_info(), &mut self.insns, pool, node, producer)?;
        }
        Ok(())
    }

    /// Apply a rewrite rule: splice the replacement into the old node's place
    /// and hand it back to the matcher.
    fn rewrite(
        &mut self,
        isa: &dyn TargetIsa,
        pool: &mut NodePool,
        ruleid: RuleId,
        node: Node,
        slots: &[PackedOption<Node>; INSTRUCTION_TEMPLATE_DEPTH],
    ) -> Node {
        let replacement = isa.rewrite_node(ruleid, pool, slots);
        trace!("{} rewrote {} into {}", ruleid, node, replacement);

        pool[replacement].desired_reg = pool[node].desired_reg;
        pool[replacement].consumer = pool[node].consumer;

        // The consumer still points at the old node in its operand slots.
        if let Some(consumer) = pool[node].consumer.expand() {
            for slot in self.insns[consumer].subnodes.iter_mut() {
                if slot.expand() == Some(node) {
                    *slot = replacement.into();
                }
            }
        }
        replacement
    }

    /// Walk the finished stream backwards, emitting reloads, the instruction
    /// and spills for each entry.
    fn emit(&mut self, pool: &NodePool, sink: &mut dyn CodeSink) {
        for i in (0..self.insns.len()).rev() {
            let inst = Inst::new(i);
            trace!(
                "emit {} {} produces {:#x} inputs {:#x} outputs {:#x}",
                inst,
                self.insns[inst].rule,
                self.insns[inst].produced_reg,
                self.insns[inst].input_regs,
                self.insns[inst].output_regs
            );

            let mut reloads = mem::take(&mut self.insns[inst].reloads);
            shuffle_registers(sink, &mut reloads);

            sink.emit_inst(self.insns[inst].rule, &self.insns[inst], pool);

            let mut spills = mem::take(&mut self.insns[inst].spills);
            shuffle_registers(sink, &mut spills);
        }
    }

    fn push_pending(&mut self, node: Node) -> CodegenResult<()> {
        if self.pending.len() >= NUM_NODES {
            return Err(CodegenError::NodeLimitExceeded);
        }
        self.pending.push(node);
        if self.pending.len() > self.max_pending {
            self.max_pending = self.pending.len();
        }
        Ok(())
    }
}

/// Find the first rule matching `node`, in table order.
fn find_rule(
    isa: &dyn TargetIsa,
    pool: &NodePool,
    node: Node,
    matchbytes: &[MidOp; INSTRUCTION_TEMPLATE_DEPTH],
    slots: &[PackedOption<Node>; INSTRUCTION_TEMPLATE_DEPTH],
) -> CodegenResult<RuleId> {
    let desired = pool[node].desired_reg;
    for (index, rule) in isa.rules().iter().enumerate() {
        if let Rule::Generate(g) = rule {
            if !register_compatible(g, desired) {
                continue;
            }
        }
        if !template_matches(matchbytes, rule.template()) {
            continue;
        }
        let ruleid = RuleId::new(index);
        if rule.has_predicate() && !isa.match_predicate(ruleid, pool, slots) {
            continue;
        }
        return Ok(ruleid);
    }
    Err(CodegenError::Unmatched {
        op: pool[node].op,
        value: pool[node].value,
        desired_reg: desired,
    })
}

/// A generation rule only applies when it can produce what the node's
/// consumer wants: a register in the compatible class, or no value at all.
fn register_compatible(rule: &GenRuleData, desired: RegMask) -> bool {
    if rule.compatible_producable_regs != 0 {
        desired & rule.compatible_producable_regs != 0
    } else {
        desired == 0
    }
}
