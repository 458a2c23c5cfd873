//! Expression-local register allocation.
//!
//! Allocation happens once per generated instruction, at the moment the
//! instruction is filled in. The value produced by the instruction must
//! travel to its consumer, which was filled in earlier and therefore sits at
//! a *lower* stream index; the entries between the two are exactly the
//! instructions executing while the value is live, and the union of their
//! `input_regs`/`output_regs` masks is the set of registers the value must
//! not travel through.
//!
//! Four policies are tried in order, from free to expensive: put the value in
//! a register both ends agree on; keep the producer's register and reload at
//! the consumer; move into the consumer's register right after the producer;
//! or push the value onto the stack at the producer and pop it at the
//! consumer. If even the stack bridge cannot find registers at the two end
//! points, the rule table itself demands the impossible and allocation fails.

use crate::ir::{Inst, InstructionData, Node, NodePool, RegMove};
use crate::isa::registers::{find_first, RegInfo, RegMask, REG_SAME_AS_RESULT};
use crate::result::{CodegenError, CodegenResult};
use cranelift_entity::{EntityRef, PrimaryMap};
use log::{debug, error};

/// Allocate the value produced by `producer` for `node`, then resolve any
/// same-as-result operand requests against the chosen register.
///
/// Stacked registers are produced and consumed implicitly in program order,
/// so for them the policy walk is skipped entirely.
pub(crate) fn allocate(
    reginfo: &RegInfo,
    insns: &mut PrimaryMap<Inst, InstructionData>,
    pool: &mut NodePool,
    node: Node,
    producer: Inst,
) -> CodegenResult<()> {
    if !reginfo.is_stacked(insns[producer].producable_regs) {
        allocate_value(reginfo, insns, pool, node, producer)?;
    }
    propagate_result_reg(insns, pool, producer);
    Ok(())
}

fn allocate_value(
    reginfo: &RegInfo,
    insns: &mut PrimaryMap<Inst, InstructionData>,
    pool: &mut NodePool,
    node: Node,
    producer: Inst,
) -> CodegenResult<()> {
    let consumer = pool[node]
        .consumer
        .expand()
        .expect("produced value has no consuming instruction");

    // The value is live strictly between the two end points.
    let range = (consumer.index() + 1)..producer.index();
    let blocked = blocked_regs(insns, range.clone());

    let desired = pool[node].desired_reg;
    let producable = insns[producer].producable_regs;

    // Both ends can use the same register; no move needed.
    let choice = desired
        & producable
        & !(blocked | insns[producer].output_regs | insns[consumer].input_regs);
    if choice != 0 {
        let reg = find_first(choice);
        pool[node].produced_reg = reg;
        insns[producer].produced_reg = reg;

        let conflicts = reginfo.conflicting_regs(reg);
        insns[consumer].input_regs |= conflicts;
        block_regs(insns, range, conflicts);
        insns[producer].output_regs |= conflicts;
        debug!("{} direct into {:#x} for {}", node, reg, producer);
        return Ok(());
    }

    // The producer's register survives until the consumer, which wants a
    // different one; carry the value across and reload it at the consumer.
    let current = producable & !(blocked | insns[producer].output_regs);
    if current != 0 {
        let producer_reg = find_first(current);
        let consumer_reg = find_first(desired & !insns[consumer].input_regs);
        if consumer_reg != 0 {
            insns[producer].produced_reg = producer_reg;
            pool[node].produced_reg = consumer_reg;

            insns[consumer].input_regs |= reginfo.conflicting_regs(consumer_reg);
            let conflicts = reginfo.conflicting_regs(producer_reg);
            block_regs(insns, range, conflicts);
            insns[producer].output_regs |= conflicts;
            insns[consumer].reloads.push(RegMove {
                src: producer_reg,
                dest: consumer_reg,
            });
            debug!(
                "{} produced into {:#x}, reloaded into {:#x} at {}",
                node, producer_reg, consumer_reg, consumer
            );
            return Ok(());
        }
    }

    // The consumer's register is free for the whole range; move into it
    // right after the producer.
    let current = desired & !(blocked | insns[consumer].input_regs);
    if current != 0 {
        let producer_reg = find_first(producable & !insns[producer].output_regs);
        let consumer_reg = find_first(current);
        if producer_reg != 0 {
            insns[producer].produced_reg = producer_reg;
            pool[node].produced_reg = consumer_reg;

            let conflicts = reginfo.conflicting_regs(consumer_reg);
            insns[consumer].input_regs |= conflicts;
            block_regs(insns, range, conflicts);
            insns[producer].output_regs |= reginfo.conflicting_regs(producer_reg);
            insns[producer].spills.push(RegMove {
                src: producer_reg,
                dest: consumer_reg,
            });
            debug!(
                "{} produced into {:#x}, spilled into {:#x} after {}",
                node, producer_reg, consumer_reg, producer
            );
            return Ok(());
        }
    }

    // No register carries the value across the range; bridge through the
    // stack. Only the two end points need a free register now.
    let current = producable & !insns[producer].output_regs;
    if current == 0 {
        return Err(deadlock(reginfo, insns, pool, producer));
    }
    let producer_reg = find_first(current);
    insns[producer].produced_reg = producer_reg;
    insns[producer].output_regs |= reginfo.conflicting_regs(producer_reg);
    insns[producer].spills.push(RegMove {
        src: producer_reg,
        dest: 0,
    });

    let current = desired & !insns[consumer].input_regs;
    if current == 0 {
        return Err(deadlock(reginfo, insns, pool, producer));
    }
    let consumer_reg = find_first(current);
    pool[node].produced_reg = consumer_reg;
    insns[consumer].input_regs |= reginfo.conflicting_regs(consumer_reg);
    insns[consumer].reloads.push(RegMove {
        src: 0,
        dest: consumer_reg,
    });
    debug!(
        "{} stacked after {}, popped into {:#x} at {}",
        node, producer, consumer_reg, consumer
    );
    Ok(())
}

/// Union of every register in use anywhere in `range`.
fn blocked_regs(
    insns: &PrimaryMap<Inst, InstructionData>,
    range: core::ops::Range<usize>,
) -> RegMask {
    range.fold(0, |acc, i| {
        let insn = &insns[Inst::new(i)];
        acc | insn.input_regs | insn.output_regs
    })
}

/// Reserve `regs` in every instruction in `range`.
fn block_regs(
    insns: &mut PrimaryMap<Inst, InstructionData>,
    range: core::ops::Range<usize>,
    regs: RegMask,
) {
    for i in range {
        let insn = &mut insns[Inst::new(i)];
        insn.input_regs |= regs;
        insn.output_regs |= regs;
    }
}

/// Replace same-as-result operand requests on `producer` with the register it
/// actually produced, then strike that register from the other operands'
/// requests; leaving it there would let two operands demand one physical
/// register, which cannot be satisfied.
fn propagate_result_reg(
    insns: &PrimaryMap<Inst, InstructionData>,
    pool: &mut NodePool,
    producer: Inst,
) {
    let produced = insns[producer].produced_reg;
    let subnodes = insns[producer].subnodes;

    let mut updated = false;
    for node in subnodes.iter().filter_map(|n| n.expand()) {
        if pool[node].desired_reg == REG_SAME_AS_RESULT {
            pool[node].desired_reg = produced;
            updated = true;
        }
    }
    if updated {
        for node in subnodes.iter().filter_map(|n| n.expand()) {
            if pool[node].desired_reg != produced {
                pool[node].desired_reg &= !produced;
            }
        }
    }
}

/// Dump the in-flight instruction window to the log and build the deadlock
/// error. The dump lists, for every pending instruction, the rule it came
/// from, its register masks and the values it consumes, which is enough to
/// identify the offending table entry.
fn deadlock(
    reginfo: &RegInfo,
    insns: &PrimaryMap<Inst, InstructionData>,
    pool: &NodePool,
    producer: Inst,
) -> CodegenError {
    let rule = insns[producer].rule;
    for i in (0..insns.len()).rev() {
        let inst = Inst::new(i);
        let insn = &insns[inst];
        error!(
            "{} {} produces {} inputs {} outputs {}",
            inst,
            insn.rule,
            reginfo.display(insn.produced_reg),
            reginfo.display(insn.input_regs),
            reginfo.display(insn.output_regs)
        );
        for node in insn.subnodes.iter().skip(1).filter_map(|n| n.expand()) {
            if pool[node].produced_reg != 0 {
                if let Some(from) = pool[node].producer.expand() {
                    error!(
                        "  consumes {} from {}",
                        reginfo.display(pool[node].produced_reg),
                        from
                    );
                }
            }
        }
    }
    CodegenError::Deadlock { rule }
}
