//! Parallel register move serialization.
//!
//! A spill or reload list describes one *parallel* transfer: every source is
//! conceptually read at the same instant, so `{a -> b, b -> a}` is a swap,
//! not two sequential moves. Serializing such a set on a machine that only
//! moves one register at a time requires care around cycles; the stack is
//! the overflow medium of last resort.

use crate::binemit::CodeSink;
use crate::ir::RegMove;

/// Serialize a parallel move set through `sink`.
///
/// Moves are emitted one at a time in an order that preserves the parallel
/// semantics:
///
/// 1. Pushes go first. A push frees its source register without needing a
///    destination, which can unblock register-to-register moves that would
///    otherwise look like cycles.
/// 2. Then any move whose destination is not a pending source; such a move
///    cannot clobber anything that still needs to be read.
/// 3. Then pops, once the registers they land in have settled.
/// 4. Anything still pending is a pure register cycle. One member's value is
///    stacked, turning that member into a pop and the cycle into a chain.
///
/// Completed moves have their fields cleared in place; the list is spent
/// after the call.
pub fn shuffle_registers(sink: &mut dyn CodeSink, moves: &mut [RegMove]) {
    let mut srcs = 0;
    let mut dests = 0;
    for m in moves.iter() {
        srcs |= m.src;
        dests |= m.dest;
    }

    loop {
        if let Some(m) = moves.iter_mut().find(|m| m.src != 0 && m.dest == 0) {
            sink.emit_move(m.src, 0);
            srcs &= !m.src;
            m.src = 0;
            continue;
        }

        if let Some(m) = moves
            .iter_mut()
            .find(|m| m.src != 0 && m.dest != 0 && m.dest & srcs == 0)
        {
            sink.emit_move(m.src, m.dest);
            srcs &= !m.src;
            dests &= !m.dest;
            m.src = 0;
            m.dest = 0;
            continue;
        }

        if let Some(m) = moves.iter_mut().find(|m| m.src == 0 && m.dest != 0) {
            sink.emit_move(0, m.dest);
            dests &= !m.dest;
            m.dest = 0;
            continue;
        }

        // A temporary register would be cheaper than stacking, but there is
        // no guarantee one exists at this point in the program.
        if let Some(m) = moves.iter_mut().find(|m| m.src != 0 || m.dest != 0) {
            sink.emit_move(m.src, 0);
            srcs &= !m.src;
            m.src = 0;
            continue;
        }

        break;
    }
}
