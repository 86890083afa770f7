//! Expansion rules of the synthetic variants.
//!
//! Each rule emits a semantically equivalent sequence of lower-degree
//! instructions. The label of the expanded instruction is reattached to the
//! first emitted instruction so that jumps into the lowered code still land
//! on it. Internal control flow uses names drawn from a [`NameSupply`].

use crate::expand::NameSupply;

use super::{Instruction, Op};

/// One-level expansion of `op`, or `None` for basic variants.
pub(crate) fn expand_op(op: &Op, label: Option<&str>, names: &mut NameSupply) -> Option<Vec<Instruction>> {
    match op {
        Op::Neutral { .. } | Op::Increase { .. } | Op::Decrease { .. } | Op::JumpNotZero { .. } => None,

        // loop: V <- V - 1; IF V != 0 GOTO loop
        // The loop label is the instruction's own label when it has one, so
        // the back edge always resolves to the decrement.
        Op::ZeroVariable { var } => {
            let head = match label {
                Some(label) => label.to_string(),
                None => names.fresh_label(),
            };
            Some(vec![
                Instruction::decrease(var.as_str()).with_label(head.as_str()),
                Instruction::jump_not_zero(var.as_str(), head),
            ])
        }

        // z <- z + 1; IF z != 0 GOTO L, with z unused elsewhere in the program
        Op::GotoLabel { target } => {
            let temp = names.fresh_work_variable();
            Some(vec![
                Instruction::increase(temp.as_str()).with_label_opt(label.map(str::to_string)),
                Instruction::jump_not_zero(temp, target.as_str()),
            ])
        }
    }
}
