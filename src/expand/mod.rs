//! Lowering of synthetic instructions into basic ones.

use tracing::{debug, instrument};

use crate::instruction::{Instruction, expansion};
use crate::program::Program;

pub mod names;
pub use names::NameSupply;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExpandError {
    #[error("invalid expansion degree {requested}: expected a degree between 0 and {max}")]
    InvalidDegree { requested: u32, max: u32 },
}

impl ExpandError {
    pub fn code(&self) -> &'static str {
        match self {
            ExpandError::InvalidDegree { .. } => "SEM-X001",
        }
    }
}

/// One-level expansion of a synthetic instruction; `None` for basic ones.
///
/// The instruction's label moves to the first emitted instruction. Parent
/// handles are assigned when the expansion is spliced into a program.
pub fn expand(instruction: &Instruction, names: &mut NameSupply) -> Option<Vec<Instruction>> {
    expansion::expand_op(instruction.op(), instruction.label(), names)
}

/// Lowers every instruction whose degree exceeds `target`.
///
/// `target == program.max_degree()` returns the instructions unchanged;
/// `target == 0` returns purely basic code.
#[instrument(skip_all, fields(program = %program.name(), degree = target))]
pub fn expand_to_degree(program: &Program, target: u32) -> Result<Program, ExpandError> {
    let max = program.max_degree();
    if target > max {
        return Err(ExpandError::InvalidDegree { requested: target, max });
    }

    let mut lowered = program.clone();
    let mut passes = 0;
    while lowered.max_degree() > target {
        lowered = lower_once(&lowered, target);
        passes += 1;
    }
    lowered.rename(format!("{}@{target}", program.name()));

    debug!(
        passes,
        before = program.len(),
        after = lowered.len(),
        "expansion finished"
    );
    Ok(lowered)
}

/// Single pass: splices the one-level expansion of each instruction above
/// `target`, recording the replaced instruction as the parent of its body.
///
/// Labels stay unique: a kept label moves to exactly one emitted
/// instruction, and fresh labels avoid every name in `program`.
fn lower_once(program: &Program, target: u32) -> Program {
    let mut names = NameSupply::for_program(program);
    let mut lowered = program.derive(program.name());

    for instruction in program.instructions() {
        let body = if instruction.degree() > target {
            expand(instruction, &mut names)
        } else {
            None
        };
        match body {
            Some(body) => {
                let origin = lowered.record_origin(instruction.clone());
                for child in body {
                    lowered.append(child.with_parent(origin));
                }
            }
            None => {
                lowered.append(instruction.clone());
            }
        }
    }
    lowered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> Program {
        Program::from_instructions(
            "mixed",
            [
                Instruction::zero_variable("y").with_label("A"),
                Instruction::goto_label("B"),
                Instruction::increase("y"),
                Instruction::neutral("x1").with_label("B"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn expand_basic_is_none() {
        let mut names = NameSupply::default();
        assert!(expand(&Instruction::increase("y"), &mut names).is_none());
    }

    #[test]
    fn degree_out_of_range_fails_and_leaves_program_alone() {
        let program = mixed();
        let before = program.clone();
        assert_eq!(
            expand_to_degree(&program, 2),
            Err(ExpandError::InvalidDegree { requested: 2, max: 1 })
        );
        assert_eq!(program, before);
    }

    #[test]
    fn max_degree_keeps_instructions() {
        let program = mixed();
        let same = expand_to_degree(&program, 1).unwrap();
        assert_eq!(same.instructions(), program.instructions());
        assert_eq!(same.name(), "mixed@1");
    }

    #[test]
    fn degree_zero_is_all_basic_with_deterministic_names() {
        let lowered = expand_to_degree(&mixed(), 0).unwrap();
        assert!(lowered.instructions().iter().all(Instruction::is_basic));
        assert_eq!(lowered.max_degree(), 0);
        assert!(lowered.is_valid());

        let text: Vec<String> = lowered.instructions().iter().map(|i| i.to_string()).collect();
        assert_eq!(
            text,
            [
                "[A    ] y <- y - 1 (1)",
                "[     ] IF y != 0 GOTO A (2)",
                "[     ] z1 <- z1 + 1 (1)",
                "[     ] IF z1 != 0 GOTO B (2)",
                "[     ] y <- y + 1 (1)",
                "[B    ] x1 <- x1 (0)",
            ]
        );
    }

    #[test]
    fn expanded_instructions_point_at_their_parent() {
        let program = mixed();
        let lowered = expand_to_degree(&program, 0).unwrap();
        let parents: Vec<Option<&Instruction>> =
            lowered.instructions().iter().map(|i| lowered.parent(i)).collect();
        assert_eq!(parents[0], Some(&program.instructions()[0]));
        assert_eq!(parents[1], Some(&program.instructions()[0]));
        assert_eq!(parents[3], Some(&program.instructions()[1]));
        assert_eq!(parents[4], None);
    }

    #[test]
    fn unlabeled_zero_variable_gets_a_fresh_bound_label() {
        let program = Program::from_instructions(
            "clear",
            [Instruction::increase("x1").with_label("L1"), Instruction::zero_variable("x1")],
        )
        .unwrap();
        let lowered = expand_to_degree(&program, 0).unwrap();
        assert_eq!(lowered.instructions()[1], {
            let origin = lowered.instructions()[1].parent().unwrap();
            Instruction::decrease("x1").with_label("L2").with_parent(origin)
        });
        assert_eq!(lowered.label_position("L2"), Ok(1));
        assert!(lowered.is_valid());
    }

    #[test]
    fn fresh_names_are_unique_across_one_pass() {
        let program = Program::from_instructions(
            "gotos",
            [
                Instruction::goto_label("E"),
                Instruction::goto_label("E"),
                Instruction::zero_variable("y"),
                Instruction::zero_variable("y"),
                Instruction::neutral("y").with_label("E"),
            ],
        )
        .unwrap();
        let lowered = expand_to_degree(&program, 0).unwrap();
        let vars: Vec<&str> = lowered.instructions().iter().filter_map(|i| i.variable()).collect();
        assert_eq!(vars, ["z1", "z1", "z2", "z2", "y", "y", "y", "y", "y"]);
        assert_eq!(lowered.labels().collect::<Vec<_>>(), ["E", "L1", "L2"]);
    }

    #[test]
    fn lowered_labels_are_bound_once() {
        let program = Program::from_instructions(
            "nested",
            [
                Instruction::zero_variable("y").with_label("L1"),
                Instruction::goto_label("L1").with_label("z1"),
                Instruction::zero_variable("x1"),
                Instruction::goto_label("L3"),
                Instruction::neutral("y").with_label("L3"),
            ],
        )
        .unwrap();
        let lowered = expand_to_degree(&program, 0).unwrap();
        let bound: Vec<&str> = lowered.instructions().iter().filter_map(Instruction::label).collect();
        let rebuilt = Program::from_instructions("again", lowered.instructions().iter().cloned())
            .expect("no label is bound twice");
        assert_eq!(rebuilt.labels().count(), bound.len());
        for label in bound {
            let position = lowered.label_position(label).unwrap();
            assert_eq!(lowered.instructions()[position].label(), Some(label));
        }
    }

    #[test]
    fn provenance_chain_of_unexpanded_instruction_is_empty() {
        let lowered = expand_to_degree(&mixed(), 0).unwrap();
        assert_eq!(lowered.provenance(&lowered.instructions()[4]).count(), 0);
        assert_eq!(lowered.provenance(&lowered.instructions()[0]).count(), 1);
    }
}
