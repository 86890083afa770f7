use std::collections::HashSet;

use crate::instruction::WORK_PREFIX;
use crate::program::Program;

const LABEL_PREFIX: &str = "L";

/// Deterministic source of fresh labels and work variables.
///
/// Candidates are numbered from 1 upward and any name already mentioned by
/// the program (or handed out earlier) is skipped, so the same program
/// always lowers to the same text.
#[derive(Debug, Clone, Default)]
pub struct NameSupply {
    taken: HashSet<String>,
    next_label: u64,
    next_work: u64,
}

impl NameSupply {
    pub fn for_program(program: &Program) -> Self {
        NameSupply {
            taken: program.names().into_iter().map(str::to_string).collect(),
            ..NameSupply::default()
        }
    }

    /// Marks `name` as in use.
    pub fn reserve(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    pub fn fresh_label(&mut self) -> String {
        loop {
            self.next_label += 1;
            let candidate = format!("{LABEL_PREFIX}{}", self.next_label);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    pub fn fresh_work_variable(&mut self) -> String {
        loop {
            self.next_work += 1;
            let candidate = format!("{WORK_PREFIX}{}", self.next_work);
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}
