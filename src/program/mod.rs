use std::collections::{BTreeMap, BTreeSet};

use crate::instruction::{ConstructionError, INPUT_PREFIX, Instruction, Op, Origin};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("label not found: {label}")]
pub struct LabelNotFound {
    pub label: String,
}

/// A jump whose target label is not bound anywhere in the program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedJump {
    /// Zero-based position of the jump.
    pub position: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("program '{program}' jumps to unbound label(s): {}", describe(.unresolved))]
pub struct ValidationError {
    pub program: String,
    pub unresolved: Vec<UnresolvedJump>,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        "SEM-V001"
    }
}

fn describe(unresolved: &[UnresolvedJump]) -> String {
    unresolved
        .iter()
        .map(|j| format!("{} (instruction #{})", j.label, j.position + 1))
        .collect::<Vec<_>>()
        .join(", ")
}

/// An ordered instruction list with its derived label table, input
/// variables and maximum degree.
///
/// Instructions produced by expansion point at their origin through an
/// [`Origin`] handle into `origins`, the provenance arena this program owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    name: String,
    instructions: Vec<Instruction>,
    labels: BTreeMap<String, usize>,
    input_variables: BTreeSet<String>,
    max_degree: u32,
    origins: Vec<Instruction>,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Program {
            name: name.into(),
            instructions: Vec::new(),
            labels: BTreeMap::new(),
            input_variables: BTreeSet::new(),
            max_degree: 0,
            origins: Vec::new(),
        }
    }

    pub fn from_instructions(
        name: impl Into<String>,
        instructions: impl IntoIterator<Item = Instruction>,
    ) -> Result<Self, ConstructionError> {
        let mut program = Program::new(name);
        for instruction in instructions {
            program.push(instruction)?;
        }
        Ok(program)
    }

    /// Appends an instruction and updates the derived tables. A duplicate
    /// label leaves the program untouched.
    pub fn push(&mut self, instruction: Instruction) -> Result<usize, ConstructionError> {
        let position = self.instructions.len();
        if let Some(label) = instruction.label() {
            if let Some(&first) = self.labels.get(label) {
                return Err(ConstructionError::DuplicateLabel {
                    label: label.to_string(),
                    first: first + 1,
                    second: position + 1,
                });
            }
        }
        Ok(self.append(instruction))
    }

    /// `push` without the duplicate check. The caller guarantees the label,
    /// if any, is not yet bound; a rebinding keeps the first position.
    pub(crate) fn append(&mut self, instruction: Instruction) -> usize {
        let position = self.instructions.len();
        if let Some(label) = instruction.label() {
            self.labels.entry(label.to_string()).or_insert(position);
        }
        if let Some(var) = instruction.variable() {
            if var.starts_with(INPUT_PREFIX) {
                self.input_variables.insert(var.to_string());
            }
        }
        self.max_degree = self.max_degree.max(instruction.degree());
        self.instructions.push(instruction);
        position
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn get(&self, position: usize) -> Option<&Instruction> {
        self.instructions.get(position)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Input variables in lexicographic order.
    pub fn input_variables(&self) -> &BTreeSet<String> {
        &self.input_variables
    }

    /// Bound labels in lexicographic order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    pub fn label_table(&self) -> &BTreeMap<String, usize> {
        &self.labels
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains_key(label)
    }

    pub fn label_position(&self, label: &str) -> Result<usize, LabelNotFound> {
        self.labels
            .get(label)
            .copied()
            .ok_or_else(|| LabelNotFound { label: label.to_string() })
    }

    pub fn max_degree(&self) -> u32 {
        self.max_degree
    }

    /// Sum of cycle costs if every instruction ran exactly once.
    pub fn static_cycles(&self) -> u64 {
        self.instructions.iter().map(Instruction::cycles).sum()
    }

    /// Every variable and label name the program mentions, bound or not.
    pub fn names(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        for instruction in &self.instructions {
            names.extend(instruction.label());
            names.extend(instruction.variable());
            names.extend(instruction.target());
        }
        names
    }

    /// The instruction `instruction` was expanded from, if any.
    pub fn parent(&self, instruction: &Instruction) -> Option<&Instruction> {
        instruction.parent().and_then(|Origin(index)| self.origins.get(index))
    }

    /// Walks the parent chain from the nearest origin outward.
    pub fn provenance<'a>(&'a self, instruction: &'a Instruction) -> impl Iterator<Item = &'a Instruction> + 'a {
        std::iter::successors(self.parent(instruction), move |current| self.parent(current))
    }

    /// Static well-formedness: every literal `JUMP_NOT_ZERO` targets a bound
    /// label. Synthetic jumps are checked once they are lowered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let unresolved: Vec<UnresolvedJump> = self
            .instructions
            .iter()
            .enumerate()
            .filter_map(|(position, instruction)| match instruction.op() {
                Op::JumpNotZero { target, .. } if !self.has_label(target) => {
                    Some(UnresolvedJump { position, label: target.clone() })
                }
                _ => None,
            })
            .collect();
        if unresolved.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { program: self.name.clone(), unresolved })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// An empty program sharing this program's provenance arena.
    pub(crate) fn derive(&self, name: impl Into<String>) -> Program {
        Program { origins: self.origins.clone(), ..Program::new(name) }
    }

    /// Stores `instruction` in the provenance arena and returns its handle.
    pub(crate) fn record_origin(&mut self, instruction: Instruction) -> Origin {
        self.origins.push(instruction);
        Origin(self.origins.len() - 1)
    }
}
