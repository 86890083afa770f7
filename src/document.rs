//! JSON program documents.
//!
//! ```json
//! {"name": "count", "instructions": [
//!   {"name": "DECREASE", "variable": "x1", "label": "L1"},
//!   {"name": "JUMP_NOT_ZERO", "variable": "x1", "arguments": {"JNZLabel": "L1"}}
//! ]}
//! ```
//!
//! Each entry is built through the instruction catalog, so documents get the
//! same checks as hand-built programs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::instruction::{ConstructionError, Opcode, Operands};
use crate::program::Program;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDocument {
    #[serde(default)]
    pub name: Option<String>,
    pub instructions: Vec<InstructionDocument>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub arguments: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("malformed program document: {0}")]
    Syntax(#[from] serde_json::Error),
    /// `index` is 1-based.
    #[error("instruction #{index}: {source}")]
    Instruction { index: usize, source: ConstructionError },
    #[error("program document has no name")]
    MissingName,
}

impl DocumentError {
    pub fn code(&self) -> &'static str {
        match self {
            DocumentError::Syntax(_) | DocumentError::MissingName => "SEM-D001",
            DocumentError::Instruction { source, .. } => source.code(),
        }
    }
}

impl ProgramDocument {
    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds the program, stopping at the first bad instruction.
    /// `fallback_name` is used when the document carries no name.
    pub fn build(&self, fallback_name: Option<&str>) -> Result<Program, DocumentError> {
        let name = self
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(fallback_name)
            .ok_or(DocumentError::MissingName)?;

        let mut program = Program::new(name);
        for (i, entry) in self.instructions.iter().enumerate() {
            let index = i + 1;
            let instruction = entry
                .name
                .parse::<Opcode>()
                .and_then(|opcode| opcode.construct(&entry.operands()))
                .map_err(|source| DocumentError::Instruction { index, source })?;
            program
                .push(instruction)
                .map_err(|source| DocumentError::Instruction { index, source })?;
        }
        Ok(program)
    }

    pub fn from_program(program: &Program) -> Self {
        ProgramDocument {
            name: Some(program.name().to_string()),
            instructions: program
                .instructions()
                .iter()
                .map(|instruction| {
                    let operands = Operands::of(instruction);
                    InstructionDocument {
                        name: instruction.opcode().name().to_string(),
                        variable: operands.variable,
                        label: operands.label,
                        arguments: operands.arguments,
                    }
                })
                .collect(),
        }
    }
}

impl InstructionDocument {
    fn operands(&self) -> Operands {
        Operands {
            variable: self.variable.clone(),
            label: self.label.clone(),
            arguments: self.arguments.clone(),
        }
    }
}
