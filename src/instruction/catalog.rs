//! Tag -> constructor mapping for the instruction catalog.
//!
//! Loaders describe an instruction by its external name (`INCREASE`,
//! `JUMP_NOT_ZERO`, ...), an optional variable, an optional label and named
//! arguments. [`Opcode::construct`] turns such a description into an
//! [`Instruction`], rejecting anything malformed up front.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Family, Instruction, Op};

/// Argument naming the target of `JUMP_NOT_ZERO`.
pub const JNZ_LABEL_ARG: &str = "JNZLabel";
/// Argument naming the target of `GOTO_LABEL`.
pub const GOTO_LABEL_ARG: &str = "gotoLabel";

static VARIABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:y|[xz][0-9]+)$").expect("variable pattern compiles"));
static LABEL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("label pattern compiles"));

pub fn is_variable_name(name: &str) -> bool {
    VARIABLE_NAME.is_match(name)
}

pub fn is_label_name(name: &str) -> bool {
    LABEL_NAME.is_match(name)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    #[error("unknown instruction: {name}")]
    UnknownInstruction { name: String },
    #[error("{instruction}: missing required operand '{operand}'")]
    MissingOperand { instruction: Opcode, operand: &'static str },
    #[error("{instruction}: malformed variable '{variable}'")]
    MalformedVariable { instruction: Opcode, variable: String },
    #[error("malformed label '{label}'")]
    MalformedLabel { label: String },
    /// `first` and `second` are 1-based instruction numbers.
    #[error("duplicate label '{label}' on instructions #{first} and #{second}")]
    DuplicateLabel { label: String, first: usize, second: usize },
}

impl ConstructionError {
    pub fn code(&self) -> &'static str {
        match self {
            ConstructionError::UnknownInstruction { .. } => "SEM-C001",
            ConstructionError::MissingOperand { .. } => "SEM-C002",
            ConstructionError::MalformedVariable { .. } => "SEM-C003",
            ConstructionError::MalformedLabel { .. } => "SEM-C004",
            ConstructionError::DuplicateLabel { .. } => "SEM-C005",
        }
    }
}

/// Variant tag of the closed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    Neutral,
    Increase,
    Decrease,
    JumpNotZero,
    ZeroVariable,
    GotoLabel,
}

impl Opcode {
    pub const ALL: [Opcode; 6] = [
        Opcode::Neutral,
        Opcode::Increase,
        Opcode::Decrease,
        Opcode::JumpNotZero,
        Opcode::ZeroVariable,
        Opcode::GotoLabel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Opcode::Neutral => "NEUTRAL",
            Opcode::Increase => "INCREASE",
            Opcode::Decrease => "DECREASE",
            Opcode::JumpNotZero => "JUMP_NOT_ZERO",
            Opcode::ZeroVariable => "ZERO_VARIABLE",
            Opcode::GotoLabel => "GOTO_LABEL",
        }
    }

    pub fn family(self) -> Family {
        match self {
            Opcode::Neutral | Opcode::Increase | Opcode::Decrease | Opcode::JumpNotZero => Family::Basic,
            Opcode::ZeroVariable | Opcode::GotoLabel => Family::Synthetic,
        }
    }

    pub fn cycles(self) -> u64 {
        match self {
            Opcode::Neutral => 0,
            Opcode::Increase | Opcode::Decrease | Opcode::ZeroVariable | Opcode::GotoLabel => 1,
            Opcode::JumpNotZero => 2,
        }
    }

    /// Builds an instruction of this variant from loader-supplied operands.
    pub fn construct(self, operands: &Operands) -> Result<Instruction, ConstructionError> {
        let label = operands.checked_label()?;
        let op = match self {
            Opcode::Neutral => Op::Neutral { var: operands.checked_variable(self)? },
            Opcode::Increase => Op::Increase { var: operands.checked_variable(self)? },
            Opcode::Decrease => Op::Decrease { var: operands.checked_variable(self)? },
            Opcode::JumpNotZero => Op::JumpNotZero {
                var: operands.checked_variable(self)?,
                target: operands.checked_argument(self, JNZ_LABEL_ARG)?,
            },
            Opcode::ZeroVariable => Op::ZeroVariable { var: operands.checked_variable(self)? },
            Opcode::GotoLabel => Op::GotoLabel {
                target: operands.checked_argument(self, GOTO_LABEL_ARG)?,
            },
        };
        Ok(Instruction::new(op).with_label_opt(label))
    }
}

impl FromStr for Opcode {
    type Err = ConstructionError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim();
        Opcode::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| ConstructionError::UnknownInstruction { name: name.to_string() })
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Loader-facing description of an instruction's operands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operands {
    pub variable: Option<String>,
    pub label: Option<String>,
    pub arguments: BTreeMap<String, String>,
}

impl Operands {
    pub fn new() -> Self {
        Operands::default()
    }

    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }

    /// Inverse of [`Opcode::construct`]: the operands describing `instruction`.
    pub fn of(instruction: &Instruction) -> Self {
        let mut operands = Operands {
            variable: instruction.variable().map(str::to_string),
            label: instruction.label().map(str::to_string),
            arguments: BTreeMap::new(),
        };
        match instruction.op() {
            Op::JumpNotZero { target, .. } => {
                operands.arguments.insert(JNZ_LABEL_ARG.to_string(), target.clone());
            }
            Op::GotoLabel { target } => {
                operands.arguments.insert(GOTO_LABEL_ARG.to_string(), target.clone());
            }
            _ => {}
        }
        operands
    }

    fn checked_label(&self) -> Result<Option<String>, ConstructionError> {
        match non_empty(self.label.as_deref()) {
            None => Ok(None),
            Some(label) if is_label_name(label) => Ok(Some(label.to_string())),
            Some(label) => Err(ConstructionError::MalformedLabel { label: label.to_string() }),
        }
    }

    fn checked_variable(&self, instruction: Opcode) -> Result<String, ConstructionError> {
        let variable = non_empty(self.variable.as_deref())
            .ok_or(ConstructionError::MissingOperand { instruction, operand: "variable" })?;
        if !is_variable_name(variable) {
            return Err(ConstructionError::MalformedVariable {
                instruction,
                variable: variable.to_string(),
            });
        }
        Ok(variable.to_string())
    }

    fn checked_argument(&self, instruction: Opcode, name: &'static str) -> Result<String, ConstructionError> {
        let target = non_empty(self.arguments.get(name).map(String::as_str))
            .ok_or(ConstructionError::MissingOperand { instruction, operand: name })?;
        if !is_label_name(target) {
            return Err(ConstructionError::MalformedLabel { label: target.to_string() });
        }
        Ok(target.to_string())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
