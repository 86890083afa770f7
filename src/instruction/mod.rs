use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expand::NameSupply;
use crate::vm::{ExecutionContext, RuntimeError};

pub mod catalog;
pub mod expansion;

pub use catalog::{ConstructionError, GOTO_LABEL_ARG, JNZ_LABEL_ARG, Opcode, Operands};

/// The single output variable.
pub const OUTPUT_VARIABLE: &str = "y";
/// Prefix of input variables (`x1`, `x2`, ...).
pub const INPUT_PREFIX: &str = "x";
/// Prefix of work variables (`z1`, `z2`, ...).
pub const WORK_PREFIX: &str = "z";

/// Basic instructions are atomic; synthetic ones are macros over them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Basic,
    Synthetic,
}

impl Family {
    /// One-letter tag used in listings.
    pub fn tag(self) -> char {
        match self {
            Family::Basic => 'B',
            Family::Synthetic => 'S',
        }
    }
}

/// The closed instruction catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    /// `V <- V`
    Neutral { var: String },
    /// `V <- V + 1`
    Increase { var: String },
    /// `V <- V - 1`, floored at zero
    Decrease { var: String },
    /// `IF V != 0 GOTO L`
    JumpNotZero { var: String, target: String },
    /// `V <- 0`
    ZeroVariable { var: String },
    /// `GOTO L`
    GotoLabel { target: String },
}

impl Op {
    pub fn opcode(&self) -> Opcode {
        match self {
            Op::Neutral { .. } => Opcode::Neutral,
            Op::Increase { .. } => Opcode::Increase,
            Op::Decrease { .. } => Opcode::Decrease,
            Op::JumpNotZero { .. } => Opcode::JumpNotZero,
            Op::ZeroVariable { .. } => Opcode::ZeroVariable,
            Op::GotoLabel { .. } => Opcode::GotoLabel,
        }
    }

    /// Operand variable, if the variant has one.
    pub fn variable(&self) -> Option<&str> {
        match self {
            Op::Neutral { var }
            | Op::Increase { var }
            | Op::Decrease { var }
            | Op::JumpNotZero { var, .. }
            | Op::ZeroVariable { var } => Some(var),
            Op::GotoLabel { .. } => None,
        }
    }

    /// Label this op jumps to, if any.
    pub fn target(&self) -> Option<&str> {
        match self {
            Op::JumpNotZero { target, .. } | Op::GotoLabel { target } => Some(target),
            _ => None,
        }
    }

    /// Number of expansion levels needed to reach purely basic code.
    pub fn degree(&self) -> u32 {
        let mut scratch = NameSupply::default();
        match expansion::expand_op(self, None, &mut scratch) {
            None => 0,
            Some(body) => 1 + body.iter().map(Instruction::degree).max().unwrap_or(0),
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Neutral { var } => write!(f, "{var} <- {var}"),
            Op::Increase { var } => write!(f, "{var} <- {var} + 1"),
            Op::Decrease { var } => write!(f, "{var} <- {var} - 1"),
            Op::JumpNotZero { var, target } => write!(f, "IF {var} != 0 GOTO {target}"),
            Op::ZeroVariable { var } => write!(f, "{var} <- 0"),
            Op::GotoLabel { target } => write!(f, "GOTO {target}"),
        }
    }
}

/// Handle to the instruction an expanded instruction was produced from.
///
/// Indexes the provenance arena of the `Program` that holds the instruction;
/// resolve it with [`crate::program::Program::parent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Origin(pub(crate) usize);

/// One line of an S program: an op, an optional label bound to its
/// position, and (for expanded code) the origin it was lowered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    op: Op,
    label: Option<String>,
    parent: Option<Origin>,
}

impl Instruction {
    pub fn new(op: Op) -> Self {
        Instruction { op, label: None, parent: None }
    }

    pub fn neutral(var: impl Into<String>) -> Self {
        Instruction::new(Op::Neutral { var: var.into() })
    }

    pub fn increase(var: impl Into<String>) -> Self {
        Instruction::new(Op::Increase { var: var.into() })
    }

    pub fn decrease(var: impl Into<String>) -> Self {
        Instruction::new(Op::Decrease { var: var.into() })
    }

    pub fn jump_not_zero(var: impl Into<String>, target: impl Into<String>) -> Self {
        Instruction::new(Op::JumpNotZero { var: var.into(), target: target.into() })
    }

    pub fn zero_variable(var: impl Into<String>) -> Self {
        Instruction::new(Op::ZeroVariable { var: var.into() })
    }

    pub fn goto_label(target: impl Into<String>) -> Self {
        Instruction::new(Op::GotoLabel { target: target.into() })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn with_label_opt(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub(crate) fn with_parent(mut self, origin: Origin) -> Self {
        self.parent = Some(origin);
        self
    }

    pub fn op(&self) -> &Op {
        &self.op
    }

    pub fn opcode(&self) -> Opcode {
        self.op.opcode()
    }

    pub fn family(&self) -> Family {
        self.opcode().family()
    }

    pub fn is_basic(&self) -> bool {
        self.family() == Family::Basic
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn variable(&self) -> Option<&str> {
        self.op.variable()
    }

    pub fn target(&self) -> Option<&str> {
        self.op.target()
    }

    pub fn parent(&self) -> Option<Origin> {
        self.parent
    }

    pub fn cycles(&self) -> u64 {
        self.opcode().cycles()
    }

    pub fn degree(&self) -> u32 {
        self.op.degree()
    }

    /// Charges the cycle cost, then applies the variant's effect.
    pub fn execute(&self, ctx: &mut ExecutionContext) -> Result<(), RuntimeError> {
        ctx.add_cycles(self.cycles());
        match &self.op {
            Op::Neutral { .. } => {}
            Op::Increase { var } => ctx.increment(var),
            Op::Decrease { var } => ctx.decrement(var),
            Op::JumpNotZero { var, target } => {
                if ctx.read(var) != 0 {
                    ctx.jump_to_label(target)?;
                }
            }
            Op::ZeroVariable { var } => ctx.set(var, 0),
            Op::GotoLabel { target } => ctx.jump_to_label(target)?,
        }
        Ok(())
    }
}

impl fmt::Display for Instruction {
    /// `[label] operation (cycles)`, with a blank label column when unlabeled.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.label.as_deref().unwrap_or("");
        write!(f, "[{label:<5}] {} ({})", self.op, self.cycles())
    }
}
