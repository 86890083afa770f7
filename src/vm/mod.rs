//! Execution engine: a program counter walking an instruction list against a
//! register file of non-negative integers.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, instrument, trace, warn};

use crate::instruction::{INPUT_PREFIX, OUTPUT_VARIABLE, WORK_PREFIX};
use crate::program::Program;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// `instruction` is the 1-based number of the jump that failed.
    #[error("label '{label}' is not bound (jump at instruction #{instruction})")]
    UnresolvedLabel { label: String, instruction: usize },
    #[error("step limit of {limit} exceeded after {cycles} cycles")]
    StepLimitExceeded { limit: u64, cycles: u64 },
}

impl RuntimeError {
    pub fn code(&self) -> &'static str {
        match self {
            RuntimeError::UnresolvedLabel { .. } => "SEM-R001",
            RuntimeError::StepLimitExceeded { .. } => "SEM-R002",
        }
    }
}

/// Mutable state of one run. Created fresh for every run and consumed by
/// [`ExecutionContext::into_result`].
#[derive(Debug)]
pub struct ExecutionContext {
    registers: HashMap<String, u64>,
    labels: BTreeMap<String, usize>,
    pc: usize,
    cycles: u64,
    jumped: bool,
    exit: bool,
}

impl ExecutionContext {
    pub fn new(labels: BTreeMap<String, usize>) -> Self {
        ExecutionContext {
            registers: HashMap::new(),
            labels,
            pc: 0,
            cycles: 0,
            jumped: false,
            exit: false,
        }
    }

    /// Binds `inputs` to `x1..xN` in order; negative inputs floor at zero.
    pub fn seed_inputs(&mut self, inputs: &[i64]) {
        for (i, &value) in inputs.iter().enumerate() {
            self.set(&format!("{INPUT_PREFIX}{}", i + 1), value);
        }
    }

    /// Current value without marking the variable as touched.
    pub fn value(&self, name: &str) -> u64 {
        self.registers.get(name).copied().unwrap_or(0)
    }

    /// Current value; an unset variable reads as zero and becomes touched.
    pub fn read(&mut self, name: &str) -> u64 {
        *self.registers.entry(name.to_string()).or_insert(0)
    }

    /// Stores `value`, flooring anything below zero.
    pub fn set(&mut self, name: &str, value: i64) {
        self.registers.insert(name.to_string(), value.max(0) as u64);
    }

    pub fn increment(&mut self, name: &str) {
        let slot = self.registers.entry(name.to_string()).or_insert(0);
        *slot = slot.saturating_add(1);
    }

    pub fn decrement(&mut self, name: &str) {
        let slot = self.registers.entry(name.to_string()).or_insert(0);
        *slot = slot.saturating_sub(1);
    }

    pub fn label_position(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    pub fn jump_to_label(&mut self, label: &str) -> Result<(), RuntimeError> {
        let target = self.label_position(label).ok_or_else(|| RuntimeError::UnresolvedLabel {
            label: label.to_string(),
            instruction: self.pc + 1,
        })?;
        self.jump_to(target);
        Ok(())
    }

    pub fn jump_to(&mut self, position: usize) {
        self.pc = position;
        self.jumped = true;
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn add_cycles(&mut self, cycles: u64) {
        self.cycles += cycles;
    }

    /// Stops the run after the current instruction. No catalog variant uses
    /// this yet.
    pub fn request_exit(&mut self) {
        self.exit = true;
    }

    pub fn should_exit(&self) -> bool {
        self.exit
    }

    /// Moves to the next instruction unless the one just executed jumped.
    fn advance(&mut self) {
        if !std::mem::take(&mut self.jumped) && !self.exit {
            self.pc += 1;
        }
    }

    pub fn into_result(self, steps: u64) -> ExecutionResult {
        let mut variables: Vec<Register> = self
            .registers
            .into_iter()
            .map(|(name, value)| Register { name, value })
            .collect();
        variables.sort_by(|a, b| register_order(&a.name, &b.name));
        ExecutionResult {
            output: variables
                .iter()
                .find(|r| r.name == OUTPUT_VARIABLE)
                .map_or(0, |r| r.value),
            cycles: self.cycles,
            steps,
            variables,
        }
    }
}

/// `y` first, then inputs, then work variables, each by numeric suffix.
fn register_order(a: &str, b: &str) -> Ordering {
    fn key(name: &str) -> (u8, u64, &str) {
        let rank = if name == OUTPUT_VARIABLE {
            0
        } else if name.starts_with(INPUT_PREFIX) {
            1
        } else if name.starts_with(WORK_PREFIX) {
            2
        } else {
            3
        };
        let index = name.get(1..).and_then(|s| s.parse().ok()).unwrap_or(u64::MAX);
        (rank, index, name)
    }
    key(a).cmp(&key(b))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Register {
    pub name: String,
    pub value: u64,
}

/// Snapshot of a finished run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    output: u64,
    cycles: u64,
    steps: u64,
    variables: Vec<Register>,
}

impl ExecutionResult {
    /// Final value of `y`.
    pub fn output(&self) -> u64 {
        self.output
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Instructions executed, counting every loop iteration.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Every variable touched during the run, in display order.
    pub fn variables(&self) -> &[Register] {
        &self.variables
    }

    pub fn value(&self, name: &str) -> u64 {
        self.variables
            .iter()
            .find(|r| r.name == name)
            .map_or(0, |r| r.value)
    }
}

/// Runs programs. Without a step limit a non-terminating program runs
/// forever.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Executor {
    step_limit: Option<u64>,
}

impl Executor {
    pub fn new() -> Self {
        Executor::default()
    }

    pub fn with_step_limit(mut self, step_limit: Option<u64>) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn step_limit(&self) -> Option<u64> {
        self.step_limit
    }

    #[instrument(skip_all, fields(program = %program.name()))]
    pub fn run(&self, program: &Program, inputs: &[i64]) -> Result<ExecutionResult, RuntimeError> {
        let instructions = program.instructions();
        let mut ctx = ExecutionContext::new(program.label_table().clone());
        ctx.seed_inputs(inputs);
        debug!(instructions = instructions.len(), ?inputs, "run starting");

        let mut steps: u64 = 0;
        while ctx.pc() < instructions.len() && !ctx.should_exit() {
            if let Some(limit) = self.step_limit.filter(|&limit| steps >= limit) {
                warn!(limit, cycles = ctx.cycles(), "step limit reached");
                return Err(RuntimeError::StepLimitExceeded { limit, cycles: ctx.cycles() });
            }
            let instruction = &instructions[ctx.pc()];
            trace!(pc = ctx.pc(), %instruction, cycles = ctx.cycles(), "step");
            instruction.execute(&mut ctx)?;
            steps += 1;
            ctx.advance();
        }

        let result = ctx.into_result(steps);
        debug!(output = result.output(), cycles = result.cycles(), steps, "run finished");
        Ok(result)
    }
}

/// Runs `program` with no step limit.
pub fn execute(program: &Program, inputs: &[i64]) -> Result<ExecutionResult, RuntimeError> {
    Executor::new().run(program, inputs)
}
