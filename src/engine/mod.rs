//! Session layer: holds the loaded program and the history of its runs.

use serde::Serialize;
use tracing::info;

use crate::expand::{ExpandError, expand_to_degree};
use crate::program::{Program, ValidationError};
use crate::vm::{ExecutionResult, Executor, RuntimeError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("no program loaded")]
    NoProgram,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Expand(#[from] ExpandError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::NoProgram => "SEM-E001",
            EngineError::Validation(e) => e.code(),
            EngineError::Expand(e) => e.code(),
            EngineError::Runtime(e) => e.code(),
        }
    }
}

/// One completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    /// 1-based run number within the session.
    pub run: usize,
    pub degree: u32,
    pub inputs: Vec<i64>,
    pub output: u64,
    pub cycles: u64,
}

#[derive(Debug, Default)]
pub struct Engine {
    program: Option<Program>,
    executor: Executor,
    history: Vec<RunRecord>,
}

impl Engine {
    pub fn new(executor: Executor) -> Self {
        Engine { program: None, executor, history: Vec::new() }
    }

    /// Replaces the current program. The program must be valid; history
    /// from the previous program is discarded.
    pub fn load(&mut self, program: Program) -> Result<(), EngineError> {
        program.validate()?;
        info!(program = program.name(), instructions = program.len(), max_degree = program.max_degree(), "program loaded");
        self.program = Some(program);
        self.history.clear();
        Ok(())
    }

    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    fn current(&self) -> Result<&Program, EngineError> {
        self.program.as_ref().ok_or(EngineError::NoProgram)
    }

    pub fn expand(&self, degree: u32) -> Result<Program, EngineError> {
        Ok(expand_to_degree(self.current()?, degree)?)
    }

    /// Lowers the current program to `degree`, runs it and records the run.
    /// Failed runs leave the history unchanged.
    pub fn run(&mut self, inputs: &[i64], degree: u32) -> Result<ExecutionResult, EngineError> {
        let lowered = self.expand(degree)?;
        let result = self.executor.run(&lowered, inputs)?;
        self.history.push(RunRecord {
            run: self.history.len() + 1,
            degree,
            inputs: inputs.to_vec(),
            output: result.output(),
            cycles: result.cycles(),
        });
        Ok(result)
    }

    pub fn history(&self) -> &[RunRecord] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
