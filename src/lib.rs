//! Interpreter and lowering engine for S, a register-machine language with
//! one output variable, numbered inputs and work variables, labels and a
//! small catalog of instructions.
//!
//! ```
//! use semulator::{Instruction, Program, expand::expand_to_degree, vm::execute};
//!
//! let program = Program::from_instructions(
//!     "clear",
//!     [Instruction::zero_variable("x1"), Instruction::increase("y")],
//! )
//! .unwrap();
//! let basic = expand_to_degree(&program, 0).unwrap();
//! let result = execute(&basic, &[3]).unwrap();
//! assert_eq!(result.output(), 1);
//! assert_eq!(result.cycles(), 3 * 3 + 1);
//! ```

pub mod codegen;
pub mod diagnostic;
pub mod document;
pub mod engine;
pub mod expand;
pub mod instruction;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod source;
pub mod vm;

pub use engine::{Engine, EngineError, RunRecord};
pub use instruction::{Family, Instruction, Op, Opcode, Operands};
pub use program::Program;
pub use vm::{ExecutionResult, Executor};
