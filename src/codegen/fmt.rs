use crate::instruction::Instruction;
use crate::program::Program;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FmtMode {
    /// One instruction per line in display form. Parses back to the same
    /// instructions.
    Source,
    /// Numbered lines with the family tag and, for expanded instructions,
    /// the chain of instructions they were lowered from.
    Listing,
}

const PROVENANCE_SEP: &str = " <<< ";

pub fn format(program: &Program, mode: FmtMode) -> String {
    let mut out = String::new();
    for (i, instruction) in program.instructions().iter().enumerate() {
        match mode {
            FmtMode::Source => {
                out.push_str(&format!("{instruction}\n"));
            }
            FmtMode::Listing => {
                out.push_str(&format!("#{} {}", i + 1, tagged(instruction)));
                for ancestor in program.provenance(instruction) {
                    out.push_str(PROVENANCE_SEP);
                    out.push_str(&tagged(ancestor));
                }
                out.push('\n');
            }
        }
    }
    out
}

fn tagged(instruction: &Instruction) -> String {
    format!("({}) {instruction}", instruction.family().tag())
}

/// One-paragraph description of a program: size, degree, cost, names.
pub fn summary(program: &Program) -> String {
    let inputs = join_or_dash(program.input_variables().iter().map(String::as_str));
    let labels = join_or_dash(program.labels());
    format!(
        "program {}: {} instruction(s), max degree {}, {} cycle(s) if each runs once\ninputs: {inputs}\nlabels: {labels}\n",
        program.name(),
        program.len(),
        program.max_degree(),
        program.static_cycles(),
    )
}

fn join_or_dash<'a>(names: impl Iterator<Item = &'a str>) -> String {
    let names: Vec<&str> = names.collect();
    if names.is_empty() { "-".to_string() } else { names.join(", ") }
}
