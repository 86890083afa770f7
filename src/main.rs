use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use semulator::codegen::fmt::{FmtMode, format, summary};
use semulator::diagnostic::{self, Diagnostic, ansi::AnsiRenderer, registry};
use semulator::document::ProgramDocument;
use semulator::parser::parse_source;
use semulator::{Engine, Executor, Op, Program};

#[derive(Parser, Debug)]
#[command(name = "semulator", version)]
#[command(about = "Load, lower and run S register-machine programs")]
struct Cli {
    /// Report diagnostics and results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable coloured diagnostics
    #[arg(long, global = true)]
    no_color: bool,

    /// Log progress at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a program summary and its numbered listing
    Show {
        /// Program file (`.json` document or listing text)
        path: PathBuf,
    },
    /// Load and validate a program without running it
    Check { path: PathBuf },
    /// Lower a program to the given degree
    Expand {
        path: PathBuf,

        /// Target degree (0 = basic instructions only)
        #[arg(long, default_value_t = 0)]
        degree: u32,

        #[arg(long, value_enum, default_value_t = Emit::Listing)]
        emit: Emit,
    },
    /// Run a program once per input set
    Run {
        path: PathBuf,

        /// Degree to run at (defaults to the program as written)
        #[arg(long)]
        degree: Option<u32>,

        /// Comma-separated input values for x1, x2, ...; repeat for more runs
        #[arg(long = "inputs", value_name = "A,B,...", allow_hyphen_values = true)]
        inputs: Vec<InputSet>,

        /// Stop a run after this many executed instructions
        #[arg(long, env = "SEMULATOR_STEP_LIMIT")]
        step_limit: Option<u64>,
    },
    /// Print the long explanation of an error code
    Explain {
        /// e.g. SEM-V001
        code: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Emit {
    Listing,
    Source,
    Json,
}

/// One `--inputs` occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct InputSet(Vec<i64>);

impl FromStr for InputSet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(InputSet::default());
        }
        s.split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<i64>().map_err(|_| format!("'{part}' is not an integer"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(InputSet)
    }
}

struct Reporter {
    json: bool,
    renderer: AnsiRenderer,
}

impl Reporter {
    fn new(cli: &Cli) -> Self {
        let use_color = !cli.no_color && !cli.json && std::io::stderr().is_terminal();
        Reporter { json: cli.json, renderer: AnsiRenderer { use_color } }
    }

    fn emit(&self, d: &Diagnostic) {
        if self.json {
            eprintln!("{}", diagnostic::json::render(d));
        } else {
            eprint!("{}", self.renderer.render(d));
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let reporter = Reporter::new(&cli);

    let outcome = match &cli.command {
        Command::Show { path } => show(path, cli.json),
        Command::Check { path } => check(path, cli.json, &reporter),
        Command::Expand { path, degree, emit } => expand(path, *degree, *emit),
        Command::Run { path, degree, inputs, step_limit } => {
            run(path, *degree, inputs, *step_limit, cli.json)
        }
        Command::Explain { code } => explain(code),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(diagnostics) => {
            for d in &diagnostics {
                reporter.emit(d);
            }
            ExitCode::FAILURE
        }
    }
}

type Outcome = Result<(), Vec<Diagnostic>>;

/// Reads `path` as a JSON document or listing text, by extension, and loads
/// it into a fresh engine. Loading validates the program.
fn load(path: &Path, executor: Executor) -> Result<Engine, Vec<Diagnostic>> {
    let origin = format!("in {}", path.display());
    let text = std::fs::read_to_string(path)
        .map_err(|e| vec![Diagnostic::error(format!("cannot read {}: {e}", path.display()))])?;
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("program");

    let program = if path.extension().is_some_and(|ext| ext == "json") {
        ProgramDocument::from_json(&text)
            .and_then(|doc| doc.build(Some(stem)))
            .map_err(|e| vec![Diagnostic::from(&e).with_note(origin.clone())])?
    } else {
        parse_source(stem, &text).map_err(|e| diagnostic::from_source_error(&e, &text))?
    };
    debug!(program = program.name(), instructions = program.len(), "parsed");

    let mut engine = Engine::new(executor);
    engine
        .load(program)
        .map_err(|e| vec![Diagnostic::from(&e).with_note(origin)])?;
    Ok(engine)
}

fn loaded(engine: &Engine) -> Result<&Program, Vec<Diagnostic>> {
    engine
        .program()
        .ok_or_else(|| vec![Diagnostic::from(&semulator::EngineError::NoProgram)])
}

/// `GOTO` targets are only resolved when the jump runs; flag the unbound ones.
fn unbound_goto_warnings(program: &Program) -> Vec<Diagnostic> {
    program
        .instructions()
        .iter()
        .enumerate()
        .filter_map(|(i, instruction)| match instruction.op() {
            Op::GotoLabel { target } if !program.has_label(target) => Some(
                Diagnostic::warning(format!("GOTO target '{target}' is never bound"))
                    .at_instruction(i + 1)
                    .with_suggestion("the run fails with SEM-R001 if this jump is taken"),
            ),
            _ => None,
        })
        .collect()
}

fn show(path: &Path, json: bool) -> Outcome {
    let engine = load(path, Executor::new())?;
    let program = loaded(&engine)?;
    if json {
        print_document(program)
    } else {
        print!("{}", summary(program));
        print!("{}", format(program, FmtMode::Listing));
        Ok(())
    }
}

fn check(path: &Path, json: bool, reporter: &Reporter) -> Outcome {
    let engine = load(path, Executor::new())?;
    let program = loaded(&engine)?;
    let warnings = unbound_goto_warnings(program);
    for w in &warnings {
        reporter.emit(w);
    }
    if json {
        let report = serde_json::json!({
            "ok": true,
            "program": program.name(),
            "instructions": program.len(),
            "max_degree": program.max_degree(),
            "warnings": warnings.len(),
        });
        println!("{report}");
    } else {
        println!(
            "ok: {} ({} instruction(s), max degree {})",
            program.name(),
            program.len(),
            program.max_degree()
        );
    }
    Ok(())
}

fn expand(path: &Path, degree: u32, emit: Emit) -> Outcome {
    let engine = load(path, Executor::new())?;
    let lowered = engine.expand(degree).map_err(|e| vec![Diagnostic::from(&e)])?;
    match emit {
        Emit::Listing => print!("{}", format(&lowered, FmtMode::Listing)),
        Emit::Source => print!("{}", format(&lowered, FmtMode::Source)),
        Emit::Json => print_document(&lowered)?,
    }
    Ok(())
}

fn run(path: &Path, degree: Option<u32>, inputs: &[InputSet], step_limit: Option<u64>, json: bool) -> Outcome {
    let mut engine = load(path, Executor::new().with_step_limit(step_limit))?;
    let degree = degree.unwrap_or(loaded(&engine)?.max_degree());
    let runs: Vec<InputSet> = if inputs.is_empty() { vec![InputSet::default()] } else { inputs.to_vec() };

    let mut reports = Vec::new();
    for InputSet(values) in &runs {
        let result = engine
            .run(values, degree)
            .map_err(|e| vec![Diagnostic::from(&e).with_note(format!("inputs {values:?}"))])?;
        if json {
            reports.push(serde_json::json!({
                "run": engine.history().len(),
                "degree": degree,
                "inputs": values,
                "result": result,
            }));
        } else {
            println!(
                "run {} (degree {degree}, inputs {values:?}): y = {}, {} cycle(s), {} step(s)",
                engine.history().len(),
                result.output(),
                result.cycles(),
                result.steps()
            );
            for register in result.variables() {
                println!("  {} = {}", register.name, register.value);
            }
        }
    }

    if json {
        let report = serde_json::json!({
            "program": loaded(&engine)?.name(),
            "runs": reports,
            "history": engine.history(),
        });
        println!("{report}");
    }
    Ok(())
}

fn explain(code: &str) -> Outcome {
    match registry::lookup(code) {
        Some(entry) => {
            print!("{}", entry.long);
            Ok(())
        }
        None => Err(vec![
            Diagnostic::error(format!("unknown error code '{code}'"))
                .with_suggestion("codes look like SEM-P001; see the README for the full list"),
        ]),
    }
}

fn print_document(program: &Program) -> Outcome {
    let text = ProgramDocument::from_program(program)
        .to_json()
        .map_err(|e| vec![Diagnostic::from(&e)])?;
    println!("{text}");
    Ok(())
}
