//! Properties that must hold for any program, chiefly that lowering keeps
//! results. Programs that may loop forever are checked only on runs that
//! finish under a step limit.

use semulator::expand::expand_to_degree;
use semulator::parser::parse_source;
use semulator::vm::{ExecutionResult, Executor, RuntimeError};
use semulator::{Engine, Instruction, Program};

const VARIABLES: [&str; 5] = ["y", "x1", "x2", "z1", "z2"];
const SEEDS: std::ops::Range<u64> = 0..200;

fn executor() -> Executor {
    Executor::new().with_step_limit(Some(1_000_000))
}

/// Random program whose jumps only go forward, so every run terminates.
fn random_program(rng: &mut fastrand::Rng) -> Program {
    random_program_with(rng, |i| i + 1)
}

/// Random program that may jump anywhere, including backwards and to
/// itself. Runs need not terminate.
fn random_looping_program(rng: &mut fastrand::Rng) -> Program {
    random_program_with(rng, |_| 0)
}

/// Jumps at position `i` target labels at positions `first_target(i)..`.
fn random_program_with(rng: &mut fastrand::Rng, first_target: impl Fn(usize) -> usize) -> Program {
    let len = rng.usize(1..16);
    let labels: Vec<Option<String>> = (0..len)
        .map(|i| rng.bool().then(|| format!("T{i}")))
        .collect();

    let mut instructions = Vec::with_capacity(len);
    for i in 0..len {
        let var = VARIABLES[rng.usize(..VARIABLES.len())];
        let ahead: Vec<&String> = labels[first_target(i)..].iter().flatten().collect();
        let target = (!ahead.is_empty()).then(|| ahead[rng.usize(..ahead.len())].clone());

        let instruction = match (rng.u8(..6), target) {
            (0, _) => Instruction::neutral(var),
            (1, _) => Instruction::increase(var),
            (2, _) => Instruction::decrease(var),
            (3, Some(target)) => Instruction::jump_not_zero(var, target),
            (4, _) => Instruction::zero_variable(var),
            (5, Some(target)) => Instruction::goto_label(target),
            _ => Instruction::increase(var),
        };
        instructions.push(match &labels[i] {
            Some(label) => instruction.with_label(label.clone()),
            None => instruction,
        });
    }
    Program::from_instructions("random", instructions).expect("labels are unique")
}

fn random_inputs(rng: &mut fastrand::Rng) -> Vec<i64> {
    (0..rng.usize(0..3)).map(|_| rng.i64(-2..6)).collect()
}

fn run(program: &Program, inputs: &[i64]) -> ExecutionResult {
    executor().run(program, inputs).expect("forward-only programs terminate")
}

#[test]
fn lowering_preserves_output() {
    for seed in SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let program = random_program(&mut rng);
        let inputs = random_inputs(&mut rng);
        let lowered = expand_to_degree(&program, 0).unwrap();

        assert!(lowered.instructions().iter().all(Instruction::is_basic), "seed {seed}");
        assert!(lowered.is_valid(), "seed {seed}");
        assert_eq!(
            run(&lowered, &inputs).output(),
            run(&program, &inputs).output(),
            "seed {seed}: output changed by lowering"
        );
    }
}

#[test]
fn lowering_preserves_every_original_variable() {
    for seed in SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let program = random_program(&mut rng);
        let inputs = random_inputs(&mut rng);
        let before = run(&program, &inputs);
        let after = run(&expand_to_degree(&program, 0).unwrap(), &inputs);
        for register in before.variables() {
            assert_eq!(after.value(&register.name), register.value, "seed {seed}: {}", register.name);
        }
    }
}

#[test]
fn lowering_preserves_looping_programs_that_finish() {
    let short = Executor::new().with_step_limit(Some(10_000));
    let mut finished = 0;
    for seed in SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let program = random_looping_program(&mut rng);
        let inputs = random_inputs(&mut rng);
        let before = match short.run(&program, &inputs) {
            Ok(result) => result,
            Err(RuntimeError::StepLimitExceeded { .. }) => continue,
            Err(e) => panic!("seed {seed}: {e}"),
        };
        let lowered = expand_to_degree(&program, 0).unwrap();
        let after = match executor().run(&lowered, &inputs) {
            Ok(result) => result,
            Err(RuntimeError::StepLimitExceeded { .. }) => continue,
            Err(e) => panic!("seed {seed}: {e}"),
        };
        finished += 1;

        assert_eq!(after.output(), before.output(), "seed {seed}: output changed by lowering");
        assert!(after.cycles() >= before.cycles(), "seed {seed}");
        for register in before.variables() {
            assert_eq!(after.value(&register.name), register.value, "seed {seed}: {}", register.name);
        }
    }
    assert!(finished > 0, "every looping program hit the step limit");
}

#[test]
fn lowering_never_saves_cycles() {
    for seed in SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let program = random_program(&mut rng);
        let inputs = random_inputs(&mut rng);
        let lowered = expand_to_degree(&program, 0).unwrap();
        assert!(run(&lowered, &inputs).cycles() >= run(&program, &inputs).cycles(), "seed {seed}");
    }
}

#[test]
fn max_degree_is_identity() {
    for seed in SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let program = random_program(&mut rng);
        let same = expand_to_degree(&program, program.max_degree()).unwrap();
        assert_eq!(same.instructions(), program.instructions(), "seed {seed}");
        assert!(expand_to_degree(&program, program.max_degree() + 1).is_err());
    }
}

#[test]
fn lowering_is_deterministic() {
    for seed in SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let program = random_program(&mut rng);
        assert_eq!(
            expand_to_degree(&program, 0).unwrap(),
            expand_to_degree(&program, 0).unwrap(),
            "seed {seed}"
        );
    }
}

#[test]
fn expanded_instructions_trace_back_to_synthetic_parents() {
    for seed in SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let program = random_program(&mut rng);
        let lowered = expand_to_degree(&program, 0).unwrap();
        for instruction in lowered.instructions() {
            match lowered.parent(instruction) {
                Some(parent) => {
                    assert!(!parent.is_basic(), "seed {seed}: basic parent {parent}");
                    assert!(program.instructions().contains(parent), "seed {seed}: foreign parent {parent}");
                }
                None => assert!(program.instructions().contains(instruction), "seed {seed}: orphan {instruction}"),
            }
        }
    }
}

#[test]
fn straight_line_cycles_match_static_cost() {
    for seed in SEEDS {
        let mut rng = fastrand::Rng::with_seed(seed);
        let len = rng.usize(0..20);
        let instructions = (0..len).map(|_| {
            let var = VARIABLES[rng.usize(..VARIABLES.len())];
            match rng.u8(..3) {
                0 => Instruction::neutral(var),
                1 => Instruction::increase(var),
                _ => Instruction::decrease(var),
            }
        });
        let program = Program::from_instructions("line", instructions).unwrap();
        let result = run(&program, &random_inputs(&mut rng));
        assert_eq!(result.cycles(), program.static_cycles(), "seed {seed}");
        assert_eq!(result.steps(), program.len() as u64, "seed {seed}");
    }
}

#[test]
fn parallel_runs_agree() {
    let programs: Vec<(Program, Vec<i64>)> = SEEDS
        .map(|seed| {
            let mut rng = fastrand::Rng::with_seed(seed);
            (random_program(&mut rng), random_inputs(&mut rng))
        })
        .collect();
    let sequential: Vec<ExecutionResult> = programs.iter().map(|(p, inputs)| run(p, inputs)).collect();

    let parallel: Vec<Vec<ExecutionResult>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| programs.iter().map(|(p, inputs)| run(p, inputs)).collect::<Vec<_>>()))
            .collect();
        handles.into_iter().map(|h| h.join().expect("worker panicked")).collect()
    });

    for results in parallel {
        assert_eq!(results, sequential);
    }
}

#[test]
fn engine_history_tracks_each_degree() {
    let program = parse_source(
        "double",
        "[A] IF x1 != 0 GOTO B\n\
         GOTO E\n\
         [B] x1 <- x1 - 1\n\
         y <- y + 1\n\
         y <- y + 1\n\
         GOTO A\n\
         [E] y <- y\n",
    )
    .unwrap();
    let mut engine = Engine::new(executor());
    engine.load(program).unwrap();

    let written = engine.run(&[4], 1).unwrap();
    let basic = engine.run(&[4], 0).unwrap();
    assert_eq!(written.output(), 8);
    assert_eq!(basic.output(), 8);

    let history = engine.history();
    assert_eq!(history.len(), 2);
    assert_eq!((history[0].degree, history[0].cycles), (1, written.cycles()));
    assert_eq!((history[1].degree, history[1].cycles), (0, basic.cycles()));
    // each GOTO costs two more cycles once lowered
    assert_eq!(basic.cycles() - written.cycles(), 2 * 5);
}
