/// An entry in the error code registry.
pub struct ErrorEntry {
    pub code: &'static str,
    pub short: &'static str, // one-line description
    pub long: &'static str,  // full explanation for `explain`
}

/// All stable error codes.
pub static REGISTRY: &[ErrorEntry] = &[
    // ── Lexer ────────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "SEM-L001",
        short: "unexpected character",
        long: r#"## SEM-L001: unexpected character

A character was found that cannot start any token of the listing syntax.
Programs use only `[ ] ( ) <- != + -`, numbers, names and `#` comments.

**Example:**

    y ← y + 1

**Fix:**

    y <- y + 1
"#,
    },
    // ── Parser ───────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "SEM-P001",
        short: "unexpected token",
        long: r#"## SEM-P001: unexpected token

The line does not match any instruction form. The forms are:

    V <- V          neutral
    V <- V + 1      increase
    V <- V - 1      decrease
    IF V != 0 GOTO L
    V <- 0          zero variable
    GOTO L

Keywords are uppercase, and registers only change by one.
"#,
    },
    ErrorEntry {
        code: "SEM-P002",
        short: "mismatched operands",
        long: r#"## SEM-P002: mismatched operands

An assignment reads one variable and writes another. Every instruction
acts on a single variable.

**Example:**

    y <- x1 + 1

**Fix:** copy through a loop, or write `y <- y + 1`.
"#,
    },
    ErrorEntry {
        code: "SEM-P003",
        short: "cycle annotation mismatch",
        long: r#"## SEM-P003: cycle annotation mismatch

The optional `(n)` at the end of a line must equal the cost of the
instruction: 0 for `V <- V`, 2 for `IF V != 0 GOTO L`, 1 for the rest.
Drop the annotation or correct it.
"#,
    },
    ErrorEntry {
        code: "SEM-P004",
        short: "unexpected end of line",
        long: r#"## SEM-P004: unexpected end of line

The line ended before the instruction was complete, e.g. `GOTO` with no
label or `y <-` with nothing after it. Each instruction fits on one line.
"#,
    },
    // ── Construction ─────────────────────────────────────────────────────────
    ErrorEntry {
        code: "SEM-C001",
        short: "unknown instruction",
        long: r#"## SEM-C001: unknown instruction

A program document names an instruction outside the catalog. Known names:
NEUTRAL, INCREASE, DECREASE, JUMP_NOT_ZERO, ZERO_VARIABLE, GOTO_LABEL.
"#,
    },
    ErrorEntry {
        code: "SEM-C002",
        short: "missing operand",
        long: r#"## SEM-C002: missing operand

An instruction lacks a required operand. Every variant except GOTO_LABEL
needs a `variable`; JUMP_NOT_ZERO needs the `JNZLabel` argument and
GOTO_LABEL needs the `gotoLabel` argument.
"#,
    },
    ErrorEntry {
        code: "SEM-C003",
        short: "malformed variable",
        long: r#"## SEM-C003: malformed variable

Variables are `y` (output), `x1`, `x2`, ... (inputs) or `z1`, `z2`, ...
(work variables). Anything else is rejected.
"#,
    },
    ErrorEntry {
        code: "SEM-C004",
        short: "malformed label",
        long: r#"## SEM-C004: malformed label

Labels are identifiers: a letter or underscore followed by letters,
digits or underscores.
"#,
    },
    ErrorEntry {
        code: "SEM-C005",
        short: "duplicate label",
        long: r#"## SEM-C005: duplicate label

Two instructions carry the same label. A label names exactly one
position, so jumps to it would be ambiguous. Rename one of them.
"#,
    },
    // ── Validation ───────────────────────────────────────────────────────────
    ErrorEntry {
        code: "SEM-V001",
        short: "jump to unbound label",
        long: r#"## SEM-V001: jump to unbound label

An `IF V != 0 GOTO L` targets a label no instruction carries. Programs
are checked before they run.

**Example:**

    IF x1 != 0 GOTO LOOP
    y <- y + 1

**Fix:** add `[LOOP]` to the instruction the jump should reach.
"#,
    },
    // ── Expansion ────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "SEM-X001",
        short: "invalid expansion degree",
        long: r#"## SEM-X001: invalid expansion degree

A program can be lowered to any degree from 0 (basic instructions only)
up to its maximum degree (the program as written). Larger degrees are
rejected.
"#,
    },
    // ── Runtime ──────────────────────────────────────────────────────────────
    ErrorEntry {
        code: "SEM-R001",
        short: "unresolved label at runtime",
        long: r#"## SEM-R001: unresolved label at runtime

A jump was taken to a label that is not bound. `GOTO L` targets are only
checked when the jump executes, so a program with an unbound `GOTO`
target loads but fails when that line runs.
"#,
    },
    ErrorEntry {
        code: "SEM-R002",
        short: "step limit exceeded",
        long: r#"## SEM-R002: step limit exceeded

The run executed more instructions than the configured step limit
allows. S programs may loop forever; the limit stops them. Raise it with
`--step-limit` or `SEMULATOR_STEP_LIMIT`, or fix the loop.
"#,
    },
    // ── Documents and sessions ───────────────────────────────────────────────
    ErrorEntry {
        code: "SEM-D001",
        short: "malformed program document",
        long: r#"## SEM-D001: malformed program document

A JSON program is not shaped like

    {"name": "...", "instructions": [{"name": "INCREASE", "variable": "y"}]}

or carries no name and none could be derived from the file name.
"#,
    },
    ErrorEntry {
        code: "SEM-E001",
        short: "no program loaded",
        long: r#"## SEM-E001: no program loaded

An engine operation needs a program, but none has been loaded.
"#,
    },
];

/// Look up an error entry by code (e.g. `"SEM-R001"`).
pub fn lookup(code: &str) -> Option<&'static ErrorEntry> {
    REGISTRY.iter().find(|e| e.code.eq_ignore_ascii_case(code.trim()))
}
