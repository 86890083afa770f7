pub mod ansi;
pub mod json;
pub mod registry;

use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

/// A reportable problem. Text-level problems point at a `span` of the
/// listing; program-level ones name an `instruction` (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: Option<&'static str>,
    pub message: String,
    pub span: Option<Span>,
    pub instruction: Option<usize>,
    pub notes: Vec<String>,
    pub suggestion: Option<String>,
    pub source: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            code: None,
            message: message.into(),
            span: None,
            instruction: None,
            notes: Vec::new(),
            suggestion: None,
            source: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic { severity: Severity::Warning, ..Diagnostic::error(message) }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn at_instruction(mut self, number: usize) -> Self {
        self.instruction = Some(number);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// One-line description of the code from the registry.
    pub fn summary(&self) -> Option<&'static str> {
        self.code.and_then(registry::lookup).map(|entry| entry.short)
    }
}

// ---- From impls for library error types ----

impl From<&crate::lexer::LexError> for Diagnostic {
    fn from(e: &crate::lexer::LexError) -> Self {
        let span = Span {
            start: e.position,
            end: e.position + e.snippet.len().max(1),
        };
        let d = Diagnostic::error(e.to_string()).with_code(e.code()).with_span(span);
        if e.suggestion.is_empty() { d } else { d.with_suggestion(e.suggestion.clone()) }
    }
}

impl From<&crate::parser::ParseError> for Diagnostic {
    fn from(e: &crate::parser::ParseError) -> Self {
        let d = Diagnostic::error(&e.message).with_code(e.code).with_span(e.span);
        match &e.hint {
            Some(hint) => d.with_suggestion(hint.clone()),
            None => d,
        }
    }
}

impl From<&crate::instruction::ConstructionError> for Diagnostic {
    fn from(e: &crate::instruction::ConstructionError) -> Self {
        use crate::instruction::ConstructionError;
        let d = Diagnostic::error(e.to_string()).with_code(e.code());
        match e {
            ConstructionError::DuplicateLabel { first, second, .. } => d
                .at_instruction(*second)
                .with_note(format!("first bound at instruction #{first}")),
            _ => d,
        }
    }
}

impl From<&crate::program::ValidationError> for Diagnostic {
    fn from(e: &crate::program::ValidationError) -> Self {
        let mut d = Diagnostic::error(format!("program '{}' is not valid", e.program)).with_code(e.code());
        if let Some(first) = e.unresolved.first() {
            d = d.at_instruction(first.position + 1);
        }
        for jump in &e.unresolved {
            d = d.with_note(format!("instruction #{} jumps to unbound label '{}'", jump.position + 1, jump.label));
        }
        d.with_suggestion("bind each target with a '[label]' prefix on some instruction")
    }
}

impl From<&crate::expand::ExpandError> for Diagnostic {
    fn from(e: &crate::expand::ExpandError) -> Self {
        Diagnostic::error(e.to_string()).with_code(e.code())
    }
}

impl From<&crate::vm::RuntimeError> for Diagnostic {
    fn from(e: &crate::vm::RuntimeError) -> Self {
        use crate::vm::RuntimeError;
        let d = Diagnostic::error(e.to_string()).with_code(e.code());
        match e {
            RuntimeError::UnresolvedLabel { instruction, .. } => d.at_instruction(*instruction),
            RuntimeError::StepLimitExceeded { .. } => {
                d.with_suggestion("raise --step-limit (or SEMULATOR_STEP_LIMIT) if the program is expected to finish")
            }
        }
    }
}

impl From<&crate::document::DocumentError> for Diagnostic {
    fn from(e: &crate::document::DocumentError) -> Self {
        use crate::document::DocumentError;
        match e {
            DocumentError::Instruction { index, source } => Diagnostic::from(source).at_instruction(*index),
            _ => Diagnostic::error(e.to_string()).with_code(e.code()),
        }
    }
}

impl From<&crate::engine::EngineError> for Diagnostic {
    fn from(e: &crate::engine::EngineError) -> Self {
        use crate::engine::EngineError;
        match e {
            EngineError::NoProgram => Diagnostic::error(e.to_string()).with_code(e.code()),
            EngineError::Validation(inner) => inner.into(),
            EngineError::Expand(inner) => inner.into(),
            EngineError::Runtime(inner) => inner.into(),
        }
    }
}

/// All diagnostics for a failed text load, each carrying `source`.
pub fn from_source_error(e: &crate::parser::SourceError, source: &str) -> Vec<Diagnostic> {
    use crate::parser::SourceError;
    match e {
        SourceError::Lex(lex) => vec![Diagnostic::from(lex).with_source(source)],
        SourceError::Parse(errors) => errors
            .iter()
            .map(|p| Diagnostic::from(p).with_source(source))
            .collect(),
    }
}
