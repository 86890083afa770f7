//! Line-oriented parser for the S listing syntax.
//!
//! One instruction per line, written the way it is displayed:
//!
//! ```text
//! [L1] x1 <- x1 - 1
//!      IF x1 != 0 GOTO L1 (2)
//! ```
//!
//! The optional `[label]` prefix may be blank (`[   ]`) and the optional
//! trailing `(n)` cycle annotation must match the instruction's cost.

use crate::instruction::{ConstructionError, GOTO_LABEL_ARG, Instruction, JNZ_LABEL_ARG, Opcode, Operands};
use crate::lexer::{self, LexError, Token};
use crate::program::Program;
use crate::source::Span;

const MAX_ERRORS: usize = 20;

pub struct Parser {
    tokens: Vec<(Token, Span)>,
    pos: usize,
    eof: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub code: &'static str,
    pub span: Span,
    pub message: String,
    pub hint: Option<String>,
}

impl ParseError {
    fn construction(err: ConstructionError, span: Span) -> Self {
        ParseError { code: err.code(), span, message: err.to_string(), hint: None }
    }

    fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Everything that can go wrong turning text into a [`Program`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error("{} parse error(s)", .0.len())]
    Parse(Vec<ParseError>),
}

/// A parsed instruction with the span of its line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub instruction: Instruction,
    pub span: Span,
}

type Result<T> = std::result::Result<T, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<(Token, Span)>, source_len: usize) -> Self {
        Parser { tokens, pos: 0, eof: Span { start: source_len, end: source_len } }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_span(&self) -> Span {
        self.tokens.get(self.pos).map(|(_, s)| *s).unwrap_or(self.eof)
    }

    fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, s)| *s)
            .unwrap_or(Span::UNKNOWN)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos).map(|(t, _)| t);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at_line_end(&self) -> bool {
        matches!(self.peek(), None | Some(Token::Newline))
    }

    fn error(&self, code: &'static str, message: String) -> ParseError {
        ParseError { code, span: self.peek_span(), message, hint: None }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            None | Some(Token::Newline) => {
                self.error("SEM-P004", format!("expected {expected}, found end of line"))
            }
            Some(tok) => self.error("SEM-P001", format!("expected {expected}, found {}", tok.describe())),
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<Span> {
        match self.peek() {
            Some(tok) if tok == expected => {
                let span = self.peek_span();
                self.advance();
                Ok(span)
            }
            _ => Err(self.unexpected(&expected.describe())),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, Span)> {
        match self.peek().cloned() {
            Some(Token::Ident(name)) => {
                let span = self.peek_span();
                self.advance();
                Ok((name, span))
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn expect_number(&mut self, value: u64) -> Result<Span> {
        match self.peek() {
            Some(Token::Number(n)) if *n == value => {
                let span = self.peek_span();
                self.advance();
                Ok(span)
            }
            Some(Token::Number(n)) => {
                let n = *n;
                Err(self
                    .error("SEM-P001", format!("expected {value}, found number {n}"))
                    .with_hint("registers only move by one: use '+ 1' or '- 1', and jumps test '!= 0'"))
            }
            _ => Err(self.unexpected(&format!("number {value}"))),
        }
    }

    /// Skips to just past the next newline.
    fn sync_to_next_line(&mut self) {
        while let Some(tok) = self.advance() {
            if *tok == Token::Newline {
                break;
            }
        }
    }

    pub fn parse_lines(&mut self) -> (Vec<Line>, Vec<ParseError>) {
        let mut lines = Vec::new();
        let mut errors = Vec::new();

        while !self.at_end() {
            if errors.len() >= MAX_ERRORS {
                break;
            }
            if self.peek() == Some(&Token::Newline) {
                self.advance();
                continue;
            }
            match self.parse_line() {
                Ok(line) => lines.push(line),
                Err(e) => {
                    errors.push(e);
                    self.sync_to_next_line();
                }
            }
        }

        (lines, errors)
    }

    fn parse_line(&mut self) -> Result<Line> {
        let start = self.peek_span();
        let label = self.parse_label_prefix()?;
        let (opcode, mut operands) = self.parse_operation()?;
        let op_span = start.merge(self.prev_span());

        if let Some(label) = label {
            operands = operands.with_label(label);
        }
        let instruction = opcode
            .construct(&operands)
            .map_err(|e| ParseError::construction(e, op_span))?;

        if self.peek() == Some(&Token::LParen) {
            self.parse_cycle_annotation(&instruction)?;
        }
        if !self.at_line_end() {
            return Err(self.unexpected("end of line"));
        }
        self.advance();

        Ok(Line { instruction, span: start.merge(self.prev_span()) })
    }

    /// `[L1]`, `[   ]` or nothing.
    fn parse_label_prefix(&mut self) -> Result<Option<String>> {
        if self.peek() != Some(&Token::LBracket) {
            return Ok(None);
        }
        self.advance();
        if self.peek() == Some(&Token::RBracket) {
            self.advance();
            return Ok(None);
        }
        let (label, _) = self.expect_ident("a label")?;
        self.expect(&Token::RBracket)?;
        Ok(Some(label))
    }

    fn parse_operation(&mut self) -> Result<(Opcode, Operands)> {
        match self.peek().cloned() {
            Some(Token::If) => self.parse_jump_not_zero(),
            Some(Token::Goto) => {
                self.advance();
                let (target, _) = self.expect_ident("a label")?;
                Ok((Opcode::GotoLabel, Operands::new().with_argument(GOTO_LABEL_ARG, target)))
            }
            Some(Token::Ident(name)) => {
                if let Some(keyword) = misspelled_keyword(&name) {
                    if self.tokens.get(self.pos + 1).map(|(t, _)| t) != Some(&Token::Assign) {
                        return Err(self
                            .error("SEM-P001", format!("expected an instruction, found '{name}'"))
                            .with_hint(format!("keywords are uppercase: '{keyword}'")));
                    }
                }
                self.parse_assignment()
            }
            _ => Err(self.unexpected("an instruction")),
        }
    }

    /// `IF V != 0 GOTO L`
    fn parse_jump_not_zero(&mut self) -> Result<(Opcode, Operands)> {
        self.expect(&Token::If)?;
        let (var, _) = self.expect_ident("a variable")?;
        self.expect(&Token::NotEquals)?;
        self.expect_number(0)?;
        self.expect(&Token::Goto)?;
        let (target, _) = self.expect_ident("a label")?;
        Ok((
            Opcode::JumpNotZero,
            Operands::new().with_variable(var).with_argument(JNZ_LABEL_ARG, target),
        ))
    }

    /// `V <- 0`, `V <- V`, `V <- V + 1` or `V <- V - 1`
    fn parse_assignment(&mut self) -> Result<(Opcode, Operands)> {
        let (var, _) = self.expect_ident("a variable")?;
        self.expect(&Token::Assign)?;

        if self.peek() == Some(&Token::Number(0)) {
            self.advance();
            return Ok((Opcode::ZeroVariable, Operands::new().with_variable(var)));
        }

        let (source, source_span) = self.expect_ident("a variable or 0")?;
        if source != var {
            return Err(ParseError {
                code: "SEM-P002",
                span: source_span,
                message: format!("'{var} <- {source} ...' must read and write the same variable"),
                hint: Some(format!("write '{var} <- {var} ...'")),
            });
        }

        let opcode = match self.peek() {
            Some(Token::Plus) => Opcode::Increase,
            Some(Token::Minus) => Opcode::Decrease,
            _ => return Ok((Opcode::Neutral, Operands::new().with_variable(var))),
        };
        self.advance();
        self.expect_number(1)?;
        Ok((opcode, Operands::new().with_variable(var)))
    }

    /// `(n)` after an instruction; must equal its cycle cost.
    fn parse_cycle_annotation(&mut self, instruction: &Instruction) -> Result<()> {
        let open = self.expect(&Token::LParen)?;
        let written = match self.peek() {
            Some(Token::Number(n)) => *n,
            _ => return Err(self.unexpected("a cycle count")),
        };
        self.advance();
        let close = self.expect(&Token::RParen)?;

        let cost = instruction.cycles();
        if written != cost {
            return Err(ParseError {
                code: "SEM-P003",
                span: open.merge(close),
                message: format!("cycle annotation ({written}) does not match {} which costs {cost}", instruction.opcode()),
                hint: Some(format!("write ({cost}) or drop the annotation")),
            });
        }
        Ok(())
    }
}

fn misspelled_keyword(name: &str) -> Option<&'static str> {
    match name.to_ascii_uppercase().as_str() {
        "IF" => Some("IF"),
        "GOTO" => Some("GOTO"),
        _ => None,
    }
}

/// Parse already-lexed tokens into lines. Errors are collected per line.
pub fn parse(tokens: Vec<(Token, Span)>, source_len: usize) -> (Vec<Line>, Vec<ParseError>) {
    let mut parser = Parser::new(tokens, source_len);
    parser.parse_lines()
}

/// Lex, parse and assemble a named program. Duplicate labels are reported
/// alongside parse errors. The result is not validated.
pub fn parse_source(name: &str, source: &str) -> std::result::Result<Program, SourceError> {
    let tokens: Vec<(Token, Span)> = lexer::lex(source)?
        .into_iter()
        .map(|(t, r)| (t, Span::from(r)))
        .collect();
    let (lines, mut errors) = parse(tokens, source.len());

    let mut program = Program::new(name);
    for line in lines {
        if let Err(e) = program.push(line.instruction) {
            errors.push(ParseError::construction(e, line.span));
        }
    }

    if errors.is_empty() {
        Ok(program)
    } else {
        errors.sort_by_key(|e| e.span.start);
        errors.truncate(MAX_ERRORS);
        Err(SourceError::Parse(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Op;

    fn parse_ok(source: &str) -> Program {
        match parse_source("test", source) {
            Ok(program) => program,
            Err(e) => panic!("parse failed: {e:?}"),
        }
    }

    fn parse_errors(source: &str) -> Vec<ParseError> {
        match parse_source("test", source) {
            Err(SourceError::Parse(errors)) => errors,
            other => panic!("expected parse errors, got {other:?}"),
        }
    }

    #[test]
    fn parse_every_instruction_form() {
        let program = parse_ok(
            "[A] x1 <- x1\n\
             y <- y + 1\n\
             z1 <- z1 - 1\n\
             IF x1 != 0 GOTO A\n\
             y <- 0\n\
             GOTO A\n",
        );
        let ops: Vec<&Op> = program.instructions().iter().map(Instruction::op).collect();
        assert_eq!(
            ops,
            [
                Instruction::neutral("x1").op(),
                Instruction::increase("y").op(),
                Instruction::decrease("z1").op(),
                Instruction::jump_not_zero("x1", "A").op(),
                Instruction::zero_variable("y").op(),
                Instruction::goto_label("A").op(),
            ]
        );
        assert_eq!(program.label_position("A"), Ok(0));
        assert_eq!(program.name(), "test");
    }

    #[test]
    fn parse_display_form_back() {
        let original = Program::from_instructions(
            "loop",
            [
                Instruction::decrease("x1").with_label("L1"),
                Instruction::jump_not_zero("x1", "L1"),
                Instruction::increase("y"),
            ],
        )
        .unwrap();
        let text: String = original.instructions().iter().map(|i| format!("{i}\n")).collect();
        let reparsed = parse_ok(&text);
        assert_eq!(reparsed.instructions(), original.instructions());
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let program = parse_ok("# header\n\n   y <- y + 1   # bump\n\n");
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn last_line_needs_no_newline() {
        assert_eq!(parse_ok("y <- y + 1").len(), 1);
    }

    #[test]
    fn mismatched_operands_are_rejected() {
        let errors = parse_errors("y <- x1 + 1\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "SEM-P002");
        assert_eq!(errors[0].span, Span { start: 5, end: 7 });
    }

    #[test]
    fn wrong_cycle_annotation_is_rejected() {
        let errors = parse_errors("IF x1 != 0 GOTO A (1)\n[A] y <- y\n");
        assert_eq!(errors[0].code, "SEM-P003");
        assert_eq!(errors[0].hint.as_deref(), Some("write (2) or drop the annotation"));
    }

    #[test]
    fn only_steps_of_one() {
        let errors = parse_errors("y <- y + 2\n");
        assert_eq!(errors[0].code, "SEM-P001");
        assert!(errors[0].hint.is_some());
    }

    #[test]
    fn lowercase_keyword_gets_hint() {
        let errors = parse_errors("if x1 != 0 GOTO A\n");
        assert_eq!(errors[0].code, "SEM-P001");
        assert_eq!(errors[0].hint.as_deref(), Some("keywords are uppercase: 'IF'"));
    }

    #[test]
    fn truncated_line_is_end_of_line_error() {
        let errors = parse_errors("IF x1 != 0 GOTO\n");
        assert_eq!(errors[0].code, "SEM-P004");
    }

    #[test]
    fn malformed_names_report_construction_codes() {
        assert_eq!(parse_errors("w1 <- w1 + 1\n")[0].code, "SEM-C003");
        assert_eq!(parse_errors("[L1] y <- y\n[L1] y <- y\n")[0].code, "SEM-C005");
    }

    #[test]
    fn errors_recover_at_next_line() {
        let errors = parse_errors("y <- \nGOTO\ny <- y + 1\nIF y GOTO A\n");
        assert_eq!(errors.len(), 3);
        assert!(errors.windows(2).all(|w| w[0].span.start <= w[1].span.start));
    }

    #[test]
    fn error_count_is_capped() {
        let source = "y <- x1\n".repeat(50);
        assert_eq!(parse_errors(&source).len(), MAX_ERRORS);
    }

    #[test]
    fn lex_error_surfaces_as_source_error() {
        assert!(matches!(parse_source("t", "y <- y * 2"), Err(SourceError::Lex(_))));
    }
}
