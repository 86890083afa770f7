use super::{Diagnostic, Severity};
use crate::source::{SourceMap, Span};

#[derive(Clone, Copy)]
enum Style {
    Strong,
    Error,
    Warning,
    Gutter,
    Faint,
}

impl Style {
    fn escape(self) -> &'static str {
        match self {
            Style::Strong => "1",
            Style::Error => "1;31",
            Style::Warning => "1;33",
            Style::Gutter => "36",
            Style::Faint => "2",
        }
    }
}

/// Renders diagnostics for a terminal: a header line, then either a source
/// excerpt with carets or the instruction number, then notes and help.
pub struct AnsiRenderer {
    pub use_color: bool,
}

impl AnsiRenderer {
    fn paint(&self, style: Style, text: &str) -> String {
        if self.use_color {
            format!("\x1b[{}m{text}\x1b[0m", style.escape())
        } else {
            text.to_string()
        }
    }

    pub fn render(&self, d: &Diagnostic) -> String {
        let accent = match d.severity {
            Severity::Error => Style::Error,
            Severity::Warning => Style::Warning,
        };
        let head = match d.code {
            Some(code) => format!("{}[{code}]", d.severity.as_str()),
            None => d.severity.as_str().to_string(),
        };
        let mut out = format!("{}: {}\n", self.paint(accent, &head), self.paint(Style::Strong, &d.message));

        let arrow = self.paint(Style::Gutter, "-->");
        match (d.span, d.source.as_deref()) {
            (Some(span), Some(source)) => out.push_str(&self.excerpt(span, source, accent)),
            _ => {
                if let Some(number) = d.instruction {
                    out.push_str(&format!("  {arrow} instruction #{number}\n"));
                }
            }
        }

        let bullet = self.paint(Style::Faint, "=");
        for note in &d.notes {
            out.push_str(&format!("  {bullet} note: {note}\n"));
        }
        if let Some(help) = &d.suggestion {
            out.push_str(&format!("  {bullet} help: {help}\n"));
        }
        out
    }

    /// `--> line:col`, the offending line, and carets under the span. The
    /// carets never run past the end of that line.
    fn excerpt(&self, span: Span, source: &str, accent: Style) -> String {
        let map = SourceMap::new(source);
        let (line, col) = map.lookup(span.start);
        let text = map.line_text(source, line);

        let number = line.to_string();
        let blank = " ".repeat(number.len());
        let bar = self.paint(Style::Gutter, "|");

        let offset = col - 1;
        let width = span.len().clamp(1, text.len().saturating_sub(offset).max(1));
        let carets = self.paint(accent, &"^".repeat(width));

        format!(
            "  {} {line}:{col}\n{blank} {bar}\n{} {bar} {text}\n{blank} {bar} {}{carets}\n",
            self.paint(Style::Gutter, "-->"),
            self.paint(Style::Gutter, &number),
            " ".repeat(offset),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "[L1] x1 <- x1 - 1\nIF x1 != 0 GOTO L1 (1)\n";

    fn annotation_error() -> Diagnostic {
        Diagnostic::error("cycle annotation (1) does not match JUMP_NOT_ZERO which costs 2")
            .with_code("SEM-P003")
            .with_span(Span { start: 37, end: 40 })
            .with_source(SOURCE)
            .with_suggestion("write (2) or drop the annotation")
    }

    fn plain() -> AnsiRenderer {
        AnsiRenderer { use_color: false }
    }

    #[test]
    fn header_carries_code() {
        let out = plain().render(&annotation_error());
        assert!(out.starts_with("error[SEM-P003]: cycle annotation"), "bad header in:\n{out}");
    }

    #[test]
    fn header_without_code() {
        let out = plain().render(&Diagnostic::error("no program loaded"));
        assert_eq!(out, "error: no program loaded\n");
    }

    #[test]
    fn points_at_the_second_line() {
        let out = plain().render(&annotation_error());
        assert!(out.contains("--> 2:20"), "missing location in:\n{out}");
        assert!(out.contains("2 | IF x1 != 0 GOTO L1 (1)"), "missing source line in:\n{out}");
        assert!(out.contains(&format!("  | {}^^^\n", " ".repeat(19))), "carets misplaced in:\n{out}");
    }

    #[test]
    fn notes_and_help_follow() {
        let out = plain().render(&annotation_error().with_note("in demo.s"));
        assert!(out.contains("= note: in demo.s"));
        assert!(out.ends_with("= help: write (2) or drop the annotation\n"), "got:\n{out}");
    }

    #[test]
    fn carets_stop_at_end_of_line() {
        let d = Diagnostic::error("bad").with_span(Span { start: 13, end: 200 }).with_source(SOURCE);
        let out = plain().render(&d);
        assert!(out.contains("^^^^\n"), "expected 4 carets in:\n{out}");
        assert!(!out.contains("^^^^^"), "carets overflow in:\n{out}");
    }

    #[test]
    fn program_errors_name_the_instruction() {
        let d = Diagnostic::error("label 'E' is not bound (jump at instruction #3)")
            .with_code("SEM-R001")
            .at_instruction(3);
        assert_eq!(
            plain().render(&d),
            "error[SEM-R001]: label 'E' is not bound (jump at instruction #3)\n  --> instruction #3\n"
        );
    }

    #[test]
    fn span_wins_over_instruction_when_source_is_known() {
        let out = plain().render(&annotation_error().at_instruction(2));
        assert!(out.contains("--> 2:20"));
        assert!(!out.contains("instruction #2"));
    }

    #[test]
    fn span_without_source_is_not_shown() {
        let d = Diagnostic::error("bad").with_span(Span { start: 0, end: 3 });
        assert_eq!(plain().render(&d), "error: bad\n");
    }

    #[test]
    fn warnings_render_as_warnings() {
        let out = plain().render(&Diagnostic::warning("GOTO target 'E' is never bound"));
        assert!(out.starts_with("warning: "));
    }

    #[test]
    fn color_toggle() {
        let colored = AnsiRenderer { use_color: true }.render(&annotation_error());
        assert!(colored.contains("\x1b[1;31merror[SEM-P003]\x1b[0m"));
        assert!(!plain().render(&annotation_error()).contains("\x1b["));
    }
}
