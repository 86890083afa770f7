use serde::Serialize;

use super::Diagnostic;
use crate::source::SourceMap;

/// Wire form of a diagnostic. Location fields appear only when known.
#[derive(Serialize)]
struct Record<'a> {
    severity: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'static str>,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    instruction: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: &'a Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<&'a str>,
}

#[derive(Serialize)]
struct Location {
    start: usize,
    end: usize,
    line: usize,
    col: usize,
}

impl<'a> From<&'a Diagnostic> for Record<'a> {
    fn from(d: &'a Diagnostic) -> Self {
        let location = d.span.zip(d.source.as_deref()).map(|(span, source)| {
            let (line, col) = SourceMap::new(source).lookup(span.start);
            Location { start: span.start, end: span.end, line, col }
        });
        Record {
            severity: d.severity.as_str(),
            code: d.code,
            summary: d.summary(),
            message: &d.message,
            location,
            instruction: d.instruction,
            notes: &d.notes,
            suggestion: d.suggestion.as_deref(),
        }
    }
}

/// One diagnostic as a single-line JSON object.
pub fn render(d: &Diagnostic) -> String {
    serde_json::to_string(&Record::from(d))
        .unwrap_or_else(|e| format!(r#"{{"severity":"error","message":"cannot serialize diagnostic: {e}"}}"#))
}
