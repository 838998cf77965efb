use serde::{Serialize, Serializer};

/// Character offsets into the compiled text. `length == 0` marks an insertion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: usize,
    pub length: usize,
}

impl Span {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Message,
}

impl DiagnosticSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Message => "message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    ExpressionExpected,
    CloseAngleBracketExpected,
    CloseParenthesesExpected,
    OpenParenthesesExpected,
    BothParenthesesExpected,
    QuestionMarkExpected,
    ParameterMissing,
    NotUnderstood,
    ArgumentNumberExpected,
    ArgumentNumberOrNExpected,
    ArgumentNumberCannotBeZero,
    ValueBeforeHyphenCannotBeN,
    HyphenExpected,
    FirstArgumentNumberLessThanLastArgumentNumber,
    SymbolExpected,
    NestingTooDeep,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::ExpressionExpected => "E2001",
            DiagnosticCode::CloseAngleBracketExpected => "E2002",
            DiagnosticCode::CloseParenthesesExpected => "E2003",
            DiagnosticCode::OpenParenthesesExpected => "E2004",
            DiagnosticCode::BothParenthesesExpected => "E2005",
            DiagnosticCode::QuestionMarkExpected => "E2006",
            DiagnosticCode::ParameterMissing => "E2007",
            DiagnosticCode::NotUnderstood => "E2008",
            DiagnosticCode::ArgumentNumberExpected => "E2101",
            DiagnosticCode::ArgumentNumberOrNExpected => "E2102",
            DiagnosticCode::ArgumentNumberCannotBeZero => "E2103",
            DiagnosticCode::ValueBeforeHyphenCannotBeN => "E2104",
            DiagnosticCode::HyphenExpected => "E2105",
            DiagnosticCode::FirstArgumentNumberLessThanLastArgumentNumber => "E2106",
            DiagnosticCode::SymbolExpected => "E2107",
            DiagnosticCode::NestingTooDeep => "E2201",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            DiagnosticCode::ExpressionExpected => "an expression was expected",
            DiagnosticCode::CloseAngleBracketExpected => "'>' expected",
            DiagnosticCode::CloseParenthesesExpected => "')' expected",
            DiagnosticCode::OpenParenthesesExpected => "'(' expected",
            DiagnosticCode::BothParenthesesExpected => "'(' and ')' expected after the function name",
            DiagnosticCode::QuestionMarkExpected => "'?' expected",
            DiagnosticCode::ParameterMissing => "a parameter is missing",
            DiagnosticCode::NotUnderstood => "this was not understood",
            DiagnosticCode::ArgumentNumberExpected => {
                "an argument number was expected before '-'"
            }
            DiagnosticCode::ArgumentNumberOrNExpected => "an argument number or 'N' was expected",
            DiagnosticCode::ArgumentNumberCannotBeZero => {
                "argument numbers start at 1 and cannot be zero"
            }
            DiagnosticCode::ValueBeforeHyphenCannotBeN => "the value before '-' cannot be 'N'",
            DiagnosticCode::HyphenExpected => "'-' expected",
            DiagnosticCode::FirstArgumentNumberLessThanLastArgumentNumber => {
                "the first argument number must be less than the last argument number"
            }
            DiagnosticCode::SymbolExpected => "a closing symbol was expected",
            DiagnosticCode::NestingTooDeep => "expressions are nested too deeply",
        }
    }
}

impl Serialize for DiagnosticCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<DiagnosticCode>,
    pub severity: DiagnosticSeverity,
    pub description: String,
    pub span: Option<Span>,
    pub can_locate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_object: Option<serde_json::Value>,
}

impl Diagnostic {
    pub fn new(description: impl Into<String>, severity: DiagnosticSeverity) -> Self {
        Self {
            code: None,
            severity,
            description: description.into(),
            span: None,
            can_locate: false,
            associated_object: None,
        }
    }

    pub fn located(
        description: impl Into<String>,
        severity: DiagnosticSeverity,
        start: usize,
        length: usize,
        can_locate: bool,
    ) -> Self {
        Self {
            span: Some(Span::new(start, length)),
            can_locate,
            ..Self::new(description, severity)
        }
    }

    pub(crate) fn coded(
        code: DiagnosticCode,
        severity: DiagnosticSeverity,
        description: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            code: Some(code),
            span: Some(span),
            can_locate: true,
            ..Self::new(description, severity)
        }
    }
}

/// Ordered feedback produced while compiling one template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn add(&mut self, description: impl Into<String>, severity: DiagnosticSeverity) {
        self.push(Diagnostic::new(description, severity));
    }

    pub fn add_with_object(
        &mut self,
        description: impl Into<String>,
        severity: DiagnosticSeverity,
        associated_object: serde_json::Value,
    ) {
        let mut diagnostic = Diagnostic::new(description, severity);
        diagnostic.associated_object = Some(associated_object);
        self.push(diagnostic);
    }

    pub fn add_error(
        &mut self,
        description: impl Into<String>,
        start: usize,
        length: usize,
        can_locate: bool,
    ) {
        self.push(Diagnostic::located(
            description,
            DiagnosticSeverity::Error,
            start,
            length,
            can_locate,
        ));
    }

    pub fn add_warning(
        &mut self,
        description: impl Into<String>,
        start: usize,
        length: usize,
        can_locate: bool,
    ) {
        self.push(Diagnostic::located(
            description,
            DiagnosticSeverity::Warning,
            start,
            length,
            can_locate,
        ));
    }

    pub fn add_message(
        &mut self,
        description: impl Into<String>,
        start: usize,
        length: usize,
        can_locate: bool,
    ) {
        self.push(Diagnostic::located(
            description,
            DiagnosticSeverity::Message,
            start,
            length,
            can_locate,
        ));
    }

    pub fn has(&self, severity: DiagnosticSeverity) -> bool {
        self.entries.iter().any(|entry| entry.severity == severity)
    }

    pub fn has_errors(&self) -> bool {
        self.has(DiagnosticSeverity::Error)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }
}

impl std::ops::Index<usize> for Diagnostics {
    type Output = Diagnostic;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

pub fn render_diagnostics(source: &str, text: &str, diagnostics: &[Diagnostic]) -> String {
    let mut output = String::new();
    for (index, diagnostic) in diagnostics.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        output.push_str(&render_diagnostic(source, text, diagnostic));
    }
    output
}

pub fn render_diagnostic(source: &str, text: &str, diagnostic: &Diagnostic) -> String {
    let mut output = String::new();
    let severity = diagnostic.severity.as_str();
    match diagnostic.code {
        Some(code) => output.push_str(&format!("{severity}[{}]", code.as_str())),
        None => output.push_str(severity),
    }
    match diagnostic.span.filter(|_| diagnostic.can_locate) {
        Some(span) => {
            output.push_str(&format!(
                " {source}:1:{} {}\n",
                span.start + 1,
                diagnostic.description
            ));
            // Templates are single-line command text; newlines would break the caret column.
            let line: String = text
                .chars()
                .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
                .collect();
            output.push_str(&format!("  | {line}\n"));
            output.push_str(&format!(
                "  | {}{}\n",
                " ".repeat(span.start),
                "^".repeat(span.length.max(1))
            ));
        }
        None => output.push_str(&format!(" {source} {}\n", diagnostic.description)),
    }
    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_reports_only_present_severities() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_warning("careful", 0, 1, true);
        diagnostics.add("fyi", DiagnosticSeverity::Message);

        assert!(diagnostics.has(DiagnosticSeverity::Warning));
        assert!(diagnostics.has(DiagnosticSeverity::Message));
        assert!(!diagnostics.has(DiagnosticSeverity::Error));
        assert!(!diagnostics.has_errors());
    }

    #[test]
    fn entries_keep_insertion_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.add_error("first", 3, 0, true);
        diagnostics.add_message("second", 0, 2, false);
        diagnostics.add_with_object(
            "third",
            DiagnosticSeverity::Warning,
            serde_json::json!({ "command": "notepad" }),
        );

        let descriptions: Vec<&str> = diagnostics
            .iter()
            .map(|entry| entry.description.as_str())
            .collect();
        assert_eq!(descriptions, ["first", "second", "third"]);
        assert_eq!(diagnostics[1].span, Some(Span::new(0, 2)));
        assert!(!diagnostics[1].can_locate);
        assert_eq!(
            diagnostics[2].associated_object,
            Some(serde_json::json!({ "command": "notepad" }))
        );
        assert_eq!(diagnostics[2].span, None);
    }

    #[test]
    fn render_includes_code_position_and_caret() {
        let diagnostic = Diagnostic::coded(
            DiagnosticCode::HyphenExpected,
            DiagnosticSeverity::Error,
            DiagnosticCode::HyphenExpected.message(),
            Span::new(2, 0),
        );
        let rendered = render_diagnostic("<input>", "!1x!", &diagnostic);
        assert_eq!(
            rendered,
            "error[E2105] <input>:1:3 '-' expected\n  | !1x!\n  |   ^"
        );
    }

    #[test]
    fn render_without_span_omits_location() {
        let diagnostic = Diagnostic::new("profile not loaded", DiagnosticSeverity::Message);
        assert_eq!(
            render_diagnostic("<input>", "", &diagnostic),
            "message <input> profile not loaded"
        );
    }

    #[test]
    fn serializes_code_as_string() {
        let diagnostic = Diagnostic::coded(
            DiagnosticCode::ParameterMissing,
            DiagnosticSeverity::Error,
            "a parameter is missing",
            Span::new(5, 0),
        );
        let value = serde_json::to_value(&diagnostic).expect("serialize");
        assert_eq!(value["code"], "E2007");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["span"]["start"], 5);
        assert!(value.get("associated_object").is_none());
    }
}
