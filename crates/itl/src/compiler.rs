use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics, Span};
use crate::lexer::{lex, Dialect};
use crate::surface::{parse_tokens, ExpressionGroup};

/// Result of compiling one template.
///
/// `expression` is `None` only when parsing was abandoned; the final entry of
/// `diagnostics` then says why.
#[derive(Debug, Clone, Serialize)]
pub struct Compilation {
    pub expression: Option<ExpressionGroup>,
    pub diagnostics: Diagnostics,
    pub is_just_text: bool,
}

impl Compilation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    pub dialect: Dialect,
    /// Accept calls whose `)` has not been typed yet.
    pub allow_unterminated_function_calls: bool,
}

impl CompileOptions {
    pub fn compile(&self, text: &str) -> Compilation {
        compile(self.dialect, text, self.allow_unterminated_function_calls)
    }
}

pub fn compile(dialect: Dialect, text: &str, allow_unterminated_function_calls: bool) -> Compilation {
    let span = debug_span!("compile", dialect = dialect.as_str(), len = text.len());
    let _guard = span.enter();

    let lexed = lex(dialect, text);
    let input_len = text.chars().count();
    let mut diagnostics = Diagnostics::new();
    let expression = match parse_tokens(
        &lexed.tokens,
        &mut diagnostics,
        input_len,
        allow_unterminated_function_calls,
    ) {
        Ok(group) => Some(group),
        Err(err) => {
            debug!(code = err.code.as_str(), message = %err.message, "parse abandoned");
            diagnostics.push(Diagnostic::coded(
                err.code,
                DiagnosticSeverity::Error,
                err.message,
                Span::new(input_len.saturating_sub(1), 0),
            ));
            None
        }
    };
    debug!(
        tokens = lexed.tokens.len(),
        diagnostics = diagnostics.len(),
        is_just_text = lexed.is_just_text,
        "compiled template"
    );
    Compilation {
        expression,
        diagnostics,
        is_just_text: lexed.is_just_text,
    }
}
