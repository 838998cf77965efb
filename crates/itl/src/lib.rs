//! Front end for ITL, the launcher's command template language.
//!
//! Templates are scanned by [`lex`], parsed into an [`ExpressionGroup`] and
//! checked in one pass by [`compile`]. Problems are reported through
//! [`Diagnostics`] rather than as errors; a parse that cannot continue still
//! yields a [`Compilation`], with no tree and a final diagnostic.

pub mod compiler;
pub mod config;
pub mod diagnostics;
pub mod formatter;
pub mod lexer;
pub mod surface;
pub mod syntax;

pub use compiler::{compile, Compilation, CompileOptions};
pub use config::{find_itl_toml, parse_itl_toml, read_itl_toml, ItlToml, CONFIG_FILE_NAME};
pub use diagnostics::{
    render_diagnostic, render_diagnostics, Diagnostic, DiagnosticCode, DiagnosticSeverity,
    Diagnostics, Span,
};
pub use formatter::{format_template, render_template};
pub use lexer::{lex, Dialect, DialectParseError, LexOutput, Punct, Token, TokenValue};
pub use surface::{
    parse_tokens, ArgumentSubstitution, Expr, ExpressionGroup, FunctionCall, Identifier,
    OptionalSubstitution, ParseError, StringLiteral,
};

#[derive(Debug, thiserror::Error)]
pub enum ItlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Diagnostics reported")]
    Diagnostics,
}
