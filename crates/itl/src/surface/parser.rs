use tracing::trace;

use crate::diagnostics::{DiagnosticCode, Diagnostics};
use crate::lexer::{Punct, Token, TokenValue};

use super::ast::*;

mod calls;
mod helpers;
mod substitution;

/// Deepest group nesting accepted before parsing is abandoned.
pub const MAX_NESTING: usize = 256;

/// A failure that aborts the whole parse. Recoverable problems are logged into
/// the diagnostics collection instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub code: DiagnosticCode,
    pub message: String,
}

impl ParseError {
    pub fn new(code: DiagnosticCode) -> Self {
        Self::with_message(code, code.message())
    }

    pub fn with_message(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Parses the whole token sequence into the root group.
///
/// `input_len` is the character length of the scanned text; errors that run
/// off the end of the tokens are anchored there.
pub fn parse_tokens(
    tokens: &[Token],
    diagnostics: &mut Diagnostics,
    input_len: usize,
    allow_unterminated_function_calls: bool,
) -> Result<ExpressionGroup, ParseError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        diagnostics,
        input_len,
        allow_unterminated_function_calls,
        depth: 0,
    };
    let group = parser.parse_expression_group(tokens.len())?;
    trace!(expressions = group.expressions.len(), "parsed root group");
    Ok(group)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    diagnostics: &'a mut Diagnostics,
    input_len: usize,
    allow_unterminated_function_calls: bool,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn parse_expression_group(&mut self, stop: usize) -> Result<ExpressionGroup, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::new(DiagnosticCode::NestingTooDeep));
        }
        self.depth += 1;
        let mut expressions = Vec::new();
        while self.pos < stop {
            if let Some(expr) = self.parse_expression(stop)? {
                expressions.push(expr);
            }
        }
        self.depth -= 1;
        Ok(ExpressionGroup::new(expressions))
    }

    fn parse_expression(&mut self, limit: usize) -> Result<Option<Expr>, ParseError> {
        let Some(token) = self.token_before(limit) else {
            return Err(ParseError::new(DiagnosticCode::ExpressionExpected));
        };
        match &token.value {
            TokenValue::Text(text) => {
                self.pos += 1;
                Ok(Some(Expr::literal(text.clone())))
            }
            TokenValue::Identifier(_) => self.parse_function_call(limit),
            TokenValue::Punct(Punct::OpenAngleBracket) => self.parse_angle_group(limit),
            TokenValue::Punct(Punct::ExclamationPoint) => self.parse_imperative(limit),
            TokenValue::Punct(Punct::QuestionMark) => self.parse_optional(limit),
            _ => {
                self.not_understood(token);
                self.pos += 1;
                Ok(None)
            }
        }
    }

    fn parse_angle_group(&mut self, limit: usize) -> Result<Option<Expr>, ParseError> {
        self.pos += 1;
        let close = self.find_punct(Punct::CloseAngleBracket, self.pos, limit);
        let end = match close {
            Some(close) => close,
            None => {
                self.log_at_region_end(DiagnosticCode::CloseAngleBracketExpected, limit);
                limit
            }
        };
        let group = self.parse_expression_group(end)?;
        if close.is_some() {
            self.pos = end + 1;
        }
        Ok(Some(Expr::Group(group)))
    }
}
