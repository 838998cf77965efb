use crate::diagnostics::{DiagnosticCode, Span};
use crate::lexer::{Punct, TokenValue};
use crate::surface::ast::{Expr, FunctionCall, Identifier};

use super::{ParseError, Parser};

impl<'a> Parser<'a> {
    pub(super) fn parse_function_call(&mut self, limit: usize) -> Result<Option<Expr>, ParseError> {
        let name = match &self.tokens[self.pos].value {
            TokenValue::Identifier(name) => Identifier { name: name.clone() },
            other => Identifier {
                name: other.to_string(),
            },
        };
        self.pos += 1;

        let Some(next) = self.token_before(limit) else {
            let call = Expr::FunctionCall(FunctionCall {
                name,
                arguments: Vec::new(),
            });
            if !self.allow_unterminated_function_calls {
                self.missing_before_limit(
                    ParseError::new(DiagnosticCode::BothParenthesesExpected),
                    limit,
                )?;
            }
            return Ok(Some(call));
        };
        if next.is_punct(Punct::OpenParenthesis) {
            self.pos += 1;
        } else {
            // Parsed as though the `(` were present. The offending token is not
            // skipped: it still starts the first argument.
            self.log(
                DiagnosticCode::OpenParenthesesExpected,
                Span::new(next.position, 0),
            );
        }

        let close = self.find_closing_paren(self.pos, limit);
        let bound = close.unwrap_or(limit.min(self.tokens.len()));
        let mut arguments = Vec::new();
        let mut after_comma = false;
        loop {
            if self.pos >= bound {
                if after_comma && close.is_some() {
                    self.log_parameter_missing(bound);
                }
                break;
            }
            if self.tokens[self.pos].is_punct(Punct::Comma) {
                self.log_parameter_missing(self.pos);
                self.pos += 1;
                after_comma = true;
                continue;
            }
            let end = self.find_top_level_comma(self.pos, bound).unwrap_or(bound);
            arguments.push(self.parse_expression_group(end)?);
            after_comma = end < bound;
            if after_comma {
                self.pos = end + 1;
            }
        }

        let call = Expr::FunctionCall(FunctionCall { name, arguments });
        match close {
            Some(close) => self.pos = close + 1,
            None if self.allow_unterminated_function_calls && limit >= self.tokens.len() => {}
            None => self.missing_before_limit(
                ParseError::new(DiagnosticCode::CloseParenthesesExpected),
                limit,
            )?,
        }
        Ok(Some(call))
    }

    /// Anchored just before the token that should have followed a comma.
    fn log_parameter_missing(&mut self, index: usize) {
        let position = self.region_end(index).saturating_sub(1);
        self.log(DiagnosticCode::ParameterMissing, Span::new(position, 0));
    }
}
