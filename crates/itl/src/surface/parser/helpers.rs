use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSeverity, Span};
use crate::lexer::{Punct, Token};

use super::{ParseError, Parser};

impl<'a> Parser<'a> {
    pub(super) fn token_before(&self, limit: usize) -> Option<&'a Token> {
        if self.pos >= limit {
            return None;
        }
        self.tokens.get(self.pos)
    }

    pub(super) fn peek_punct_at(&self, index: usize, punct: Punct, limit: usize) -> bool {
        index < limit
            && self
                .tokens
                .get(index)
                .is_some_and(|token| token.is_punct(punct))
    }

    pub(super) fn consume_punct(&mut self, punct: Punct, limit: usize) -> bool {
        if self.peek_punct_at(self.pos, punct, limit) {
            self.pos += 1;
            return true;
        }
        false
    }

    /// Character offset where the region bounded by `limit` ends.
    pub(super) fn region_end(&self, limit: usize) -> usize {
        self.tokens
            .get(limit)
            .map(|token| token.position)
            .unwrap_or(self.input_len)
    }

    /// First `punct` in `from..limit`, ignoring nesting.
    pub(super) fn find_punct(&self, punct: Punct, from: usize, limit: usize) -> Option<usize> {
        let end = limit.min(self.tokens.len());
        (from..end).find(|&index| self.tokens[index].is_punct(punct))
    }

    /// The `)` closing a paren whose contents start at `from`.
    pub(super) fn find_closing_paren(&self, from: usize, limit: usize) -> Option<usize> {
        self.find_at_depth_zero(from, limit, |token| {
            token.is_punct(Punct::CloseParenthesis)
        })
    }

    pub(super) fn find_top_level_comma(&self, from: usize, limit: usize) -> Option<usize> {
        self.find_at_depth_zero(from, limit, |token| token.is_punct(Punct::Comma))
    }

    fn find_at_depth_zero(
        &self,
        from: usize,
        limit: usize,
        is_terminator: impl Fn(&Token) -> bool,
    ) -> Option<usize> {
        let end = limit.min(self.tokens.len());
        let mut depth = 0usize;
        for index in from..end {
            let token = &self.tokens[index];
            if depth == 0 && is_terminator(token) {
                return Some(index);
            }
            if token.is_punct(Punct::OpenParenthesis) {
                depth += 1;
            } else if token.is_punct(Punct::CloseParenthesis) {
                // An unbalanced `)` belongs to an enclosing region.
                if depth == 0 {
                    return None;
                }
                depth -= 1;
            }
        }
        None
    }

    pub(super) fn emit_diag(&mut self, code: DiagnosticCode, message: &str, span: Span) {
        self.diagnostics.push(Diagnostic::coded(
            code,
            DiagnosticSeverity::Error,
            message,
            span,
        ));
    }

    pub(super) fn log(&mut self, code: DiagnosticCode, span: Span) {
        self.emit_diag(code, code.message(), span);
    }

    pub(super) fn log_at_region_end(&mut self, code: DiagnosticCode, limit: usize) {
        let span = Span::new(self.region_end(limit), 0);
        self.log(code, span);
    }

    pub(super) fn not_understood(&mut self, token: &Token) {
        let message = format!("'{}' was not understood", token.value);
        self.emit_diag(DiagnosticCode::NotUnderstood, &message, token.span());
    }

    /// Something was still expected when the tokens before `limit` ran out.
    ///
    /// Running off the end of the input is fatal. Reaching the end of an
    /// enclosing region is logged there and parsing continues after it.
    pub(super) fn missing_before_limit(
        &mut self,
        error: ParseError,
        limit: usize,
    ) -> Result<(), ParseError> {
        if limit >= self.tokens.len() {
            return Err(error);
        }
        let span = Span::new(self.region_end(limit), 0);
        self.emit_diag(error.code, &error.message, span);
        self.pos = limit;
        Ok(())
    }
}
