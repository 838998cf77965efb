use crate::diagnostics::{DiagnosticCode, Span};
use crate::lexer::{Punct, Token, TokenValue};
use crate::surface::ast::{ArgumentSubstitution, Expr, OptionalSubstitution};
use crate::syntax;

use super::{ParseError, Parser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubstitutionMarker {
    Imperative,
    Optional,
}

impl SubstitutionMarker {
    fn closing(self) -> Punct {
        match self {
            SubstitutionMarker::Imperative => Punct::ExclamationPoint,
            SubstitutionMarker::Optional => Punct::QuestionMark,
        }
    }

    fn ends_body(self, token: &Token) -> bool {
        token.is_punct(self.closing())
            || (self == SubstitutionMarker::Optional && token.is_punct(Punct::Colon))
    }
}

enum ArgumentNumber {
    Number(u32),
    OpenBound,
    Invalid,
}

impl<'a> Parser<'a> {
    pub(super) fn parse_imperative(&mut self, limit: usize) -> Result<Option<Expr>, ParseError> {
        let substitution =
            self.parse_argument_substitution(SubstitutionMarker::Imperative, limit)?;
        if !self.consume_punct(Punct::ExclamationPoint, limit) {
            return Ok(None);
        }
        Ok(substitution.map(Expr::ImperativeSubstitution))
    }

    pub(super) fn parse_optional(&mut self, limit: usize) -> Result<Option<Expr>, ParseError> {
        let substitution = self.parse_argument_substitution(SubstitutionMarker::Optional, limit)?;
        let Some(token) = self.token_before(limit) else {
            return Ok(None);
        };
        self.pos += 1;
        let default_value = if token.is_punct(Punct::Colon) {
            match self.parse_default_value(token, limit)? {
                Some(value) => Some(Box::new(value)),
                None => return Ok(None),
            }
        } else {
            None
        };
        Ok(substitution.map(|substitution| {
            Expr::OptionalSubstitution(OptionalSubstitution {
                substitution,
                default_value,
            })
        }))
    }

    /// Parses the body after `!` or `?`. On return the cursor rests on the
    /// token that ended the body, or on `limit` when there was none.
    fn parse_argument_substitution(
        &mut self,
        marker: SubstitutionMarker,
        limit: usize,
    ) -> Result<Option<ArgumentSubstitution>, ParseError> {
        let open = self.tokens[self.pos].position;
        self.pos += 1;
        let mut substitution = ArgumentSubstitution::default();
        let mut valid = true;
        let mut slot = 1;
        loop {
            let Some(token) = self.token_before(limit) else {
                self.unterminated_substitution(marker, limit)?;
                return Ok(None);
            };
            if marker.ends_body(token) {
                if slot == 1 {
                    self.log(
                        DiagnosticCode::ArgumentNumberOrNExpected,
                        Span::new(token.position, 0),
                    );
                    valid = false;
                }
                break;
            }
            match slot {
                1 => {
                    let hyphen_follows = self.peek_punct_at(self.pos + 1, Punct::Hyphen, limit);
                    match self.argument_number(token, hyphen_follows) {
                        ArgumentNumber::Number(number) => {
                            substitution.argument_number = Some(number)
                        }
                        ArgumentNumber::OpenBound => {}
                        ArgumentNumber::Invalid => valid = false,
                    }
                }
                2 => {
                    if token.is_punct(Punct::Hyphen) {
                        substitution.singular = false;
                    } else {
                        self.log(DiagnosticCode::HyphenExpected, Span::new(token.position, 0));
                        valid = false;
                    }
                }
                3 => match self.argument_number(token, false) {
                    ArgumentNumber::Number(number) => {
                        substitution.last_argument_number = Some(number)
                    }
                    ArgumentNumber::OpenBound => {}
                    ArgumentNumber::Invalid => valid = false,
                },
                _ => {
                    self.skip_substitution_tail(marker, limit)?;
                    return Ok(None);
                }
            }
            self.pos += 1;
            slot += 1;
        }

        if let (false, Some(first), Some(last)) = (
            substitution.singular,
            substitution.argument_number,
            substitution.last_argument_number,
        ) {
            if first > last {
                let end = self.tokens[self.pos].end_position;
                self.log(
                    DiagnosticCode::FirstArgumentNumberLessThanLastArgumentNumber,
                    Span::new(open, end - open),
                );
                valid = false;
            }
        }
        Ok(valid.then_some(substitution))
    }

    fn argument_number(&mut self, token: &Token, hyphen_follows: bool) -> ArgumentNumber {
        match &token.value {
            TokenValue::Integer(0) => {
                self.log(DiagnosticCode::ArgumentNumberCannotBeZero, token.span());
                ArgumentNumber::Invalid
            }
            TokenValue::Integer(number) => ArgumentNumber::Number(*number),
            TokenValue::Identifier(name) if syntax::is_open_bound(name) => {
                if hyphen_follows {
                    self.log(DiagnosticCode::ValueBeforeHyphenCannotBeN, token.span());
                    return ArgumentNumber::Invalid;
                }
                ArgumentNumber::OpenBound
            }
            _ => {
                let code = if hyphen_follows {
                    DiagnosticCode::ArgumentNumberExpected
                } else {
                    DiagnosticCode::ArgumentNumberOrNExpected
                };
                self.log(code, token.span());
                ArgumentNumber::Invalid
            }
        }
    }

    /// Logs every token up to the body's end; the cursor stops on the terminator.
    fn skip_substitution_tail(
        &mut self,
        marker: SubstitutionMarker,
        limit: usize,
    ) -> Result<(), ParseError> {
        while let Some(token) = self.token_before(limit) {
            if marker.ends_body(token) {
                return Ok(());
            }
            self.not_understood(token);
            self.pos += 1;
        }
        self.unterminated_substitution(marker, limit)
    }

    fn unterminated_substitution(
        &mut self,
        marker: SubstitutionMarker,
        limit: usize,
    ) -> Result<(), ParseError> {
        let error = ParseError::with_message(
            DiagnosticCode::SymbolExpected,
            format!("'{}' expected", marker.closing().as_char()),
        );
        self.missing_before_limit(error, limit)
    }

    /// Parses the default after `?n:` up to and including the closing `?`.
    fn parse_default_value(
        &mut self,
        colon: &Token,
        limit: usize,
    ) -> Result<Option<Expr>, ParseError> {
        let Some(token) = self.token_before(limit) else {
            self.log_at_region_end(DiagnosticCode::QuestionMarkExpected, limit);
            return Ok(None);
        };
        let value = match &token.value {
            TokenValue::Punct(Punct::OpenParenthesis) => {
                self.pos += 1;
                let Some(close) = self.find_closing_paren(self.pos, limit) else {
                    self.log_at_region_end(DiagnosticCode::CloseParenthesesExpected, limit);
                    self.parse_expression_group(limit)?;
                    return Ok(None);
                };
                let group = self.parse_expression_group(close)?;
                self.pos = close + 1;
                Expr::Group(group)
            }
            TokenValue::Text(text) => {
                self.pos += 1;
                Expr::literal(text.clone())
            }
            TokenValue::Punct(Punct::QuestionMark) => {
                self.log(
                    DiagnosticCode::ExpressionExpected,
                    Span::new(colon.end_position, 0),
                );
                self.pos += 1;
                return Ok(None);
            }
            _ => {
                self.log(
                    DiagnosticCode::ExpressionExpected,
                    Span::new(colon.end_position, 0),
                );
                self.skip_to_closing_question(limit)?;
                return Ok(None);
            }
        };

        match self.token_before(limit) {
            Some(next) if next.is_punct(Punct::QuestionMark) => {
                self.pos += 1;
                Ok(Some(value))
            }
            Some(next) => {
                self.log(DiagnosticCode::QuestionMarkExpected, next.span());
                match self.find_punct(Punct::QuestionMark, self.pos, limit) {
                    Some(question) => self.pos = question + 1,
                    None => self.pos = limit,
                }
                Ok(None)
            }
            None => {
                self.log_at_region_end(DiagnosticCode::QuestionMarkExpected, limit);
                Ok(None)
            }
        }
    }

    fn skip_to_closing_question(&mut self, limit: usize) -> Result<(), ParseError> {
        while let Some(token) = self.token_before(limit) {
            self.pos += 1;
            if token.is_punct(Punct::QuestionMark) {
                return Ok(());
            }
            self.not_understood(token);
        }
        self.missing_before_limit(ParseError::new(DiagnosticCode::QuestionMarkExpected), limit)
    }
}
