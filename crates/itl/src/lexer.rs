use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::diagnostics::Span;
use crate::syntax;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    #[default]
    Standard,
    InlineExecution,
    SingleFunction,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Standard => "standard",
            Dialect::InlineExecution => "inline_execution",
            Dialect::SingleFunction => "single_function",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown dialect `{0}` (expected standard, inline or single-function)")]
pub struct DialectParseError(pub String);

impl FromStr for Dialect {
    type Err = DialectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "standard" => Ok(Dialect::Standard),
            "inline" | "inline_execution" => Ok(Dialect::InlineExecution),
            "single_function" | "function" => Ok(Dialect::SingleFunction),
            _ => Err(DialectParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Punct {
    OpenAngleBracket,
    CloseAngleBracket,
    OpenParenthesis,
    CloseParenthesis,
    Comma,
    ExclamationPoint,
    QuestionMark,
    Colon,
    Hyphen,
}

impl Punct {
    pub fn as_char(self) -> char {
        match self {
            Punct::OpenAngleBracket => '<',
            Punct::CloseAngleBracket => '>',
            Punct::OpenParenthesis => '(',
            Punct::CloseParenthesis => ')',
            Punct::Comma => ',',
            Punct::ExclamationPoint => '!',
            Punct::QuestionMark => '?',
            Punct::Colon => ':',
            Punct::Hyphen => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TokenValue {
    Text(String),
    Identifier(String),
    Integer(u32),
    Punct(Punct),
}

impl TokenValue {
    pub fn is_punct(&self, punct: Punct) -> bool {
        matches!(self, TokenValue::Punct(p) if *p == punct)
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Text(text) | TokenValue::Identifier(text) => f.write_str(text),
            TokenValue::Integer(value) => write!(f, "{value}"),
            TokenValue::Punct(punct) => write!(f, "{}", punct.as_char()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub value: TokenValue,
    pub position: usize,
    pub end_position: usize,
}

impl Token {
    pub fn span(&self) -> Span {
        Span::new(self.position, self.end_position - self.position)
    }

    pub fn is_punct(&self, punct: Punct) -> bool {
        self.value.is_punct(punct)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub is_just_text: bool,
}

pub fn lex(dialect: Dialect, content: &str) -> LexOutput {
    let mut lexer = Lexer::new(dialect, content);
    lexer.run();
    let is_just_text = lexer
        .tokens
        .iter()
        .all(|token| matches!(token.value, TokenValue::Text(_)));
    LexOutput {
        tokens: lexer.tokens,
        is_just_text,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Text,
    Expression,
    Angle,
    Paren,
    /// Body of `!..!` or `?..?`, closed by the carried punctuation.
    Substitution(Punct),
    /// Directly after the `:` of an optional substitution.
    DefaultStart,
    DefaultText,
    /// After a parenthesised default, waiting for the closing `?`.
    AfterDefault,
}

#[derive(Debug, Clone, Copy)]
struct RunChar {
    ch: char,
    position: usize,
    escaped: bool,
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
    dialect: Dialect,
    modes: Vec<Mode>,
    run: Vec<RunChar>,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(dialect: Dialect, content: &str) -> Self {
        let root = match dialect {
            Dialect::Standard => Mode::Text,
            Dialect::InlineExecution | Dialect::SingleFunction => Mode::Expression,
        };
        Self {
            chars: content.chars().collect(),
            index: 0,
            dialect,
            modes: vec![root],
            run: Vec::new(),
            tokens: Vec::new(),
        }
    }

    fn run(&mut self) {
        while self.index < self.chars.len() {
            let ch = self.chars[self.index];
            match self.mode() {
                Mode::Text => self.lex_text(ch),
                Mode::Expression | Mode::Angle | Mode::Paren => self.lex_expression(ch),
                Mode::Substitution(close) => self.lex_substitution(ch, close),
                Mode::DefaultStart => self.lex_default_start(ch),
                Mode::DefaultText | Mode::AfterDefault => self.lex_default_text(ch),
            }
        }
        self.flush_run(false);
    }

    fn mode(&self) -> Mode {
        self.modes.last().copied().unwrap_or(Mode::Text)
    }

    fn push_mode(&mut self, mode: Mode) {
        trace!(?mode, position = self.index, "enter scanning mode");
        self.modes.push(mode);
    }

    fn pop_mode(&mut self) {
        // The root mode is never left.
        if self.modes.len() > 1 {
            self.modes.pop();
        }
    }

    fn replace_mode(&mut self, mode: Mode) {
        if self.modes.len() > 1 {
            if let Some(top) = self.modes.last_mut() {
                *top = mode;
            }
        }
    }

    fn lex_text(&mut self, ch: char) {
        match ch {
            syntax::ESCAPE => self.escape(syntax::TEXT_SPECIAL),
            '<' => self.open(Punct::OpenAngleBracket, Mode::Angle),
            '!' => self.open(
                Punct::ExclamationPoint,
                Mode::Substitution(Punct::ExclamationPoint),
            ),
            '?' => self.open(Punct::QuestionMark, Mode::Substitution(Punct::QuestionMark)),
            '>' => {
                self.flush_run(false);
                self.punct(Punct::CloseAngleBracket);
            }
            _ => self.push_char(ch),
        }
    }

    fn lex_expression(&mut self, ch: char) {
        match ch {
            syntax::ESCAPE => self.escape(syntax::EXPRESSION_SPECIAL),
            '(' => {
                self.flush_run(true);
                self.punct(Punct::OpenParenthesis);
                self.push_mode(Mode::Paren);
            }
            ')' => self.close(Punct::CloseParenthesis, Mode::Paren),
            '<' => self.open(Punct::OpenAngleBracket, Mode::Angle),
            '>' => self.close(Punct::CloseAngleBracket, Mode::Angle),
            ',' => {
                self.flush_run(false);
                self.punct(Punct::Comma);
            }
            '!' => self.open(
                Punct::ExclamationPoint,
                Mode::Substitution(Punct::ExclamationPoint),
            ),
            '?' => self.open(Punct::QuestionMark, Mode::Substitution(Punct::QuestionMark)),
            _ => self.push_char(ch),
        }
    }

    fn lex_substitution(&mut self, ch: char, close: Punct) {
        if ch == close.as_char() {
            self.punct(close);
            self.pop_mode();
            return;
        }
        match ch {
            '-' => self.punct(Punct::Hyphen),
            ':' if close == Punct::QuestionMark => {
                self.punct(Punct::Colon);
                self.replace_mode(Mode::DefaultStart);
            }
            '>' | ')' if self.encloses(ch) => self.unwind(ch),
            _ if ch.is_whitespace() => self.index += 1,
            _ if ch.is_ascii_digit() => self.number(),
            _ if syntax::is_ident_start(ch) => self.word(),
            _ => {
                self.tokens.push(Token {
                    value: TokenValue::Text(ch.to_string()),
                    position: self.index,
                    end_position: self.index + 1,
                });
                self.index += 1;
            }
        }
    }

    fn lex_default_start(&mut self, ch: char) {
        if ch == '(' {
            self.replace_mode(Mode::AfterDefault);
            self.punct(Punct::OpenParenthesis);
            self.push_mode(Mode::Paren);
            return;
        }
        self.replace_mode(Mode::DefaultText);
        // `\(` keeps a literal default that starts with a parenthesis.
        if ch == syntax::ESCAPE && self.chars.get(self.index + 1) == Some(&'(') {
            self.run.push(RunChar {
                ch: '(',
                position: self.index,
                escaped: true,
            });
            self.index += 2;
        }
    }

    fn lex_default_text(&mut self, ch: char) {
        match ch {
            syntax::ESCAPE => self.escape(syntax::DEFAULT_TEXT_SPECIAL),
            '?' => {
                self.flush_run(false);
                self.punct(Punct::QuestionMark);
                self.pop_mode();
            }
            '>' | ')' if self.encloses(ch) => self.unwind(ch),
            _ => self.push_char(ch),
        }
    }

    fn enclosing_mode(ch: char) -> Mode {
        if ch == '>' {
            Mode::Angle
        } else {
            Mode::Paren
        }
    }

    fn encloses(&self, ch: char) -> bool {
        self.modes[1..].contains(&Self::enclosing_mode(ch))
    }

    /// Abandons unfinished substitution state so `ch` can close the region around it.
    fn unwind(&mut self, ch: char) {
        let punct = if ch == '>' {
            Punct::CloseAngleBracket
        } else {
            Punct::CloseParenthesis
        };
        self.close(punct, Self::enclosing_mode(ch));
    }

    fn open(&mut self, punct: Punct, mode: Mode) {
        self.flush_run(false);
        self.punct(punct);
        self.push_mode(mode);
    }

    /// Emits `punct` and leaves `mode` along with anything still open inside it.
    /// Without an enclosing `mode` the punctuation is stray and nothing is left.
    fn close(&mut self, punct: Punct, mode: Mode) {
        self.flush_run(false);
        self.punct(punct);
        if !self.modes[1..].contains(&mode) {
            return;
        }
        while self.modes.len() > 1 && self.mode() != mode {
            self.modes.pop();
        }
        self.pop_mode();
    }

    fn punct(&mut self, punct: Punct) {
        self.tokens.push(Token {
            value: TokenValue::Punct(punct),
            position: self.index,
            end_position: self.index + 1,
        });
        self.index += 1;
    }

    fn escape(&mut self, special: &[char]) {
        match self.chars.get(self.index + 1) {
            Some(next) if special.contains(next) => {
                self.run.push(RunChar {
                    ch: *next,
                    position: self.index,
                    escaped: true,
                });
                self.index += 2;
            }
            _ => self.push_char(syntax::ESCAPE),
        }
    }

    fn push_char(&mut self, ch: char) {
        self.run.push(RunChar {
            ch,
            position: self.index,
            escaped: false,
        });
        self.index += 1;
    }

    fn number(&mut self) {
        let start = self.index;
        while self.index < self.chars.len() && self.chars[self.index].is_ascii_digit() {
            self.index += 1;
        }
        let digits: String = self.chars[start..self.index].iter().collect();
        let value = match digits.parse::<u32>() {
            Ok(number) => TokenValue::Integer(number),
            Err(_) => TokenValue::Text(digits),
        };
        self.tokens.push(Token {
            value,
            position: start,
            end_position: self.index,
        });
    }

    fn word(&mut self) {
        let start = self.index;
        while self.index < self.chars.len() && syntax::is_ident_continue(self.chars[self.index]) {
            self.index += 1;
        }
        self.tokens.push(Token {
            value: TokenValue::Identifier(self.chars[start..self.index].iter().collect()),
            position: start,
            end_position: self.index,
        });
    }

    fn leading_function_name(&self) -> bool {
        self.dialect == Dialect::SingleFunction && self.tokens.is_empty() && self.modes.len() == 1
    }

    /// Emits the pending text run. Before `(` its trailing word becomes the function name.
    fn flush_run(&mut self, before_paren: bool) {
        if self.run.is_empty() {
            return;
        }
        let run = std::mem::take(&mut self.run);
        let end = self.index;
        let trailing = trailing_identifier_len(&run);
        let ident_len =
            if before_paren || (trailing == run.len() && self.leading_function_name()) {
                trailing
            } else {
                0
            };

        let split = run.len() - ident_len;
        if split > 0 {
            let text_end = if ident_len > 0 {
                run[split].position
            } else {
                end
            };
            self.tokens.push(Token {
                value: TokenValue::Text(run[..split].iter().map(|c| c.ch).collect()),
                position: run[0].position,
                end_position: text_end,
            });
        }
        if ident_len > 0 {
            self.tokens.push(Token {
                value: TokenValue::Identifier(run[split..].iter().map(|c| c.ch).collect()),
                position: run[split].position,
                end_position: end,
            });
        }
    }
}

fn trailing_identifier_len(run: &[RunChar]) -> usize {
    let mut len = run
        .iter()
        .rev()
        .take_while(|c| !c.escaped && syntax::is_ident_continue(c.ch))
        .count();
    while len > 0 && !syntax::is_ident_start(run[run.len() - len].ch) {
        len -= 1;
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(dialect: Dialect, src: &str) -> Vec<TokenValue> {
        lex(dialect, src)
            .tokens
            .into_iter()
            .map(|token| token.value)
            .collect()
    }

    fn text(value: &str) -> TokenValue {
        TokenValue::Text(value.to_string())
    }

    fn ident(value: &str) -> TokenValue {
        TokenValue::Identifier(value.to_string())
    }

    fn punct(punct: Punct) -> TokenValue {
        TokenValue::Punct(punct)
    }

    #[test]
    fn standard_plain_text_is_one_literal() {
        let output = lex(Dialect::Standard, "notepad C:\\notes\\todo.txt (draft), v2");
        assert!(output.is_just_text);
        assert_eq!(output.tokens.len(), 1);
        assert_eq!(output.tokens[0].value, text("notepad C:\\notes\\todo.txt (draft), v2"));
        assert_eq!(output.tokens[0].position, 0);
        assert_eq!(output.tokens[0].end_position, 37);
    }

    #[test]
    fn empty_input_has_no_tokens() {
        let output = lex(Dialect::Standard, "");
        assert!(output.tokens.is_empty());
        assert!(output.is_just_text);
    }

    #[test]
    fn escapes_only_apply_to_special_characters() {
        let output = lex(Dialect::Standard, "wow\\! really\\?");
        assert!(output.is_just_text);
        assert_eq!(
            output.tokens.iter().map(|t| t.value.clone()).collect::<Vec<_>>(),
            vec![text("wow! really?")]
        );
        assert_eq!(output.tokens[0].end_position, 14);
    }

    #[test]
    fn imperative_substitution_tokens() {
        assert_eq!(
            values(Dialect::Standard, "run !2-N! now"),
            vec![
                text("run "),
                punct(Punct::ExclamationPoint),
                TokenValue::Integer(2),
                punct(Punct::Hyphen),
                ident("N"),
                punct(Punct::ExclamationPoint),
                text(" now"),
            ]
        );
    }

    #[test]
    fn substitution_body_skips_whitespace_and_tracks_spans() {
        let output = lex(Dialect::Standard, "! 12 !");
        let spans: Vec<(usize, usize)> = output
            .tokens
            .iter()
            .map(|t| (t.position, t.end_position))
            .collect();
        assert_eq!(spans, vec![(0, 1), (2, 4), (5, 6)]);
        assert!(!output.is_just_text);
    }

    #[test]
    fn too_large_argument_number_stays_text() {
        assert_eq!(
            values(Dialect::Standard, "!99999999999!")[1],
            text("99999999999")
        );
    }

    #[test]
    fn optional_substitution_with_literal_default() {
        assert_eq!(
            values(Dialect::Standard, "?1:hello world!?"),
            vec![
                punct(Punct::QuestionMark),
                TokenValue::Integer(1),
                punct(Punct::Colon),
                text("hello world!"),
                punct(Punct::QuestionMark),
            ]
        );
    }

    #[test]
    fn optional_substitution_with_parenthesised_default() {
        assert_eq!(
            values(Dialect::Standard, "?1:(a!2!)?"),
            vec![
                punct(Punct::QuestionMark),
                TokenValue::Integer(1),
                punct(Punct::Colon),
                punct(Punct::OpenParenthesis),
                text("a"),
                punct(Punct::ExclamationPoint),
                TokenValue::Integer(2),
                punct(Punct::ExclamationPoint),
                punct(Punct::CloseParenthesis),
                punct(Punct::QuestionMark),
            ]
        );
    }

    #[test]
    fn escaped_open_paren_starts_a_literal_default() {
        assert_eq!(
            values(Dialect::Standard, "?1:\\(x?")[3],
            text("(x")
        );
    }

    #[test]
    fn angle_group_switches_to_expression_mode() {
        assert_eq!(
            values(Dialect::Standard, "go <upper(a, !1!)> (x)"),
            vec![
                text("go "),
                punct(Punct::OpenAngleBracket),
                ident("upper"),
                punct(Punct::OpenParenthesis),
                text("a"),
                punct(Punct::Comma),
                text(" "),
                punct(Punct::ExclamationPoint),
                TokenValue::Integer(1),
                punct(Punct::ExclamationPoint),
                punct(Punct::CloseParenthesis),
                punct(Punct::CloseAngleBracket),
                text(" (x)"),
            ]
        );
    }

    #[test]
    fn inline_splits_trailing_word_before_paren() {
        let output = lex(Dialect::InlineExecution, "say hi(x)");
        assert_eq!(
            output.tokens.iter().map(|t| t.value.clone()).collect::<Vec<_>>(),
            vec![
                text("say "),
                ident("hi"),
                punct(Punct::OpenParenthesis),
                text("x"),
                punct(Punct::CloseParenthesis),
            ]
        );
        assert_eq!(output.tokens[1].position, 4);
        assert_eq!(output.tokens[1].end_position, 6);
        assert!(!output.is_just_text);
    }

    #[test]
    fn inline_word_without_paren_is_text() {
        assert_eq!(values(Dialect::InlineExecution, "foo"), vec![text("foo")]);
    }

    #[test]
    fn single_function_leading_word_is_identifier() {
        assert_eq!(values(Dialect::SingleFunction, "foo"), vec![ident("foo")]);
        assert_eq!(
            values(Dialect::SingleFunction, "foo bar"),
            vec![text("foo bar")]
        );
    }

    #[test]
    fn escaped_character_breaks_identifier() {
        let tokens = values(Dialect::InlineExecution, "a\\,b(");
        assert_eq!(tokens[0], text("a,"));
        assert_eq!(tokens[1], ident("b"));
        assert_eq!(
            values(Dialect::InlineExecution, "\\(x")[0],
            text("(x")
        );
    }

    #[test]
    fn close_angle_inside_substitution_closes_group() {
        assert_eq!(
            values(Dialect::Standard, "<!1>x"),
            vec![
                punct(Punct::OpenAngleBracket),
                punct(Punct::ExclamationPoint),
                TokenValue::Integer(1),
                punct(Punct::CloseAngleBracket),
                text("x"),
            ]
        );
    }

    #[test]
    fn close_angle_leaves_unclosed_parens() {
        assert_eq!(
            values(Dialect::Standard, "<f(x>!1!"),
            vec![
                punct(Punct::OpenAngleBracket),
                ident("f"),
                punct(Punct::OpenParenthesis),
                text("x"),
                punct(Punct::CloseAngleBracket),
                punct(Punct::ExclamationPoint),
                TokenValue::Integer(1),
                punct(Punct::ExclamationPoint),
            ]
        );
    }

    #[test]
    fn stray_close_angle_in_text_is_punctuation() {
        assert_eq!(
            values(Dialect::Standard, "a>b"),
            vec![text("a"), punct(Punct::CloseAngleBracket), text("b")]
        );
    }

    #[test]
    fn positions_are_character_offsets() {
        let output = lex(Dialect::Standard, "héllo !1!");
        assert_eq!(output.tokens[0].end_position, 6);
        assert_eq!(output.tokens[1].position, 6);
    }

    #[test]
    fn dialect_parses_from_cli_spellings() {
        assert_eq!("inline".parse::<Dialect>(), Ok(Dialect::InlineExecution));
        assert_eq!(
            "single-function".parse::<Dialect>(),
            Ok(Dialect::SingleFunction)
        );
        assert_eq!("Standard".parse::<Dialect>(), Ok(Dialect::Standard));
        assert!("fancy".parse::<Dialect>().is_err());
    }
}
