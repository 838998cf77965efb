use crate::compiler::compile;
use crate::diagnostics::Diagnostics;
use crate::lexer::Dialect;
use crate::surface::{ArgumentSubstitution, Expr, ExpressionGroup, OptionalSubstitution};
use crate::syntax;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Text,
    Expression,
}

impl Context {
    fn special(self) -> &'static [char] {
        match self {
            Context::Text => syntax::TEXT_SPECIAL,
            Context::Expression => syntax::EXPRESSION_SPECIAL,
        }
    }
}

/// Writes `group` back as template text that compiles to the same tree.
pub fn render_template(dialect: Dialect, group: &ExpressionGroup) -> String {
    let context = match dialect {
        Dialect::Standard => Context::Text,
        Dialect::InlineExecution | Dialect::SingleFunction => Context::Expression,
    };
    let mut output = String::new();
    render_group(&mut output, group, context);
    output
}

/// Compiles `text` and renders it in canonical form.
pub fn format_template(dialect: Dialect, text: &str) -> Result<String, Diagnostics> {
    let compilation = compile(dialect, text, false);
    if compilation.has_errors() {
        return Err(compilation.diagnostics);
    }
    match compilation.expression {
        Some(group) => Ok(render_template(dialect, &group)),
        None => Err(compilation.diagnostics),
    }
}

fn render_group(output: &mut String, group: &ExpressionGroup, context: Context) {
    for expr in &group.expressions {
        render_expr(output, expr, context);
    }
}

fn render_expr(output: &mut String, expr: &Expr, context: Context) {
    match expr {
        Expr::StringLiteral(literal) => push_escaped(output, &literal.text, context.special()),
        Expr::Identifier(identifier) => output.push_str(&identifier.name),
        Expr::Group(group) => {
            output.push('<');
            render_group(output, group, Context::Expression);
            output.push('>');
        }
        Expr::FunctionCall(call) => {
            if context == Context::Text {
                output.push('<');
            }
            output.push_str(&call.name.name);
            output.push('(');
            for (index, argument) in call.arguments.iter().enumerate() {
                if index > 0 {
                    output.push(',');
                }
                render_group(output, argument, Context::Expression);
            }
            output.push(')');
            if context == Context::Text {
                output.push('>');
            }
        }
        Expr::ImperativeSubstitution(substitution) => {
            output.push('!');
            render_substitution_body(output, substitution);
            output.push('!');
        }
        Expr::OptionalSubstitution(optional) => render_optional(output, optional),
    }
}

fn render_optional(output: &mut String, optional: &OptionalSubstitution) {
    output.push('?');
    render_substitution_body(output, &optional.substitution);
    if let Some(default_value) = &optional.default_value {
        output.push(':');
        match default_value.as_ref() {
            Expr::StringLiteral(literal) => {
                // A leading `(` would open a parenthesised default.
                let text = match literal.text.strip_prefix('(') {
                    Some(rest) => {
                        output.push_str("\\(");
                        rest
                    }
                    None => literal.text.as_str(),
                };
                push_escaped(output, text, syntax::DEFAULT_TEXT_SPECIAL);
            }
            Expr::Group(group) => {
                output.push('(');
                render_group(output, group, Context::Expression);
                output.push(')');
            }
            other => {
                output.push('(');
                render_expr(output, other, Context::Expression);
                output.push(')');
            }
        }
    }
    output.push('?');
}

fn render_substitution_body(output: &mut String, substitution: &ArgumentSubstitution) {
    if substitution.singular {
        push_bound(output, substitution.argument_number);
        return;
    }
    // A range always has a numeric start.
    output.push_str(&substitution.argument_number.unwrap_or(1).to_string());
    output.push('-');
    push_bound(output, substitution.last_argument_number);
}

fn push_bound(output: &mut String, bound: Option<u32>) {
    match bound {
        Some(number) => output.push_str(&number.to_string()),
        None => output.push_str(syntax::OPEN_BOUND),
    }
}

fn push_escaped(output: &mut String, text: &str, special: &[char]) {
    for ch in text.chars() {
        if special.contains(&ch) {
            output.push(syntax::ESCAPE);
        }
        output.push(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reformat(dialect: Dialect, text: &str) -> String {
        format_template(dialect, text).expect("template compiles cleanly")
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(
            reformat(Dialect::Standard, "notepad C:\\notes\\todo.txt"),
            "notepad C:\\notes\\todo.txt"
        );
    }

    #[test]
    fn substitution_bodies_are_normalised() {
        assert_eq!(
            reformat(Dialect::Standard, "copy ! 1 - n ! to ?2?"),
            "copy !1-N! to ?2?"
        );
        assert_eq!(reformat(Dialect::Standard, "!n!"), "!N!");
        assert_eq!(reformat(Dialect::Standard, "!3-!"), "!3-N!");
    }

    #[test]
    fn escapes_are_reemitted_where_needed() {
        assert_eq!(reformat(Dialect::Standard, "wow\\!"), "wow\\!");
        assert_eq!(
            reformat(Dialect::InlineExecution, "a\\,b"),
            "a\\,b"
        );
    }

    #[test]
    fn defaults_keep_their_form() {
        assert_eq!(reformat(Dialect::Standard, "?1:hello?"), "?1:hello?");
        assert_eq!(reformat(Dialect::Standard, "?1:\\(x?"), "?1:\\(x?");
        assert_eq!(
            reformat(Dialect::Standard, "?1:(a !2!)?"),
            "?1:(a !2!)?"
        );
    }

    #[test]
    fn calls_and_groups_render_in_expression_syntax() {
        assert_eq!(
            reformat(Dialect::Standard, "run <upper(a,!1!)> now"),
            "run <upper(a,!1!)> now"
        );
        assert_eq!(reformat(Dialect::InlineExecution, "f(g(x),y)"), "f(g(x),y)");
    }

    #[test]
    fn call_in_text_context_is_wrapped() {
        let group = ExpressionGroup::new(vec![Expr::FunctionCall(crate::surface::FunctionCall {
            name: crate::surface::Identifier {
                name: "upper".to_string(),
            },
            arguments: vec![ExpressionGroup::new(vec![Expr::literal("x")])],
        })]);
        assert_eq!(render_template(Dialect::Standard, &group), "<upper(x)>");
        assert_eq!(render_template(Dialect::InlineExecution, &group), "upper(x)");
    }

    #[test]
    fn errors_are_returned_instead_of_text() {
        let diagnostics = format_template(Dialect::Standard, "!3-1!").unwrap_err();
        assert_eq!(diagnostics.len(), 1);
    }
}
