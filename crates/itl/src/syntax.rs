/// Escapes the next character when that character is special in the current scanning mode.
/// Anywhere else a backslash is ordinary text, so paths like `C:\tools\` need no quoting.
pub const ESCAPE: char = '\\';

/// Identifier used in substitutions for an open bound ("all" / "through the last").
pub const OPEN_BOUND: &str = "N";

/// Characters with a meaning of their own in literal text (the `Standard` root).
pub const TEXT_SPECIAL: &[char] = &['!', '?', '<', '>'];

/// Characters with a meaning of their own inside `<...>`, `(...)` and the inline dialects.
pub const EXPRESSION_SPECIAL: &[char] = &['!', '?', '<', '>', '(', ')', ','];

/// Characters that end the literal default of `?n:default?`.
pub const DEFAULT_TEXT_SPECIAL: &[char] = &['?', '>', ')'];

pub fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

pub fn is_ident_continue(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

pub fn is_open_bound(text: &str) -> bool {
    text.eq_ignore_ascii_case(OPEN_BOUND)
}
