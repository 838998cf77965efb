mod ast;
mod parser;

pub use ast::*;
pub use parser::{parse_tokens, ParseError, MAX_NESTING};
