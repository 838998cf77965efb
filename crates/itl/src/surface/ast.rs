use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringLiteral {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExpressionGroup {
    pub expressions: Vec<Expr>,
}

impl ExpressionGroup {
    pub fn new(expressions: Vec<Expr>) -> Self {
        Self { expressions }
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionCall {
    pub name: Identifier,
    pub arguments: Vec<ExpressionGroup>,
}

/// Reference to one argument (`singular`) or an inclusive range of them.
///
/// `None` stands for `N`: the last argument for `last_argument_number`, all
/// arguments when `argument_number` is `None` on a singular substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArgumentSubstitution {
    pub argument_number: Option<u32>,
    pub last_argument_number: Option<u32>,
    pub singular: bool,
}

impl ArgumentSubstitution {
    pub fn single(argument_number: Option<u32>) -> Self {
        Self {
            argument_number,
            last_argument_number: None,
            singular: true,
        }
    }

    pub fn range(first: u32, last: Option<u32>) -> Self {
        Self {
            argument_number: Some(first),
            last_argument_number: last,
            singular: false,
        }
    }
}

impl Default for ArgumentSubstitution {
    fn default() -> Self {
        Self::single(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionalSubstitution {
    #[serde(flatten)]
    pub substitution: ArgumentSubstitution,
    pub default_value: Option<Box<Expr>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expr {
    StringLiteral(StringLiteral),
    Identifier(Identifier),
    Group(ExpressionGroup),
    FunctionCall(FunctionCall),
    ImperativeSubstitution(ArgumentSubstitution),
    OptionalSubstitution(OptionalSubstitution),
}

impl Expr {
    pub fn literal(text: impl Into<String>) -> Self {
        Expr::StringLiteral(StringLiteral { text: text.into() })
    }
}
