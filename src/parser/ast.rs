use pest::Span;

use crate::action::SetMode;

#[derive(Debug, Clone, PartialEq)]
pub struct RawRuleSet<'a> {
    pub rules: Vec<RawRule<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRule<'a> {
    pub expr: RawExpr<'a>,
    pub actions: Vec<RawAction<'a>>,
    pub span: Span<'a>,
}

/// `||`-separated groups of `&&`-separated conditions
#[derive(Debug, Clone, PartialEq)]
pub struct RawExpr<'a> {
    pub conjunctions: Vec<Vec<RawCondition<'a>>>,
    pub span: Span<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawCondition<'a> {
    Exists { key: &'a str, span: Span<'a> },
    Predicate(RawPredicate<'a>),
    Group(RawExpr<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPredicate<'a> {
    pub key: &'a str,
    pub operator: &'a str,
    pub value: RawValue<'a>,
    pub span: Span<'a>,
    // Subcomponent spans for precise error reporting
    pub key_span: Span<'a>,
    pub operator_span: Span<'a>,
    pub value_span: Span<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawValue<'a> {
    Single(RawScalar<'a>),
    List(Vec<RawScalar<'a>>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawScalar<'a> {
    Quoted(Span<'a>), // quotes stripped, escapes preserved
    Number(Span<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawAction<'a> {
    pub kind: RawActionKind<'a>,
    pub span: Span<'a>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawActionKind<'a> {
    Keep,
    Drop,
    Set {
        mode: SetMode,
        key: &'a str,
        value: RawScalar<'a>,
    },
    Remove {
        key: &'a str,
    },
}

impl<'a> RawValue<'a> {
    pub fn scalars(&self) -> &[RawScalar<'a>] {
        match self {
            RawValue::Single(s) => std::slice::from_ref(s),
            RawValue::List(xs) => xs,
        }
    }
}

impl<'a> RawScalar<'a> {
    /// Source text, without quotes for quoted strings
    pub fn as_str(&self) -> &'a str {
        match self {
            RawScalar::Quoted(span) | RawScalar::Number(span) => span.as_str(),
        }
    }

    pub fn span(&self) -> Span<'a> {
        match self {
            RawScalar::Quoted(span) | RawScalar::Number(span) => *span,
        }
    }

    pub fn is_quoted(&self) -> bool {
        matches!(self, RawScalar::Quoted(_))
    }
}
