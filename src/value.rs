use std::fmt::{self, Display};

use itertools::Itertools;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Field value stored in an event, also used as the operand of field actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    String(String),
}

impl Scalar {
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Integers keep their exact form, anything else goes through f64
    pub fn number(n: f64) -> Option<Self> {
        if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
            Some(Self::Number((n as i64).into()))
        } else {
            serde_json::Number::from_f64(n).map(Self::Number)
        }
    }

    /// Textual form used by string operators
    pub fn as_text(&self) -> String {
        match self {
            Scalar::String(s) => s.clone(),
            Scalar::Number(n) => n.to_string(),
        }
    }

    /// Numeric form used by numeric operators, `None` if the value isn't a finite number
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Scalar::Number(n) => n.as_f64()?,
            Scalar::String(s) => s.trim().parse::<f64>().ok()?,
        };
        n.is_finite().then_some(n)
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => write_quoted(f, s),
            Scalar::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Self::Number(n.into())
    }
}

/// Operators that compare a field's textual form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringOperator {
    Equals,     // ==
    NotEquals,  // !=
    Contains,   // :contains
    Matches,    // =~
    NotMatches, // !~
}

impl StringOperator {
    pub fn is_regex(&self) -> bool {
        matches!(self, StringOperator::Matches | StringOperator::NotMatches)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StringOperator::Equals => "==",
            StringOperator::NotEquals => "!=",
            StringOperator::Contains => ":contains",
            StringOperator::Matches => "=~",
            StringOperator::NotMatches => "!~",
        }
    }
}

/// Operators that compare a field's numeric form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOperator {
    Equals,         // ==
    NotEquals,      // !=
    Less,           // <
    LessOrEqual,    // <=
    Greater,        // >
    GreaterOrEqual, // >=
}

impl NumericOperator {
    pub fn compare(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            NumericOperator::Equals => lhs == rhs,
            NumericOperator::NotEquals => lhs != rhs,
            NumericOperator::Less => lhs < rhs,
            NumericOperator::LessOrEqual => lhs <= rhs,
            NumericOperator::Greater => lhs > rhs,
            NumericOperator::GreaterOrEqual => lhs >= rhs,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NumericOperator::Equals => "==",
            NumericOperator::NotEquals => "!=",
            NumericOperator::Less => "<",
            NumericOperator::LessOrEqual => "<=",
            NumericOperator::Greater => ">",
            NumericOperator::GreaterOrEqual => ">=",
        }
    }
}

impl Display for StringOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Display for NumericOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// String operand. Carries a compiled, fully anchored pattern when used with `=~` or `!~`.
#[derive(Debug, Clone)]
pub struct StringLiteral {
    text: String,
    pattern: Option<Regex>,
}

impl StringLiteral {
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pattern: None,
        }
    }

    /// Compile `text` as a regex that has to match the whole field
    pub fn pattern(text: impl Into<String>, size_limit: usize) -> Result<Self, regex::Error> {
        let text = text.into();
        // `text` must be a well-formed regex on its own, otherwise an unbalanced
        // `)` could close the anchoring group early
        RegexBuilder::new(&text).size_limit(size_limit).build()?;
        let pattern = RegexBuilder::new(&format!(r"\A(?:{})\z", text))
            .size_limit(size_limit)
            .build()?;
        Ok(Self {
            text,
            pattern: Some(pattern),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn satisfied_by(&self, op: StringOperator, lhs: &str) -> bool {
        match op {
            StringOperator::Equals => lhs == self.text,
            StringOperator::NotEquals => lhs != self.text,
            StringOperator::Contains => lhs.contains(self.text.as_str()),
            StringOperator::Matches => self.pattern.as_ref().is_some_and(|r| r.is_match(lhs)),
            StringOperator::NotMatches => self.pattern.as_ref().is_some_and(|r| !r.is_match(lhs)),
        }
    }
}

// the compiled pattern is derived from the text
impl PartialEq for StringLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.pattern.is_some() == other.pattern.is_some()
    }
}

/// Right-hand side of a comparison: one operand or a list of alternatives
#[derive(Debug, Clone, PartialEq)]
pub enum Operand<T> {
    Single(T),
    List(Vec<T>),
}

impl<T> Operand<T> {
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let slice = match self {
            Operand::Single(x) => std::slice::from_ref(x),
            Operand::List(xs) => xs.as_slice(),
        };
        slice.iter()
    }
}

impl<T: Display> Display for Operand<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Single(x) => write!(f, "{}", x),
            Operand::List(xs) => write!(f, "[{}]", xs.iter().join(", ")),
        }
    }
}

pub type StringValue = Operand<StringLiteral>;
pub type NumericValue = Operand<f64>;

impl StringValue {
    /// A list is satisfied if any of its members is
    pub fn satisfied_by(&self, op: StringOperator, lhs: &str) -> bool {
        self.iter().any(|v| v.satisfied_by(op, lhs))
    }
}

impl NumericValue {
    /// A list is satisfied if any of its members is
    pub fn satisfied_by(&self, op: NumericOperator, lhs: f64) -> bool {
        self.iter().any(|v| op.compare(lhs, *v))
    }
}

impl Display for StringLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_quoted(f, &self.text)
    }
}

/// Single-quote `s` using only the escapes the rule grammar understands, so the
/// output reads back to the same text
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("'")
}
