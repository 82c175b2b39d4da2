use std::fmt::{self, Display};

use itertools::Itertools;

use crate::event::Event;
use crate::value::{NumericOperator, NumericValue, StringOperator, StringValue};

/// Anything that can be tested against a single event
pub trait Evaluate {
    fn evaluate(&self, event: &Event) -> bool;
}

/// Disjunction of conjunctions. True as soon as one conjunction is true, false when empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression<C = Condition> {
    pub conjunctions: Vec<Conjunction<C>>,
}

/// Conditions that must all hold. Stops at the first false one, vacuously true when empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Conjunction<C = Condition> {
    pub conditions: Vec<C>,
}

impl<C> Expression<C> {
    pub fn new(conjunctions: Vec<Conjunction<C>>) -> Self {
        Self { conjunctions }
    }

    /// Expression with a single condition
    pub fn single(condition: C) -> Self {
        Self::new(vec![Conjunction::new(vec![condition])])
    }
}

impl<C> Conjunction<C> {
    pub fn new(conditions: Vec<C>) -> Self {
        Self { conditions }
    }
}

impl<C: Evaluate> Evaluate for Expression<C> {
    fn evaluate(&self, event: &Event) -> bool {
        self.conjunctions.iter().any(|c| c.evaluate(event))
    }
}

impl<C: Evaluate> Evaluate for Conjunction<C> {
    fn evaluate(&self, event: &Event) -> bool {
        self.conditions.iter().all(|c| c.evaluate(event))
    }
}

/// Atomic test against one event
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Exists(String),
    String(StringMatch),
    Numeric(NumericMatch),
    Nested(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringMatch {
    pub key: String,
    pub op: StringOperator,
    pub value: StringValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericMatch {
    pub key: String,
    pub op: NumericOperator,
    pub value: NumericValue,
}

impl Condition {
    pub fn exists(key: impl Into<String>) -> Self {
        Self::Exists(key.into())
    }

    pub fn string(key: impl Into<String>, op: StringOperator, value: StringValue) -> Self {
        Self::String(StringMatch {
            key: key.into(),
            op,
            value,
        })
    }

    pub fn numeric(key: impl Into<String>, op: NumericOperator, value: NumericValue) -> Self {
        Self::Numeric(NumericMatch {
            key: key.into(),
            op,
            value,
        })
    }

    pub fn nested(expr: Expression) -> Self {
        Self::Nested(expr)
    }
}

impl Evaluate for Condition {
    fn evaluate(&self, event: &Event) -> bool {
        match self {
            Condition::Exists(key) => event.contains_key(key),
            Condition::String(m) => m.evaluate(event),
            Condition::Numeric(m) => m.evaluate(event),
            Condition::Nested(e) => e.evaluate(event),
        }
    }
}

impl Evaluate for StringMatch {
    fn evaluate(&self, event: &Event) -> bool {
        event
            .get(&self.key)
            .is_some_and(|field| self.value.satisfied_by(self.op, &field.as_text()))
    }
}

impl Evaluate for NumericMatch {
    // a field without a numeric form never matches
    fn evaluate(&self, event: &Event) -> bool {
        event
            .get(&self.key)
            .and_then(|field| field.as_number())
            .is_some_and(|n| self.value.satisfied_by(self.op, n))
    }
}

impl<C: Display> Display for Expression<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.conjunctions.iter().join(" || "))
    }
}

impl<C: Display> Display for Conjunction<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.conditions.iter().join(" && "))
    }
}

impl Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Exists(key) => write!(f, ":exists {}", key),
            Condition::String(m) => write!(f, "{} {} {}", m.key, m.op, m.value),
            Condition::Numeric(m) => write!(f, "{} {} {}", m.key, m.op, m.value),
            Condition::Nested(e) => write!(f, "({})", e),
        }
    }
}
