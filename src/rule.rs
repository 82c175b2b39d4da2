use std::fmt::{self, Display};

use crate::action::Action;
use crate::expr::Expression;

/// A guard expression and the actions to run when it matches
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub expression: Expression,
    pub actions: Vec<Action>,
}

/// Rules in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl Rule {
    pub fn new(expression: Expression, actions: Vec<Action>) -> Self {
        Self {
            expression,
            actions,
        }
    }
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "if {} {{", self.expression)?;
        for action in &self.actions {
            write!(f, " {}", action)?;
        }
        write!(f, " }}")
    }
}

impl Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rule in &self.rules {
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}
