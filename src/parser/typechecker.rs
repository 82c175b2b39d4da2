//! Turns the raw AST into the evaluable rule model
use crate::{
    action::Action,
    config::EngineConfig,
    expr::{Condition, Conjunction, Expression},
    parser::{
        ast::{RawAction, RawActionKind, RawCondition, RawExpr, RawPredicate, RawRuleSet, RawScalar, RawValue},
        error::{SieveError, SpanExt},
    },
    rule::{Rule, RuleSet},
    value::{NumericOperator, Operand, Scalar, StringLiteral, StringOperator},
};

/// Undo the escapes the grammar allows inside quotes. Unknown escapes are kept
/// as written so regex escapes like `\.` or `\d` survive.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn parse_string_operator(op: &str) -> Option<StringOperator> {
    match op {
        "==" => Some(StringOperator::Equals),
        "!=" => Some(StringOperator::NotEquals),
        ":contains" => Some(StringOperator::Contains),
        "=~" => Some(StringOperator::Matches),
        "!~" => Some(StringOperator::NotMatches),
        _ => None,
    }
}

fn parse_numeric_operator(op: &str) -> Option<NumericOperator> {
    match op {
        "==" => Some(NumericOperator::Equals),
        "!=" => Some(NumericOperator::NotEquals),
        "<" => Some(NumericOperator::Less),
        "<=" => Some(NumericOperator::LessOrEqual),
        ">" => Some(NumericOperator::Greater),
        ">=" => Some(NumericOperator::GreaterOrEqual),
        _ => None,
    }
}

/// Main typechecker that transforms raw AST to the rule model
pub struct Typechecker<'c> {
    source: &'c str,
    config: &'c EngineConfig,
}

impl<'c> Typechecker<'c> {
    /// Transform a raw rule file into a rule set
    ///
    /// # Errors
    /// Returns `SieveError` for operator/value mismatches, mixed lists, bad regexes and
    /// out-of-range numbers.
    pub fn typecheck(
        raw: RawRuleSet<'_>,
        source: &str,
        config: &EngineConfig,
    ) -> Result<RuleSet, SieveError> {
        let checker = Typechecker { source, config };
        let rules = raw
            .rules
            .into_iter()
            .map(|rule| -> Result<Rule, SieveError> {
                let expression = checker.typecheck_expr(rule.expr)?;
                let actions = rule
                    .actions
                    .into_iter()
                    .map(|a| checker.typecheck_action(a))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Rule::new(expression, actions))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RuleSet::new(rules))
    }

    fn typecheck_expr(&self, raw: RawExpr<'_>) -> Result<Expression, SieveError> {
        let conjunctions = raw
            .conjunctions
            .into_iter()
            .map(|conj| {
                conj.into_iter()
                    .map(|c| self.typecheck_condition(c))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Conjunction::new)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Expression::new(conjunctions))
    }

    fn typecheck_condition(&self, raw: RawCondition<'_>) -> Result<Condition, SieveError> {
        match raw {
            RawCondition::Exists { key, .. } => Ok(Condition::exists(key)),
            RawCondition::Predicate(pred) => self.typecheck_predicate(pred),
            RawCondition::Group(expr) => self.typecheck_expr(expr).map(Condition::nested),
        }
    }

    /// The operand decides the comparison kind: quoted values compare as strings,
    /// bare numbers compare numerically.
    fn typecheck_predicate(&self, pred: RawPredicate<'_>) -> Result<Condition, SieveError> {
        let scalars = pred.value.scalars();
        let quoted = scalars.iter().filter(|s| s.is_quoted()).count();

        if quoted == scalars.len() {
            let op = parse_string_operator(pred.operator)
                .ok_or_else(|| self.incompatible(&pred, "string"))?;
            let value = self.build_operand(&pred.value, |s| self.string_literal(s, op))?;
            Ok(Condition::string(pred.key, op, value))
        } else if quoted == 0 {
            let op = parse_numeric_operator(pred.operator)
                .ok_or_else(|| self.incompatible(&pred, "numeric"))?;
            let value = self.build_operand(&pred.value, |s| self.number(s))?;
            Ok(Condition::numeric(pred.key, op, value))
        } else {
            let (line, col) = pred.value_span.to_location();
            Err(SieveError::MixedList {
                span: pred.value_span.to_source_span(),
                src: self.source.to_string(),
                line,
                col,
            })
        }
    }

    fn build_operand<T>(
        &self,
        value: &RawValue<'_>,
        f: impl Fn(&RawScalar<'_>) -> Result<T, SieveError>,
    ) -> Result<Operand<T>, SieveError> {
        match value {
            RawValue::Single(s) => f(s).map(Operand::Single),
            RawValue::List(xs) => xs
                .iter()
                .map(f)
                .collect::<Result<Vec<_>, _>>()
                .map(Operand::List),
        }
    }

    fn string_literal(
        &self,
        scalar: &RawScalar<'_>,
        op: StringOperator,
    ) -> Result<StringLiteral, SieveError> {
        let text = unescape(scalar.as_str());
        if !op.is_regex() {
            return Ok(StringLiteral::literal(text));
        }

        StringLiteral::pattern(text.clone(), self.config.regex_size_limit).map_err(|e| {
            let span = scalar.span();
            let (line, col) = span.to_location();
            SieveError::InvalidRegex {
                pattern: text,
                span: span.to_source_span(),
                reason: e.to_string(),
                src: self.source.to_string(),
                line,
                col,
            }
        })
    }

    fn number(&self, scalar: &RawScalar<'_>) -> Result<f64, SieveError> {
        scalar
            .as_str()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| self.invalid_number(scalar))
    }

    fn scalar(&self, scalar: &RawScalar<'_>) -> Result<Scalar, SieveError> {
        match scalar {
            RawScalar::Quoted(_) => Ok(Scalar::String(unescape(scalar.as_str()))),
            RawScalar::Number(_) => match scalar.as_str().parse::<i64>() {
                Ok(n) => Ok(Scalar::from(n)),
                Err(_) => self
                    .number(scalar)
                    .and_then(|n| Scalar::number(n).ok_or_else(|| self.invalid_number(scalar))),
            },
        }
    }

    fn typecheck_action(&self, raw: RawAction<'_>) -> Result<Action, SieveError> {
        Ok(match raw.kind {
            RawActionKind::Keep => Action::Keep,
            RawActionKind::Drop => Action::Drop,
            RawActionKind::Set { mode, key, value } => Action::SetField {
                key: key.to_string(),
                value: self.scalar(&value)?,
                mode,
            },
            RawActionKind::Remove { key } => Action::remove(key),
        })
    }

    fn incompatible(&self, pred: &RawPredicate<'_>, kind: &'static str) -> SieveError {
        let (line, col) = pred.operator_span.to_location();
        SieveError::IncompatibleOperator {
            operator: pred.operator.to_string(),
            kind,
            operator_span: pred.operator_span.to_source_span(),
            value_span: pred.value_span.to_source_span(),
            src: self.source.to_string(),
            line,
            col,
        }
    }

    fn invalid_number(&self, scalar: &RawScalar<'_>) -> SieveError {
        let span = scalar.span();
        let (line, col) = span.to_location();
        SieveError::InvalidNumber {
            found: scalar.as_str().to_string(),
            span: span.to_source_span(),
            src: self.source.to_string(),
            line,
            col,
        }
    }
}
