use pest::{iterators::Pair, Parser};
use pest_derive::Parser;

use super::{
    ast::{RawAction, RawActionKind, RawCondition, RawExpr, RawPredicate, RawRule, RawRuleSet, RawScalar, RawValue},
    error::SieveError,
};
use crate::action::SetMode;

#[derive(Parser)]
#[grammar = "parser/grammar.pest"]
pub struct RawParser;

impl RawParser {
    /// Parse a rule file into a Raw AST
    pub fn parse_raw_rules(input: &str) -> Result<RawRuleSet<'_>, SieveError> {
        let mut pairs = Self::parse(Rule::program, input)
            .map_err(|e| SieveError::from_pest(Box::new(e), input.to_string()))?;

        let program_pair = pairs
            .next()
            .ok_or_else(|| SieveError::internal("Grammar guarantees program exists"))?;

        let rules = program_pair
            .into_inner()
            .filter(|p| p.as_rule() == Rule::sieve_rule)
            .map(Self::parse_rule)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawRuleSet { rules })
    }

    fn parse_rule(pair: Pair<'_, Rule>) -> Result<RawRule<'_>, SieveError> {
        let span = pair.as_span();
        let mut inner = pair.into_inner().filter(|p| p.as_rule() != Rule::kw_if);

        let expr_pair = inner
            .next()
            .ok_or_else(|| SieveError::internal("Grammar guarantees rule has expression"))?;
        let expr = Self::parse_expr(expr_pair)?;

        let actions = inner.map(Self::parse_action).collect::<Result<Vec<_>, _>>()?;

        Ok(RawRule {
            expr,
            actions,
            span,
        })
    }

    fn parse_expr(pair: Pair<'_, Rule>) -> Result<RawExpr<'_>, SieveError> {
        let span = pair.as_span();
        let conjunctions = pair
            .into_inner()
            .map(|conj| {
                conj.into_inner()
                    .map(Self::parse_condition)
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawExpr { conjunctions, span })
    }

    fn parse_condition(pair: Pair<'_, Rule>) -> Result<RawCondition<'_>, SieveError> {
        match pair.as_rule() {
            Rule::exists => {
                let span = pair.as_span();
                let key = pair
                    .into_inner()
                    .next()
                    .ok_or_else(|| SieveError::internal("Grammar guarantees :exists has key"))?;
                Ok(RawCondition::Exists {
                    key: key.as_str(),
                    span,
                })
            }
            Rule::predicate => Self::parse_predicate(pair).map(RawCondition::Predicate),
            Rule::expr => Self::parse_expr(pair).map(RawCondition::Group),
            other => Err(SieveError::internal(format!(
                "Unexpected condition rule: {:?}",
                other
            ))),
        }
    }

    fn parse_predicate(pair: Pair<'_, Rule>) -> Result<RawPredicate<'_>, SieveError> {
        let span = pair.as_span();
        let mut inner = pair.into_inner();

        let key_pair = inner
            .next()
            .ok_or_else(|| SieveError::internal("Grammar guarantees predicate has key"))?;

        let operator_pair = inner
            .next()
            .ok_or_else(|| SieveError::internal("Grammar guarantees predicate has operator"))?;

        let value_pair = inner
            .next()
            .ok_or_else(|| SieveError::internal("Grammar guarantees predicate has value"))?;
        let value_span = value_pair.as_span();
        let value = Self::parse_value(value_pair)?;

        Ok(RawPredicate {
            key: key_pair.as_str(),
            operator: operator_pair.as_str(),
            value,
            span,
            key_span: key_pair.as_span(),
            operator_span: operator_pair.as_span(),
            value_span,
        })
    }

    fn parse_value(pair: Pair<'_, Rule>) -> Result<RawValue<'_>, SieveError> {
        let inner = pair
            .into_inner()
            .next()
            .ok_or_else(|| SieveError::internal("Grammar guarantees value has content"))?;

        match inner.as_rule() {
            Rule::list => {
                let items = inner
                    .into_inner()
                    .map(Self::parse_scalar)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(RawValue::List(items))
            }
            _ => Self::parse_scalar(inner).map(RawValue::Single),
        }
    }

    fn parse_scalar(pair: Pair<'_, Rule>) -> Result<RawScalar<'_>, SieveError> {
        match pair.as_rule() {
            Rule::quoted => {
                // Grammar already parsed inner content without quotes
                let inner = pair.into_inner().next().ok_or_else(|| {
                    SieveError::internal("Grammar guarantees quoted string has inner content")
                })?;
                Ok(RawScalar::Quoted(inner.as_span()))
            }
            Rule::number => Ok(RawScalar::Number(pair.as_span())),
            other => Err(SieveError::internal(format!(
                "Unexpected scalar rule: {:?}",
                other
            ))),
        }
    }

    fn parse_action(pair: Pair<'_, Rule>) -> Result<RawAction<'_>, SieveError> {
        let span = pair.as_span();
        let action_rule = pair.as_rule();

        let kind = match action_rule {
            Rule::keep_action => RawActionKind::Keep,
            Rule::drop_action => RawActionKind::Drop,
            Rule::add_force_action | Rule::add_action | Rule::update_action => {
                let mode = match action_rule {
                    Rule::add_force_action => SetMode::Overwrite,
                    Rule::add_action => SetMode::IfAbsent,
                    _ => SetMode::IfPresent,
                };
                // skip the keyword
                let mut inner = pair.into_inner().skip(1);
                let key = inner
                    .next()
                    .ok_or_else(|| SieveError::internal("Grammar guarantees action has key"))?;
                let value = inner
                    .next()
                    .ok_or_else(|| SieveError::internal("Grammar guarantees action has value"))?;
                RawActionKind::Set {
                    mode,
                    key: key.as_str(),
                    value: Self::parse_scalar(value)?,
                }
            }
            Rule::remove_action => {
                let key = pair
                    .into_inner()
                    .nth(1)
                    .ok_or_else(|| SieveError::internal("Grammar guarantees remove has key"))?;
                RawActionKind::Remove { key: key.as_str() }
            }
            other => {
                return Err(SieveError::internal(format!(
                    "Unexpected action rule: {:?}",
                    other
                )))
            }
        };

        Ok(RawAction { kind, span })
    }
}
