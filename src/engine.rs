use slog::{debug, o, trace, warn, Logger};

use crate::action::{ActionError, Step};
use crate::config::EngineConfig;
use crate::event::Event;
use crate::expr::Evaluate;
use crate::rule::RuleSet;

/// Final fate of an event after the rule chain ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Kept,
    Dropped,
}

/// Result of running the rule chain over one event
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub disposition: Disposition,
    /// indices of rules whose expression matched, in evaluation order
    pub matched: Vec<usize>,
    /// actions that failed without stopping the chain
    pub failures: Vec<ActionError>,
}

impl Outcome {
    pub fn is_kept(&self) -> bool {
        self.disposition == Disposition::Kept
    }
}

/// Runs an immutable rule set against events, one at a time
pub struct RuleEngine {
    rules: RuleSet,
    config: EngineConfig,
    logger: Logger,
}

impl RuleEngine {
    pub fn new(rules: RuleSet, config: EngineConfig, logger: &Logger) -> Self {
        let logger = logger.new(o!("rules" => rules.len()));
        Self {
            rules,
            config,
            logger,
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the rule chain, mutating `event` in place.
    ///
    /// The first `keep` or `drop` action decides the disposition and stops all
    /// further rules. If no rule halts, the event is kept.
    pub fn evaluate(&self, event: &mut Event) -> Outcome {
        let mut outcome = Outcome {
            disposition: Disposition::Kept,
            matched: Vec::new(),
            failures: Vec::new(),
        };

        for (idx, rule) in self.rules.iter().enumerate() {
            if !rule.expression.evaluate(event) {
                trace!(self.logger, "rule did not match"; "rule" => idx);
                continue;
            }

            debug!(self.logger, "rule matched"; "rule" => idx, "expr" => %rule.expression);
            outcome.matched.push(idx);

            for action in &rule.actions {
                match action.apply(event, &self.config) {
                    Ok(Step::Continue) => {
                        trace!(self.logger, "applied action"; "rule" => idx, "action" => %action);
                    }
                    Ok(step) => {
                        outcome.disposition = if step == Step::Drop {
                            Disposition::Dropped
                        } else {
                            Disposition::Kept
                        };
                        debug!(self.logger, "rule chain halted"; "rule" => idx, "action" => %action);
                        return outcome;
                    }
                    Err(err) => {
                        warn!(self.logger, "action failed"; "rule" => idx, "action" => %action, "error" => %err);
                        outcome.failures.push(err);
                    }
                }
            }
        }

        outcome
    }

    /// Returns the (possibly modified) event if it is kept, `None` if dropped
    pub fn process(&self, mut event: Event) -> Option<Event> {
        match self.evaluate(&mut event).disposition {
            Disposition::Kept => Some(event),
            Disposition::Dropped => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::expr::{Condition, Expression};
    use crate::rule::Rule;
    use crate::value::Scalar;

    fn logger() -> Logger {
        Logger::root(slog::Discard, o!())
    }

    fn engine(rules: Vec<Rule>) -> RuleEngine {
        RuleEngine::new(RuleSet::new(rules), EngineConfig::default(), &logger())
    }

    #[test]
    fn test_empty_rule_set_keeps_event_unmodified() {
        let e: Event = [("a", Scalar::from(1))].into_iter().collect();
        assert_eq!(engine(vec![]).process(e.clone()), Some(e));
    }

    #[test]
    fn test_keep_stops_chain() {
        let engine = engine(vec![
            Rule::new(Expression::single(Condition::exists("a")), vec![Action::Keep]),
            Rule::new(Expression::single(Condition::exists("a")), vec![Action::Drop]),
        ]);
        let mut e: Event = [("a", Scalar::from(1))].into_iter().collect();
        let outcome = engine.evaluate(&mut e);
        assert!(outcome.is_kept());
        assert_eq!(outcome.matched, vec![0]);
    }

    #[test]
    fn test_actions_after_halt_are_not_run() {
        let engine = engine(vec![Rule::new(
            Expression::single(Condition::exists("a")),
            vec![Action::Drop, Action::set("b", 1)],
        )]);
        let mut e: Event = [("a", Scalar::from(1))].into_iter().collect();
        assert_eq!(engine.evaluate(&mut e).disposition, Disposition::Dropped);
        assert!(!e.contains_key("b"));
    }
}
