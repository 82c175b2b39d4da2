pub mod action;
pub mod config;
pub mod engine;
pub mod event;
pub mod expr;
pub mod input;
pub mod parser;
pub mod rule;
pub mod value;

use std::path::Path;

pub use action::{Action, ActionError, SetMode, Step};
pub use config::EngineConfig;
pub use engine::{Disposition, Outcome, RuleEngine};
pub use event::Event;
pub use expr::{Condition, Conjunction, Evaluate, Expression, NumericMatch, StringMatch};
pub use parser::{parse_rules, SieveError};
pub use rule::{Rule, RuleSet};
pub use value::{NumericOperator, NumericValue, Operand, Scalar, StringLiteral, StringOperator, StringValue};

/// Read and parse a rule file.
///
/// # Errors
/// `RuleFileNotFound` if `path` doesn't exist, `Io` if it can't be read, and any
/// syntax or typecheck error from the contents.
pub fn load_rules(path: &Path, config: &EngineConfig) -> Result<RuleSet, SieveError> {
    if !path.exists() {
        return Err(SieveError::RuleFileNotFound {
            path: path.display().to_string(),
        });
    }

    let source = std::fs::read_to_string(path).map_err(|e| SieveError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    parse_rules(&source, config)
}
