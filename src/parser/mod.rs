pub mod ast;
pub mod error;
pub mod raw;
pub mod typechecker;

// Re-exports for clean API
pub use ast::{RawAction, RawActionKind, RawCondition, RawExpr, RawPredicate, RawRuleSet, RawScalar, RawValue};
pub use error::SieveError;
pub use raw::RawParser;
pub use typechecker::Typechecker;

use crate::{config::EngineConfig, rule::RuleSet};

/// Parse and typecheck rule source text
pub fn parse_rules(source: &str, config: &EngineConfig) -> Result<RuleSet, SieveError> {
    let raw = RawParser::parse_raw_rules(source)?;
    Typechecker::typecheck(raw, source, config)
}
