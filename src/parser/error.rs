use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use super::raw::Rule;

/// Errors raised while loading a rule file. All of them are fatal at startup.
#[allow(dead_code)] // Fields are used by miette's derive macros
#[derive(Debug, Clone, Diagnostic, Error)]
pub enum SieveError {
    // Syntax errors from pest
    #[error("Syntax error at line {line}, column {col}")]
    #[diagnostic(code(sieve::syntax))]
    Syntax {
        #[source_code]
        src: String,
        #[label("{expected_msg}")]
        span: SourceSpan,
        #[help]
        help: Option<String>,
        expected_msg: String,
        line: usize,
        col: usize,
    },

    // Typechecker errors with spans
    #[error("Operator '{operator}' cannot be used with a {kind} value at line {line}, column {col}")]
    #[diagnostic(
        code(sieve::incompatible_operator),
        help("String values take ==, !=, :contains, =~, !~. Numeric values take ==, !=, <, <=, >, >=")
    )]
    IncompatibleOperator {
        operator: String,
        kind: &'static str,
        #[label("incompatible operator")]
        operator_span: SourceSpan,
        #[label("{kind} value")]
        value_span: SourceSpan,
        #[source_code]
        src: String,
        line: usize,
        col: usize,
    },

    #[error("List mixes strings and numbers at line {line}, column {col}")]
    #[diagnostic(
        code(sieve::mixed_list),
        help("Quote every element to compare as strings, or none to compare as numbers")
    )]
    MixedList {
        #[label("mixed list")]
        span: SourceSpan,
        #[source_code]
        src: String,
        line: usize,
        col: usize,
    },

    #[error("Invalid regex '{pattern}' at line {line}, column {col}")]
    #[diagnostic(code(sieve::invalid_regex))]
    InvalidRegex {
        pattern: String,
        #[label("{reason}")]
        span: SourceSpan,
        reason: String,
        #[source_code]
        src: String,
        line: usize,
        col: usize,
    },

    #[error("Number out of range: {found} at line {line}, column {col}")]
    #[diagnostic(code(sieve::invalid_number))]
    InvalidNumber {
        found: String,
        #[label("not a finite number")]
        span: SourceSpan,
        #[source_code]
        src: String,
        line: usize,
        col: usize,
    },

    // Configuration errors
    #[error("Rule file not found: {path}")]
    #[diagnostic(
        code(sieve::rule_file_not_found),
        help("Check that the rule file path exists and is readable")
    )]
    RuleFileNotFound { path: String },

    #[error("Could not read rule file {path}: {message}")]
    #[diagnostic(code(sieve::io_error))]
    Io { path: String, message: String },

    // Internal errors
    #[error("Internal parser error: {message}")]
    #[diagnostic(code(sieve::internal))]
    Internal { message: String },
}

// Extension trait for span location extraction
pub trait SpanExt {
    fn to_location(&self) -> (usize, usize);
    fn to_source_span(&self) -> SourceSpan;
}

impl SpanExt for pest::Span<'_> {
    #[inline]
    fn to_location(&self) -> (usize, usize) {
        self.start_pos().line_col()
    }

    #[inline]
    fn to_source_span(&self) -> SourceSpan {
        (self.start(), self.end() - self.start()).into()
    }
}

/// Convert pest Rule enum to user-friendly names
fn rule_to_friendly_name(grammar_rule: &Rule) -> &'static str {
    match grammar_rule {
        Rule::program => "program",
        Rule::sieve_rule => "rule",
        Rule::kw_if => "'if'",
        Rule::expr => "expression",
        Rule::conjunction => "expression",
        Rule::condition => "condition",
        Rule::exists => "':exists'",
        Rule::predicate => "comparison",
        Rule::operator => "operator",
        Rule::value => "value",
        Rule::list => "list",
        Rule::scalar => "string or number",
        Rule::quoted => "quoted string",
        Rule::inner_single => "string content",
        Rule::inner_double => "string content",
        Rule::escaped => "escape sequence",
        Rule::number => "number",
        Rule::key => "field name",
        Rule::key_char => "field name",
        Rule::action => "action",
        Rule::keep_action => "'keep'",
        Rule::drop_action => "'drop'",
        Rule::add_force_action => "'add!'",
        Rule::add_action => "'add'",
        Rule::update_action => "'update'",
        Rule::remove_action => "'remove'",
        Rule::kw_add_force => "'add!'",
        Rule::kw_add => "'add'",
        Rule::kw_update => "'update'",
        Rule::kw_remove => "'remove'",
        Rule::WHITESPACE => "whitespace",
        Rule::COMMENT => "comment",
        Rule::EOI => "end of input",
    }
}

/// Generate contextual help text based on error patterns
fn generate_help_text(positives: &[Rule], found_eoi: bool) -> Option<String> {
    if positives.is_empty() {
        return None;
    }

    if positives.contains(&Rule::value) || positives.contains(&Rule::number) {
        if found_eoi {
            return Some("Add a value after the operator, like: source.port == 443".to_string());
        }
        return Some("Expected a quoted string, a number, or a [list]".to_string());
    }

    if positives.contains(&Rule::operator) {
        return Some("Compare the field with an operator, like: source.ip == '10.0.0.1'".to_string());
    }

    if positives.contains(&Rule::keep_action) || positives.contains(&Rule::add_action) {
        return Some(
            "Valid actions: keep, drop, add key = value, add! key = value, update key = value, remove key"
                .to_string(),
        );
    }

    if positives.contains(&Rule::kw_if) {
        return Some("Every rule starts with: if <expression> { <actions> }".to_string());
    }

    if positives.contains(&Rule::EOI) {
        return Some("Unexpected input. Check for unbalanced braces, parentheses or quotes.".to_string());
    }

    None
}

impl SieveError {
    /// Create a syntax error from pest error with diagnostic information
    pub fn from_pest(pest_err: Box<pest::error::Error<Rule>>, src: String) -> Self {
        use pest::error::{ErrorVariant, InputLocation};

        // miette needs a non-zero width to draw an arrow
        let span: SourceSpan = match pest_err.location {
            InputLocation::Pos(pos) => {
                if pos >= src.len() && pos > 0 {
                    (pos - 1, 1).into()
                } else if pos < src.len() {
                    (pos, 1).into()
                } else {
                    (0, 0).into()
                }
            }
            InputLocation::Span((start, end)) => (start, end.saturating_sub(start).max(1)).into(),
        };

        let (line, col) = match pest_err.line_col {
            pest::error::LineColLocation::Pos((line, col)) => (line, col),
            pest::error::LineColLocation::Span((line, col), _) => (line, col),
        };

        let (expected_msg, help) = match &pest_err.variant {
            ErrorVariant::ParsingError {
                positives,
                negatives: _,
            } => {
                let found_eoi = match pest_err.location {
                    InputLocation::Pos(p) => p >= src.len(),
                    InputLocation::Span((_, end)) => end >= src.len(),
                };

                let expected_msg = if positives.is_empty() {
                    "Unexpected input".to_string()
                } else {
                    let mut names: Vec<&str> =
                        positives.iter().map(rule_to_friendly_name).collect();
                    names.dedup();
                    if names.len() == 1 {
                        format!("Expected {}", names[0])
                    } else if names.len() <= 3 {
                        format!("Expected one of: {}", names.join(", "))
                    } else {
                        format!("Expected one of: {}, ...", names[..3].join(", "))
                    }
                };

                (expected_msg, generate_help_text(positives, found_eoi))
            }
            ErrorVariant::CustomError { message } => (message.clone(), None),
        };

        SieveError::Syntax {
            src,
            span,
            help,
            expected_msg,
            line,
            col,
        }
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        SieveError::Internal {
            message: msg.into(),
        }
    }

    /// Line and column (1-based) of the offending source text, if the error has one
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            SieveError::Syntax { line, col, .. }
            | SieveError::IncompatibleOperator { line, col, .. }
            | SieveError::MixedList { line, col, .. }
            | SieveError::InvalidRegex { line, col, .. }
            | SieveError::InvalidNumber { line, col, .. } => Some((*line, *col)),
            SieveError::RuleFileNotFound { .. }
            | SieveError::Io { .. }
            | SieveError::Internal { .. } => None,
        }
    }
}
