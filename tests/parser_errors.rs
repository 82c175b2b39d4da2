use eventsieve::parser::*;
use eventsieve::{load_rules, parse_rules, EngineConfig};

fn syntax_error(src: &str) -> SieveError {
    let err = RawParser::parse_raw_rules(src).unwrap_err();
    assert!(
        matches!(err, SieveError::Syntax { .. }),
        "expected syntax error for {:?}, got {:?}",
        src,
        err
    );
    err
}

#[test]
fn test_missing_braces() {
    syntax_error("if :exists a drop");
    syntax_error("if :exists a { drop");
    syntax_error("if :exists a drop }");
}

#[test]
fn test_missing_if() {
    syntax_error(":exists a { drop }");
    syntax_error("iff :exists a { drop }");
}

#[test]
fn test_missing_value() {
    let err = syntax_error("if a == { drop }");
    if let SieveError::Syntax { help, .. } = err {
        assert!(help.is_some());
    }
    syntax_error("if a == ");
}

#[test]
fn test_unknown_operator() {
    syntax_error("if a === 'x' { drop }");
    syntax_error("if a ~= 'x' { drop }");
    syntax_error("if a contains 'x' { drop }");
}

#[test]
fn test_unknown_action() {
    syntax_error("if :exists a { discard }");
    syntax_error("if :exists a { add b }");
    syntax_error("if :exists a { remove }");
    syntax_error("if :exists a { add b = c }");
}

#[test]
fn test_empty_expression() {
    syntax_error("if { drop }");
    syntax_error("if () { drop }");
    syntax_error("if :exists a && { drop }");
    syntax_error("if :exists a || { drop }");
}

#[test]
fn test_bad_lists() {
    syntax_error("if a == [] { drop }");
    syntax_error("if a == ['x',] { drop }");
    syntax_error("if a == ['x' 'y'] { drop }");
}

#[test]
fn test_unterminated_strings() {
    syntax_error("if a == 'x { drop }");
    syntax_error(r#"if a == "x { drop }"#);
    syntax_error(r"if a == 'x\' { drop }");
}

#[test]
fn test_malformed_numbers() {
    syntax_error("if n > 1. { drop }");
    syntax_error("if n > 10abc { drop }");
    syntax_error("if n > .5 { drop }");
}

#[test]
fn test_unterminated_block_comment() {
    syntax_error("/* never closed\nif :exists a { drop }");
}

#[test]
fn test_error_location() {
    let src = "if :exists a { keep }\nif b == { drop }\n";
    let err = syntax_error(src);
    let (line, col) = err.location().unwrap();
    assert_eq!(line, 2);
    assert_eq!(col, 9);
}

#[test]
fn test_error_message_mentions_position() {
    let err = syntax_error("if a == 'x' { explode }");
    let msg = err.to_string();
    assert!(msg.contains("line 1"), "message was: {}", msg);
}

#[test]
fn test_parse_failure_never_yields_empty_rules() {
    // a broken file must not silently turn into "no rules"
    assert!(parse_rules("if :exists a { drop }\ngarbage", &EngineConfig::default()).is_err());
}

#[test]
fn test_missing_rule_file() {
    let err = load_rules(
        std::path::Path::new("/definitely/not/here.sieve"),
        &EngineConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, SieveError::RuleFileNotFound { .. }));
    assert_eq!(err.location(), None);
}
