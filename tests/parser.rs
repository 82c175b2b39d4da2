use eventsieve::action::SetMode;
use eventsieve::parser::*;

fn parse(input: &str) -> RawRuleSet<'_> {
    RawParser::parse_raw_rules(input).unwrap()
}

#[test]
fn test_empty_file() {
    assert!(parse("").rules.is_empty());
    assert!(parse("  \n\t\n").rules.is_empty());
    assert!(parse("# nothing here\n// or here\n/* nor\nhere */").rules.is_empty());
}

#[test]
fn test_exists_rule() {
    let rules = parse("if :exists malware { drop }");
    assert_eq!(rules.rules.len(), 1);

    let rule = &rules.rules[0];
    assert_eq!(rule.expr.conjunctions.len(), 1);
    assert!(matches!(
        &rule.expr.conjunctions[0][..],
        [RawCondition::Exists { key: "malware", .. }]
    ));
    assert_eq!(rule.actions.len(), 1);
    assert_eq!(rule.actions[0].kind, RawActionKind::Drop);
}

#[test]
fn test_predicate_parts() {
    let rules = parse("if source.ip == '10.0.0.1' { keep }");
    let RawCondition::Predicate(pred) = &rules.rules[0].expr.conjunctions[0][0] else {
        panic!("expected predicate");
    };
    assert_eq!(pred.key, "source.ip");
    assert_eq!(pred.operator, "==");
    assert_eq!(pred.value_span.as_str(), "'10.0.0.1'");
    match &pred.value {
        RawValue::Single(s) => {
            assert!(s.is_quoted());
            assert_eq!(s.as_str(), "10.0.0.1");
        }
        other => panic!("expected single value, got {:?}", other),
    }
}

#[test]
fn test_all_operators() {
    for op in ["==", "!=", "<", "<=", ">", ">=", ":contains", "=~", "!~"] {
        let src = format!("if a {} 1 {{ keep }}", op);
        let rules = parse(&src);
        let RawCondition::Predicate(pred) = &rules.rules[0].expr.conjunctions[0][0] else {
            panic!("expected predicate for {}", op);
        };
        assert_eq!(pred.operator, op);
    }
}

#[test]
fn test_operators_without_spaces() {
    let rules = parse("if a<=5&&b!~'x'{drop}");
    let conj = &rules.rules[0].expr.conjunctions[0];
    assert_eq!(conj.len(), 2);
    let RawCondition::Predicate(a) = &conj[0] else { panic!() };
    let RawCondition::Predicate(b) = &conj[1] else { panic!() };
    assert_eq!((a.key, a.operator), ("a", "<="));
    assert_eq!((b.key, b.operator), ("b", "!~"));
}

#[test]
fn test_or_of_ands() {
    let rules = parse("if :exists a && :exists b || :exists c { keep }");
    let conjunctions = &rules.rules[0].expr.conjunctions;
    assert_eq!(conjunctions.len(), 2);
    assert_eq!(conjunctions[0].len(), 2);
    assert_eq!(conjunctions[1].len(), 1);
}

#[test]
fn test_parenthesized_group() {
    let rules = parse("if :exists a && (:exists b || :exists c) { keep }");
    let conj = &rules.rules[0].expr.conjunctions[0];
    assert_eq!(conj.len(), 2);
    match &conj[1] {
        RawCondition::Group(inner) => {
            assert_eq!(inner.conjunctions.len(), 2);
            assert_eq!(inner.span.as_str(), ":exists b || :exists c");
        }
        other => panic!("expected group, got {:?}", other),
    }
}

#[test]
fn test_lists() {
    let rules = parse(r#"if a == ['x', "y"] || n == [1, 2.5, -3] { keep }"#);
    let conjunctions = &rules.rules[0].expr.conjunctions;

    let RawCondition::Predicate(strings) = &conjunctions[0][0] else { panic!() };
    let RawValue::List(items) = &strings.value else { panic!("expected list") };
    let texts: Vec<_> = items.iter().map(|s| s.as_str()).collect();
    assert_eq!(texts, vec!["x", "y"]);
    assert!(items.iter().all(|s| s.is_quoted()));

    let RawCondition::Predicate(numbers) = &conjunctions[1][0] else { panic!() };
    let RawValue::List(items) = &numbers.value else { panic!("expected list") };
    let texts: Vec<_> = items.iter().map(|s| s.as_str()).collect();
    assert_eq!(texts, vec!["1", "2.5", "-3"]);
    assert!(items.iter().all(|s| !s.is_quoted()));
}

#[test]
fn test_escapes_are_preserved_raw() {
    let rules = parse(r"if a == 'it\'s' { keep }");
    let RawCondition::Predicate(pred) = &rules.rules[0].expr.conjunctions[0][0] else { panic!() };
    assert_eq!(pred.value.scalars()[0].as_str(), r"it\'s");
}

#[test]
fn test_empty_string() {
    let rules = parse("if a == '' { keep }");
    let RawCondition::Predicate(pred) = &rules.rules[0].expr.conjunctions[0][0] else { panic!() };
    assert_eq!(pred.value.scalars()[0].as_str(), "");
}

#[test]
fn test_actions() {
    let rules = parse(
        r#"
        if :exists a {
            add b = 'x'
            add! c = 3
            update d = "y"
            remove e
            keep
        }
        "#,
    );
    let kinds: Vec<_> = rules.rules[0].actions.iter().map(|a| a.kind.clone()).collect();
    assert_eq!(kinds.len(), 5);
    assert!(matches!(
        &kinds[0],
        RawActionKind::Set { mode: SetMode::IfAbsent, key: "b", value } if value.as_str() == "x"
    ));
    assert!(matches!(
        &kinds[1],
        RawActionKind::Set { mode: SetMode::Overwrite, key: "c", value } if value.as_str() == "3" && !value.is_quoted()
    ));
    assert!(matches!(
        &kinds[2],
        RawActionKind::Set { mode: SetMode::IfPresent, key: "d", value } if value.as_str() == "y"
    ));
    assert_eq!(kinds[3], RawActionKind::Remove { key: "e" });
    assert_eq!(kinds[4], RawActionKind::Keep);
}

#[test]
fn test_rule_without_actions() {
    let rules = parse("if :exists a {}");
    assert!(rules.rules[0].actions.is_empty());
}

#[test]
fn test_multiple_rules_keep_file_order() {
    let rules = parse(
        "if :exists first { keep }\n\
         # comment between rules\n\
         if :exists second { drop }",
    );
    let keys: Vec<_> = rules
        .rules
        .iter()
        .map(|r| match &r.expr.conjunctions[0][0] {
            RawCondition::Exists { key, .. } => *key,
            _ => panic!("expected exists"),
        })
        .collect();
    assert_eq!(keys, vec!["first", "second"]);
}

#[test]
fn test_keyword_prefixed_keys() {
    // field names that start with a keyword are still field names
    let rules = parse("if iff == 1 { add addr = 'x' remove removed }");
    let RawCondition::Predicate(pred) = &rules.rules[0].expr.conjunctions[0][0] else { panic!() };
    assert_eq!(pred.key, "iff");
    assert_eq!(
        rules.rules[0].actions[1].kind,
        RawActionKind::Remove { key: "removed" }
    );
}
