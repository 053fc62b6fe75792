//! Scenario tests for matching reports, compatibility of recursive types and
//! bounded, lazy test generation.

use std::collections::BTreeSet;

use pactum_core::{
    ContractDocument, EnumPattern, NegativePolicy, ObjectPattern, Pattern, Resolver, Row,
    ScalarPattern, Value,
};
use rust_decimal::Decimal;

fn dsl(text: &str) -> Pattern {
    Pattern::parse_dsl(text).unwrap()
}

fn object_fields(pattern: &Pattern) -> &ObjectPattern {
    match pattern {
        Pattern::Object(o) | Pattern::Tabular(o) => o,
        other => panic!("expected an object variant, got {}", other.type_name()),
    }
}

// ──────────────────────────────────────────────
// Match reports
// ──────────────────────────────────────────────

#[test]
fn object_reports_every_bad_key() {
    let pattern = dsl(r#"{"id": "(number)", "height": "(number)"}"#);
    let value = Value::object([
        ("id", Value::string("abc123")),
        ("height", Value::string("5 feet 7")),
    ]);
    let result = pattern.matches(&value, &Resolver::new());
    let failure = result.as_failure().expect("both keys are wrong");
    assert_eq!(failure.causes.len(), 2);

    let paths: Vec<String> = failure.lines().into_iter().map(|l| l.path).collect();
    assert_eq!(paths, vec!["height", "id"]);
    assert!(result.report().contains(">> id"));
}

#[test]
fn key_errors_come_before_value_errors() {
    let pattern = dsl(r#"{"id": "(number)", "name": "(string)"}"#);
    let value = Value::object([("id", Value::string("x")), ("extra", Value::number(1))]);
    let failure = pattern.matches(&value, &Resolver::new());
    let paths: Vec<String> = failure
        .as_failure()
        .unwrap()
        .lines()
        .into_iter()
        .map(|l| l.path)
        .collect();
    assert_eq!(paths, vec!["extra", "name", "id"]);
}

// ──────────────────────────────────────────────
// Recursive types
// ──────────────────────────────────────────────

const RECURSIVE: &str = r#"{
    "types": {
        "Node": { "value": "(number)", "next?": "(Node)" },
        "Tree": { "label": "(string)", "children": "(Tree*)" },
        "Ping": { "pong?": "(Pong)" },
        "Pong": { "ping?": "(Ping)" }
    },
    "root": { "node": "(Node)", "tree": "(Tree)", "ping": "(Ping)" }
}"#;

#[test]
fn recursive_types_are_compatible_with_themselves() {
    let (root, resolver) = ContractDocument::from_json_str(RECURSIVE)
        .unwrap()
        .load()
        .unwrap();
    for name in ["Node", "Tree", "Ping", "Pong"] {
        let named = Pattern::deferred(name);
        let result = named.is_compatible_with(&named, &resolver, &resolver);
        assert!(result.is_success(), "{}: {}", name, result.report());
    }
    assert!(root.is_compatible_with(&root, &resolver, &resolver).is_success());
}

#[test]
fn recursive_type_still_checks_inline_nesting() {
    let (newer, mine) = ContractDocument::from_json_str(
        r#"{"types": {"A": {"v": "(number)", "child?": "(A)"}}, "root": "(A)"}"#,
    )
    .unwrap()
    .load()
    .unwrap();
    let older = dsl(r#"{"v": "(number)", "child?": {"v": "(string)"}}"#);
    let theirs = Resolver::new();

    let witness = Value::object([
        ("v", Value::number(1)),
        ("child", Value::object([("v", Value::string("x"))])),
    ]);
    assert!(older.matches(&witness, &theirs).is_success());
    assert!(newer.matches(&witness, &mine).is_failure());

    let result = newer.is_compatible_with(&older, &mine, &theirs);
    let lines = result.as_failure().unwrap().lines();
    assert_eq!(lines[0].path, "child.v");
}

#[test]
fn recursive_types_generate_and_match() {
    let (root, resolver) = ContractDocument::from_json_str(RECURSIVE)
        .unwrap()
        .load()
        .unwrap();
    let value = root.generate(&resolver).unwrap();
    assert!(root.matches(&value, &resolver).is_success());

    let chain = Value::object([
        ("value", Value::number(1)),
        (
            "next",
            Value::object([
                ("value", Value::number(2)),
                ("next", Value::object([("value", Value::number(3))])),
            ]),
        ),
    ]);
    assert!(Pattern::deferred("Node").matches(&chain, &resolver).is_success());

    let broken = Value::object([
        ("value", Value::number(1)),
        ("next", Value::object([("value", Value::string("two"))])),
    ]);
    let result = Pattern::deferred("Node").matches(&broken, &resolver);
    assert_eq!(result.as_failure().unwrap().lines()[0].path, "next.value");
}

#[test]
fn recursive_types_yield_finite_test_variants() {
    let (_, resolver) = ContractDocument::from_json_str(RECURSIVE)
        .unwrap()
        .load()
        .unwrap();
    let variants: Vec<Pattern> = Pattern::deferred("Node")
        .new_based_on(&Row::default(), &resolver)
        .unwrap()
        .collect();
    assert!(!variants.is_empty());
    assert!(variants.len() <= resolver.max_combinations());
}

// ──────────────────────────────────────────────
// Positive variants
// ──────────────────────────────────────────────

#[test]
fn optional_nullable_nested_object_yields_five_variants() {
    let resolver = Resolver::new().with_pattern(
        "Address",
        Pattern::Object(
            ObjectPattern::new([("street?".to_string(), dsl("(string?)"))].into())
                .with_alias("(Address)"),
        ),
    );
    let root = dsl(r#"{"address?": "(Address?)"}"#);
    let variants: Vec<Pattern> = root
        .new_based_on(&Row::default(), &resolver)
        .unwrap()
        .collect();
    assert_eq!(variants.len(), 5);

    let mut shapes = BTreeSet::new();
    for variant in &variants {
        let shape = match object_fields(variant).pattern.get("address") {
            None => "address absent".to_string(),
            Some(p) if p.is_null() => "address null".to_string(),
            Some(address) => match object_fields(address).pattern.get("street") {
                None => "street absent".to_string(),
                Some(p) if p.is_null() => "street null".to_string(),
                Some(p) => format!("street {}", p.type_name()),
            },
        };
        shapes.insert(shape);
    }
    let expected: BTreeSet<String> = [
        "address absent",
        "address null",
        "street absent",
        "street null",
        "street string",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    assert_eq!(shapes, expected);

    for variant in &variants {
        let value = variant.generate(&resolver).unwrap();
        assert!(root.matches(&value, &resolver).is_success(), "{}", value);
    }
}

#[test]
fn many_enum_keys_are_capped() {
    let status = || {
        Pattern::Enum(EnumPattern::new((0..10).map(Value::number).collect(), false).unwrap())
    };
    let root = Pattern::object((0..6).map(|i| (format!("k{}", i), status())));
    let variants: Vec<Pattern> = root
        .new_based_on(&Row::default(), &Resolver::new())
        .unwrap()
        .collect();
    assert_eq!(variants.len(), 64);

    // The first ten variants cover every value of every key.
    for key in ["k0", "k3", "k5"] {
        let seen: BTreeSet<String> = variants[..10]
            .iter()
            .map(|v| object_fields(v).pattern[key].type_name())
            .collect();
        assert_eq!(seen.len(), 10, "{}", key);
    }
}

#[test]
fn row_examples_specialize_keys() {
    let root = dsl(r#"{"id": "(number)", "name": "(string)"}"#);
    let row = Row::from_pairs([("id", "10")]);
    let variants: Vec<Pattern> = root.new_based_on(&row, &Resolver::new()).unwrap().collect();
    assert_eq!(variants.len(), 1);
    assert_eq!(
        object_fields(&variants[0]).pattern["id"],
        Pattern::exact(Value::Number(Decimal::from(10)))
    );

    let bad = Row::from_pairs([("id", "ten")]);
    assert!(root.new_based_on(&bad, &Resolver::new()).is_err());
}

#[test]
fn null_examples_stay_null() {
    let resolver = Resolver::new();
    let root = dsl(r#"{"nick": "(string?)", "age": "(number)"}"#);
    let row = Row::from_json_example(Value::object([
        ("nick", Value::Null),
        ("age", Value::number(3)),
    ]));
    let variants: Vec<Pattern> = root.new_based_on(&row, &resolver).unwrap().collect();
    assert_eq!(variants.len(), 1);
    assert_eq!(object_fields(&variants[0]).pattern["nick"], Pattern::exact(Value::Null));
    assert_eq!(
        variants[0].generate(&resolver).unwrap(),
        Value::object([("age", Value::number(3)), ("nick", Value::Null)])
    );

    let strict = dsl(r#"{"nick": "(string)"}"#);
    let null_row = Row::from_json_example(Value::object([("nick", Value::Null)]));
    assert!(strict.new_based_on(&null_row, &resolver).is_err());
}

// ──────────────────────────────────────────────
// Streaming
// ──────────────────────────────────────────────

#[test]
fn huge_optional_spaces_stream_lazily() {
    // 2^30 combinations; only the first hundred are ever built.
    let root = Pattern::object((0..30).map(|i| (format!("param{}?", i), Pattern::number())));
    let resolver = Resolver::new().with_max_combinations(usize::MAX).unwrap();
    let first: Vec<Pattern> = root
        .new_based_on(&Row::default(), &resolver)
        .unwrap()
        .take(100)
        .collect();
    assert_eq!(first.len(), 100);
    let distinct: BTreeSet<String> = first.iter().map(|p| format!("{:?}", p)).collect();
    assert_eq!(distinct.len(), 100);
}

#[test]
fn negative_streams_are_lazy_too() {
    let root = Pattern::object((0..30).map(|i| (format!("param{}", i), Pattern::string())));
    let first: Vec<Pattern> = root
        .negative_based_on(&Row::default(), &Resolver::new())
        .take(5)
        .collect();
    assert_eq!(first.len(), 5);
}

// ──────────────────────────────────────────────
// Negative variants
// ──────────────────────────────────────────────

#[test]
fn binary_negatives_are_the_other_scalars() {
    let names: Vec<String> = Pattern::Scalar(ScalarPattern::Binary)
        .negative_based_on(&Row::default(), &Resolver::new())
        .map(|p| p.type_name())
        .collect();
    assert_eq!(names, vec!["null", "number", "boolean"]);
}

fn corrupted_keys(policy: NegativePolicy) -> Vec<(String, String)> {
    let root = dsl(r#"{"name": "(string)", "age": "(number)", "status": {"$enum": ["OPEN", "CLOSED"]}}"#);
    let resolver = Resolver::new().with_negative_policy(policy);
    let mut pairs = Vec::new();
    let clean = object_fields(&root).pattern.clone();
    for variant in root.negative_based_on(&Row::default(), &resolver) {
        let fields = &object_fields(&variant).pattern;
        for (key, pattern) in fields {
            if clean.get(key) != Some(pattern) {
                pairs.push((key.clone(), pattern.type_name()));
            }
        }
    }
    pairs
}

#[test]
fn every_policy_corrupts_one_key_at_a_time() {
    let all = corrupted_keys(NegativePolicy::All);
    assert_eq!(all.len(), 9);

    let typed = corrupted_keys(NegativePolicy::NonStringly);
    assert!(typed.iter().all(|(_, name)| name != "null"));
    assert!(!typed.contains(&("name".to_string(), "string".to_string())));
    assert!(typed.contains(&("age".to_string(), "boolean".to_string())));
    assert!(typed.contains(&("status".to_string(), "number".to_string())));

    let stringly = corrupted_keys(NegativePolicy::Stringly);
    assert!(stringly.iter().all(|(key, _)| key == "age"));
    assert_eq!(stringly.len(), 2);
}

#[test]
fn negatives_never_match_the_original() {
    let root = dsl(r#"{"id": "(number)", "nick?": "(string?)", "born": "(date)"}"#);
    let resolver = Resolver::new();
    for variant in root.negative_based_on(&Row::default(), &resolver) {
        let value = variant.generate(&resolver).unwrap();
        assert!(
            root.matches(&value, &resolver).is_failure(),
            "{} should not match",
            value
        );
    }
}


#[test]
fn structured_negatives_never_match_the_original() {
    let root = dsl(
        r#"{
            "ids": "(number*)",
            "pair": ["(string)", "(number...)"],
            "prices": {"$dictionary": ["(string)", "(number)"]}
        }"#,
    );
    let resolver = Resolver::new();
    for _ in 0..20 {
        for variant in root.negative_based_on(&Row::default(), &resolver) {
            let value = variant.generate(&resolver).unwrap();
            assert!(
                root.matches(&value, &resolver).is_failure(),
                "{} from {} should not match",
                value,
                variant.type_name()
            );
        }
    }
}
