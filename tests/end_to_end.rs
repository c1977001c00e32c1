//! End-to-end rulebase -> input -> output scenarios (spec.md §8 S1-S6),
//! exercised through the public `Context` API rather than any internal
//! module, the way `examples/gregjoy1-redical`'s `tests/integration.rs`
//! drives its crate only through its published surface.

use log_pdag::{Context, Value};

fn load(rulebase: &str) -> Context {
    let mut ctx = Context::new();
    let errors = ctx.load_rulebase_str(rulebase);
    assert!(errors.is_empty(), "unexpected compile errors: {:?}", errors);
    ctx
}

fn field<'a>(result: &'a Value, name: &str) -> &'a Value {
    match result {
        Value::Object(fields) => fields.get(name).unwrap_or_else(|| panic!("missing field '{}'", name)),
        other => panic!("expected an object, got {:?}", other),
    }
}

fn tags(result: &Value) -> Vec<String> {
    match field(result, "event.tags") {
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_str().expect("tag is a string").to_string())
            .collect(),
        other => panic!("expected an array, got {:?}", other),
    }
}

#[test]
fn s1_word_and_rest_capture_two_fields() {
    let ctx = load("version=2\nrule=:%from:word% says %msg:rest%");
    let result = ctx.normalize(b"foo says hello!");
    assert_eq!(field(&result, "from"), &Value::str("foo"));
    assert_eq!(field(&result, "msg"), &Value::str("hello!"));
}

#[test]
fn s2_ipv4_fields_and_tag() {
    let ctx = load("version=2\nrule=[tagA]:src=%src:ipv4% dst=%dst:ipv4%");
    let result = ctx.normalize(b"src=10.0.0.1 dst=10.0.0.2");
    assert_eq!(field(&result, "src"), &Value::str("10.0.0.1"));
    assert_eq!(field(&result, "dst"), &Value::str("10.0.0.2"));
    assert_eq!(tags(&result), vec!["tagA".to_string()]);
}

#[test]
fn s3_annotation_adds_a_field_alongside_the_capture() {
    let ctx = load("version=2\nrule=[login]:user %u:word% in\nannotate=login:+origin=\"syslog\"");
    let result = ctx.normalize(b"user alice in");
    assert_eq!(field(&result, "u"), &Value::str("alice"));
    assert_eq!(tags(&result), vec!["login".to_string()]);
    assert_eq!(field(&result, "origin"), &Value::str("syslog"));
}

#[test]
fn s4_non_match_preserves_originalmsg_and_unparsed_data() {
    let ctx = load("version=2\nrule=[tagA]:src=%src:ipv4% dst=%dst:ipv4%");
    let result = ctx.normalize(b"not an iptables line");
    assert_eq!(field(&result, "originalmsg"), &Value::str("not an iptables line"));
    assert_eq!(field(&result, "unparsed-data"), &Value::str("not an iptables line"));
}

#[test]
fn s5_optimizer_does_not_change_matching_behavior() {
    let ctx = load("version=2\nrule=:hello world");
    assert!(matches!(ctx.normalize(b"hello world"), Value::Object(fields) if !fields.contains("originalmsg")));
    let miss = ctx.normalize(b"hello worlX");
    assert_eq!(field(&miss, "unparsed-data"), &Value::str("X"));
}

#[test]
fn s6_backtracking_prefers_the_first_rule_that_fully_matches() {
    let ctx = load(concat!(
        "version=2\n",
        "rule=:%a:word% %b:word%\n",
        "rule=:%a:word% %b:rest%\n",
    ));
    let result = ctx.normalize(b"one two three");
    assert_eq!(field(&result, "a"), &Value::str("one"));
    assert_eq!(field(&result, "b"), &Value::str("two three"));
}

#[test]
fn ipv4_ipv6_mac48_boundary_cases() {
    let ctx = load(concat!(
        "version=2\n",
        "rule=[v4]:addr=%a:ipv4%\n",
        "rule=[v6]:addr=%a:ipv6%\n",
        "rule=[mac]:addr=%a:mac48%\n",
    ));

    let v4 = ctx.normalize(b"addr=255.255.255.255");
    assert_eq!(tags(&v4), vec!["v4".to_string()]);

    let bad_v4 = ctx.normalize(b"addr=256.0.0.1");
    assert!(!matches!(field(&bad_v4, "unparsed-data"), Value::String(s) if s.is_empty()));

    let v6 = ctx.normalize(b"addr=::");
    assert_eq!(tags(&v6), vec!["v6".to_string()]);

    let mixed_mac = ctx.normalize(b"addr=00:11:22-33:44:55");
    assert!(field(&mixed_mac, "originalmsg") == &Value::str("addr=00:11:22-33:44:55"));
}

#[test]
fn annotation_remove_deletes_a_captured_field() {
    let ctx = load(concat!(
        "version=2\n",
        "rule=[scrub]:user=%user:word% pass=%pass:word%\n",
        "annotate=scrub:-pass\n",
    ));
    let result = ctx.normalize(b"user=alice pass=hunter2");
    assert_eq!(field(&result, "user"), &Value::str("alice"));
    match result {
        Value::Object(fields) => assert!(!fields.contains("pass")),
        other => panic!("expected an object, got {:?}", other),
    }
}

#[test]
fn repeated_annotate_directives_for_one_tag_concatenate() {
    let ctx = load(concat!(
        "version=2\n",
        "rule=[login]:user %u:word% in\n",
        "annotate=login:+origin=\"syslog\"\n",
        "annotate=login:+severity=\"info\"\n",
    ));
    let result = ctx.normalize(b"user alice in");
    assert_eq!(field(&result, "origin"), &Value::str("syslog"));
    assert_eq!(field(&result, "severity"), &Value::str("info"));
}

#[test]
fn rejects_a_rulebase_missing_the_version_header() {
    let mut ctx = Context::new();
    let errors = ctx.load_rulebase_str("rule=:hello");
    assert!(!errors.is_empty());
}

#[test]
fn named_type_reference_is_reusable_across_rules() {
    let ctx = load(concat!(
        "version=2\n",
        "type=@oct:%n:number%\n",
        "rule=:a %x:@oct%\n",
        "rule=:b %y:@oct%\n",
    ));
    assert_eq!(field(&ctx.normalize(b"a 7"), "x"), &Value::str("7"));
    assert_eq!(field(&ctx.normalize(b"b 9"), "y"), &Value::str("9"));
}

#[test]
fn cef_event_decomposes_header_and_extensions() {
    let ctx = load("version=2\nrule=[cef]:%e:cef%");
    let input = b"CEF:0|Security|threatmanager|1.0|100|worm successfully stopped|10|src=10.0.0.1 dst=2.1.2.2";
    let result = ctx.normalize(input);
    match field(&result, "e") {
        Value::Object(fields) => {
            assert_eq!(fields.get("SignatureID"), Some(&Value::str("100")));
            match fields.get("Extensions") {
                Some(Value::Object(ext)) => {
                    assert_eq!(ext.get("src"), Some(&Value::str("10.0.0.1")));
                }
                other => panic!("expected Extensions object, got {:?}", other),
            }
        }
        other => panic!("expected object, got {:?}", other),
    }
}
