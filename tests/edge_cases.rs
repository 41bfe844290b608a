use rulegrid::{
    apply, evaluate_conditions, resolve_column, Combinator, Fact, RuleSet, RuleSetBuilder,
    FIELD_NAME_MARKER, OPERATOR_MARKER,
};
use serde_json::json;

const SAMPLE: &str = r##"{
    "Metadata": { "Id": "1", "ClassName": "AvailableFlight", "ConditionsOperator": "AND", "GeneralAction": "SetAppliedRules" },
    "Rules": [
        { "Index": "#FieldName", "Condition_1": "CabinClass", "Action_1": "Promo" },
        { "Index": "#Operator", "Condition_1": "Equals", "Action_1": "Set" },
        { "Index": "1", "Condition_1": "E", "Action_1": "true" }
    ]
}"##;

fn flight() -> Fact {
    Fact::new()
        .set("Origin", "THR")
        .set("Destination", "MHD")
        .set("CabinClass", "E")
}

fn fire_all(rule_set: &RuleSet, fact: &mut Fact) {
    for rule in rule_set.rules() {
        if evaluate_conditions(rule_set, rule, fact) {
            apply(rule_set, rule, fact).unwrap();
        }
    }
}

#[test]
fn missing_action_target_leaves_fact_untouched() {
    let rule_set = RuleSet::from_json_str(SAMPLE).unwrap();
    let rule = &rule_set.rules()[0];

    let mut fact = flight();
    assert!(evaluate_conditions(&rule_set, rule, &fact));
    apply(&rule_set, rule, &mut fact).unwrap();

    assert_eq!(fact, flight());
    assert!(!fact.contains("AppliedRules"));
}

#[test]
fn present_action_target_is_set_and_audited() {
    let rule_set = RuleSet::from_json_str(SAMPLE).unwrap();
    let mut fact = flight().set("Promo", false);
    fire_all(&rule_set, &mut fact);

    assert_eq!(fact.get("Promo"), Some(&json!(true)));
    assert_eq!(fact.get("AppliedRules"), Some(&json!(["RuleId:1 RuleIndex:1"])));
}

fn or_rule_set(first: &str, second: &str) -> RuleSet {
    RuleSetBuilder::new("or")
        .combinator(Combinator::Or)
        .column("Condition_1", first, "Equals")
        .column("Condition_2", second, "Equals")
        .column("Action_1", "CabinClass", "Set")
        .rule(|r| {
            r.when("Condition_1", "THR")
                .when("Condition_2", "THR")
                .then("Action_1", "B")
        })
        .build()
}

#[test]
fn or_missing_field_after_pass_forces_false() {
    let rule_set = or_rule_set("Origin", "Gate");
    assert!(!evaluate_conditions(&rule_set, &rule_set.rules()[0], &flight()));
}

#[test]
fn or_pass_after_missing_field_recovers() {
    let rule_set = or_rule_set("Gate", "Origin");
    assert!(evaluate_conditions(&rule_set, &rule_set.rules()[0], &flight()));
}

#[test]
fn renumbering_skips_definition_rows_and_actionless_rules() {
    let rule_set = RuleSet::from_json_str(
        r##"{
            "Metadata": { "Id": "2", "ConditionsOperator": "OR" },
            "Rules": [
                { "Index": "#FieldName", "Condition_1": "CabinClass", "Action_1": "Promo" },
                { "Index": "#Operator", "Condition_1": "Equals", "Action_1": "Set" },
                { "Index": "3", "Condition_1": "E", "Action_1": "true" },
                { "Index": "4", "Condition_1": "B", "Action_1": "  " },
                { "Index": "5", "Condition_1": "F", "Action_1": "false" }
            ]
        }"##,
    )
    .unwrap();

    let indices: Vec<&str> = rule_set.rules().iter().map(|r| r.index.as_str()).collect();
    assert_eq!(indices, vec!["1", "2"]);
    assert_eq!(rule_set.rule("2").unwrap().conditions[0].1, "F");
}

#[test]
fn resolve_column_reads_marker_rows() {
    let rule_set = RuleSet::from_json_str(SAMPLE).unwrap();
    let defs = rule_set.definitions();
    assert_eq!(defs.field_name("Condition_1"), Some("CabinClass"));
    assert_eq!(defs.operator("Action_1"), Some("Set"));
    assert_eq!(defs.field_name("Condition_2"), None);

    let rows = vec![rulegrid::Rule {
        index: FIELD_NAME_MARKER.into(),
        conditions: vec![("Condition_1".into(), "Seats".into())],
        actions: vec![],
    }];
    assert_eq!(resolve_column(&rows, "Condition_1", FIELD_NAME_MARKER), Some("Seats"));
    assert_eq!(resolve_column(&rows, "Condition_1", OPERATOR_MARKER), None);
    assert_eq!(resolve_column(&[], "Condition_1", FIELD_NAME_MARKER), None);
}

#[test]
fn later_rules_see_earlier_mutations() {
    let rule_set = RuleSetBuilder::new("chain")
        .column("Condition_1", "CabinClass", "Equals")
        .column("Action_1", "CabinClass", "Set")
        .rule(|r| r.when("Condition_1", "E").then("Action_1", "B"))
        .rule(|r| r.when("Condition_1", "B").then("Action_1", "F"))
        .build();
    let mut fact = flight();
    fire_all(&rule_set, &mut fact);
    assert_eq!(fact.get("CabinClass"), Some(&json!("F")));
}

#[test]
fn numeric_and_text_comparisons() {
    let rule_set = RuleSetBuilder::new("mixed")
        .column("Condition_1", "Seats", "GreaterThan")
        .column("Condition_2", "Price", "<=")
        .column("Condition_3", "Tags", "Contains")
        .column("Condition_4", "Origin", "StartsWith")
        .column("Action_1", "Label", "Set")
        .rule(|r| {
            r.when("Condition_1", "9")
                .when("Condition_2", "99.5")
                .when("Condition_3", "night")
                .when("Condition_4", "TH")
                .then("Action_1", "ok")
        })
        .build();

    let fact = flight()
        .set("Seats", 10)
        .set("Price", "99.5")
        .set("Tags", json!(["night", "direct"]))
        .set("Label", "");
    assert!(evaluate_conditions(&rule_set, &rule_set.rules()[0], &fact));

    let fact = fact.set("Seats", 9);
    assert!(!evaluate_conditions(&rule_set, &rule_set.rules()[0], &fact));
}
