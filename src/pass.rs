use std::time::Instant;

use tracing::{trace, warn};

use crate::action::apply_actions;
use crate::config::{ActionErrorPolicy, EngineConfig};
use crate::{evaluate_conditions, ActionError, Fact, FactReport, FiredRule, MatchNetwork, RuleSet};

/// One pass of `rule_set` over `facts`, rule by rule.
///
/// Each object is worked on as a copy. A rule sees the mutations of the rules
/// before it on the same object, never those made on other objects.
pub(crate) fn run_naive(
    rule_set: &RuleSet,
    facts: &[Fact],
    config: &EngineConfig,
) -> Result<Vec<FactReport>, ActionError> {
    facts
        .iter()
        .map(|fact| {
            let start = Instant::now();
            let mut working = fact.clone();
            let mut fired = Vec::new();
            let result = fire_naive(rule_set, &mut working, &mut fired, config);
            finish(fact, working, fired, result, start, config)
        })
        .collect()
}

fn fire_naive(
    rule_set: &RuleSet,
    fact: &mut Fact,
    fired: &mut Vec<FiredRule>,
    config: &EngineConfig,
) -> Result<(), ActionError> {
    for rule in rule_set.rules() {
        if !evaluate_conditions(rule_set, rule, fact) {
            continue;
        }
        apply_actions(rule_set, rule, fact, &config.audit_field)?;
        trace!(rule_set = %rule_set.id(), rule = %rule.index, "rule fired");
        fired.push(FiredRule::of(rule_set, rule));
    }
    Ok(())
}

/// One pass of everything registered in `network` over `facts`.
///
/// Rules are walked in match order against the object as it is mutated, so the
/// result equals a naive pass over the same rules. Each activation applies
/// through the rule set it came from.
pub(crate) fn run_network(
    network: &MatchNetwork,
    facts: &[Fact],
    config: &EngineConfig,
) -> Result<Vec<FactReport>, ActionError> {
    facts
        .iter()
        .map(|fact| {
            let start = Instant::now();
            let mut working = fact.clone();
            let mut fired = Vec::new();
            let result = fire_network(network, &mut working, &mut fired, config);
            finish(fact, working, fired, result, start, config)
        })
        .collect()
}

fn fire_network(
    network: &MatchNetwork,
    fact: &mut Fact,
    fired: &mut Vec<FiredRule>,
    config: &EngineConfig,
) -> Result<(), ActionError> {
    network.run(fact, |activation, fact| {
        apply_actions(activation.rule_set(), activation.rule(), fact, &config.audit_field)?;
        let entry = activation.fired();
        trace!(rule_set = %entry.rule_set_id(), rule = %entry.rule_index(), "rule fired");
        fired.push(entry);
        Ok(())
    })
}

fn finish(
    input: &Fact,
    working: Fact,
    fired: Vec<FiredRule>,
    result: Result<(), ActionError>,
    start: Instant,
    config: &EngineConfig,
) -> Result<FactReport, ActionError> {
    let Err(err) = result else {
        return Ok(FactReport::new(working, fired, None, start.elapsed()));
    };
    warn!(error = %err, fired = fired.len(), policy = ?config.on_action_error, "action failed");
    match config.on_action_error {
        ActionErrorPolicy::FailBatch => Err(err),
        ActionErrorPolicy::RestoreObject => {
            Ok(FactReport::new(input.clone(), fired, Some(err), start.elapsed()))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{Combinator, RuleSetBuilder};

    fn seats() -> RuleSet {
        RuleSetBuilder::new("seats")
            .combinator(Combinator::And)
            .column("Condition_1", "Seats", ">=")
            .column("Action_1", "Seats", "Increase")
            .column("Action_2", "Label", "Set")
            .rule(|r| r.when("Condition_1", "1").then("Action_1", "1"))
            .rule(|r| r.when("Condition_1", "3").then("Action_2", "many"))
            .build()
    }

    fn facts() -> Vec<Fact> {
        vec![
            Fact::new().set("Seats", 2).set("Label", ""),
            Fact::new().set("Seats", 0).set("Label", ""),
        ]
    }

    #[test]
    fn naive_sees_earlier_mutations() {
        let reports = run_naive(&seats(), &facts(), &EngineConfig::default()).unwrap();
        assert_eq!(reports[0].fact().get("Seats"), Some(&json!(3)));
        assert_eq!(reports[0].fact().get("Label"), Some(&json!("many")));
        assert_eq!(reports[0].fired().len(), 2);
        assert_eq!(reports[1].fact(), &facts()[1]);
        assert!(reports[1].fired().is_empty());
    }

    #[test]
    fn network_sees_earlier_mutations() {
        let mut network = MatchNetwork::new();
        network.add_rule_set(Arc::new(seats()));
        let config = EngineConfig::default();
        let via_network = run_network(&network, &facts(), &config).unwrap();
        let naive = run_naive(&seats(), &facts(), &config).unwrap();

        assert_eq!(via_network[0].fact().get("Label"), Some(&json!("many")));
        assert_eq!(via_network[0].fired().len(), 2);
        for (a, b) in via_network.iter().zip(&naive) {
            assert_eq!(a.fact(), b.fact());
            assert_eq!(a.fired(), b.fired());
        }
    }

    fn failing() -> RuleSet {
        RuleSetBuilder::new("bad")
            .column("Action_1", "Seats", "Increase")
            .column("Action_2", "Seats", "Increase")
            .rule(|r| r.then("Action_1", "1"))
            .rule(|r| r.then("Action_2", "lots"))
            .build()
    }

    #[test]
    fn restore_policy_keeps_batch_going() {
        let input = vec![Fact::new().set("Seats", 5), Fact::new().set("Other", 1)];
        let reports = run_naive(&failing(), &input, &EngineConfig::default()).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].fact(), &input[0]);
        assert!(matches!(reports[0].error(), Some(ActionError::NotAnInteger { .. })));
        assert_eq!(reports[0].fired().len(), 1);
        assert!(reports[1].error().is_none());
    }

    #[test]
    fn fail_batch_policy_aborts() {
        let config = EngineConfig::default().with_action_error_policy(ActionErrorPolicy::FailBatch);
        let input = vec![Fact::new().set("Seats", 5)];
        assert!(run_naive(&failing(), &input, &config).is_err());

        let mut network = MatchNetwork::new();
        network.add_rule_set(Arc::new(failing()));
        assert!(run_network(&network, &input, &config).is_err());
    }
}
