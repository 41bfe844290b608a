use serde_json::Value;

use crate::{Combinator, ConditionOp, Fact, Literal, Rule, RuleSet};

/// Result of testing one condition cell against one fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The column has no field definition, or the fact lacks the field.
    Missing,
    /// Blank literal: the field is present and nothing is tested.
    Wildcard,
    Passed,
    Failed,
}

impl Combinator {
    pub(crate) fn seed(self) -> bool {
        self == Combinator::And
    }

    /// Fold one condition outcome into the running result.
    ///
    /// A missing field forces `false` whatever the combinator, so under OR a
    /// missing field after a passing condition flips the result back.
    pub(crate) fn combine(self, acc: bool, outcome: Outcome) -> bool {
        match (outcome, self) {
            (Outcome::Missing, _) => false,
            (Outcome::Wildcard, _) => acc,
            (Outcome::Passed, Combinator::And) => acc,
            (Outcome::Failed, Combinator::And) => false,
            (Outcome::Passed, Combinator::Or) => true,
            (Outcome::Failed, Combinator::Or) => acc,
        }
    }
}

/// A condition cell with its operator and literal parsed, ready to test.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Condition {
    op: Option<ConditionOp>,
    literal: Literal,
}

impl Condition {
    pub(crate) fn new(operator: Option<&str>, literal: &str) -> Self {
        Self {
            op: operator.and_then(ConditionOp::from_phrase),
            literal: Literal::parse(literal),
        }
    }

    /// Test a present fact value. An unknown operator fails the condition.
    pub(crate) fn test(&self, value: &Value) -> Outcome {
        if self.literal.is_blank() {
            return Outcome::Wildcard;
        }
        match self.op {
            Some(op) if self.literal.test(op, value) => Outcome::Passed,
            _ => Outcome::Failed,
        }
    }
}

/// Decide whether `rule` fires on `fact`.
///
/// Conditions are folded in column order starting from `true` for AND and
/// `false` for OR. Every condition is visited; nothing short-circuits.
#[must_use]
pub fn evaluate_conditions(rule_set: &RuleSet, rule: &Rule, fact: &Fact) -> bool {
    let combinator = rule_set.combinator();
    let definitions = rule_set.definitions();

    rule.conditions
        .iter()
        .fold(combinator.seed(), |acc, (column, literal)| {
            let outcome = match definitions.field_name(column).and_then(|f| fact.get(f)) {
                None => Outcome::Missing,
                Some(value) => Condition::new(definitions.operator(column), literal).test(value),
            };
            combinator.combine(acc, outcome)
        })
}
