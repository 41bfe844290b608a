use std::fmt;

use super::rule::Rule;
use super::ruleset::RuleSet;

/// A rule that fired on a fact, identified by its rule set and rule index.
///
/// The `Display` form is the audit entry recorded under the audit field when a
/// rule set's general action is `SetAppliedRules`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub struct FiredRule {
    rule_set_id: String,
    rule_index: String,
}

impl FiredRule {
    pub fn new(rule_set_id: impl Into<String>, rule_index: impl Into<String>) -> Self {
        Self {
            rule_set_id: rule_set_id.into(),
            rule_index: rule_index.into(),
        }
    }

    pub(crate) fn of(rule_set: &RuleSet, rule: &Rule) -> Self {
        Self::new(rule_set.id(), rule.index.as_str())
    }

    #[must_use]
    pub fn rule_set_id(&self) -> &str {
        &self.rule_set_id
    }

    #[must_use]
    pub fn rule_index(&self) -> &str {
        &self.rule_index
    }
}

impl fmt::Display for FiredRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleId:{} RuleIndex:{}", self.rule_set_id, self.rule_index)
    }
}
