use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::evaluate::{Condition, Outcome};
use crate::{Combinator, ConditionOp, Fact, FiredRule, Rule, RuleSet};

/// Canonical identity of a condition test. Operators are keyed by their parsed
/// form so `Equals` and `==` share a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct NodeKey {
    field: String,
    op: Option<ConditionOp>,
    literal: String,
}

/// One shared condition test, reading the field at `field_slot`.
#[derive(Debug)]
struct ConditionNode {
    field_slot: usize,
    condition: Condition,
}

impl ConditionNode {
    fn outcome(&self, value: Option<&Value>) -> Outcome {
        match value {
            Some(value) => self.condition.test(value),
            None => Outcome::Missing,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum JoinTerm {
    Node(usize),
    /// The column has no field definition; always missing.
    Unresolved,
}

/// A rule compiled into a join over condition nodes.
#[derive(Debug)]
struct RuleJoin {
    rule_set: usize,
    rule: usize,
    combinator: Combinator,
    terms: Vec<JoinTerm>,
}

impl RuleJoin {
    fn holds(&self, outcomes: &[Outcome]) -> bool {
        self.terms.iter().fold(self.combinator.seed(), |acc, term| {
            let outcome = match term {
                JoinTerm::Node(idx) => outcomes[*idx],
                JoinTerm::Unresolved => Outcome::Missing,
            };
            self.combinator.combine(acc, outcome)
        })
    }
}

/// A rule whose join matched a fact, together with the rule set it came from.
#[derive(Debug, Clone, Copy)]
pub struct Activation<'a> {
    rule_set: &'a Arc<RuleSet>,
    rule: &'a Rule,
}

impl<'a> Activation<'a> {
    #[must_use]
    pub fn rule_set(&self) -> &'a Arc<RuleSet> {
        self.rule_set
    }

    #[must_use]
    pub fn rule(&self) -> &'a Rule {
        self.rule
    }

    #[must_use]
    pub fn fired(&self) -> FiredRule {
        FiredRule::of(self.rule_set, self.rule)
    }
}

/// Matching network shared by every rule set registered into it.
///
/// Identical `(field, operator, literal)` tests are compiled into one node and
/// evaluated once per fact, however many rules reference them. Rule sets only
/// accumulate: [`match_fact`](Self::match_fact) reports matches across every
/// rule set added so far. Scope an instance to one unit of work and drop it.
#[derive(Debug, Default)]
pub struct MatchNetwork {
    rule_sets: Vec<Arc<RuleSet>>,
    fields: Vec<String>,
    field_index: HashMap<String, usize>,
    /// Nodes reading each field slot.
    field_nodes: Vec<Vec<usize>>,
    nodes: Vec<ConditionNode>,
    node_index: HashMap<NodeKey, usize>,
    joins: Vec<RuleJoin>,
}

impl MatchNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every rule of `rule_set` into joins over shared nodes.
    ///
    /// Each join keeps the combinator of the rule set it came from.
    pub fn add_rule_set(&mut self, rule_set: Arc<RuleSet>) {
        let slot = self.rule_sets.len();
        let combinator = rule_set.combinator();
        let nodes_before = self.nodes.len();
        let mut reused = 0usize;

        for (position, rule) in rule_set.rules().iter().enumerate() {
            let mut terms = Vec::with_capacity(rule.conditions.len());
            for (column, literal) in &rule.conditions {
                let definitions = rule_set.definitions();
                let Some(field) = definitions.field_name(column) else {
                    terms.push(JoinTerm::Unresolved);
                    continue;
                };
                let (node, existed) = self.register_node(field, definitions.operator(column), literal);
                if existed {
                    reused += 1;
                }
                terms.push(JoinTerm::Node(node));
            }
            self.joins.push(RuleJoin {
                rule_set: slot,
                rule: position,
                combinator,
                terms,
            });
        }

        debug!(
            rule_set = %rule_set.id(),
            rules = rule_set.rules().len(),
            created = self.nodes.len() - nodes_before,
            reused,
            "registered rule set in match network"
        );
        self.rule_sets.push(rule_set);
    }

    /// Return the node for this test, creating it if needed. The flag is `true`
    /// when an existing node was reused.
    fn register_node(&mut self, field: &str, operator: Option<&str>, literal: &str) -> (usize, bool) {
        let key = NodeKey {
            field: field.to_owned(),
            op: operator.and_then(ConditionOp::from_phrase),
            literal: literal.to_owned(),
        };
        if let Some(&idx) = self.node_index.get(&key) {
            return (idx, true);
        }

        let field_slot = self.register_field(field);
        let idx = self.nodes.len();
        self.nodes.push(ConditionNode {
            field_slot,
            condition: Condition::new(operator, literal),
        });
        self.node_index.insert(key, idx);
        self.field_nodes[field_slot].push(idx);
        (idx, false)
    }

    fn register_field(&mut self, field: &str) -> usize {
        if let Some(&slot) = self.field_index.get(field) {
            return slot;
        }
        let slot = self.fields.len();
        self.fields.push(field.to_owned());
        self.field_index.insert(field.to_owned(), slot);
        self.field_nodes.push(Vec::new());
        slot
    }

    /// Match `fact` against every registered rule, as it stands.
    ///
    /// Each field is looked up once and each node tested once. Every join
    /// folds with the combinator of the rule set it came from, so no
    /// combinator is passed in. Matches come back in registration order, then
    /// rule order within a rule set.
    #[must_use]
    pub fn match_fact(&self, fact: &Fact) -> Vec<Activation<'_>> {
        let outcomes = self.outcomes(fact);
        self.joins
            .iter()
            .filter(|join| join.holds(&outcomes))
            .map(|join| self.activation(join))
            .collect()
    }

    /// Walk every registered rule in match order against the current state of
    /// `fact`, calling `fire` for each rule whose join holds.
    ///
    /// Mutations made by `fire` are seen by the rules after it. Node outcomes
    /// are cached per fact state: after each firing only the nodes reading a
    /// field whose value changed are tested again. The first error from `fire`
    /// stops the walk.
    ///
    /// # Errors
    ///
    /// Returns whatever `fire` returns.
    pub fn run<'a, E>(
        &'a self,
        fact: &mut Fact,
        mut fire: impl FnMut(Activation<'a>, &mut Fact) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut values: Vec<Option<Value>> =
            self.fields.iter().map(|field| fact.get(field).cloned()).collect();
        let mut outcomes = self.outcomes(fact);

        for join in &self.joins {
            if !join.holds(&outcomes) {
                continue;
            }
            fire(self.activation(join), fact)?;

            for (slot, field) in self.fields.iter().enumerate() {
                let current = fact.get(field);
                if current == values[slot].as_ref() {
                    continue;
                }
                values[slot] = current.cloned();
                for &idx in &self.field_nodes[slot] {
                    outcomes[idx] = self.nodes[idx].outcome(values[slot].as_ref());
                }
            }
        }
        Ok(())
    }

    fn outcomes(&self, fact: &Fact) -> Vec<Outcome> {
        let values: Vec<_> = self.fields.iter().map(|field| fact.get(field)).collect();
        self.nodes
            .iter()
            .map(|node| node.outcome(values[node.field_slot]))
            .collect()
    }

    fn activation(&self, join: &RuleJoin) -> Activation<'_> {
        let rule_set = &self.rule_sets[join.rule_set];
        Activation {
            rule_set,
            rule: &rule_set.rules()[join.rule],
        }
    }

    /// Number of distinct condition nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of compiled rule joins across all rule sets.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.joins.len()
    }

    #[must_use]
    pub fn rule_set_count(&self) -> usize {
        self.rule_sets.len()
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rule_sets.is_empty()
    }
}
