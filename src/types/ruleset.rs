use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::definitions::ColumnDefinitions;
use super::rule::Rule;

/// General action name that turns on the applied-rules audit trail.
pub const SET_APPLIED_RULES: &str = "SetAppliedRules";

/// How the outcomes of a rule's conditions combine into one firing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    /// Parse `"AND"` / `"OR"`, ignoring ASCII case and surrounding whitespace.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("AND") {
            Some(Self::And)
        } else if text.eq_ignore_ascii_case("OR") {
            Some(Self::Or)
        } else {
            None
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("AND"),
            Self::Or => f.write_str("OR"),
        }
    }
}

/// Rule set metadata, taken from the `Metadata` section of a rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub id: String,
    /// The object class this rule set applies to.
    pub class_name: Option<String>,
    pub version: Option<String>,
    pub conditions_operator: Combinator,
    pub general_action: Option<String>,
    /// Any other metadata cells, kept as text.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Metadata {
    #[must_use]
    pub fn new(id: &str, conditions_operator: Combinator) -> Self {
        Self {
            id: id.to_owned(),
            class_name: None,
            version: None,
            conditions_operator,
            general_action: None,
            extra: BTreeMap::new(),
        }
    }

    /// Whether firing rules must record themselves in the audit list.
    #[must_use]
    pub fn records_applied_rules(&self) -> bool {
        self.general_action.as_deref() == Some(SET_APPLIED_RULES)
    }

    /// The key this rule set is stored and looked up under: the class name,
    /// or the id when no class name is given.
    #[must_use]
    pub fn class_key(&self) -> &str {
        self.class_name.as_deref().unwrap_or(&self.id)
    }
}

/// A compiled rule table: metadata, ordinary rules in firing order, and the
/// column definitions those rules are read through.
///
/// Immutable once built; share it behind `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub(crate) metadata: Metadata,
    pub(crate) rules: Vec<Rule>,
    pub(crate) definitions: ColumnDefinitions,
}

impl RuleSet {
    /// Assemble a rule set from raw rows.
    ///
    /// Definition rows and rows without a non-blank action are dropped; the
    /// remaining rules are renumbered `1..=N` in their original order.
    #[must_use]
    pub fn new(metadata: Metadata, definitions: ColumnDefinitions, rows: Vec<Rule>) -> Self {
        let rules = rows
            .into_iter()
            .filter(|row| !row.is_definition() && row.has_action())
            .enumerate()
            .map(|(i, mut rule)| {
                rule.index = (i + 1).to_string();
                rule
            })
            .collect();
        Self {
            metadata,
            rules,
            definitions,
        }
    }

    /// Load a rule set from the JSON text of a tabular document.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`](super::LoadError) if the document is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, super::LoadError> {
        crate::load::load_str(json)
    }

    /// Load a rule set from the JSON bytes of a tabular document.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`](super::LoadError) if the document is malformed.
    pub fn from_json_slice(json: &[u8]) -> Result<Self, super::LoadError> {
        crate::load::load_slice(json)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    #[must_use]
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    #[must_use]
    pub fn combinator(&self) -> Combinator {
        self.metadata.conditions_operator
    }

    /// Ordinary rules in firing order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn definitions(&self) -> &ColumnDefinitions {
        &self.definitions
    }

    /// Look up a rule by its (renumbered) index.
    #[must_use]
    pub fn rule(&self, index: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.index == index)
    }
}

#[cfg(feature = "binary-cache")]
impl RuleSet {
    /// Serialize this rule set to a byte vector.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`](crate::serial::SerializeError) if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, crate::serial::SerializeError> {
        crate::serial::encode(self)
    }

    /// Deserialize a rule set previously produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`](crate::serial::DeserializeError) on
    /// format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, crate::serial::DeserializeError> {
        crate::serial::decode(bytes)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleSet({}: {} rules, {} columns, {})",
            self.metadata.id,
            self.rules.len(),
            self.definitions.len(),
            self.metadata.conditions_operator,
        )
    }
}

/// Builder for assembling a [`RuleSet`] in code.
///
/// # Example
///
/// ```
/// use rulegrid::{Combinator, RuleSetBuilder};
///
/// let rule_set = RuleSetBuilder::new("flights")
///     .class_name("AvailableFlight")
///     .combinator(Combinator::And)
///     .column("Condition_1", "CabinClass", "Equals")
///     .column("Action_1", "MaxPrice", "Set")
///     .rule(|r| r.when("Condition_1", "E").then("Action_1", "100"))
///     .build();
///
/// assert_eq!(rule_set.rules().len(), 1);
/// assert_eq!(rule_set.rules()[0].index, "1");
/// ```
#[derive(Debug)]
pub struct RuleSetBuilder {
    metadata: Metadata,
    definitions: ColumnDefinitions,
    rules: Vec<Rule>,
}

/// Intermediate builder passed to the rule definition closure.
#[derive(Debug, Default)]
pub struct RuleBuilder {
    conditions: Vec<(String, String)>,
    actions: Vec<(String, String)>,
}

impl RuleSetBuilder {
    /// Start a rule set with the given id, combining conditions with AND.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            metadata: Metadata::new(id, Combinator::And),
            definitions: ColumnDefinitions::new(),
            rules: Vec::new(),
        }
    }

    #[must_use]
    pub fn class_name(mut self, class_name: &str) -> Self {
        self.metadata.class_name = Some(class_name.to_owned());
        self
    }

    #[must_use]
    pub fn version(mut self, version: &str) -> Self {
        self.metadata.version = Some(version.to_owned());
        self
    }

    #[must_use]
    pub fn combinator(mut self, combinator: Combinator) -> Self {
        self.metadata.conditions_operator = combinator;
        self
    }

    #[must_use]
    pub fn general_action(mut self, action: &str) -> Self {
        self.metadata.general_action = Some(action.to_owned());
        self
    }

    /// Define what a generic column addresses and which operator it applies.
    #[must_use]
    pub fn column(mut self, column: &str, field_name: &str, operator: &str) -> Self {
        self.definitions.define(column, field_name, operator);
        self
    }

    /// Append a rule. Rules without a non-blank action are dropped by
    /// [`build`](Self::build), like they are when loading a table.
    #[must_use]
    pub fn rule(mut self, f: impl FnOnce(RuleBuilder) -> RuleBuilder) -> Self {
        let builder = f(RuleBuilder::default());
        self.rules.push(Rule {
            index: String::new(),
            conditions: builder.conditions,
            actions: builder.actions,
        });
        self
    }

    #[must_use]
    pub fn build(self) -> RuleSet {
        RuleSet::new(self.metadata, self.definitions, self.rules)
    }
}

impl RuleBuilder {
    /// Add a condition cell.
    #[must_use]
    pub fn when(mut self, column: &str, literal: &str) -> Self {
        self.conditions.push((column.to_owned(), literal.to_owned()));
        self
    }

    /// Add an action cell.
    #[must_use]
    pub fn then(mut self, column: &str, value: &str) -> Self {
        self.actions.push((column.to_owned(), value.to_owned()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combinator_parse() {
        assert_eq!(Combinator::parse("AND"), Some(Combinator::And));
        assert_eq!(Combinator::parse(" or "), Some(Combinator::Or));
        assert_eq!(Combinator::parse("XOR"), None);
        assert_eq!(Combinator::Or.to_string(), "OR");
    }

    #[test]
    fn builder_renumbers_and_drops_actionless_rules() {
        let rule_set = RuleSetBuilder::new("rs")
            .rule(|r| r.when("Condition_1", "a").then("Action_1", "x"))
            .rule(|r| r.when("Condition_1", "b").then("Action_1", " "))
            .rule(|r| r.when("Condition_1", "c").then("Action_1", "z"))
            .build();

        let indices: Vec<&str> = rule_set.rules().iter().map(|r| r.index.as_str()).collect();
        assert_eq!(indices, vec!["1", "2"]);
        assert_eq!(rule_set.rules()[1].conditions[0].1, "c");
    }

    #[test]
    fn new_drops_definition_rows() {
        let rows = vec![
            Rule {
                index: "#FieldName".into(),
                conditions: vec![],
                actions: vec![("Action_1".into(), "Promo".into())],
            },
            Rule {
                index: "7".into(),
                conditions: vec![],
                actions: vec![("Action_1".into(), "true".into())],
            },
        ];
        let rule_set = RuleSet::new(
            Metadata::new("rs", Combinator::And),
            ColumnDefinitions::new(),
            rows,
        );
        assert_eq!(rule_set.rules().len(), 1);
        assert_eq!(rule_set.rules()[0].index, "1");
    }

    #[test]
    fn metadata_flags() {
        let mut meta = Metadata::new("7", Combinator::Or);
        assert!(!meta.records_applied_rules());
        assert_eq!(meta.class_key(), "7");

        meta.general_action = Some(SET_APPLIED_RULES.into());
        meta.class_name = Some("AvailableFlight".into());
        assert!(meta.records_applied_rules());
        assert_eq!(meta.class_key(), "AvailableFlight");
    }

    #[test]
    fn rule_lookup_and_display() {
        let rule_set = RuleSetBuilder::new("pricing")
            .combinator(Combinator::Or)
            .column("Action_1", "Promo", "Set")
            .rule(|r| r.then("Action_1", "true"))
            .build();
        assert!(rule_set.rule("1").is_some());
        assert!(rule_set.rule("2").is_none());
        assert_eq!(
            rule_set.to_string(),
            "RuleSet(pricing: 1 rules, 1 columns, OR)"
        );
    }
}
