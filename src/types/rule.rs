use serde::{Deserialize, Serialize};

/// Marker character that distinguishes definition rows from ordinary rules.
pub(crate) const DEFINITION_MARK: char = '#';

/// One row of a rule table.
///
/// Conditions and actions map a generic column key (`Condition_1`,
/// `Action_2`, ...) to the literal cell text, in column order. What a column
/// tests or mutates is looked up in the rule set's
/// [`ColumnDefinitions`](super::ColumnDefinitions), never stored on the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Position among the ordinary rules of the set, starting at `"1"`.
    pub index: String,
    pub conditions: Vec<(String, String)>,
    pub actions: Vec<(String, String)>,
}

impl Rule {
    /// Whether this row is a reserved definition row such as `#FieldName`.
    #[must_use]
    pub fn is_definition(&self) -> bool {
        self.index.contains(DEFINITION_MARK)
    }

    /// Whether at least one action cell holds something other than whitespace.
    #[must_use]
    pub fn has_action(&self) -> bool {
        self.actions.iter().any(|(_, value)| !value.trim().is_empty())
    }

    /// Look up a cell by column key in either the condition or action columns.
    #[must_use]
    pub fn cell(&self, column: &str) -> Option<&str> {
        self.conditions
            .iter()
            .chain(&self.actions)
            .find(|(key, _)| key == column)
            .map(|(_, value)| value.as_str())
    }
}
