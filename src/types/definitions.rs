use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::rule::Rule;

/// Index of the definition row naming the fact field a column targets.
pub const FIELD_NAME_MARKER: &str = "#FieldName";
/// Index of the definition row naming the operator a column applies.
pub const OPERATOR_MARKER: &str = "#Operator";

/// Find the row whose index is `marker` and return its cell under `column`.
///
/// Returns `None` if no such row exists or the row has no such column. The
/// first matching row wins. This scans every row; use [`ColumnDefinitions`]
/// to resolve repeatedly.
#[must_use]
pub fn resolve_column<'a>(rows: &'a [Rule], column: &str, marker: &str) -> Option<&'a str> {
    rows.iter()
        .find(|row| row.index == marker)
        .and_then(|row| row.cell(column))
}

/// What one generic column means: the fact field it addresses and the
/// operator it applies. Either part may be undefined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub field_name: Option<String>,
    pub operator: Option<String>,
}

/// The column lookup table of a rule set, built once from its definition rows.
///
/// Blank cells count as undefined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinitions {
    columns: BTreeMap<String, ColumnDefinition>,
}

impl ColumnDefinitions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from the reserved `#FieldName` / `#Operator` rows found
    /// in `rows`. Ordinary rows are ignored.
    #[must_use]
    pub fn from_rows(rows: &[Rule]) -> Self {
        let mut columns = BTreeMap::new();
        let keys = rows
            .iter()
            .filter(|row| row.index == FIELD_NAME_MARKER || row.index == OPERATOR_MARKER)
            .flat_map(|row| row.conditions.iter().chain(&row.actions))
            .map(|(key, _)| key.as_str());

        for key in keys {
            if columns.contains_key(key) {
                continue;
            }
            let definition = ColumnDefinition {
                field_name: non_blank(resolve_column(rows, key, FIELD_NAME_MARKER)),
                operator: non_blank(resolve_column(rows, key, OPERATOR_MARKER)),
            };
            columns.insert(key.to_owned(), definition);
        }
        Self { columns }
    }

    /// Define (or redefine) a column.
    pub fn define(&mut self, column: &str, field_name: &str, operator: &str) {
        self.columns.insert(
            column.to_owned(),
            ColumnDefinition {
                field_name: non_blank(Some(field_name)),
                operator: non_blank(Some(operator)),
            },
        );
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&ColumnDefinition> {
        self.columns.get(column)
    }

    #[must_use]
    pub fn field_name(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(|d| d.field_name.as_deref())
    }

    #[must_use]
    pub fn operator(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(|d| d.operator.as_deref())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnDefinition)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

fn non_blank(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(index: &str, cells: &[(&str, &str)]) -> Rule {
        let mut rule = Rule {
            index: index.into(),
            conditions: Vec::new(),
            actions: Vec::new(),
        };
        for (key, value) in cells {
            let cell = ((*key).to_owned(), (*value).to_owned());
            if key.starts_with("Action_") {
                rule.actions.push(cell);
            } else {
                rule.conditions.push(cell);
            }
        }
        rule
    }

    fn table() -> Vec<Rule> {
        vec![
            row(
                "#FieldName",
                &[("Condition_1", "CabinClass"), ("Action_1", "MaxPrice")],
            ),
            row("#Operator", &[("Condition_1", "Equals"), ("Action_1", "Set")]),
            row("1", &[("Condition_1", "E"), ("Action_1", "100")]),
        ]
    }

    #[test]
    fn resolve_finds_marker_row_cell() {
        let rows = table();
        assert_eq!(
            resolve_column(&rows, "Condition_1", FIELD_NAME_MARKER),
            Some("CabinClass")
        );
        assert_eq!(resolve_column(&rows, "Action_1", OPERATOR_MARKER), Some("Set"));
    }

    #[test]
    fn resolve_missing_column_or_row() {
        let rows = table();
        assert_eq!(resolve_column(&rows, "Condition_9", FIELD_NAME_MARKER), None);
        assert_eq!(resolve_column(&rows[2..], "Condition_1", FIELD_NAME_MARKER), None);
    }

    #[test]
    fn resolve_matches_index_exactly() {
        let rows = table();
        assert_eq!(resolve_column(&rows, "Condition_1", "1"), Some("E"));
        assert_eq!(resolve_column(&rows, "Condition_1", "#Missing"), None);
    }

    #[test]
    fn from_rows_builds_every_defined_column() {
        let defs = ColumnDefinitions::from_rows(&table());
        assert_eq!(defs.len(), 2);
        assert_eq!(defs.field_name("Condition_1"), Some("CabinClass"));
        assert_eq!(defs.operator("Condition_1"), Some("Equals"));
        assert_eq!(defs.field_name("Action_1"), Some("MaxPrice"));
        assert_eq!(defs.operator("Action_1"), Some("Set"));
    }

    #[test]
    fn blank_definitions_are_undefined() {
        let rows = vec![
            row("#FieldName", &[("Condition_1", "  "), ("Condition_2", "Origin")]),
            row("#Operator", &[("Condition_1", "Equals")]),
        ];
        let defs = ColumnDefinitions::from_rows(&rows);
        assert_eq!(defs.field_name("Condition_1"), None);
        assert_eq!(defs.operator("Condition_1"), Some("Equals"));
        assert_eq!(defs.field_name("Condition_2"), Some("Origin"));
        assert_eq!(defs.operator("Condition_2"), None);
    }

    #[test]
    fn define_overrides() {
        let mut defs = ColumnDefinitions::new();
        assert!(defs.is_empty());
        defs.define("Action_1", "Promo", "Set");
        defs.define("Action_1", "Discount", "Increase");
        assert_eq!(defs.field_name("Action_1"), Some("Discount"));
        assert_eq!(defs.operator("Action_1"), Some("Increase"));
        assert_eq!(defs.len(), 1);
    }
}
