use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::{ColumnDefinitions, Combinator, LoadError, Metadata, Rule, RuleSet};

const METADATA: &str = "Metadata";
const RULES: &str = "Rules";
const CONDITION_PREFIX: &str = "Condition_";
const ACTION_PREFIX: &str = "Action_";

pub(crate) fn load_str(json: &str) -> Result<RuleSet, LoadError> {
    let document: Value = serde_json::from_str(json)?;
    load_document(&document)
}

pub(crate) fn load_slice(json: &[u8]) -> Result<RuleSet, LoadError> {
    let document: Value = serde_json::from_slice(json)?;
    load_document(&document)
}

/// Turn a tabular rule-set document into a [`RuleSet`].
///
/// The document holds a `Metadata` object and a `Rules` array. Each rule row
/// has an `Index` plus any number of `Condition_*` / `Action_*` cells. Rows
/// whose index contains `#` become column definitions; the rest are ordinary
/// rules, filtered and renumbered by [`RuleSet::new`].
///
/// # Errors
///
/// Returns [`LoadError`] if a section is missing or a cell has the wrong shape.
pub fn load_document(document: &Value) -> Result<RuleSet, LoadError> {
    let root = document.as_object().ok_or_else(|| LoadError::WrongShape {
        field: "document".into(),
        expected: "an object",
    })?;

    let metadata = root
        .get(METADATA)
        .ok_or(LoadError::MissingSection { section: METADATA })?;
    let metadata = parse_metadata(metadata)?;

    let rows = root
        .get(RULES)
        .ok_or(LoadError::MissingSection { section: RULES })?
        .as_array()
        .ok_or_else(|| LoadError::WrongShape {
            field: RULES.into(),
            expected: "an array",
        })?
        .iter()
        .enumerate()
        .map(|(i, row)| parse_row(i, row))
        .collect::<Result<Vec<Rule>, LoadError>>()?;

    let definitions = ColumnDefinitions::from_rows(&rows);
    let total_rows = rows.len();
    let rule_set = RuleSet::new(metadata, definitions, rows);

    debug!(
        rule_set = %rule_set.id(),
        rows = total_rows,
        rules = rule_set.rules().len(),
        columns = rule_set.definitions().len(),
        "loaded rule set"
    );
    Ok(rule_set)
}

fn parse_metadata(value: &Value) -> Result<Metadata, LoadError> {
    let section = value.as_object().ok_or_else(|| LoadError::WrongShape {
        field: METADATA.into(),
        expected: "an object",
    })?;

    let id = scalar(section, "Id")?.ok_or_else(|| LoadError::MissingField {
        field: "Metadata.Id".into(),
    })?;

    let operator =
        scalar(section, "ConditionsOperator")?.ok_or_else(|| LoadError::MissingField {
            field: "Metadata.ConditionsOperator".into(),
        })?;
    let conditions_operator =
        Combinator::parse(&operator).ok_or(LoadError::UnknownCombinator { value: operator })?;

    let extra: BTreeMap<String, String> = section
        .iter()
        .filter(|(key, _)| {
            !matches!(
                key.as_str(),
                "Id" | "ClassName" | "Version" | "ConditionsOperator" | "GeneralAction"
            )
        })
        .map(|(key, value)| (key.clone(), cell_text(value)))
        .collect();

    Ok(Metadata {
        id,
        class_name: scalar(section, "ClassName")?,
        version: scalar(section, "Version")?,
        conditions_operator,
        general_action: scalar(section, "GeneralAction")?,
        extra,
    })
}

/// Read an optional scalar metadata cell as trimmed text. Blank reads as absent.
fn scalar(section: &Map<String, Value>, key: &str) -> Result<Option<String>, LoadError> {
    match section.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_owned()))
        }
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(LoadError::WrongShape {
            field: format!("{METADATA}.{key}"),
            expected: "a string or number",
        }),
    }
}

fn parse_row(position: usize, value: &Value) -> Result<Rule, LoadError> {
    let row = value.as_object().ok_or_else(|| LoadError::WrongShape {
        field: format!("{RULES}[{position}]"),
        expected: "an object",
    })?;

    let index = match row.get("Index") {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Null) | None => {
            return Err(LoadError::MissingField {
                field: format!("{RULES}[{position}].Index"),
            })
        }
        Some(_) => {
            return Err(LoadError::WrongShape {
                field: format!("{RULES}[{position}].Index"),
                expected: "a string or number",
            })
        }
    };

    let mut rule = Rule {
        index,
        conditions: Vec::new(),
        actions: Vec::new(),
    };
    for (key, cell) in row {
        let target = if key.starts_with(CONDITION_PREFIX) {
            &mut rule.conditions
        } else if key.starts_with(ACTION_PREFIX) {
            &mut rule.actions
        } else {
            continue;
        };
        if matches!(cell, Value::Array(_) | Value::Object(_)) {
            return Err(LoadError::WrongShape {
                field: format!("{RULES}[{position}].{key}"),
                expected: "a string",
            });
        }
        target.push((key.clone(), cell_text(cell)));
    }
    Ok(rule)
}

/// Cell text as authored: strings verbatim, `null` as blank, other scalars
/// in their JSON spelling.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
