use serde_json::Value;

use crate::{ActionError, ActionOp, Fact, FiredRule, Rule, RuleSet};

/// Field that collects audit entries when none is configured.
pub const DEFAULT_AUDIT_FIELD: &str = "AppliedRules";

/// Apply `rule`'s actions to `fact`, recording audit entries under
/// [`DEFAULT_AUDIT_FIELD`].
///
/// # Errors
///
/// See [`apply_actions`].
pub fn apply(rule_set: &RuleSet, rule: &Rule, fact: &mut Fact) -> Result<(), ActionError> {
    apply_actions(rule_set, rule, fact, DEFAULT_AUDIT_FIELD).map(|_| ())
}

/// Apply `rule`'s actions to `fact` in column order.
///
/// An action is skipped when its cell is blank, its column has no field
/// definition, or the fact lacks the field. For every other action, when the
/// rule set's general action is `SetAppliedRules`, the entry
/// `RuleId:<id> RuleIndex:<index>` is appended to `audit_field` and the list is
/// deduplicated. Calling this twice for one firing applies the mutations twice.
///
/// Returns the number of actions that resolved to a field.
///
/// # Errors
///
/// Returns [`ActionError`] when `Increase`/`Decrease` meet a non-integer, the
/// result overflows, or `Set` on a boolean field gets a non-boolean literal.
/// Actions before the failing one have already been applied.
pub fn apply_actions(
    rule_set: &RuleSet,
    rule: &Rule,
    fact: &mut Fact,
    audit_field: &str,
) -> Result<usize, ActionError> {
    let definitions = rule_set.definitions();
    let mut resolved = 0;

    for (column, literal) in &rule.actions {
        if literal.trim().is_empty() {
            continue;
        }
        let Some(field) = definitions.field_name(column) else {
            continue;
        };
        let Some(current) = fact.get(field) else {
            continue;
        };

        let op = definitions.operator(column).and_then(ActionOp::from_phrase);
        if let Some(op) = op {
            let updated = apply_op(op, field, current, literal)?;
            fact.insert(field, updated);
        }
        resolved += 1;

        if rule_set.metadata().records_applied_rules() {
            record(fact, audit_field, &FiredRule::of(rule_set, rule));
        }
    }
    Ok(resolved)
}

fn apply_op(op: ActionOp, field: &str, current: &Value, literal: &str) -> Result<Value, ActionError> {
    match op {
        ActionOp::Set => set_value(field, current, literal),
        ActionOp::Increase => {
            let (old, delta) = integer_operands(field, current, literal)?;
            old.checked_add(delta)
                .map(Value::from)
                .ok_or_else(|| ActionError::Overflow { field: field.into() })
        }
        ActionOp::Decrease => {
            let (old, delta) = integer_operands(field, current, literal)?;
            old.checked_sub(delta)
                .map(Value::from)
                .ok_or_else(|| ActionError::Overflow { field: field.into() })
        }
    }
}

/// Coerce the literal to the field's current type: booleans stay booleans,
/// everything else is stored as the literal text.
fn set_value(field: &str, current: &Value, literal: &str) -> Result<Value, ActionError> {
    match current {
        Value::Bool(_) => {
            let text = literal.trim();
            if text.eq_ignore_ascii_case("true") {
                Ok(Value::Bool(true))
            } else if text.eq_ignore_ascii_case("false") {
                Ok(Value::Bool(false))
            } else {
                Err(ActionError::NotABoolean {
                    field: field.into(),
                    value: literal.into(),
                })
            }
        }
        _ => Ok(Value::String(literal.to_owned())),
    }
}

fn integer_operands(field: &str, current: &Value, literal: &str) -> Result<(i64, i64), ActionError> {
    let old = current.as_i64().ok_or_else(|| ActionError::NotAnInteger {
        field: field.into(),
        value: current.to_string(),
    })?;
    let delta = literal
        .trim()
        .parse::<i64>()
        .map_err(|_| ActionError::NotAnInteger {
            field: field.into(),
            value: literal.into(),
        })?;
    Ok((old, delta))
}

/// Append an audit entry, keeping the first occurrence of each entry.
fn record(fact: &mut Fact, audit_field: &str, fired: &FiredRule) {
    let mut entries = match fact.get(audit_field) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    entries.push(Value::String(fired.to_string()));

    let mut unique: Vec<Value> = Vec::with_capacity(entries.len());
    for entry in entries {
        if !unique.contains(&entry) {
            unique.push(entry);
        }
    }
    fact.insert(audit_field, Value::Array(unique));
}
