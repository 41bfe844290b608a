use thiserror::Error;

/// A tabular rule-set document that cannot be turned into a [`RuleSet`](super::RuleSet).
///
/// Raised while loading; the whole document is rejected.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("rule set document is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("rule set document has no '{section}' section")]
    MissingSection { section: &'static str },

    #[error("'{field}' must be {expected}")]
    WrongShape { field: String, expected: &'static str },

    #[error("required field '{field}' is missing")]
    MissingField { field: String },

    #[error("unknown conditions operator '{value}'; expected AND or OR")]
    UnknownCombinator { value: String },
}

/// An `Increase`, `Decrease` or boolean `Set` action whose value cannot be coerced.
///
/// Raised while applying actions to one fact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("field '{field}': '{value}' is not an integer")]
    NotAnInteger { field: String, value: String },

    #[error("field '{field}': '{value}' is not a boolean")]
    NotABoolean { field: String, value: String },

    #[error("field '{field}': integer overflow")]
    Overflow { field: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_section_message() {
        let err = LoadError::MissingSection { section: "Rules" };
        assert_eq!(err.to_string(), "rule set document has no 'Rules' section");
    }

    #[test]
    fn wrong_shape_message() {
        let err = LoadError::WrongShape {
            field: "Rules".into(),
            expected: "an array",
        };
        assert_eq!(err.to_string(), "'Rules' must be an array");
    }

    #[test]
    fn missing_field_message() {
        let err = LoadError::MissingField {
            field: "Metadata.Id".into(),
        };
        assert_eq!(err.to_string(), "required field 'Metadata.Id' is missing");
    }

    #[test]
    fn unknown_combinator_message() {
        let err = LoadError::UnknownCombinator {
            value: "XOR".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown conditions operator 'XOR'; expected AND or OR"
        );
    }

    #[test]
    fn not_an_integer_message() {
        let err = ActionError::NotAnInteger {
            field: "Seats".into(),
            value: "two".into(),
        };
        assert_eq!(err.to_string(), "field 'Seats': 'two' is not an integer");
    }

    #[test]
    fn not_a_boolean_message() {
        let err = ActionError::NotABoolean {
            field: "MaxPriceSet".into(),
            value: "maybe".into(),
        };
        assert_eq!(
            err.to_string(),
            "field 'MaxPriceSet': 'maybe' is not a boolean"
        );
    }

    #[test]
    fn overflow_message() {
        let err = ActionError::Overflow {
            field: "Counter".into(),
        };
        assert_eq!(err.to_string(), "field 'Counter': integer overflow");
    }
}
