use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::LoadError;

/// One object evaluated, and possibly mutated, by a rule set.
///
/// Fields are addressed by their top-level name. Field order is preserved so
/// facts round-trip to JSON in the order they arrived, with fields added by
/// rules (such as the audit list) appended at the end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fact {
    fields: Map<String, Value>,
}

impl Fact {
    /// Create an empty fact.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, builder style.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value.into());
        self
    }

    /// Insert or overwrite a field.
    pub fn insert(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_owned(), value);
    }

    /// Look up a field. A field holding `null` is present.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Parse a fact from JSON text. The text must hold an object.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the text is not JSON or not an object.
    pub fn from_json_str(json: &str) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }
}

impl TryFrom<Value> for Fact {
    type Error = LoadError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(LoadError::WrongShape {
                field: "fact".into(),
                expected: "object",
            }),
        }
    }
}

impl From<Map<String, Value>> for Fact {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl From<Fact> for Value {
    fn from(fact: Fact) -> Self {
        fact.into_value()
    }
}
