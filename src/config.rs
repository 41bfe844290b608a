use serde::{Deserialize, Serialize};

use crate::action::DEFAULT_AUDIT_FIELD;

/// What to do with an object whose action application fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionErrorPolicy {
    /// Emit the object as it was before the pass and continue with the next one.
    #[default]
    RestoreObject,
    /// Abort the whole call with the error.
    FailBatch,
}

/// Which matching path [`RuleEngine::apply`](crate::RuleEngine::apply) takes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Evaluate every rule against every object.
    #[default]
    Naive,
    /// Match through a [`MatchNetwork`](crate::MatchNetwork) with shared nodes.
    Network,
}

/// Engine settings. Every field has a default, so partial JSON is accepted.
///
/// ```
/// use rulegrid::{ActionErrorPolicy, EngineConfig, MatchStrategy};
///
/// let config = EngineConfig::from_json_str(r#"{ "default_strategy": "network" }"#).unwrap();
/// assert_eq!(config.default_strategy, MatchStrategy::Network);
/// assert_eq!(config.on_action_error, ActionErrorPolicy::RestoreObject);
/// assert_eq!(config.audit_field, "AppliedRules");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Field receiving `RuleId:<id> RuleIndex:<index>` audit entries.
    pub audit_field: String,
    pub on_action_error: ActionErrorPolicy,
    pub default_strategy: MatchStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            audit_field: DEFAULT_AUDIT_FIELD.to_owned(),
            on_action_error: ActionErrorPolicy::default(),
            default_strategy: MatchStrategy::default(),
        }
    }
}

impl EngineConfig {
    /// Parse settings from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] on malformed input or
    /// unknown enum values.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn with_audit_field(mut self, field: &str) -> Self {
        self.audit_field = field.to_owned();
        self
    }

    #[must_use]
    pub fn with_action_error_policy(mut self, policy: ActionErrorPolicy) -> Self {
        self.on_action_error = policy;
        self
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.default_strategy = strategy;
        self
    }
}
