mod action;
mod config;
mod engine;
mod error;
mod evaluate;
mod load;
mod network;
mod pass;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod store;
mod types;

pub use action::{apply, apply_actions, DEFAULT_AUDIT_FIELD};
pub use config::{ActionErrorPolicy, EngineConfig, MatchStrategy};
pub use engine::RuleEngine;
pub use error::RuleGridError;
pub use evaluate::evaluate_conditions;
pub use load::load_document;
pub use network::{Activation, MatchNetwork};
pub use store::{InMemoryRuleSetStore, RuleSetStore, StoreError};
pub use types::{
    resolve_column, ActionError, ActionOp, ColumnDefinition, ColumnDefinitions, Combinator,
    ConditionOp, FactReport, Fact, FiredRule, Literal, LiteralKind, LoadError, Metadata, Rule,
    RuleBuilder, RuleSet, RuleSetBuilder, FIELD_NAME_MARKER, OPERATOR_MARKER, SET_APPLIED_RULES,
};

#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
