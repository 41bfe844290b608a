mod definitions;
mod error;
mod fact;
mod fired;
mod literal;
mod operator;
mod report;
mod rule;
mod ruleset;

pub use definitions::{
    resolve_column, ColumnDefinition, ColumnDefinitions, FIELD_NAME_MARKER, OPERATOR_MARKER,
};
pub use error::{ActionError, LoadError};
pub use fact::Fact;
pub use fired::FiredRule;
pub use literal::{Literal, LiteralKind};
pub use operator::{ActionOp, ConditionOp};
pub use report::FactReport;
pub use rule::Rule;
pub use ruleset::{Combinator, Metadata, RuleBuilder, RuleSet, RuleSetBuilder, SET_APPLIED_RULES};
