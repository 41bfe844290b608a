use thiserror::Error;

use crate::store::StoreError;
use crate::{ActionError, LoadError};

/// Unified error type returned by [`RuleEngine`](crate::RuleEngine).
#[derive(Debug, Error)]
pub enum RuleGridError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Action(#[from] ActionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("upload contains no rule set document")]
    EmptyUpload,

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Serialize(#[from] crate::serial::SerializeError),

    #[cfg(feature = "binary-cache")]
    #[error(transparent)]
    Deserialize(#[from] crate::serial::DeserializeError),
}
