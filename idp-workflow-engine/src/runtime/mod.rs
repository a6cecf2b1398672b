//! # Workflow Runtime
//!
//! The durable execution substrate replacing an external workflow service.
//! A workflow instance is a plain async function driven through a
//! [`WorkflowContext`]; durability comes from checkpointing every finished
//! activity into the [`RunStore`], so a resumed run replays instantly past
//! completed work instead of re-executing it.

pub mod context;
pub mod retry;
pub mod signals;
pub mod store;

pub use context::WorkflowContext;
pub use retry::RetryPolicy;
pub use signals::SignalHub;
pub use store::{MemoryRunStore, RunFailure, RunStatus, RunStore, RunStoreError, WorkflowRun};

use thiserror::Error;

/// Terminal classification of a workflow step failure.
///
/// `NonRetryable` aborts the run immediately and carries the stable
/// `error_type` reported to callers (for downstream 4xx failures this is the
/// Command API's own error code). `Retryable` consumes retry attempts under
/// the active [`RetryPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("{message}")]
    NonRetryable { error_type: String, message: String },
    #[error("{message}")]
    Retryable { message: String },
}

impl WorkflowError {
    pub fn non_retryable(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NonRetryable {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Retryable {
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }

    pub fn error_type(&self) -> Option<&str> {
        match self {
            Self::NonRetryable { error_type, .. } => Some(error_type),
            Self::Retryable { .. } => None,
        }
    }
}
