use crate::expression::error::ExprCompileError;

/// Crate-wide result alias.
pub type FxResult<T> = Result<T, FxError>;

/// Errors surfaced by layer setup, rebuilds and the optional worker.
///
/// Each variant is scoped to the smallest failing unit: `Compile` and `Allocation` are fatal to a
/// single layer instance, `Expression` to a single configuration channel, `WorkerTimeout` to a
/// single pending request.
#[derive(thiserror::Error, Debug)]
pub enum FxError {
    /// Input data or configuration failed a structural check.
    #[error("validation error: {0}")]
    Validation(String),

    /// The host could not compile or link the shader program.
    #[error("program compile error: {0}")]
    Compile(String),

    /// A GPU buffer or pooled record could not be obtained.
    #[error("allocation error: {0}")]
    Allocation(String),

    /// A style expression did not compile for its channel.
    #[error(transparent)]
    Expression(#[from] ExprCompileError),

    /// A simplify request outlived its deadline.
    #[error("worker timeout: request {0} got no response in time")]
    WorkerTimeout(u64),

    /// The simplify worker thread failed or went away.
    #[error("worker error: {0}")]
    Worker(String),

    /// JSON input could not be parsed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FxError {
    /// Construct a [`FxError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Construct a [`FxError::Compile`].
    pub fn compile(msg: impl Into<String>) -> Self {
        Self::Compile(msg.into())
    }

    /// Construct a [`FxError::Allocation`].
    pub fn allocation(msg: impl Into<String>) -> Self {
        Self::Allocation(msg.into())
    }

    /// Construct a [`FxError::Worker`].
    pub fn worker(msg: impl Into<String>) -> Self {
        Self::Worker(msg.into())
    }

    /// Construct a [`FxError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Returns `true` for failures that leave a layer instance permanently unusable.
    pub fn is_fatal_to_layer(&self) -> bool {
        matches!(self, Self::Compile(_) | Self::Allocation(_))
    }
}

impl From<serde_json::Error> for FxError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
