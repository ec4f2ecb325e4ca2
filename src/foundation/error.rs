/// Convenience result type used across medflow.
pub type MedflowResult<T> = Result<T, MedflowError>;

/// Error taxonomy shared by pipeline, device and node APIs.
///
/// Every variant except [`MedflowError::Other`] aborts the in-progress update without publishing
/// output. Slice-index clamping is not an error and never produces one of these.
#[derive(thiserror::Error, Debug)]
pub enum MedflowError {
    /// A required input slot is unconnected or holds a never-produced object.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Input rank or shape does not satisfy the node.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// An index has no clamping policy and lies outside its valid range.
    #[error("index out of range: {0}")]
    IndexOutOfRange(String),

    /// Device selection found nothing matching the policy.
    #[error("no device available: {0}")]
    NoDeviceAvailable(String),

    /// The requested device lacks a capability the operation needs.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A streaming buffer has no further frames.
    #[error("stream exhausted: {0}")]
    StreamExhausted(String),

    /// Bad parameters, wiring cycles, unknown node kinds.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Errors when serializing or deserializing pipeline descriptions.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MedflowError {
    /// Build a [`MedflowError::InvalidInput`] value.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Build a [`MedflowError::DimensionMismatch`] value.
    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    /// Build a [`MedflowError::IndexOutOfRange`] value.
    pub fn index_out_of_range(msg: impl Into<String>) -> Self {
        Self::IndexOutOfRange(msg.into())
    }

    /// Build a [`MedflowError::NoDeviceAvailable`] value.
    pub fn no_device(msg: impl Into<String>) -> Self {
        Self::NoDeviceAvailable(msg.into())
    }

    /// Build a [`MedflowError::UnsupportedOperation`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedOperation(msg.into())
    }

    /// Build a [`MedflowError::StreamExhausted`] value.
    pub fn stream_exhausted(msg: impl Into<String>) -> Self {
        Self::StreamExhausted(msg.into())
    }

    /// Build a [`MedflowError::InvalidConfiguration`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Build a [`MedflowError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// True for [`MedflowError::StreamExhausted`].
    pub fn is_stream_exhausted(&self) -> bool {
        matches!(self, Self::StreamExhausted(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
