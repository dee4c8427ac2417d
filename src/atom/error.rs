use thiserror::Error;

/// Errors returned by the container's views.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AtomError {
    /// Write or delete attempted through the read-only projection.
    #[error("State is read-only: cannot modify '{key}'")]
    ReadOnly { key: String },
}
