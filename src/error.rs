use thiserror::Error;

/// Failures surfaced to the transport layer.
///
/// Resolution failures, missing batch entries and partial application are
/// not errors; they are reported inside the phase results.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("extra '{0}' is not registered")]
    UnknownExtra(String),
    #[error("an extra with callback id '{0}' is already registered")]
    DuplicateExtra(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
