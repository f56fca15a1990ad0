/// Crate-wide result alias.
pub type LyrividResult<T> = Result<T, LyrividError>;

/// Error taxonomy for preview and export.
///
/// `Cancelled` is user-initiated and deliberately not a failure: callers are
/// expected to suppress error presentation for it.
#[derive(thiserror::Error, Debug)]
pub enum LyrividError {
    /// Image, audio, or font asset was unreachable or undecodable. Raised
    /// before any frame work starts.
    #[error("asset load error: {0}")]
    AssetLoad(String),

    /// Export was cancelled through the shared cancellation flag.
    #[error("export cancelled")]
    Cancelled,

    /// The external encoder rejected its input or exited with a failure.
    #[error("encoder error: {0}")]
    Encoder(String),

    /// A configuration invariant was violated (zero frame rate, negative
    /// duration, out-of-range style values). Fast-fail, never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Context-wrapped I/O and plumbing errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LyrividError {
    /// Construct an [`LyrividError::AssetLoad`] from any message.
    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }

    /// Construct an [`LyrividError::Encoder`] from any message.
    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::Encoder(msg.into())
    }

    /// Construct an [`LyrividError::Validation`] from any message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Return `true` for the user-initiated cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
