use thiserror::Error;

/// Every failure the generator can report. None of them are fatal: the
/// caller turns them into an error notice and carries on.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed user input. Nothing was rendered or stored.
    #[error("{0}")]
    Validation(String),

    /// The payload does not fit in a symbol at level H and the requested size.
    #[error("Error generating QR code: {0}")]
    Capacity(String),

    /// A logo or CSV file could not be read or decoded.
    #[error("{0}")]
    Asset(String),

    /// The history store rejected a read or write.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("drawing failed: {0}")]
    Render(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
