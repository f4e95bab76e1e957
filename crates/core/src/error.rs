/// Result alias that carries the custom [`LuminaireError`] type.
pub type Result<T> = std::result::Result<T, LuminaireError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum LuminaireError {
    /// A construction-time configuration problem, such as an empty scene
    /// list or an ambiguous active-playlist selection. Reported immediately
    /// and not retried.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A transition request named a playlist that does not exist.
    #[error("unknown playlist `{0}`")]
    UnknownPlaylist(String),
    /// General-purpose error, used by effect layers to describe a render
    /// fault so the scene can skip them for the frame.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Wrapper around JSON (de)serialization errors.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl LuminaireError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Creates a configuration error from the provided message.
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

impl From<&str> for LuminaireError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for LuminaireError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
