//! Error types.

use thiserror::Error;

/// Error type.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WAV decoding error.
    #[error("Hound error: {0}")]
    Hound(#[from] hound::Error),

    /// Sample file is not mono.
    #[error("Sample '{path}' has {channels} channels, expected 1")]
    UnsupportedChannels { path: String, channels: u16 },

    /// Sample file has no frames.
    #[error("Sample '{0}' is empty")]
    EmptySample(String),

    /// Set message without a usable `file` property.
    #[error("Set message has no file path")]
    MissingFilePath,

    /// Not enough room in a worker ring for a whole record.
    #[error("Ring full: needed {needed} bytes, {vacant} vacant")]
    QueueFull { needed: usize, vacant: usize },

    /// Atom serialization failed.
    #[error("Forge error: {0}")]
    Forge(#[from] tessera_atom::ForgeError),

    /// Saved state is missing or has the wrong shape.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Configuration rejected by `validate()`.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Worker thread could not be started.
    #[error("Failed to spawn worker thread: {0}")]
    ThreadSpawn(std::io::Error),
}

/// Result type.
pub type Result<T> = std::result::Result<T, Error>;
