//! Error types for tessera-atom.

use thiserror::Error;

/// Error returned by [`Forge`](crate::Forge) writes.
///
/// Running out of buffer is the only way a write can fail. Once a forge has
/// overflowed it stays overflowed until [`Forge::set_buffer`](crate::Forge::set_buffer).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForgeError {
    #[error("Forge buffer overflow: needed {needed} bytes, {remaining} remaining")]
    Overflow { needed: usize, remaining: usize },
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, ForgeError>;
