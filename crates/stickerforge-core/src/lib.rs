//! stickerforge-core: shared sticker types, errors, and configuration.
//!
//! This crate is the foundational dependency for the other stickerforge
//! crates, providing the target-format enumeration, the conversion outcome
//! type handed back to callers, a unified error type, and the configuration
//! sections the engine reads.

pub mod config;
pub mod error;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, ErrorKind, Result};
pub use media::*;
