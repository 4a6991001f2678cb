//! Stickerforge - chat sticker conversion tool
//!
//! This library crate exposes the configuration and request layer for
//! integration testing and embedding in a bot.

pub mod config;
pub mod service;
