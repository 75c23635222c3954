// In: src/itch/mod.rs

//! Decoder for the tagged binary order-book feed (ITCH 5.0 message set).
//!
//! The file is a sequence of frames, each a big-endian `u16` length followed by
//! that many payload bytes. The first payload byte is the message tag, which
//! selects a fixed layout from `MESSAGE_LAYOUTS`.

pub mod decoder;
pub mod layouts;
pub mod message;

#[cfg(test)]
mod tests;

pub use self::decoder::{FeedStats, MessageDecoder};
pub use self::layouts::{layout_for, MessageLayout, HEADER_LEN, MESSAGE_LAYOUTS};
pub use self::message::{Alpha, BinaryMessage, MessageHeader, Price4};
