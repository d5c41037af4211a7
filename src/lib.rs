//! # Two-factor codes on a wearable, synchronized from a companion.
//!
//! The companion (a phone app) holds the catalogue of TOTP tokens, and pushes it to the
//! device whenever it changes or the two reconnect. The device only computes and displays
//! one-time passwords.
//!
//! The link between companion and device is short-range wireless, with a small maximum
//! message size, and it may lose or reorder messages. Hence a catalogue is sent as a
//! sequence of messages:
//! - `START`, announcing the number of tokens, optionally the companion's clock (for clock
//!   drift compensation), and whether the device should store the tokens
//! - one `TOKEN` per record, carrying its position in the catalogue
//! - `END`
//!
//! The device accepts the sequence only if all announced positions arrived, and otherwise
//! sticks to its last known good catalogue.
//!
//! This crate contains the logic of both sides, independent of a particular runtime:
//! - [`totp`]: RFC 6238 one-time passwords
//! - [`cache`]: the device's cache of current and upcoming passwords
//! - [`sequence`]: reassembly of update sequences
//! - [`manager`]: the device's token manager, tying the above together
//! - [`companion`]: splitting a catalogue into an update sequence
//! - [`settings`]: device settings, pushed by the companion in a message of their own
//!
//! What the device runtime provides (clock, randomness, storage) is abstracted in
//! [`platform`]. The accompanying binary simulates a companion and a device on a PC.

/// Token logic has typed errors (see [`totp::TotpError`]), everything touching
/// the outside world just uses `anyhow`.
pub use anyhow::Result;

pub mod cache;
pub mod cli;
pub mod companion;
pub mod manager;
pub mod message;
pub mod platform;
pub mod record;
pub mod sequence;
pub mod settings;
pub mod totp;

#[cfg(test)]
mod test_support;
