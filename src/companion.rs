//! The companion's side of an update: splitting a catalogue into messages.

use crate::message::PeerMessage;
use crate::record::TotpRecord;

/// How the companion is configured to send updates
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SendOptions {
    /// Announce the companion clock so the device can compensate drift
    pub compensate_clock_drift: bool,
    /// Ask the device to keep the catalogue across restarts
    pub store_on_device: bool,
}

/// `START`, one `TOKEN` per record in catalogue order, `END`.
///
/// `now` is the companion clock in seconds since the UNIX epoch, sent only when
/// drift compensation is on. Storing is requested only when enabled, absent
/// otherwise.
pub fn update_sequence(tokens: &[TotpRecord], now: f64, options: SendOptions) -> Vec<PeerMessage> {
    let mut messages = Vec::with_capacity(tokens.len() + 2);
    messages.push(PeerMessage::Start {
        count: tokens.len(),
        remote_epoch_seconds: if options.compensate_clock_drift { Some(now) } else { None },
        store_on_device: if options.store_on_device { Some(true) } else { None },
    });
    messages.extend(
        tokens
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, token)| PeerMessage::Token { index, token }),
    );
    messages.push(PeerMessage::End);
    messages
}
