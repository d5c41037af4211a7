//! Reassembly of a token catalogue from an update sequence.
//!
//! The companion sends a catalogue as `START`, one `TOKEN` per record and
//! `END`, since the transport limits the size of a single message. The
//! transport may also lose or reorder messages. A sequence is accepted only if
//! every announced position was filled when `END` arrives; anything else
//! discards the sequence and keeps the last accepted catalogue.
//!
//! Note that a reordered `END` overtaking pending `TOKEN`s also rejects an
//! otherwise complete sequence, leaving the device on stale data until the
//! companion sends the next one.

use log::{debug, info, warn};

use crate::record::TotpRecord;

#[derive(Clone, Debug, PartialEq)]
/// A complete catalogue, together with the instructions sent along with it.
pub struct AcceptedUpdate {
    pub tokens: Vec<TotpRecord>,
    /// Companion clock minus device clock, at the time `START` arrived
    pub clock_drift: f64,
    pub store_on_device: bool,
}

#[derive(Clone, Debug, PartialEq)]
struct Session {
    slots: Vec<Option<TotpRecord>>,
    filled: usize,
    clock_drift: f64,
    store_on_device: bool,
}

#[derive(Clone, Debug, PartialEq)]
enum State {
    Idle,
    Accumulating(Session),
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateSequence {
    state: State,
}

impl Default for UpdateSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateSequence {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn is_accumulating(&self) -> bool {
        matches!(self.state, State::Accumulating(_))
    }

    /// Begins a new sequence of `count` tokens, dropping any sequence in flight.
    ///
    /// `remote_seconds` is the companion's clock when it sent `START`; without
    /// it, no drift is compensated. Tokens are only kept on the device when
    /// `store_on_device` says so explicitly.
    pub fn start(
        &mut self,
        count: usize,
        remote_seconds: Option<f64>,
        store_on_device: Option<bool>,
        local_seconds: f64,
    ) {
        if self.is_accumulating() {
            info!("update sequence restarted before it ended");
        }
        let clock_drift = match remote_seconds {
            Some(remote) => remote - local_seconds,
            None => 0.0,
        };
        debug!("update sequence of {} tokens, clock drift {}", count, clock_drift);

        self.state = State::Accumulating(Session {
            slots: vec![None; count],
            filled: 0,
            clock_drift,
            store_on_device: store_on_device.unwrap_or(false),
        });
    }

    /// Places `record` at `index`. Later arrivals may fill earlier holes, and
    /// a repeated index overwrites its slot.
    pub fn token(&mut self, index: usize, record: TotpRecord) {
        let session = match &mut self.state {
            State::Accumulating(session) => session,
            State::Idle => {
                // a START lost or overtaken; stay idle so its END is rejected
                warn!("token {} received outside of an update sequence", index);
                return;
            }
        };

        let capacity = session.slots.len();
        if index >= capacity {
            warn!("token {} out of range for a sequence of {}", index, capacity);
            self.abort();
            return;
        }

        let slot = &mut session.slots[index];
        if slot.is_none() {
            session.filled += 1;
        }
        *slot = Some(record);
    }

    /// Closes the sequence. Returns the catalogue iff every position was
    /// filled; the sequence is back to idle either way.
    pub fn end(&mut self) -> Option<AcceptedUpdate> {
        let session = match core::mem::replace(&mut self.state, State::Idle) {
            State::Accumulating(session) => session,
            State::Idle => {
                warn!("update sequence ended without being started");
                return None;
            }
        };

        let expected = session.slots.len();
        if session.filled != expected {
            warn!(
                "update sequence rejected: received {} of {} tokens",
                session.filled, expected
            );
            return None;
        }

        let tokens: Vec<TotpRecord> = session.slots.into_iter().flatten().collect();
        info!("update sequence of {} tokens accepted", tokens.len());
        Some(AcceptedUpdate {
            tokens,
            clock_drift: session.clock_drift,
            store_on_device: session.store_on_device,
        })
    }

    fn abort(&mut self) {
        if self.is_accumulating() {
            debug!("update sequence aborted");
        }
        self.state = State::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{some_other_token, some_token};

    #[test]
    fn complete_sequence_is_accepted_in_order() {
        let mut sequence = UpdateSequence::new();
        sequence.start(2, None, None, 1000.0);
        sequence.token(0, some_token());
        sequence.token(1, some_other_token());

        let update = sequence.end().unwrap();

        assert_eq!(update.tokens, vec![some_token(), some_other_token()]);
        assert_eq!(update.clock_drift, 0.0);
        assert!(!update.store_on_device);
        assert!(!sequence.is_accumulating());
    }

    #[test]
    fn reordered_tokens_keep_their_positions() {
        let mut sequence = UpdateSequence::new();
        sequence.start(2, None, None, 0.0);
        sequence.token(1, some_other_token());
        sequence.token(0, some_token());

        assert_eq!(sequence.end().unwrap().tokens, vec![some_token(), some_other_token()]);
    }

    #[test]
    fn empty_sequence_is_accepted() {
        let mut sequence = UpdateSequence::new();
        sequence.start(0, None, None, 0.0);

        assert_eq!(sequence.end().unwrap().tokens, vec![]);
    }

    #[test]
    fn missing_token_rejects() {
        let mut sequence = UpdateSequence::new();
        sequence.start(2, None, None, 0.0);
        sequence.token(1, some_other_token());

        assert_eq!(sequence.end(), None);
        assert!(!sequence.is_accumulating());
    }

    #[test]
    fn token_before_start_rejects() {
        let mut sequence = UpdateSequence::new();
        sequence.token(0, some_token());
        sequence.start(1, None, None, 0.0);

        assert_eq!(sequence.end(), None);
    }

    #[test]
    fn end_without_start_rejects() {
        let mut sequence = UpdateSequence::new();

        assert_eq!(sequence.end(), None);
    }

    #[test]
    fn duplicate_index_does_not_count_twice() {
        let mut sequence = UpdateSequence::new();
        sequence.start(2, None, None, 0.0);
        sequence.token(0, some_token());
        sequence.token(0, some_other_token());

        assert_eq!(sequence.end(), None);
    }

    #[test]
    fn duplicate_index_keeps_latest_record() {
        let mut sequence = UpdateSequence::new();
        sequence.start(1, None, None, 0.0);
        sequence.token(0, some_token());
        sequence.token(0, some_other_token());

        assert_eq!(sequence.end().unwrap().tokens, vec![some_other_token()]);
    }

    #[test]
    fn out_of_range_index_aborts() {
        let mut sequence = UpdateSequence::new();
        sequence.start(2, None, None, 0.0);
        sequence.token(0, some_token());
        sequence.token(5, some_other_token());
        assert!(!sequence.is_accumulating());

        // the remaining messages of the aborted sequence change nothing
        sequence.token(1, some_other_token());
        assert_eq!(sequence.end(), None);
    }

    #[test]
    fn restart_discards_previous_tokens() {
        let mut sequence = UpdateSequence::new();
        sequence.start(2, None, None, 0.0);
        sequence.token(0, some_token());
        sequence.token(1, some_token());
        sequence.start(1, None, None, 0.0);
        sequence.token(0, some_other_token());

        assert_eq!(sequence.end().unwrap().tokens, vec![some_other_token()]);
    }

    #[test]
    fn clock_drift_and_store_flag_are_carried() {
        let mut sequence = UpdateSequence::new();
        sequence.start(0, Some(1_000.5), Some(true), 990.0);

        let update = sequence.end().unwrap();
        assert_eq!(update.clock_drift, 10.5);
        assert!(update.store_on_device);
    }
}
