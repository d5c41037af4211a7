//! The device-side token manager.
//!
//! It owns the committed catalogue and feeds incoming update messages through
//! an [`UpdateSequence`]. Once a sequence is accepted, the catalogue is swapped
//! in one step, the password cache is emptied and adopts the sequence's clock drift, observers
//! are notified, and the catalogue is stored or deleted on the device as
//! instructed.

use log::{debug, info, warn};
use rand_core::RngCore;

use crate::cache::PasswordCache;
use crate::message::PeerMessage;
use crate::platform::{store::Store, Clock};
use crate::record::TotpRecord;
use crate::sequence::{AcceptedUpdate, UpdateSequence};
use crate::totp::{Generator, Totp, TotpError};
use crate::Result;

/// Called with the new catalogue after every change
pub type Observer = Box<dyn FnMut(&[TotpRecord])>;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
/// What handling a single message did
pub enum Update {
    /// Part of a sequence still in flight, or discarded as out of order
    Pending,
    /// A sequence completed and its catalogue is now committed
    Accepted,
    /// A sequence ended incomplete; the catalogue is unchanged
    Rejected,
    /// Not an update message
    Ignored,
}

pub struct TokenManager<C, R, S, G = Totp> {
    tokens: Vec<TotpRecord>,
    sequence: UpdateSequence,
    observers: Vec<Observer>,
    passwords: PasswordCache<C, R, G>,
    store: S,
}

impl<C: Clock, R: RngCore, S: Store> TokenManager<C, R, S, Totp> {
    pub fn new(clock: C, rng: R, store: S) -> Self {
        Self::with_password_cache(PasswordCache::new(clock, rng), store)
    }
}

impl<C: Clock, R: RngCore, S: Store, G: Generator> TokenManager<C, R, S, G> {
    pub fn with_password_cache(passwords: PasswordCache<C, R, G>, store: S) -> Self {
        Self {
            tokens: Vec::new(),
            sequence: UpdateSequence::new(),
            observers: Vec::new(),
            passwords,
            store,
        }
    }

    pub fn handle_message(&mut self, message: PeerMessage) -> Update {
        match message {
            PeerMessage::Start { count, remote_epoch_seconds, store_on_device } => {
                let local_seconds = self.passwords.clock().now();
                self.sequence.start(count, remote_epoch_seconds, store_on_device, local_seconds);
                Update::Pending
            }
            PeerMessage::Token { index, token } => {
                self.sequence.token(index, token);
                Update::Pending
            }
            PeerMessage::End => match self.sequence.end() {
                Some(update) => {
                    self.commit(update);
                    Update::Accepted
                }
                None => Update::Rejected,
            },
            PeerMessage::UpdateSettings { .. } => {
                debug!("settings message is not for the token manager");
                Update::Ignored
            }
        }
    }

    /// The committed catalogue, in the order the companion sent it
    pub fn tokens(&self) -> &[TotpRecord] {
        &self.tokens
    }

    /// Observers are called in registration order; registering the same
    /// closure twice calls it twice.
    pub fn register_observer(&mut self, observer: impl FnMut(&[TotpRecord]) + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn password(&mut self, token: &TotpRecord) -> core::result::Result<String, TotpError> {
        self.passwords.get_password(token)
    }

    pub fn clock_drift(&self) -> f64 {
        self.passwords.clock_drift()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads a catalogue stored by an earlier update, if any.
    ///
    /// Meant to run once at start-up, before the first update arrives.
    pub fn try_restore(&mut self) -> Result<bool> {
        if !self.store.exists() {
            debug!("no stored tokens");
            return Ok(false);
        }
        self.tokens = self.store.read()?;
        info!("restored {} tokens", self.tokens.len());
        self.notify_observers();
        Ok(true)
    }

    fn commit(&mut self, update: AcceptedUpdate) {
        let AcceptedUpdate { tokens, clock_drift, store_on_device } = update;
        self.tokens = tokens;
        // a token may keep its label and issuer but change its secret
        self.passwords.clear();
        self.passwords.set_clock_drift(clock_drift);
        self.notify_observers();

        // keeping tokens on the device is opt-in, anything else removes them
        let stored = if store_on_device {
            self.store.write(&self.tokens)
        } else {
            self.store.delete()
        };
        if let Err(err) = stored {
            warn!("could not update stored tokens: {}", err);
        }
    }

    fn notify_observers(&mut self) {
        let tokens = &self.tokens;
        self.observers.iter_mut().for_each(|observer| observer(tokens));
    }
}
