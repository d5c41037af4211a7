//! Per-token cache of the current and next one-time password.
//!
//! The UI asks for every visible token's password once per second, while the
//! password only changes once per period. The cache computes the current
//! password on the first request of a period and, with a small probability per
//! request, the password of the following period, so the computation cost of a
//! rollover is spread over the period before it.

use std::collections::{BTreeMap, HashMap};

use log::debug;
use rand_core::RngCore;

use crate::platform::{coin_flip, Clock};
use crate::record::TotpRecord;
use crate::totp::{period_index, Generator, Totp, TotpError};

/// Chance per request to pre-compute the next period's password.
///
/// At one request per second and a 30 second period, this makes it more than
/// 99% likely that the next password is ready before the rollover.
pub const PRECACHE_PROBABILITY: f64 = 0.15;

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct TokenKey {
    issuer: Option<String>,
    label: String,
}

impl TokenKey {
    fn of(record: &TotpRecord) -> Self {
        Self {
            issuer: record.issuer.clone(),
            label: record.label.clone(),
        }
    }
}

pub struct PasswordCache<C, R, G = Totp> {
    clock: C,
    rng: R,
    generator: G,
    /// Seconds to add to the local clock, see [`PasswordCache::set_clock_drift`]
    clock_drift: f64,
    /// period index -> password, holding at most the current and the next period
    passwords: HashMap<TokenKey, BTreeMap<i64, String>>,
}

impl<C: Clock, R: RngCore> PasswordCache<C, R, Totp> {
    pub fn new(clock: C, rng: R) -> Self {
        Self::with_generator(clock, rng, Totp)
    }
}

impl<C: Clock, R: RngCore, G: Generator> PasswordCache<C, R, G> {
    pub fn with_generator(clock: C, rng: R, generator: G) -> Self {
        Self {
            clock,
            rng,
            generator,
            clock_drift: 0.0,
            passwords: HashMap::new(),
        }
    }

    /// Current password of `record`.
    pub fn get_password(&mut self, record: &TotpRecord) -> Result<String, TotpError> {
        let period = record.period_seconds()?;
        // time, drift and therefore the period are fixed for the whole call
        let now = self.clock.now();
        let clock_drift = self.clock_drift;
        let current = period_index(period, now, clock_drift);
        let next = current + 1;

        let passwords = self.passwords.entry(TokenKey::of(record)).or_default();

        let password = match passwords.get(&current) {
            Some(password) => password.clone(),
            None => {
                debug!("computing password of {:?} for period {}", record.label, current);
                let password = self.generator.generate(record, now, clock_drift, false)?;
                passwords.retain(|&index, _| index == next);
                passwords.insert(current, password.clone());
                password
            }
        };

        if !passwords.contains_key(&next) && coin_flip(&mut self.rng, PRECACHE_PROBABILITY) {
            debug!("pre-computing password of {:?} for period {}", record.label, next);
            let upcoming = self.generator.generate(record, now, clock_drift, true)?;
            passwords.insert(next, upcoming);
        }

        passwords.retain(|&index, _| index == current || index == next);

        Ok(password)
    }

    pub fn clock_drift(&self) -> f64 {
        self.clock_drift
    }

    /// Seconds the peer's clock is ahead of ours. Cached passwords are kept;
    /// those of periods no longer current are dropped on their next miss.
    pub fn set_clock_drift(&mut self, seconds: f64) {
        debug!("clock drift {} -> {}", self.clock_drift, seconds);
        self.clock_drift = seconds;
    }

    /// Forgets every cached password, e.g. once the catalogue they were
    /// computed from is replaced.
    pub fn clear(&mut self) {
        debug!("dropping cached passwords of {} tokens", self.passwords.len());
        self.passwords.clear();
    }

    /// Periods currently holding a password for `record`, ascending.
    pub fn cached_periods(&self, record: &TotpRecord) -> Vec<i64> {
        self.passwords
            .get(&TokenKey::of(record))
            .map(|passwords| passwords.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
