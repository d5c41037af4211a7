//! What the device runtime provides to the token logic: a clock, a source of
//! randomness and persistent storage.
//!
//! On the PC, time comes from `SystemTime`, randomness from a ChaCha8 RNG seeded
//! by the operating system, and storage is a single postcard-encoded file.

use std::cell::Cell;
use std::rc::Rc;

use rand_core::{RngCore, SeedableRng};

use crate::Result;

pub mod store;

/// Wall-clock time, in (fractional) seconds since the UNIX epoch.
pub trait Clock {
    fn now(&self) -> f64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
            Ok(since_epoch) => since_epoch.as_secs_f64(),
            // clock set before 1970
            Err(before_epoch) => -before_epoch.duration().as_secs_f64(),
        }
    }
}

#[derive(Clone, Debug, Default)]
/// A clock that only moves when told to. Clones share the same time.
pub struct ManualClock {
    seconds: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(seconds: f64) -> Self {
        Self { seconds: Rc::new(Cell::new(seconds)) }
    }

    pub fn set(&self, seconds: f64) {
        self.seconds.set(seconds);
    }

    pub fn advance(&self, seconds: f64) {
        self.seconds.set(self.seconds.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.seconds.get()
    }
}

/// Bernoulli trial: `true` with probability `probability`.
pub fn coin_flip(rng: &mut impl RngCore, probability: f64) -> bool {
    let draw = f64::from(rng.next_u32()) / (f64::from(u32::MAX) + 1.0);
    draw < probability
}

pub fn init_rng() -> Result<chacha20::ChaCha8Rng> {
    chacha20::ChaCha8Rng::from_rng(rand_core::OsRng)
        .map_err(|err| anyhow::anyhow!("could not seed RNG: {}", err))
}

pub fn seeded_rng(seed: u64) -> chacha20::ChaCha8Rng {
    chacha20::ChaCha8Rng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{always_precache, never_precache};

    #[test]
    fn coin_flip_extremes() {
        assert!(coin_flip(&mut always_precache(), 0.15));
        assert!(!coin_flip(&mut never_precache(), 0.15));
        assert!(!coin_flip(&mut always_precache(), 0.0));
    }

    #[test]
    fn coin_flip_frequency() {
        let mut rng = seeded_rng(7);
        let heads = (0..10_000).filter(|_| coin_flip(&mut rng, 0.15)).count();
        assert!((1_200..1_800).contains(&heads), "got {} heads", heads);
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(10.0);
        let other = clock.clone();
        clock.advance(5.0);
        assert_eq!(other.now(), 15.0);
        other.set(1.0);
        assert_eq!(clock.now(), 1.0);
    }
}
