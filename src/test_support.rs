#![allow(dead_code)]
#![cfg(test)]
use std::cell::Cell;
use std::rc::Rc;

use rand_core::RngCore;

use crate::record::TotpRecord;
use crate::totp::{Generator, Totp, TotpError};

pub const SOME_SECRET: &str = "MJUXILTMPEXTEWRWMNFEITY";

pub fn some_token() -> TotpRecord {
    TotpRecord::new("some label", SOME_SECRET)
}

pub fn some_other_token() -> TotpRecord {
    TotpRecord::new("some other label", SOME_SECRET)
}

/// RNG returning the same word forever; `0` always wins a coin flip,
/// `u32::MAX` never does.
pub struct ConstantRng(pub u32);

pub fn always_precache() -> ConstantRng {
    ConstantRng(0)
}

pub fn never_precache() -> ConstantRng {
    ConstantRng(u32::MAX)
}

impl RngCore for ConstantRng {
    fn next_u32(&mut self) -> u32 {
        self.0
    }
    fn next_u64(&mut self) -> u64 {
        u64::from(self.0)
    }
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.iter_mut().for_each(|byte| *byte = self.0 as u8);
    }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> core::result::Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// The real engine, counting its invocations
#[derive(Clone, Default)]
pub struct CountingTotp {
    pub calls: Rc<Cell<usize>>,
}

impl CountingTotp {
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Generator for CountingTotp {
    fn generate(
        &mut self,
        record: &TotpRecord,
        timestamp: f64,
        clock_drift: f64,
        for_next_period: bool,
    ) -> Result<String, TotpError> {
        self.calls.set(self.calls.get() + 1);
        Totp.generate(record, timestamp, clock_drift, for_next_period)
    }
}
