#![allow(dead_code)]

use rand_core::RngCore;

use watch_totp_sync::record::TotpRecord;

pub const SOME_SECRET: &str = "MJUXILTMPEXTEWRWMNFEITY";

pub fn token(label: &str) -> TotpRecord {
    TotpRecord::new(label, SOME_SECRET)
}

/// `ConstantRng(0)` always pre-computes, `ConstantRng(u32::MAX)` never does
pub struct ConstantRng(pub u32);

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
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
