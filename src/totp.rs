//! Time-based one-time passwords (RFC 6238), on top of HOTP (RFC 4226).
//!
//! The engine is stateless: everything it needs is the record, the time and
//! the clock drift to compensate for. Caching lives in [`crate::cache`].

use core::convert::TryFrom;

use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::platform::{Clock, SystemClock};
use crate::record::{Algorithm, TotpRecord};

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
/// Inputs the engine refuses to compute a password for.
///
/// A validation layer in front of the engine is expected to reject these;
/// the engine fails loudly instead of producing a wrong code.
pub enum TotpError {
    #[error("secret is not valid base32")]
    InvalidSecret,
    #[error("unsupported algorithm {0:?}")]
    UnsupportedAlgorithm(String),
    #[error("invalid number of digits {0:?}")]
    InvalidDigits(String),
    #[error("invalid period {0:?}")]
    InvalidPeriod(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Contains a one-time password
pub struct Otp {
    pub value: u32,
    pub digits: u32,
}

/// OTP codes are presented as left-zero-padded strings
impl core::fmt::Display for Otp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:0width$}", self.value, width = self.digits as usize)
    }
}

/// Index of the period containing `timestamp + clock_drift`, starting at 0.
pub fn period_index(period_seconds: u64, timestamp: f64, clock_drift: f64) -> i64 {
    ((timestamp + clock_drift) / period_seconds as f64).floor() as i64
}

/// Whole seconds until the current period ends, in `1..=period_seconds`.
pub fn seconds_remaining(period_seconds: u64, timestamp: f64, clock_drift: f64) -> u64 {
    let elapsed = (timestamp + clock_drift).rem_euclid(period_seconds as f64);
    period_seconds - elapsed.floor() as u64
}

/// Decodes an RFC 4648 base32 secret, ignoring case and padding.
///
/// Authenticator apps commonly hand out secrets whose length is not a
/// multiple of eight characters, so leftover bits are dropped rather than
/// checked.
pub fn decode_secret(secret: &str) -> Result<Vec<u8>, TotpError> {
    let mut spec = data_encoding::Specification::new();
    spec.symbols.push_str("ABCDEFGHIJKLMNOPQRSTUVWXYZ234567");
    spec.check_trailing_bits = false;
    let base32 = spec.encoding().map_err(|_| TotpError::InvalidSecret)?;

    let normalized = secret.trim().trim_end_matches('=').to_ascii_uppercase();
    let key = base32
        .decode(normalized.as_bytes())
        .map_err(|_| TotpError::InvalidSecret)?;
    if key.is_empty() {
        return Err(TotpError::InvalidSecret);
    }
    Ok(key)
}

type HmacSha1 = Hmac<Sha1>;
type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// RFC 4226 HOTP value for `counter`.
pub fn hotp(key: &[u8], algorithm: Algorithm, counter: u64, digits: u32) -> Result<Otp, TotpError> {
    // 1. HMAC over the 8-byte big-endian counter
    let message = counter.to_be_bytes();
    let hash = match algorithm {
        Algorithm::Sha1 => {
            let mut mac = HmacSha1::new_from_slice(key).map_err(|_| TotpError::InvalidSecret)?;
            mac.update(&message);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha256 => {
            let mut mac = HmacSha256::new_from_slice(key).map_err(|_| TotpError::InvalidSecret)?;
            mac.update(&message);
            mac.finalize().into_bytes().to_vec()
        }
        Algorithm::Sha512 => {
            let mut mac = HmacSha512::new_from_slice(key).map_err(|_| TotpError::InvalidSecret)?;
            mac.update(&message);
            mac.finalize().into_bytes().to_vec()
        }
    };

    // 2. dynamic truncation to a 31-bit integer
    let offset = (hash[hash.len() - 1] & 0x0f) as usize;
    let truncated = u32::from_be_bytes([
        hash[offset] & 0x7f,
        hash[offset + 1],
        hash[offset + 2],
        hash[offset + 3],
    ]);

    // 3. reduce to the requested number of decimal digits
    let value = (u64::from(truncated) % 10u64.pow(digits)) as u32;
    Ok(Otp { value, digits })
}

/// Password of `record` for the period containing `timestamp + clock_drift`,
/// or for the period after it. Times before the UNIX epoch use period 0.
pub fn compute_otp_at(
    record: &TotpRecord,
    timestamp: f64,
    clock_drift: f64,
    for_next_period: bool,
) -> Result<String, TotpError> {
    let period = record.period_seconds()?;
    let digits = record.digit_count()?;
    let algorithm = record.algorithm()?;
    let key = decode_secret(&record.secret)?;

    let counter = period_index(period, timestamp, clock_drift) + i64::from(for_next_period);
    // before the epoch, stay on the first period instead of wrapping around
    let counter = u64::try_from(counter).unwrap_or(0);
    let otp = hotp(&key, algorithm, counter, digits)?;
    Ok(otp.to_string())
}

/// Password of `record` at the current wall-clock time.
pub fn compute_otp(record: &TotpRecord, clock_drift: f64, for_next_period: bool) -> Result<String, TotpError> {
    compute_otp_at(record, SystemClock.now(), clock_drift, for_next_period)
}

/// Whatever the password cache calls on a miss.
pub trait Generator {
    fn generate(
        &mut self,
        record: &TotpRecord,
        timestamp: f64,
        clock_drift: f64,
        for_next_period: bool,
    ) -> Result<String, TotpError>;
}

#[derive(Clone, Copy, Debug, Default)]
/// The RFC 6238 engine
pub struct Totp;

impl Generator for Totp {
    fn generate(
        &mut self,
        record: &TotpRecord,
        timestamp: f64,
        clock_drift: f64,
        for_next_period: bool,
    ) -> Result<String, TotpError> {
        compute_otp_at(record, timestamp, clock_drift, for_next_period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOME_SECRET: &str = "MJUXILTMPEXTEWRWMNFEITY";

    #[test]
    fn otp_is_zero_padded() {
        assert_eq!(Otp { value: 42, digits: 6 }.to_string(), "000042");
        assert_eq!(Otp { value: 7081804, digits: 8 }.to_string(), "07081804");
    }

    #[test]
    fn period_index_starts_at_zero() {
        assert_eq!(period_index(30, 0.0, 0.0), 0);
        assert_eq!(period_index(30, 42.0, 0.0), 1);
        assert_eq!(period_index(30, 42.0, -13.0), 0);
        assert_eq!(period_index(30, 59.999, 0.0), 1);
        assert_eq!(period_index(30, 60.0, 0.0), 2);
    }

    #[test]
    fn seconds_remaining_counts_down() {
        assert_eq!(seconds_remaining(30, 0.0, 0.0), 30);
        assert_eq!(seconds_remaining(30, 29.5, 0.0), 1);
        assert_eq!(seconds_remaining(30, 42.0, 3.0), 15);
    }

    #[test]
    fn secret_decoding_ignores_case_and_padding() {
        assert_eq!(decode_secret("gezdgnbv").unwrap(), b"12345".to_vec());
        assert_eq!(decode_secret("GEZDGNA=").unwrap(), b"1234".to_vec());
        assert_eq!(decode_secret("GEZDGNA").unwrap(), b"1234".to_vec());
        assert_eq!(decode_secret("not base32!"), Err(TotpError::InvalidSecret));
        assert_eq!(decode_secret(""), Err(TotpError::InvalidSecret));
    }

    #[test]
    fn invalid_record_fields_are_reported() {
        let mut record = TotpRecord::new("some label", "1nvalid");
        assert_eq!(compute_otp_at(&record, 0.0, 0.0, false), Err(TotpError::InvalidSecret));

        record.secret = SOME_SECRET.into();
        record.algorithm = "SHA3".into();
        assert_eq!(
            compute_otp_at(&record, 0.0, 0.0, false),
            Err(TotpError::UnsupportedAlgorithm("SHA3".into()))
        );
    }

    #[test]
    fn negative_time_saturates_at_first_period() {
        let record = TotpRecord::new("some label", SOME_SECRET);
        let first = compute_otp_at(&record, 0.0, 0.0, false).unwrap();

        assert_eq!(compute_otp_at(&record, 10.0, -100.0, false).unwrap(), first);
        assert_eq!(compute_otp_at(&record, 10.0, -40.0, true).unwrap(), first);
        assert_eq!(compute_otp_at(&record, -1e12, 0.0, false).unwrap(), first);
    }

    #[test]
    fn clock_drift_shifts_the_period() {
        let record = TotpRecord::new("some label", SOME_SECRET);

        assert_eq!(
            compute_otp_at(&record, 10.0, 30.0, false).unwrap(),
            compute_otp_at(&record, 40.0, 0.0, false).unwrap(),
        );
        assert_ne!(
            compute_otp_at(&record, 10.0, 30.0, false).unwrap(),
            compute_otp_at(&record, 10.0, 0.0, false).unwrap(),
        );
    }
}
