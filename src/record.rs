//! The token record exchanged between companion and device.
//!
//! Records travel over the wire in the shape the companion stores them in
//! (numbers as decimal strings, algorithm as its name), so parsing into
//! typed values happens only when a password is actually computed.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::totp::TotpError;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
/// One TOTP credential, as configured on the companion.
pub struct TotpRecord {
    /// Account label, e.g. `alice@example.com`
    pub label: String,
    #[serde(default)]
    pub issuer: Option<String>,
    /// User-chosen override of the generated display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// Base32 (RFC 4648) shared secret, case-insensitive
    pub secret: String,
    /// One of `SHA1`, `SHA256`, `SHA512`
    pub algorithm: String,
    /// Number of digits, as decimal string
    pub digits: String,
    /// Period in seconds, as decimal string
    pub period: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
/// HMAC hash functions allowed by RFC 6238
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl FromStr for Algorithm {
    type Err = TotpError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "SHA1" => Ok(Algorithm::Sha1),
            "SHA256" => Ok(Algorithm::Sha256),
            "SHA512" => Ok(Algorithm::Sha512),
            other => Err(TotpError::UnsupportedAlgorithm(other.into())),
        }
    }
}

impl core::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Algorithm::Sha1 => "SHA1",
            Algorithm::Sha256 => "SHA256",
            Algorithm::Sha512 => "SHA512",
        };
        f.write_str(name)
    }
}

impl TotpRecord {
    /// Record with the usual defaults (SHA1, 6 digits, 30 seconds).
    pub fn new(label: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            issuer: None,
            display_name: None,
            secret: secret.into(),
            algorithm: Algorithm::Sha1.to_string(),
            digits: "6".into(),
            period: "30".into(),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn algorithm(&self) -> Result<Algorithm, TotpError> {
        self.algorithm.parse()
    }

    /// Digit count, at least one. Codes longer than ten digits carry no
    /// additional entropy since truncation yields a 31-bit integer.
    pub fn digit_count(&self) -> Result<u32, TotpError> {
        match self.digits.trim().parse::<u32>() {
            Ok(digits) if (1..=10).contains(&digits) => Ok(digits),
            _ => Err(TotpError::InvalidDigits(self.digits.clone())),
        }
    }

    pub fn period_seconds(&self) -> Result<u64, TotpError> {
        match self.period.trim().parse::<u64>() {
            Ok(period) if period > 0 => Ok(period),
            _ => Err(TotpError::InvalidPeriod(self.period.clone())),
        }
    }

    /// Two records denote the same token iff label and issuer both match,
    /// where a missing issuer only matches another missing issuer.
    pub fn is_same_token(&self, other: &TotpRecord) -> bool {
        self.label == other.label && self.issuer == other.issuer
    }

    /// Name shown in token lists.
    ///
    /// Falls back to `issuer (label)`, or just `label` without an issuer. With
    /// `include_label_and_issuer`, an override is followed by that fallback,
    /// e.g. `Work / ACME (alice)`.
    pub fn display_name(&self, include_label_and_issuer: bool) -> String {
        let label_and_issuer = match &self.issuer {
            Some(issuer) if !issuer.is_empty() => format!("{} ({})", issuer, self.label),
            _ => self.label.clone(),
        };

        match &self.display_name {
            Some(name) if !name.is_empty() => {
                if include_label_and_issuer {
                    format!("{} / {}", name, label_and_issuer)
                } else {
                    name.clone()
                }
            }
            _ => label_and_issuer,
        }
    }
}

/// Position of the first record in `tokens` denoting the same token as `record`.
pub fn find_matching(tokens: &[TotpRecord], record: &TotpRecord) -> Option<usize> {
    tokens.iter().position(|token| token.is_same_token(record))
}
