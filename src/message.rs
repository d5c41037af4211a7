//! Messages sent from the companion to the device.
//!
//! On the wire, messages are JSON objects discriminated by their `type` field.
//! The peer socket limits the size of a single message, which is why a
//! catalogue is split into one message per token.

use serde::{Deserialize, Serialize};

use crate::record::TotpRecord;
use crate::Result;

/// Largest message the peer socket accepts, in bytes
pub const MAX_MESSAGE_SIZE: usize = 1027;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PeerMessage {
    #[serde(rename = "UPDATE_TOKENS_START_MESSAGE", rename_all = "camelCase")]
    Start {
        /// Number of tokens announced, to detect lost messages
        count: usize,
        /// Companion clock, to compensate clock drift on the device
        #[serde(default, skip_serializing_if = "Option::is_none", alias = "secondsSinceEpochInCompanion")]
        remote_epoch_seconds: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none", alias = "storeTokensOnDevice")]
        store_on_device: Option<bool>,
    },
    #[serde(rename = "UPDATE_TOKENS_TOKEN_MESSAGE")]
    Token {
        /// Position of the token in the catalogue
        index: usize,
        token: TotpRecord,
    },
    #[serde(rename = "UPDATE_TOKENS_END_MESSAGE")]
    End,
    #[serde(rename = "UPDATE_SETTINGS_MESSAGE", rename_all = "camelCase")]
    UpdateSettings { updated_settings: AppSettings },
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
/// A partial settings update; absent fields are left unchanged.
/// See [`crate::settings::SettingsManager`].
pub struct AppSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_use_large_token_view: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_scheme: Option<String>,
}

impl PeerMessage {
    /// Serializes for the peer socket, refusing messages it would not carry.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = serde_json::to_vec(self)?;
        if bytes.len() > MAX_MESSAGE_SIZE {
            return Err(anyhow::anyhow!(
                "message of {} bytes exceeds the limit of {} bytes",
                bytes.len(),
                MAX_MESSAGE_SIZE
            ));
        }
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
