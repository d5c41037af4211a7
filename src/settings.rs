//! Device settings pushed by the companion.
//!
//! Settings travel in their own message, next to but independent of token
//! update sequences. Each message carries only the settings that changed,
//! which are merged into the current ones, stored and announced to observers.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::message::{AppSettings, PeerMessage};
use crate::platform::store::SettingsStore;
use crate::Result;

/// Color scheme used until the companion picks another one
pub const DEFAULT_COLOR_SCHEME: &str = "default";

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Settings {
    pub should_use_large_token_view: bool,
    pub color_scheme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            should_use_large_token_view: false,
            color_scheme: DEFAULT_COLOR_SCHEME.into(),
        }
    }
}

impl Settings {
    /// Takes over every field present in `updated`.
    pub fn merge(&mut self, updated: &AppSettings) {
        if let Some(large) = updated.should_use_large_token_view {
            self.should_use_large_token_view = large;
        }
        if let Some(color_scheme) = &updated.color_scheme {
            self.color_scheme = color_scheme.clone();
        }
    }
}

pub type SettingsObserver = Box<dyn FnMut(&Settings)>;

pub struct SettingsManager<S> {
    settings: Settings,
    observers: Vec<SettingsObserver>,
    store: S,
}

impl<S: SettingsStore> SettingsManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            settings: Settings::default(),
            observers: Vec::new(),
            store,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn register_observer(&mut self, observer: impl FnMut(&Settings) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Handles the message if it is a settings update; returns whether it was.
    pub fn handle_message(&mut self, message: &PeerMessage) -> bool {
        match message {
            PeerMessage::UpdateSettings { updated_settings } => {
                self.update(updated_settings);
                true
            }
            _ => false,
        }
    }

    /// Merges `updated` into the current settings, then stores them and
    /// notifies observers.
    pub fn update(&mut self, updated: &AppSettings) {
        self.settings.merge(updated);
        debug!("settings now {:?}", self.settings);
        if let Err(err) = self.store.write_settings(&self.settings) {
            warn!("could not store settings: {}", err);
        }
        self.notify_observers();
    }

    /// Loads settings stored earlier, if any. Meant to run once at start-up.
    pub fn try_restore(&mut self) -> Result<bool> {
        match self.store.read_settings()? {
            Some(settings) => {
                info!("restored settings");
                self.settings = settings;
                self.notify_observers();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn notify_observers(&mut self) {
        let settings = &self.settings;
        self.observers.iter_mut().for_each(|observer| observer(settings));
    }
}
