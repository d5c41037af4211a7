//! Persistent storage of the token catalogue and the device settings.
//!
//! The device keeps at most one catalogue and one set of settings, each under
//! a fixed well-known name. Here, we use postcard-encoded files in a state
//! directory for persistence, and in-memory slots where nothing should outlive
//! the process.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::record::TotpRecord;
use crate::settings::Settings;
use crate::Result;

/// Well-known file name of the stored catalogue
pub const TOKENS_FILE_NAME: &str = "tokens.postcard";
/// Well-known file name of the stored settings
pub const SETTINGS_FILE_NAME: &str = "settings.postcard";

/// The persistence collaborator of the token manager.
pub trait Store {
    fn exists(&self) -> bool;
    fn read(&self) -> Result<Vec<TotpRecord>>;
    fn write(&mut self, tokens: &[TotpRecord]) -> Result<()>;
    /// Removes the stored catalogue; no-op if there is none.
    fn delete(&mut self) -> Result<()>;
}

/// The persistence collaborator of the settings manager.
pub trait SettingsStore {
    /// The stored settings, `None` if none were stored yet.
    fn read_settings(&self) -> Result<Option<Settings>>;
    fn write_settings(&mut self, settings: &Settings) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
    settings_path: PathBuf,
}

impl FileStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Result<Self> {
        let state_dir = state_dir.as_ref();
        if !state_dir.exists() {
            fs::create_dir_all(state_dir)?;
            info!("created state directory {}", state_dir.display());
        }
        Ok(Self {
            path: state_dir.join(TOKENS_FILE_NAME),
            settings_path: state_dir.join(SETTINGS_FILE_NAME),
        })
    }

    /// Location of the stored catalogue
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }
}

// write-then-rename, so a crash never leaves a truncated file
fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    let partial = path.with_extension("partial");
    fs::write(&partial, contents)?;
    fs::rename(&partial, path)?;
    Ok(())
}

impl Store for FileStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn read(&self) -> Result<Vec<TotpRecord>> {
        let serialized = fs::read(&self.path)?;
        let tokens: Vec<TotpRecord> = postcard::from_bytes(&serialized)
            .map_err(|_| anyhow::anyhow!("postcard deserialization error"))?;
        debug!("read {} tokens from {}", tokens.len(), self.path.display());
        Ok(tokens)
    }

    fn write(&mut self, tokens: &[TotpRecord]) -> Result<()> {
        let serialized = postcard::to_allocvec(tokens)
            .map_err(|_| anyhow::anyhow!("postcard serialization error"))?;
        replace_file(&self.path, &serialized)?;
        debug!("wrote {} tokens to {}", tokens.len(), self.path.display());
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        if self.exists() {
            fs::remove_file(&self.path)?;
            debug!("deleted {}", self.path.display());
        }
        Ok(())
    }
}

impl SettingsStore for FileStore {
    fn read_settings(&self) -> Result<Option<Settings>> {
        if !self.settings_path.is_file() {
            return Ok(None);
        }
        let serialized = fs::read(&self.settings_path)?;
        let settings = postcard::from_bytes(&serialized)
            .map_err(|_| anyhow::anyhow!("postcard deserialization error"))?;
        Ok(Some(settings))
    }

    fn write_settings(&mut self, settings: &Settings) -> Result<()> {
        let serialized = postcard::to_allocvec(settings)
            .map_err(|_| anyhow::anyhow!("postcard serialization error"))?;
        replace_file(&self.settings_path, &serialized)?;
        debug!("wrote settings to {}", self.settings_path.display());
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tokens: Option<Vec<TotpRecord>>,
    settings: Option<Settings>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn exists(&self) -> bool {
        self.tokens.is_some()
    }

    fn read(&self) -> Result<Vec<TotpRecord>> {
        self.tokens
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no tokens stored"))
    }

    fn write(&mut self, tokens: &[TotpRecord]) -> Result<()> {
        self.tokens = Some(tokens.to_vec());
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        self.tokens = None;
        Ok(())
    }
}

impl SettingsStore for MemoryStore {
    fn read_settings(&self) -> Result<Option<Settings>> {
        Ok(self.settings.clone())
    }

    fn write_settings(&mut self, settings: &Settings) -> Result<()> {
        self.settings = Some(settings.clone());
        Ok(())
    }
}
