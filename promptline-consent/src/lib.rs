//! Privacy-settings persistence for Promptline telemetry.
//!
//! The store loads the settings file once at startup and keeps an in-memory
//! copy; every mutating operation rewrites the file in full before it
//! returns. Tracking decisions read the in-memory copy, so lookups are
//! cheap and never touch disk.

use promptline_types::PrivacySettings;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;
use tracing::debug;

/// Result type for consent-store operations.
pub type ConsentResult<T> = Result<T, ConsentError>;

/// Errors that can occur reading or writing the settings file.
#[derive(Debug, Error)]
pub enum ConsentError {
    #[error("settings storage error: {0}")]
    Storage(String),

    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// File-backed store for [`PrivacySettings`].
pub struct ConsentStore {
    path: PathBuf,
    settings: RwLock<PrivacySettings>,
}

impl ConsentStore {
    /// Opens the store at `path`, creating a default settings file (with a
    /// fresh anonymous client id) if none exists yet.
    pub fn open(path: impl Into<PathBuf>) -> ConsentResult<Self> {
        let path = path.into();
        let settings = match Self::read_file(&path)? {
            Some(settings) => settings,
            None => {
                let defaults = PrivacySettings::default();
                Self::write_file(&path, &defaults)?;
                debug!("created default privacy settings at {}", path.display());
                defaults
            }
        };

        Ok(Self {
            path,
            settings: RwLock::new(settings),
        })
    }

    /// Default settings location under the platform-local data directory.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("promptline")
            .join("privacy.json")
    }

    /// Returns a copy of the current settings.
    pub fn settings(&self) -> PrivacySettings {
        self.settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Whether tracking is currently allowed (sink configured AND consent
    /// given).
    pub fn is_tracking_enabled(&self) -> bool {
        self.settings().is_tracking_enabled()
    }

    /// Records the user's consent decision.
    pub fn set_consent(&self, granted: bool) -> ConsentResult<()> {
        self.mutate(|s| s.consent_given = granted)
    }

    /// Enables or disables the remote sink for this installation.
    pub fn set_remote_tracking(&self, enabled: bool) -> ConsentResult<()> {
        self.mutate(|s| s.remote_tracking_enabled = enabled)
    }

    pub fn set_track_prompts(&self, enabled: bool) -> ConsentResult<()> {
        self.mutate(|s| s.track_prompts = enabled)
    }

    pub fn set_track_tokens(&self, enabled: bool) -> ConsentResult<()> {
        self.mutate(|s| s.track_tokens = enabled)
    }

    pub fn set_track_metadata(&self, enabled: bool) -> ConsentResult<()> {
        self.mutate(|s| s.track_metadata = enabled)
    }

    pub fn set_data_retention_days(&self, days: u32) -> ConsentResult<()> {
        self.mutate(|s| s.data_retention_days = days)
    }

    /// Applies `f` to a copy of the settings, persists the copy, then
    /// commits it to memory. A failed write leaves the in-memory settings
    /// unchanged.
    fn mutate(&self, f: impl FnOnce(&mut PrivacySettings)) -> ConsentResult<()> {
        let mut guard = self
            .settings
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut updated = guard.clone();
        f(&mut updated);
        Self::write_file(&self.path, &updated)?;
        *guard = updated;
        Ok(())
    }

    fn read_file(path: &Path) -> ConsentResult<Option<PrivacySettings>> {
        if !path.exists() {
            return Ok(None);
        }

        let json = std::fs::read_to_string(path)
            .map_err(|e| ConsentError::Storage(e.to_string()))?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn write_file(path: &Path, settings: &PrivacySettings) -> ConsentResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConsentError::Storage(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(path, json).map_err(|e| ConsentError::Storage(e.to_string()))?;
        Ok(())
    }
}
