//! Persisted display settings
//!
//! Currently only the light/dark theme. The value lives in a small JSON file
//! and is read once at startup; [`ThemeSettings::toggle`] is the only writer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display theme
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeSetting {
    #[default]
    Light,
    Dark,
}

impl ThemeSetting {
    pub fn toggled(self) -> Self {
        match self {
            ThemeSetting::Light => ThemeSetting::Dark,
            ThemeSetting::Dark => ThemeSetting::Light,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeSetting::Light => "light",
            ThemeSetting::Dark => "dark",
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Settings I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Settings encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Backing storage for the theme
pub trait SettingsStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet
    fn load(&self) -> Result<Option<ThemeSetting>, SettingsError>;

    fn save(&self, theme: ThemeSetting) -> Result<(), SettingsError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SettingsFile {
    theme: ThemeSetting,
}

/// JSON file store, e.g. `{"theme":"dark"}`
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> SettingsError {
        SettingsError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Option<ThemeSetting>, SettingsError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_str::<SettingsFile>(&raw) {
            Ok(file) => Ok(Some(file.theme)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unreadable settings file"
                );
                Ok(None)
            }
        }
    }

    fn save(&self, theme: ThemeSetting) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }
        let body = serde_json::to_string(&SettingsFile { theme })?;
        fs::write(&self.path, body).map_err(|e| self.io_error(e))
    }
}

/// Process-wide theme, initialised once and changed only by toggling
pub struct ThemeSettings {
    store: Box<dyn SettingsStore>,
    current: RwLock<ThemeSetting>,
}

impl ThemeSettings {
    /// Stored value, else the OS preference, else light
    ///
    /// Whatever was picked is written back so later runs agree.
    pub fn load(store: Box<dyn SettingsStore>, os_preference: Option<ThemeSetting>) -> Self {
        let stored = store.load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not read settings, using defaults");
            None
        });

        let theme = match stored {
            Some(theme) => theme,
            None => {
                let theme = os_preference.unwrap_or_default();
                if let Err(e) = store.save(theme) {
                    tracing::warn!(error = %e, "Could not persist initial theme");
                }
                theme
            }
        };

        tracing::debug!(theme = theme.as_str(), "Theme loaded");
        Self {
            store,
            current: RwLock::new(theme),
        }
    }

    pub fn current(&self) -> ThemeSetting {
        *self.current.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Flip the theme and persist it. On a write failure the old value stays.
    pub fn toggle(&self) -> Result<ThemeSetting, SettingsError> {
        let mut current = self.current.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let next = current.toggled();
        self.store.save(next)?;
        *current = next;

        tracing::info!(theme = next.as_str(), "Theme toggled");
        Ok(next)
    }
}

/// Read the terminal's light/dark hint from `COLORFGBG` (`"15;0"` is light text on black)
pub fn detect_os_preference() -> Option<ThemeSetting> {
    std::env::var("COLORFGBG")
        .ok()
        .and_then(|value| theme_from_colorfgbg(&value))
}

fn theme_from_colorfgbg(value: &str) -> Option<ThemeSetting> {
    let background: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    match background {
        0..=6 | 8 => Some(ThemeSetting::Dark),
        _ => Some(ThemeSetting::Light),
    }
}
