//! Process-wide light/dark theme.
//!
//! Reads go through [`ThemeCell::get`]. The only writer is the theme switcher, through the
//! crate-private [`ThemeCell::set`].

use std::{cell::Cell, path::PathBuf};

use crate::foundation::error::{StageError, StageResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

/// Persistence for the theme preference.
pub trait ThemeStore {
    fn load(&self) -> StageResult<Option<Theme>>;
    fn save(&mut self, theme: Theme) -> StageResult<()>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryThemeStore {
    value: Option<Theme>,
}

impl MemoryThemeStore {
    pub fn new(value: Option<Theme>) -> Self {
        Self { value }
    }
}

impl ThemeStore for MemoryThemeStore {
    fn load(&self) -> StageResult<Option<Theme>> {
        Ok(self.value)
    }

    fn save(&mut self, theme: Theme) -> StageResult<()> {
        self.value = Some(theme);
        Ok(())
    }
}

/// Stores the theme as a single word in a text file.
#[derive(Clone, Debug)]
pub struct FileThemeStore {
    path: PathBuf,
}

impl FileThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ThemeStore for FileThemeStore {
    fn load(&self) -> StageResult<Option<Theme>> {
        match std::fs::read_to_string(&self.path) {
            Ok(s) => Ok(Theme::parse(&s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StageError::Other(anyhow::Error::new(e).context(format!(
                "read theme preference '{}'",
                self.path.display()
            )))),
        }
    }

    fn save(&mut self, theme: Theme) -> StageResult<()> {
        std::fs::write(&self.path, theme.as_str()).map_err(|e| {
            StageError::Other(anyhow::Error::new(e).context(format!(
                "write theme preference '{}'",
                self.path.display()
            )))
        })
    }
}

/// The current theme. `None` until initialized.
#[derive(Debug, Default)]
pub struct ThemeCell {
    value: Cell<Option<Theme>>,
}

impl ThemeCell {
    pub fn new(value: Option<Theme>) -> Self {
        Self {
            value: Cell::new(value),
        }
    }

    /// Initialize from a store; an unreadable store counts as unset.
    pub fn from_store(store: &dyn ThemeStore) -> Self {
        match store.load() {
            Ok(v) => Self::new(v),
            Err(err) => {
                tracing::warn!(error = %err, "theme preference unreadable, leaving unset");
                Self::new(None)
            }
        }
    }

    pub fn get(&self) -> Option<Theme> {
        self.value.get()
    }

    /// Current theme, `Light` when unset.
    pub fn resolved(&self) -> Theme {
        self.get().unwrap_or_default()
    }

    pub(crate) fn set(&self, theme: Theme) {
        self.value.set(Some(theme));
    }
}

#[cfg(test)]
#[path = "../tests/unit/theme.rs"]
mod tests;
