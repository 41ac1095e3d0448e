use std::sync::Arc;

use crate::storage::Storage;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted light/dark preference.
#[derive(Debug, Clone)]
pub struct ThemePreference {
    storage: Option<Arc<dyn Storage>>,
}

impl ThemePreference {
    pub fn new(storage: Option<Arc<dyn Storage>>) -> Self {
        Self { storage }
    }

    /// Saved preference, if any. Unrecognised values count as unset.
    pub fn saved(&self) -> Option<Theme> {
        let storage = self.storage.as_ref()?;
        match storage.get(THEME_KEY) {
            Ok(value) => value.as_deref().and_then(Theme::parse),
            Err(err) => {
                tracing::warn!("Failed to read theme preference: {err:#}");
                None
            }
        }
    }

    /// Saved preference, or `fallback` (the system preference) when unset.
    pub fn initial(&self, fallback: Theme) -> Theme {
        self.saved().unwrap_or(fallback)
    }

    pub fn set(&self, theme: Theme) {
        let Some(storage) = &self.storage else {
            return;
        };
        if let Err(err) = storage.set(THEME_KEY, theme.as_str()) {
            tracing::warn!("Failed to persist theme preference: {err:#}");
        }
    }

    /// Flip the current theme, persist and return it.
    pub fn toggle(&self, current: Theme) -> Theme {
        let next = current.toggled();
        self.set(next);
        next
    }
}
