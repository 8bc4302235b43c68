use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::{SharedStore, WriteOutcome, keys, load_document, save_document};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
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

    pub fn label(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub struct ThemeSetting {
    store: SharedStore,
    theme: Theme,
}

impl ThemeSetting {
    pub fn load(store: SharedStore) -> Self {
        let theme = load_document(store.as_ref(), keys::THEME).unwrap_or_default();
        Self { store, theme }
    }

    pub fn current(&self) -> Theme {
        self.theme
    }

    pub fn set(&mut self, theme: Theme) -> WriteOutcome {
        self.theme = theme;
        save_document(self.store.as_ref(), keys::THEME, &self.theme)
    }

    pub fn toggle(&mut self) -> WriteOutcome {
        self.set(self.theme.toggled())
    }
}
