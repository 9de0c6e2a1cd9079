//! Light/dark theme preference

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dom::{Document, ElementRef};
use crate::events::ClickEvent;
use crate::storage::PreferenceStore;

pub const THEME_KEY: &str = "theme";
pub const THEME_ATTRIBUTE: &str = "data-theme";
pub const THEME_TOGGLE_SELECTOR: &str = ".theme-toggle";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// The other theme; anything but dark toggles to dark
    pub fn toggled(current: Option<Theme>) -> Theme {
        match current {
            Some(Theme::Dark) => Theme::Light,
            _ => Theme::Dark,
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("unknown theme '{other}'")),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies and persists the theme on the document element
pub struct PreferenceController {
    root: Option<ElementRef>,
    toggle_button: Option<ElementRef>,
    store: Rc<dyn PreferenceStore>,
}

impl PreferenceController {
    pub fn new(document: &dyn Document, store: Rc<dyn PreferenceStore>) -> Self {
        Self {
            root: document.root(),
            toggle_button: document.query(THEME_TOGGLE_SELECTOR),
            store,
        }
    }

    /// Apply the stored theme, if any; the markup's theme stays otherwise
    pub fn init(&self) -> Option<Theme> {
        let stored = self.store.get(THEME_KEY)?;
        match stored.parse::<Theme>() {
            Ok(theme) => {
                self.apply(theme);
                tracing::debug!(%theme, "restored theme preference");
                Some(theme)
            }
            Err(err) => {
                tracing::warn!(%err, "ignoring stored theme");
                None
            }
        }
    }

    /// Theme currently set on the document element
    pub fn current(&self) -> Option<Theme> {
        self.root
            .as_ref()
            .and_then(|root| root.attribute(THEME_ATTRIBUTE))
            .and_then(|value| value.parse().ok())
    }

    /// Flip the theme and persist it
    ///
    /// A failed write is logged; the page still switches theme.
    pub fn toggle(&self) -> Theme {
        let theme = Theme::toggled(self.current());
        self.apply(theme);
        if let Err(err) = self.store.set(THEME_KEY, theme.as_str()) {
            tracing::warn!(error = %err, "could not persist theme preference");
        }
        theme
    }

    /// Toggle when the theme button was clicked
    pub fn on_click(&self, click: &ClickEvent) -> bool {
        match &self.toggle_button {
            Some(button) if button.contains(click.target.as_ref()) => {
                self.toggle();
                true
            }
            _ => false,
        }
    }

    fn apply(&self, theme: Theme) {
        if let Some(root) = &self.root {
            root.set_attribute(THEME_ATTRIBUTE, theme.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use crate::storage::MemoryStore;

    fn controller(doc: &MemoryDocument, store: &Rc<MemoryStore>) -> PreferenceController {
        PreferenceController::new(doc, store.clone())
    }

    #[test]
    fn test_init_applies_stored_theme() {
        let doc = MemoryDocument::new();
        let store = Rc::new(MemoryStore::with_entry(THEME_KEY, "light"));
        let prefs = controller(&doc, &store);

        assert_eq!(prefs.init(), Some(Theme::Light));
        assert_eq!(doc.root().unwrap().attribute(THEME_ATTRIBUTE).as_deref(), Some("light"));
    }

    #[test]
    fn test_init_without_stored_value_keeps_markup() {
        let doc = MemoryDocument::new();
        doc.root().unwrap().set_attribute(THEME_ATTRIBUTE, "light");
        let prefs = controller(&doc, &Rc::new(MemoryStore::new()));

        assert_eq!(prefs.init(), None);
        assert_eq!(prefs.current(), Some(Theme::Light));
    }

    #[test]
    fn test_invalid_stored_value_is_ignored() {
        let doc = MemoryDocument::new();
        let prefs = controller(&doc, &Rc::new(MemoryStore::with_entry(THEME_KEY, "sepia")));

        assert_eq!(prefs.init(), None);
        assert_eq!(doc.root().unwrap().attribute(THEME_ATTRIBUTE), None);
    }

    #[test]
    fn test_two_toggles_round_trip() {
        let doc = MemoryDocument::new();
        let store = Rc::new(MemoryStore::with_entry(THEME_KEY, "dark"));
        let prefs = controller(&doc, &store);
        prefs.init();

        assert_eq!(prefs.toggle(), Theme::Light);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("light"));
        assert_eq!(prefs.toggle(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("dark"));
        assert_eq!(prefs.current(), Some(Theme::Dark));
    }

    #[test]
    fn test_first_toggle_without_theme_is_dark() {
        let doc = MemoryDocument::new();
        let store = Rc::new(MemoryStore::new());
        let prefs = controller(&doc, &store);

        assert_eq!(prefs.toggle(), Theme::Dark);
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("dark"));
    }

    #[test]
    fn test_storage_failure_still_switches_theme() {
        let doc = MemoryDocument::new();
        let store = Rc::new(MemoryStore::with_entry(THEME_KEY, "light"));
        store.reject_writes(true);
        let prefs = controller(&doc, &store);
        prefs.init();

        assert_eq!(prefs.toggle(), Theme::Dark);
        assert_eq!(prefs.current(), Some(Theme::Dark));
        assert_eq!(store.get(THEME_KEY).as_deref(), Some("light"));
    }

    #[test]
    fn test_toggle_button_click() {
        let doc = MemoryDocument::new();
        let button = doc.spawn(None, "button.theme-toggle");
        let icon = doc.spawn(Some(&button), "i.fas.fa-moon");
        let prefs = controller(&doc, &Rc::new(MemoryStore::new()));

        assert!(prefs.on_click(&ClickEvent::new(icon)));
        assert_eq!(prefs.current(), Some(Theme::Dark));
        assert!(!prefs.on_click(&ClickEvent::new(doc.body().unwrap())));
    }
}
