//! Scroll-position-derived presentation state
//!
//! [`ScrollCoordinator`] is the only owner of the last scroll offset. On each
//! scroll sample it derives a new [`ScrollState`] and applies it to the
//! navbar, the back-to-top button and any parallax layers.

mod anchors;
mod parallax;

pub use anchors::AnchorNavigator;
pub use parallax::{ParallaxLayer, PARALLAX_SELECTOR};

use serde::Serialize;

use crate::config::ScrollSettings;
use crate::dom::{add_classes, remove_classes, Document, ElementRef};

const NAVBAR_ID: &str = "navbar";
const BACK_TO_TOP_ID: &str = "backToTop";

const NAVBAR_SOLID_CLASSES: &str = "bg-white/95 shadow-lg";
const BACK_TO_TOP_HIDDEN: &str = "opacity-0 invisible";
const BACK_TO_TOP_SHOWN: &str = "opacity-100 visible";

/// Presentation state derived from the scroll position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScrollState {
    pub last_offset: f64,

    /// Navbar slid out of view (scrolling down, far from the top)
    pub navbar_hidden: bool,

    /// Navbar has an opaque background
    pub navbar_solid: bool,

    pub back_to_top_visible: bool,
}

impl ScrollState {
    /// Derive the state that follows a new scroll sample
    pub fn advance(&self, offset: f64, settings: &ScrollSettings) -> ScrollState {
        ScrollState {
            last_offset: offset,
            navbar_hidden: offset > self.last_offset && offset > settings.hide_after,
            navbar_solid: offset > settings.solid_after,
            back_to_top_visible: offset > settings.back_to_top_after,
        }
    }
}

/// Applies scroll-derived state to the page
pub struct ScrollCoordinator {
    settings: ScrollSettings,
    state: ScrollState,
    navbar: Option<ElementRef>,
    back_to_top: Option<ElementRef>,
    parallax: Vec<ParallaxLayer>,
}

impl ScrollCoordinator {
    /// Look up the navbar and back-to-top button; either may be absent
    pub fn new(document: &dyn Document, settings: ScrollSettings) -> Self {
        let navbar = document.by_id(NAVBAR_ID);
        let back_to_top = document.by_id(BACK_TO_TOP_ID);
        if navbar.is_none() {
            tracing::debug!("no #{NAVBAR_ID} on page, navbar effects disabled");
        }

        Self {
            settings,
            state: ScrollState::default(),
            navbar,
            back_to_top,
            parallax: Vec::new(),
        }
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn back_to_top(&self) -> Option<&ElementRef> {
        self.back_to_top.as_ref()
    }

    pub fn has_back_to_top(&self) -> bool {
        self.back_to_top.is_some()
    }

    /// Start moving parallax layers on scroll
    pub fn attach_parallax(&mut self, layers: Vec<ParallaxLayer>) {
        tracing::debug!(count = layers.len(), "parallax layers attached");
        self.parallax = layers;
    }

    pub fn parallax_layers(&self) -> &[ParallaxLayer] {
        &self.parallax
    }

    /// Handle one scroll sample
    pub fn on_scroll(&mut self, offset: f64) -> ScrollState {
        let next = self.state.advance(offset, &self.settings);
        self.apply(&next);
        for layer in &self.parallax {
            layer.apply(offset);
        }
        self.state = next;
        next
    }

    fn apply(&self, state: &ScrollState) {
        if let Some(navbar) = &self.navbar {
            if state.navbar_solid {
                add_classes(navbar.as_ref(), NAVBAR_SOLID_CLASSES);
            } else {
                remove_classes(navbar.as_ref(), NAVBAR_SOLID_CLASSES);
            }

            let transform = if state.navbar_hidden {
                "translateY(-100%)"
            } else {
                "translateY(0)"
            };
            navbar.set_style("transform", transform);
        }

        if let Some(button) = &self.back_to_top {
            if state.back_to_top_visible {
                remove_classes(button.as_ref(), BACK_TO_TOP_HIDDEN);
                add_classes(button.as_ref(), BACK_TO_TOP_SHOWN);
            } else {
                add_classes(button.as_ref(), BACK_TO_TOP_HIDDEN);
                remove_classes(button.as_ref(), BACK_TO_TOP_SHOWN);
            }
        }
    }
}
