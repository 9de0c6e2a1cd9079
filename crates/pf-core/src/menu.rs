//! Mobile navigation menu

use std::rc::Rc;

use crate::dom::{set_icon, Document, Element, ElementRef};
use crate::events::ClickEvent;

pub const MENU_BUTTON_SELECTOR: &str = ".mobile-menu-button";
pub const MENU_PANEL_SELECTOR: &str = ".mobile-menu";

const HIDDEN: &str = "hidden";
const OPEN_ICON: &str = "fa-times";
const CLOSED_ICON: &str = "fa-bars";

/// Shows and hides the mobile menu panel
pub struct MenuController {
    document: Rc<dyn Document>,
    button: ElementRef,
    panel: ElementRef,
}

impl MenuController {
    /// `None` unless both the trigger button and the panel exist
    pub fn new(document: Rc<dyn Document>) -> Option<Self> {
        let button = document.query(MENU_BUTTON_SELECTOR);
        let panel = document.query(MENU_PANEL_SELECTOR);
        match (button, panel) {
            (Some(button), Some(panel)) => Some(Self {
                document,
                button,
                panel,
            }),
            _ => {
                tracing::debug!("no mobile menu on page");
                None
            }
        }
    }

    pub fn is_open(&self) -> bool {
        !self.panel.has_class(HIDDEN)
    }

    /// Flip the panel and swap the button icon
    pub fn toggle(&self) {
        if self.is_open() {
            self.close();
        } else {
            self.panel.remove_class(HIDDEN);
            set_icon(self.document.as_ref(), self.button.as_ref(), OPEN_ICON);
        }
    }

    pub fn close(&self) {
        self.panel.add_class(HIDDEN);
        set_icon(self.document.as_ref(), self.button.as_ref(), CLOSED_ICON);
    }

    /// Close unless `target` is inside the button or the panel; returns
    /// whether it closed
    pub fn close_if_outside(&self, target: &dyn Element) -> bool {
        if self.button.contains(target) || self.panel.contains(target) {
            return false;
        }
        self.close();
        true
    }

    /// Route a page click: the button toggles, anything outside closes
    pub fn on_click(&self, click: &ClickEvent) {
        let target = click.target.as_ref();
        if self.button.contains(target) {
            self.toggle();
        } else {
            self.close_if_outside(target);
        }
    }
}
