//! Smooth scrolling for in-page links and the back-to-top button

use std::rc::Rc;

use crate::dom::{Document, ElementRef};
use crate::events::ClickEvent;

const IN_PAGE_LINK: &str = r##"a[href^="#"]"##;

/// Turns clicks on `#fragment` links into smooth scrolls
pub struct AnchorNavigator {
    document: Rc<dyn Document>,
    anchor_offset: f64,
    back_to_top: Option<ElementRef>,
}

impl AnchorNavigator {
    /// `anchor_offset` is subtracted from every target so the fixed navbar
    /// does not cover it
    pub fn new(document: Rc<dyn Document>, anchor_offset: f64) -> Self {
        Self {
            document,
            anchor_offset,
            back_to_top: None,
        }
    }

    pub fn with_back_to_top(mut self, button: Option<ElementRef>) -> Self {
        self.back_to_top = button;
        self
    }

    /// Handle a click; returns whether it was consumed
    pub fn on_click(&self, click: &ClickEvent) -> bool {
        if let Some(button) = &self.back_to_top {
            if button.contains(click.target.as_ref()) {
                self.document.scroll_to(0.0, true);
                return true;
            }
        }

        let Some(link) = click.target.closest(IN_PAGE_LINK) else {
            return false;
        };
        click.prevent_default();

        let href = link.attribute("href").unwrap_or_default();
        if href.len() < 2 {
            return true;
        }
        match self.document.query(&href) {
            Some(target) => {
                let top = target.offset_top() - self.anchor_offset;
                tracing::debug!(%href, top, "scrolling to anchor");
                self.document.scroll_to(top, true);
            }
            None => tracing::debug!(%href, "anchor target not found"),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    fn setup() -> (MemoryDocument, AnchorNavigator) {
        let doc = MemoryDocument::new();
        let nav = AnchorNavigator::new(Rc::new(doc.clone()), 80.0);
        (doc, nav)
    }

    #[test]
    fn test_link_scrolls_to_target_minus_navbar() {
        let (doc, nav) = setup();
        let link = doc.spawn(None, r##"a[href="#projects"]"##);
        let label = doc.spawn_text(Some(&link), "span", "Projects");
        let section = doc.spawn(None, "section#projects");
        doc.set_offset_top(section.as_ref(), 1200.0);

        let click = ClickEvent::new(label);
        assert!(nav.on_click(&click));
        assert!(click.default_prevented());
        assert_eq!(doc.scroll_requests(), vec![(1120.0, true)]);
    }

    #[test]
    fn test_missing_target_still_prevents_jump() {
        let (doc, nav) = setup();
        let link = doc.spawn(None, r##"a[href="#nowhere"]"##);

        let click = ClickEvent::new(link);
        assert!(nav.on_click(&click));
        assert!(click.default_prevented());
        assert!(doc.scroll_requests().is_empty());
    }

    #[test]
    fn test_external_links_are_left_alone() {
        let (doc, nav) = setup();
        let link = doc.spawn(None, r#"a[href="https://github.com"]"#);

        let click = ClickEvent::new(link);
        assert!(!nav.on_click(&click));
        assert!(!click.default_prevented());
    }

    #[test]
    fn test_back_to_top_scrolls_home() {
        let doc = MemoryDocument::new();
        let button = doc.spawn(None, "button#backToTop");
        let icon = doc.spawn(Some(&button), "i.fas.fa-arrow-up");
        let nav = AnchorNavigator::new(Rc::new(doc.clone()), 80.0).with_back_to_top(Some(button));

        assert!(nav.on_click(&ClickEvent::new(icon)));
        assert_eq!(doc.scroll_requests(), vec![(0.0, true)]);
    }
}
