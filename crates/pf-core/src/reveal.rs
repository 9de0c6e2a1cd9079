//! One-shot reveal effects driven by element visibility
//!
//! Elements are grouped into pools that share one visibility observer.
//! Each registration is a [`RevealSubscription`] that moves from
//! [`RevealPhase::Pending`] to [`RevealPhase::Fired`] exactly once; the
//! element is unobserved as soon as it fires and later reports are ignored.

use std::rc::Rc;

use crate::config::RevealSettings;
use crate::dom::{Document, Element, ElementRef, ObserverId, ObserverOptions, VisibilityObserver};
use crate::events::VisibilityEntry;

pub const FADE_SELECTOR: &str = ".animate-on-scroll";
pub const SKILL_BAR_SELECTOR: &str = ".skill-progress";
pub const LAZY_IMAGE_SELECTOR: &str = "img[data-src]";

const FADE_CLASS: &str = "animate-fade-in-up";
const LAZY_CLASS: &str = "lazy";
const DEFAULT_SKILL_WIDTH: &str = "0%";

// Observers report ratios rounded just under the threshold they crossed
const RATIO_EPSILON: f64 = 1e-3;

/// What happens when an element is revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevealKind {
    /// Adds the fade-in animation class
    Fade,

    /// Sets the bar's width from `data-width`
    SkillBar,

    /// Moves `data-src` into `src`
    LazyImage,
}

impl RevealKind {
    fn apply(self, element: &dyn Element) {
        match self {
            RevealKind::Fade => element.add_class(FADE_CLASS),
            RevealKind::SkillBar => {
                let width = element
                    .attribute("data-width")
                    .filter(|w| !w.is_empty())
                    .unwrap_or_else(|| DEFAULT_SKILL_WIDTH.to_string());
                element.set_style("width", &width);
            }
            RevealKind::LazyImage => {
                if let Some(src) = element.attribute("data-src") {
                    element.set_attribute("src", &src);
                }
                element.remove_class(LAZY_CLASS);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    Pending,
    Fired,
}

/// A single element waiting for its reveal
#[derive(Debug)]
pub struct RevealSubscription {
    element: ElementRef,
    kind: RevealKind,
    threshold: f64,
    phase: RevealPhase,
}

impl RevealSubscription {
    pub fn kind(&self) -> RevealKind {
        self.kind
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    pub fn element(&self) -> &dyn Element {
        self.element.as_ref()
    }

    fn fire(&mut self) {
        self.kind.apply(self.element.as_ref());
        self.phase = RevealPhase::Fired;
    }
}

struct RevealPool {
    kind: RevealKind,
    threshold: f64,
    observer: Option<Rc<dyn VisibilityObserver>>,
    subscriptions: Vec<RevealSubscription>,
}

impl RevealPool {
    fn observer_id(&self) -> Option<ObserverId> {
        self.observer.as_ref().map(|o| o.id())
    }
}

/// Owns every reveal pool on the page
pub struct ViewportRevealController {
    document: Rc<dyn Document>,
    settings: RevealSettings,
    pools: Vec<RevealPool>,
}

impl ViewportRevealController {
    pub fn new(document: Rc<dyn Document>, settings: RevealSettings) -> Self {
        Self {
            document,
            settings,
            pools: Vec::new(),
        }
    }

    /// Watch `element` and reveal it the first time at least `threshold`
    /// of it is visible
    ///
    /// Without observer support the element is revealed immediately.
    pub fn register(&mut self, element: ElementRef, kind: RevealKind, threshold: f64) {
        let pool = self.pool_for(kind, threshold);
        let mut subscription = RevealSubscription {
            element,
            kind,
            threshold,
            phase: RevealPhase::Pending,
        };

        match &pool.observer {
            Some(observer) => observer.observe(subscription.element.as_ref()),
            None => subscription.fire(),
        }
        pool.subscriptions.push(subscription);
    }

    /// Register every element matching `selector`; returns how many were found
    pub fn register_all(&mut self, selector: &str, kind: RevealKind, threshold: f64) -> usize {
        let elements = self.document.query_all(selector);
        let count = elements.len();
        for element in elements {
            self.register(element, kind, threshold);
        }
        if count == 0 {
            tracing::debug!(selector, "no reveal targets on page");
        }
        count
    }

    /// Fade-ins and skill bars, using the configured thresholds
    pub fn register_animations(&mut self) {
        let fade = self.settings.fade_threshold;
        let skill = self.settings.skill_threshold;
        self.register_all(FADE_SELECTOR, RevealKind::Fade, fade);
        self.register_all(SKILL_BAR_SELECTOR, RevealKind::SkillBar, skill);
    }

    pub fn register_lazy_images(&mut self) {
        let threshold = self.settings.lazy_image_threshold;
        self.register_all(LAZY_IMAGE_SELECTOR, RevealKind::LazyImage, threshold);
    }

    /// Handle one visibility report; returns whether it revealed an element
    pub fn on_visibility(&mut self, entry: &VisibilityEntry) -> bool {
        let Some(pool) = self
            .pools
            .iter_mut()
            .find(|pool| pool.observer_id() == Some(entry.observer))
        else {
            return false;
        };

        let Some(subscription) = pool
            .subscriptions
            .iter_mut()
            .find(|s| s.phase == RevealPhase::Pending && s.element.is_same(entry.target.as_ref()))
        else {
            return false;
        };

        if !entry.intersecting || entry.ratio + RATIO_EPSILON < subscription.threshold {
            return false;
        }

        subscription.fire();
        if let Some(observer) = &pool.observer {
            observer.unobserve(subscription.element.as_ref());
        }
        tracing::trace!(kind = ?subscription.kind, "element revealed");
        true
    }

    /// Subscriptions that have not fired yet
    pub fn pending_count(&self) -> usize {
        self.subscriptions()
            .filter(|s| s.phase == RevealPhase::Pending)
            .count()
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &RevealSubscription> {
        self.pools.iter().flat_map(|pool| pool.subscriptions.iter())
    }

    fn pool_for(&mut self, kind: RevealKind, threshold: f64) -> &mut RevealPool {
        let existing = self
            .pools
            .iter()
            .position(|pool| pool.kind == kind && pool.threshold == threshold);

        let idx = match existing {
            Some(idx) => idx,
            None => {
                let mut options = ObserverOptions::new(threshold);
                if kind == RevealKind::Fade {
                    options = options.with_bottom_margin(self.settings.fade_bottom_margin_px);
                }
                let observer = self.document.observe_visibility(&options);
                if observer.is_none() {
                    tracing::debug!(?kind, "visibility observers unavailable, revealing immediately");
                }
                self.pools.push(RevealPool {
                    kind,
                    threshold,
                    observer,
                    subscriptions: Vec::new(),
                });
                self.pools.len() - 1
            }
        };
        &mut self.pools[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    fn entry(doc: &MemoryDocument, observer: usize, target: &ElementRef, ratio: f64) -> VisibilityEntry {
        VisibilityEntry {
            observer: doc.observers()[observer].id(),
            target: target.clone(),
            ratio,
            intersecting: ratio > 0.0,
        }
    }

    fn controller(doc: &MemoryDocument) -> ViewportRevealController {
        ViewportRevealController::new(Rc::new(doc.clone()), RevealSettings::default())
    }

    #[test]
    fn test_fade_fires_once_and_unobserves() {
        let doc = MemoryDocument::new();
        let card = doc.spawn(None, "div.animate-on-scroll");
        let mut reveal = controller(&doc);
        reveal.register_animations();

        let observer = &doc.observers()[0];
        assert_eq!(observer.options().root_margin(), "0px 0px -50px 0px");
        assert!(observer.is_observing(card.as_ref()));

        assert!(reveal.on_visibility(&entry(&doc, 0, &card, 0.1)));
        assert!(card.has_class("animate-fade-in-up"));
        assert!(!observer.is_observing(card.as_ref()));

        card.remove_class("animate-fade-in-up");
        assert!(!reveal.on_visibility(&entry(&doc, 0, &card, 1.0)));
        assert!(!card.has_class("animate-fade-in-up"));
        assert_eq!(reveal.pending_count(), 0);
    }

    #[test]
    fn test_skill_bar_waits_for_half_visibility() {
        let doc = MemoryDocument::new();
        let bar = doc.spawn(None, r#"div.skill-progress[data-width="85%"]"#);
        let bare = doc.spawn(None, "div.skill-progress");
        let mut reveal = controller(&doc);
        reveal.register_animations();

        // No fade targets, so the skill bar pool owns the only observer
        assert!(!reveal.on_visibility(&entry(&doc, 0, &bar, 0.3)));
        assert_eq!(bar.style("width"), None);

        assert!(reveal.on_visibility(&entry(&doc, 0, &bar, 0.4999)));
        assert_eq!(bar.style("width").as_deref(), Some("85%"));

        assert!(reveal.on_visibility(&entry(&doc, 0, &bare, 0.6)));
        assert_eq!(bare.style("width").as_deref(), Some("0%"));
    }

    #[test]
    fn test_lazy_image_gets_source() {
        let doc = MemoryDocument::new();
        let img = doc.spawn(None, r#"img.lazy[data-src="/static/me.jpg"]"#);
        let mut reveal = controller(&doc);
        reveal.register_lazy_images();

        let mut report = entry(&doc, 0, &img, 0.0);
        report.intersecting = true;
        assert!(reveal.on_visibility(&report));
        assert_eq!(img.attribute("src").as_deref(), Some("/static/me.jpg"));
        assert!(!img.has_class("lazy"));
    }

    #[test]
    fn test_leaving_viewport_does_not_fire() {
        let doc = MemoryDocument::new();
        let card = doc.spawn(None, "div.animate-on-scroll");
        let mut reveal = controller(&doc);
        reveal.register_animations();

        let mut report = entry(&doc, 0, &card, 0.5);
        report.intersecting = false;
        assert!(!reveal.on_visibility(&report));
        assert_eq!(reveal.pending_count(), 1);
    }

    #[test]
    fn test_reports_from_other_observers_are_ignored() {
        let doc = MemoryDocument::new();
        let card = doc.spawn(None, "div.animate-on-scroll");
        doc.spawn(None, "div.skill-progress");
        let mut reveal = controller(&doc);
        reveal.register_animations();

        assert!(!reveal.on_visibility(&entry(&doc, 1, &card, 1.0)));
        assert!(!card.has_class("animate-fade-in-up"));
    }

    #[test]
    fn test_without_observers_reveals_immediately() {
        let doc = MemoryDocument::without_observers();
        let card = doc.spawn(None, "div.animate-on-scroll");
        let mut reveal = controller(&doc);
        reveal.register_animations();

        assert!(card.has_class("animate-fade-in-up"));
        assert_eq!(reveal.pending_count(), 0);
    }
}
