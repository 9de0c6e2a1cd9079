//! Typewriter effect for the hero heading

use std::cell::Cell;
use std::rc::Rc;

use crate::dom::{Document, ElementRef};
use crate::timing::{Scheduler, TimerId};

pub const HERO_TEXT_SELECTOR: &str = ".hero-text";

/// Re-types an element's text one character at a time
pub struct TypingEffect {
    element: ElementRef,
    text: Vec<char>,
    typed: Cell<usize>,
    interval_ms: f64,
    scheduler: Rc<dyn Scheduler>,
    timer: Cell<Option<TimerId>>,
}

impl TypingEffect {
    /// Start typing the `.hero-text` element, if the page has one
    pub fn start(
        document: &dyn Document,
        scheduler: Rc<dyn Scheduler>,
        interval_ms: f64,
    ) -> Option<Rc<Self>> {
        let Some(element) = document.query(HERO_TEXT_SELECTOR) else {
            tracing::debug!("no hero text, typing effect disabled");
            return None;
        };
        Some(Self::type_into(element, scheduler, interval_ms))
    }

    /// Clear `element` and type its former text back in; the first character
    /// appears immediately
    pub fn type_into(element: ElementRef, scheduler: Rc<dyn Scheduler>, interval_ms: f64) -> Rc<Self> {
        let text: Vec<char> = element.text().chars().collect();
        element.set_text("");

        let effect = Rc::new(Self {
            element,
            text,
            typed: Cell::new(0),
            interval_ms,
            scheduler,
            timer: Cell::new(None),
        });
        effect.type_next();
        effect
    }

    pub fn is_finished(&self) -> bool {
        self.typed.get() >= self.text.len()
    }

    /// Stop typing, leaving the text typed so far
    pub fn cancel(&self) {
        if let Some(timer) = self.timer.take() {
            self.scheduler.clear_timeout(timer);
        }
    }

    fn type_next(self: &Rc<Self>) {
        self.timer.set(None);
        let typed = self.typed.get();
        if typed >= self.text.len() {
            return;
        }

        let shown: String = self.text[..=typed].iter().collect();
        self.element.set_text(&shown);
        self.typed.set(typed + 1);

        if !self.is_finished() {
            let effect = self.clone();
            let timer = self
                .scheduler
                .set_timeout(self.interval_ms, Box::new(move || effect.type_next()));
            self.timer.set(Some(timer));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use crate::timing::ManualScheduler;

    #[test]
    fn test_types_one_character_per_interval() {
        let doc = MemoryDocument::new();
        let hero = doc.spawn_text(None, "h1.hero-text", "Hi, I'm Sam");
        let scheduler = Rc::new(ManualScheduler::new());

        let effect = TypingEffect::start(&doc, scheduler.clone(), 100.0).unwrap();
        assert_eq!(hero.text(), "H");

        scheduler.advance(100.0);
        assert_eq!(hero.text(), "Hi");
        scheduler.advance(250.0);
        assert_eq!(hero.text(), "Hi, ");
        assert!(!effect.is_finished());

        scheduler.advance(10_000.0);
        assert_eq!(hero.text(), "Hi, I'm Sam");
        assert!(effect.is_finished());
        assert_eq!(scheduler.pending_timers(), 0);
    }

    #[test]
    fn test_multibyte_text_is_typed_by_character() {
        let doc = MemoryDocument::new();
        let hero = doc.spawn_text(None, "h1.hero-text", "Olá ✨");
        let scheduler = Rc::new(ManualScheduler::new());

        TypingEffect::start(&doc, scheduler.clone(), 100.0).unwrap();
        scheduler.advance(200.0);
        assert_eq!(hero.text(), "Olá");
        scheduler.advance(200.0);
        assert_eq!(hero.text(), "Olá ✨");
    }

    #[test]
    fn test_cancel_stops_typing() {
        let doc = MemoryDocument::new();
        let hero = doc.spawn_text(None, "h1.hero-text", "Portfolio");
        let scheduler = Rc::new(ManualScheduler::new());

        let effect = TypingEffect::start(&doc, scheduler.clone(), 100.0).unwrap();
        scheduler.advance(100.0);
        effect.cancel();
        scheduler.advance(1000.0);
        assert_eq!(hero.text(), "Po");
    }

    #[test]
    fn test_missing_hero_is_a_no_op() {
        let doc = MemoryDocument::new();
        let scheduler = Rc::new(ManualScheduler::new());
        assert!(TypingEffect::start(&doc, scheduler.clone(), 100.0).is_none());
        assert_eq!(scheduler.pending_timers(), 0);
    }
}
