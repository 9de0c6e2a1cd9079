//! Replays a [`Scenario`] against the in-memory page

use std::cell::Cell;
use std::rc::Rc;

use anyhow::{anyhow, Result};
use pf_core::app::{AppSnapshot, Collaborators, Platform, PortfolioApp};
use pf_core::dom::{Document, ElementRef, MemoryDocument, VisibilityObserver};
use pf_core::events::{ClickEvent, EventBus, PageEvent, VisibilityEntry};
use pf_core::preference::THEME_KEY;
use pf_core::search::StaticSearchIndex;
use pf_core::storage::MemoryStore;
use pf_core::timing::{ManualScheduler, Scheduler};

use crate::scenario::{PageNode, Scenario, Step};

/// Cycles through `rolls`; a lone `0.5` when empty
fn replay(rolls: Vec<f64>) -> impl Fn() -> f64 {
    let rolls = if rolls.is_empty() { vec![0.5] } else { rolls };
    let next = Cell::new(0);
    move || {
        let i = next.get();
        next.set(i + 1);
        rolls[i % rolls.len()]
    }
}

/// A started page with a virtual clock
pub struct Simulation {
    document: MemoryDocument,
    scheduler: Rc<ManualScheduler>,
    bus: Rc<EventBus>,
    app: Rc<PortfolioApp>,
    snapshots: Vec<AppSnapshot>,
}

impl Simulation {
    /// Build the page and start every controller
    pub fn new(scenario: &Scenario) -> Result<Self> {
        let document = MemoryDocument::new();
        for node in &scenario.page {
            build(&document, None, node);
        }

        let scheduler = Rc::new(ManualScheduler::new());
        let bus = Rc::new(EventBus::new());
        let storage = match &scenario.stored_theme {
            Some(theme) => MemoryStore::with_entry(THEME_KEY, theme),
            None => MemoryStore::new(),
        };

        let mut collaborators = Collaborators::simulated(
            scheduler.clone(),
            &scenario.config,
            replay(scenario.rolls.clone()),
        );
        if let Some(entries) = &scenario.search_index {
            collaborators.search = Rc::new(StaticSearchIndex::new(entries.clone()));
        }

        let platform = Platform {
            document: Rc::new(document.clone()),
            scheduler: scheduler.clone(),
            storage: Rc::new(storage),
            bus: bus.clone(),
        };
        let app = PortfolioApp::new(platform, collaborators, scenario.config.clone());
        app.start()?;

        Ok(Self {
            document,
            scheduler,
            bus,
            app,
            snapshots: Vec::new(),
        })
    }

    #[cfg(test)]
    pub fn document(&self) -> &MemoryDocument {
        &self.document
    }

    /// Run every step, then record a final snapshot
    pub fn run(mut self, steps: &[Step]) -> Result<Vec<AppSnapshot>> {
        for (index, step) in steps.iter().enumerate() {
            self.step(step)
                .map_err(|err| anyhow!("step {} ({step:?}): {err}", index + 1))?;
        }
        self.snapshots.push(self.app.snapshot());
        self.app.shutdown();
        Ok(self.snapshots)
    }

    pub fn step(&mut self, step: &Step) -> Result<()> {
        tracing::debug!(?step, at = self.scheduler.now(), "replaying");
        match step {
            Step::Scroll { offset } => {
                self.document.set_scroll_offset(*offset);
                self.bus.publish(PageEvent::Scroll { offset: *offset });
            }
            Step::Click { selector } => {
                let target = self.find(selector)?;
                let click = ClickEvent::new(target);
                self.bus.publish(PageEvent::Click(click.clone()));
                if click.default_prevented() {
                    tracing::debug!(%selector, "default action suppressed");
                }
            }
            Step::Input { selector, value } => {
                let target = self.find(selector)?;
                target.set_value(value);
                self.bus.publish(PageEvent::Input {
                    target,
                    value: value.clone(),
                });
            }
            Step::Fill { form, fields } => {
                let form = self.find(form)?;
                for (name, value) in fields {
                    let field = form
                        .query(&format!(r#"[name="{name}"]"#))
                        .ok_or_else(|| anyhow!("form has no field named '{name}'"))?;
                    field.set_value(value);
                }
            }
            Step::Submit { selector } => {
                let form = self.find(selector)?;
                self.bus.publish(PageEvent::Submit { form });
            }
            Step::Wait { ms } => self.scheduler.advance(*ms),
            Step::Reveal { selector, ratio } => self.reveal(selector, *ratio)?,
            Step::Notify { message, severity } => {
                self.app.show_notification(message, severity);
            }
            Step::RefreshStats => {
                let changed = self.app.update_github_stats();
                tracing::info!(changed, "stats refreshed");
            }
            Step::Snapshot => self.snapshots.push(self.app.snapshot()),
        }
        Ok(())
    }

    fn find(&self, selector: &str) -> Result<ElementRef> {
        self.document
            .query(selector)
            .ok_or_else(|| anyhow!("no element matches '{selector}'"))
    }

    /// Report every element matching `selector` to the observers watching it
    fn reveal(&self, selector: &str, ratio: f64) -> Result<()> {
        let targets = self.document.query_all(selector);
        if targets.is_empty() {
            return Err(anyhow!("no element matches '{selector}'"));
        }
        let observers = self.document.observers();
        for target in targets {
            let watching = observers
                .iter()
                .filter(|observer| observer.is_observing(target.as_ref()));
            for observer in watching {
                self.bus.publish(PageEvent::Visibility(VisibilityEntry {
                    observer: observer.id(),
                    target: target.clone(),
                    ratio,
                    intersecting: ratio > 0.0,
                }));
            }
        }
        Ok(())
    }
}

fn build(document: &MemoryDocument, parent: Option<&ElementRef>, node: &PageNode) {
    let element = document.spawn(parent, &node.element);
    if let Some(text) = &node.text {
        element.set_text(text);
    }
    if let Some(top) = node.offset_top {
        document.set_offset_top(element.as_ref(), top);
    }
    for child in &node.children {
        build(document, Some(&element), child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_core::form::FormState;
    use pf_core::preference::Theme;

    use crate::scenario::DEFAULT_SCENARIO;

    fn simulate(json: &str) -> Vec<AppSnapshot> {
        let scenario = Scenario::from_json(json).unwrap();
        Simulation::new(&scenario).unwrap().run(&scenario.steps).unwrap()
    }

    #[test]
    fn test_default_scenario_runs() {
        let snapshots = simulate(DEFAULT_SCENARIO);
        let last = snapshots.last().unwrap();
        assert!(last.started);
        assert_eq!(last.form_outcome, Some(FormState::Success));
        assert_eq!(last.pending_reveals, 0);
    }

    #[test]
    fn test_scroll_and_theme_steps() {
        let snapshots = simulate(
            r#"{
                "stored_theme": "light",
                "page": [
                    {"element": "nav#navbar", "children": [{"element": "button.theme-toggle"}]},
                    {"element": "button#backToTop.opacity-0.invisible"}
                ],
                "steps": [
                    {"action": "scroll", "offset": 350},
                    {"action": "snapshot"},
                    {"action": "click", "selector": ".theme-toggle"}
                ]
            }"#,
        );
        assert_eq!(snapshots.len(), 2);
        assert!(snapshots[0].scroll.navbar_solid);
        assert!(snapshots[0].scroll.back_to_top_visible);
        assert_eq!(snapshots[0].theme, Some(Theme::Light));
        assert_eq!(snapshots[1].theme, Some(Theme::Dark));
    }

    #[test]
    fn test_invalid_submit_reports_validation_error() {
        let snapshots = simulate(
            r#"{
                "page": [{"element": "form", "children": [
                    {"element": "input[name=\"name\"]"},
                    {"element": "input[name=\"email\"]"},
                    {"element": "input[name=\"subject\"]"},
                    {"element": "input[name=\"message\"]"},
                    {"element": "button[type=\"submit\"]", "text": "Send Message"}
                ]}],
                "steps": [
                    {"action": "fill", "fields": [["name", "Ada"], ["email", "ada"], ["subject", "Hi"], ["message", "Hello"]]},
                    {"action": "submit"}
                ]
            }"#,
        );
        let last = snapshots.last().unwrap();
        assert_eq!(last.form_state, Some(FormState::Idle));
        assert_eq!(last.form_outcome, Some(FormState::Invalid));
        assert_eq!(
            last.notification.as_ref().map(|n| n.message.as_str()),
            Some("Please enter a valid email address")
        );
    }

    #[test]
    fn test_missing_element_fails_step() {
        let scenario =
            Scenario::from_json(r#"{"steps": [{"action": "click", "selector": ".nowhere"}]}"#).unwrap();
        let err = Simulation::new(&scenario).unwrap().run(&scenario.steps).unwrap_err();
        assert!(err.to_string().contains("step 1"));
        assert!(err.to_string().contains(".nowhere"));
    }

    #[test]
    fn test_stats_counter_moves_with_rolls() {
        let scenario = Scenario::from_json(
            r#"{
                "rolls": [0.9],
                "page": [{"element": "span[data-github-stat=\"stars\"]", "text": "41"}],
                "steps": [{"action": "wait", "ms": 1100}]
            }"#,
        )
        .unwrap();
        let mut sim = Simulation::new(&scenario).unwrap();
        for step in &scenario.steps {
            sim.step(step).unwrap();
        }
        let stars = sim.document().query("[data-github-stat]").unwrap();
        assert_eq!(stars.text(), "42");
    }
}
