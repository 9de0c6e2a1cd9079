//! Browser bindings for the portfolio page
//!
//! Implements the pf-core capability traits on `web-sys`, forwards browser
//! events to the page bus and boots [`PortfolioApp`] once the document is
//! ready. The functions exported here are the page's public JS surface.

use std::cell::RefCell;
use std::rc::Rc;

use pf_core::app::{Collaborators, Platform, PortfolioApp};
use pf_core::config::PortfolioConfig;
use pf_core::events::EventBus;
use pf_core::search::{SearchResult, StaticSearchIndex};
use wasm_bindgen::prelude::*;

pub mod dom;
pub mod listeners;
pub mod scheduler;
pub mod storage;

pub use dom::{BrowserDocument, BrowserElement, BrowserObserver};
pub use scheduler::BrowserScheduler;
pub use storage::LocalStorageStore;

const CONFIG_GLOBAL: &str = "__portfolioConfig";
const SEARCH_INDEX_GLOBAL: &str = "__portfolioSearchIndex";

thread_local! {
    static APP: RefCell<Option<Rc<PortfolioApp>>> = const { RefCell::new(None) };
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn current_app() -> Option<Rc<PortfolioApp>> {
    APP.with(|app| app.borrow().clone())
}

/// Initialize panic reporting and logging, then boot when the DOM is ready
#[wasm_bindgen(start)]
pub fn init() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    if document.ready_state() == "loading" {
        let ready = Closure::once(move || {
            if let Err(err) = boot() {
                web_sys::console::error_1(&err);
            }
        });
        document.add_event_listener_with_callback("DOMContentLoaded", ready.as_ref().unchecked_ref())?;
        ready.forget();
        Ok(())
    } else {
        boot()
    }
}

/// Optional object on `window` decoded with serde
fn read_global<T: serde::de::DeserializeOwned>(window: &web_sys::Window, name: &str) -> Option<T> {
    let value = js_sys::Reflect::get(window, &JsValue::from_str(name)).ok()?;
    if value.is_undefined() || value.is_null() {
        return None;
    }
    match serde_wasm_bindgen::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            tracing::warn!(global = name, error = %err, "ignoring malformed page global");
            None
        }
    }
}

/// Build the platform and start every controller
pub fn boot() -> Result<(), JsValue> {
    if current_app().is_some() {
        return Err(to_js(pf_core::PortfolioError::AlreadyStarted));
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let bus = Rc::new(EventBus::new());
    let document = Rc::new(BrowserDocument::new(bus.clone())?);
    let scheduler = Rc::new(BrowserScheduler::new()?);

    let config: PortfolioConfig = read_global(&window, CONFIG_GLOBAL).unwrap_or_default();
    let mut collaborators = Collaborators::simulated(scheduler.clone(), &config, js_sys::Math::random);
    if let Some(entries) = read_global::<Vec<SearchResult>>(&window, SEARCH_INDEX_GLOBAL) {
        tracing::debug!(entries = entries.len(), "using page search index");
        collaborators.search = Rc::new(StaticSearchIndex::new(entries));
    }

    listeners::install(&window, document.raw(), bus.clone())?;

    let platform = Platform {
        document,
        scheduler,
        storage: Rc::new(LocalStorageStore::new()),
        bus,
    };
    let app = PortfolioApp::new(platform, collaborators, config);
    app.start().map_err(to_js)?;
    APP.with(|slot| *slot.borrow_mut() = Some(app));
    Ok(())
}

/// Show a toast; unknown or missing severities mean `info`
#[wasm_bindgen(js_name = showNotification)]
pub fn show_notification(message: &str, severity: Option<String>) -> Result<(), JsValue> {
    let app = current_app().ok_or_else(|| JsValue::from_str("portfolio page not started"))?;
    app.show_notification(message, severity.as_deref().unwrap_or("info"));
    Ok(())
}

/// Refresh the GitHub counters now; returns how many changed
#[wasm_bindgen(js_name = updateGitHubStats)]
pub fn update_github_stats() -> Result<u32, JsValue> {
    let app = current_app().ok_or_else(|| JsValue::from_str("portfolio page not started"))?;
    Ok(app.update_github_stats() as u32)
}

/// Run a search directly and return the results as plain objects
#[wasm_bindgen(js_name = performSearch)]
pub fn perform_search(query: &str) -> Result<JsValue, JsValue> {
    let app = current_app().ok_or_else(|| JsValue::from_str("portfolio page not started"))?;
    let results = app.perform_search(query).map_err(to_js)?;
    serde_wasm_bindgen::to_value(&results).map_err(to_js)
}

/// Current presentation state, mainly for debugging from the console
#[wasm_bindgen]
pub fn snapshot() -> Result<JsValue, JsValue> {
    let app = current_app().ok_or_else(|| JsValue::from_str("portfolio page not started"))?;
    serde_wasm_bindgen::to_value(&app.snapshot()).map_err(to_js)
}
