//! Debounced site search
//!
//! The search box feeds a [`Debouncer`]; once typing pauses the query goes
//! to a pluggable [`SearchProvider`] and the results panel is rebuilt from
//! scratch.

use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::config::SearchSettings;
use crate::dom::{create_with_classes, Document, Element, ElementRef};
use crate::error::Result;
use crate::notifications::{NotificationCenter, Severity};
use crate::timing::{Debouncer, Scheduler};

pub const SEARCH_INPUT_SELECTOR: &str = ".search-input";
pub const SEARCH_RESULTS_SELECTOR: &str = ".search-results";

pub const NO_RESULTS_MESSAGE: &str = "No results found";
pub const SEARCH_FAILED_MESSAGE: &str = "Search is unavailable right now.";

const HIDDEN: &str = "hidden";

/// One hit shown in the results panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub description: String,
}

/// Backend answering search queries
pub trait SearchProvider {
    /// `query` is already trimmed and lower-cased
    fn search(&self, query: &str) -> Result<Vec<SearchResult>>;
}

/// Provider with nothing to search
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySearch;

impl SearchProvider for EmptySearch {
    fn search(&self, _query: &str) -> Result<Vec<SearchResult>> {
        Ok(Vec::new())
    }
}

/// Case-insensitive substring search over a fixed list of entries
#[derive(Debug, Clone, Default)]
pub struct StaticSearchIndex {
    entries: Vec<SearchResult>,
}

impl StaticSearchIndex {
    pub fn new(entries: Vec<SearchResult>) -> Self {
        Self { entries }
    }

    /// Parse a JSON array of `{url, title, description}` objects
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SearchProvider for StaticSearchIndex {
    fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let query = query.to_lowercase();
        Ok(self
            .entries
            .iter()
            .filter(|entry| {
                entry.title.to_lowercase().contains(&query)
                    || entry.description.to_lowercase().contains(&query)
            })
            .cloned()
            .collect())
    }
}

/// Trim and lower-case raw input
pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

struct Inner {
    document: Rc<dyn Document>,
    input: ElementRef,
    panel: ElementRef,
    provider: Rc<dyn SearchProvider>,
    notifications: NotificationCenter,
    min_query_chars: usize,
    debouncer: Debouncer<String>,
}

/// Binds the search input to the results panel
#[derive(Clone)]
pub struct SearchController {
    inner: Rc<Inner>,
}

impl SearchController {
    /// Wire up the search box; `None` when the page lacks the input or panel
    pub fn new(
        document: Rc<dyn Document>,
        scheduler: Rc<dyn Scheduler>,
        provider: Rc<dyn SearchProvider>,
        notifications: NotificationCenter,
        settings: &SearchSettings,
    ) -> Option<Self> {
        let (Some(input), Some(panel)) = (
            document.query(SEARCH_INPUT_SELECTOR),
            document.query(SEARCH_RESULTS_SELECTOR),
        ) else {
            tracing::debug!("no search box on page, search disabled");
            return None;
        };

        let inner = Rc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let debouncer = Debouncer::new(scheduler, settings.debounce_ms, move |query: String| {
                if let Some(inner) = weak.upgrade() {
                    inner.run(&query);
                }
            });
            Inner {
                document,
                input,
                panel,
                provider,
                notifications,
                min_query_chars: settings.min_query_chars,
                debouncer,
            }
        });
        Some(Self { inner })
    }

    pub fn input(&self) -> &dyn Element {
        self.inner.input.as_ref()
    }

    pub fn panel(&self) -> &dyn Element {
        self.inner.panel.as_ref()
    }

    /// Handle a change of the search input; returns whether a search was
    /// scheduled
    ///
    /// Short queries hide the panel and drop any search still waiting on
    /// the debounce window.
    pub fn on_input(&self, raw: &str) -> bool {
        let query = normalize_query(raw);
        if query.chars().count() < self.inner.min_query_chars {
            self.inner.debouncer.cancel();
            self.inner.panel.add_class(HIDDEN);
            return false;
        }
        self.inner.debouncer.call(query);
        true
    }

    pub fn is_pending(&self) -> bool {
        self.inner.debouncer.is_pending()
    }
}

impl Inner {
    fn run(&self, query: &str) {
        match self.provider.search(query) {
            Ok(results) => {
                tracing::debug!(query, hits = results.len(), "search finished");
                self.render(&results);
            }
            Err(err) => {
                tracing::warn!(query, error = %err, "search provider failed");
                self.panel.add_class(HIDDEN);
                self.notifications.notify(SEARCH_FAILED_MESSAGE, Severity::Error);
            }
        }
    }

    /// Replace the panel's content with `results`
    fn render(&self, results: &[SearchResult]) {
        let doc = self.document.as_ref();
        self.panel.clear_children();

        if results.is_empty() {
            if let Some(empty) = create_with_classes(doc, "p", "p-4 text-gray-500") {
                empty.set_text(NO_RESULTS_MESSAGE);
                self.panel.append_child(empty.as_ref());
            }
        } else {
            for result in results {
                if let Some(block) = result_block(doc, result) {
                    self.panel.append_child(block.as_ref());
                }
            }
        }
        self.panel.remove_class(HIDDEN);
    }
}

fn result_block(doc: &dyn Document, result: &SearchResult) -> Option<ElementRef> {
    let link = create_with_classes(doc, "a", "block p-4 hover:bg-gray-50 border-b border-gray-100")?;
    link.set_attribute("href", &result.url);

    let title = create_with_classes(doc, "h4", "font-semibold text-gray-800")?;
    title.set_text(&result.title);
    let description = create_with_classes(doc, "p", "text-sm text-gray-600")?;
    description.set_text(&result.description);

    link.append_child(title.as_ref());
    link.append_child(description.as_ref());
    Some(link)
}
