//! Core controllers for the portfolio page
//!
//! This crate holds every page behaviour (scroll-driven navbar, reveal
//! animations, toasts, search, contact form, theme) written against small
//! capability traits, so it runs unchanged in the browser and headless.

pub mod animation;
pub mod app;
pub mod config;
pub mod dom;
pub mod error;
pub mod events;
pub mod form;
pub mod menu;
pub mod notifications;
pub mod preference;
pub mod reveal;
pub mod scroll;
pub mod search;
pub mod stats;
pub mod storage;
pub mod timing;

// Re-export commonly used types
pub use animation::{interpolate, NumberAnimator, TypingEffect};
pub use app::{AppSnapshot, Collaborators, Platform, PortfolioApp};
pub use config::PortfolioConfig;
pub use dom::{Document, Element, ElementRef, MemoryDocument, ObserverOptions, VisibilityObserver};
pub use error::{PortfolioError, Result, ValidationError};
pub use events::{ClickEvent, EventBus, EventKind, PageEvent, VisibilityEntry};
pub use form::{ContactMessage, FormController, FormState, SimulatedSubmission, SubmissionService};
pub use menu::MenuController;
pub use notifications::{Notification, NotificationCenter, Severity};
pub use preference::{PreferenceController, Theme};
pub use reveal::{RevealKind, ViewportRevealController};
pub use scroll::{ScrollCoordinator, ScrollState};
pub use search::{EmptySearch, SearchController, SearchProvider, SearchResult, StaticSearchIndex};
pub use stats::{RandomWalkStats, StatsProvider, StatsRefresher};
pub use storage::{MemoryStore, PreferenceStore};
pub use timing::{Debouncer, ManualScheduler, Scheduler};
