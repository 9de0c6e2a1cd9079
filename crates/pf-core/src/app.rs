//! Start-up wiring of every page controller
//!
//! [`PortfolioApp`] is built once per page from a [`Platform`] (document,
//! scheduler, storage, event bus) and a set of [`Collaborators`]. Calling
//! [`PortfolioApp::start`] initialises the controllers in a fixed order and
//! subscribes them to the bus; it runs at most once.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;

use crate::animation::{NumberAnimator, TypingEffect};
use crate::config::PortfolioConfig;
use crate::dom::{Document, ElementRef};
use crate::error::{PortfolioError, Result};
use crate::events::{EventBus, EventKind, PageEvent, SubscriptionId};
use crate::form::{FormController, FormState, SimulatedSubmission, SubmissionService};
use crate::menu::MenuController;
use crate::notifications::{Notification, NotificationCenter, Severity};
use crate::preference::{PreferenceController, Theme};
use crate::reveal::ViewportRevealController;
use crate::scroll::{AnchorNavigator, ParallaxLayer, ScrollCoordinator, ScrollState};
use crate::search::{normalize_query, EmptySearch, SearchController, SearchProvider, SearchResult};
use crate::stats::{RandomWalkStats, StatsProvider, StatsRefresher};
use crate::storage::PreferenceStore;
use crate::timing::Scheduler;

/// Host capabilities the controllers run on
#[derive(Clone)]
pub struct Platform {
    pub document: Rc<dyn Document>,
    pub scheduler: Rc<dyn Scheduler>,
    pub storage: Rc<dyn PreferenceStore>,
    pub bus: Rc<EventBus>,
}

/// External services the page delegates to
#[derive(Clone)]
pub struct Collaborators {
    pub search: Rc<dyn SearchProvider>,
    pub submission: Rc<dyn SubmissionService>,
    pub stats: Rc<dyn StatsProvider>,
}

impl Collaborators {
    /// Stand-ins used until real backends exist: no search results, a
    /// delayed always-successful submission and randomly drifting counters
    pub fn simulated(
        scheduler: Rc<dyn Scheduler>,
        config: &PortfolioConfig,
        random: impl Fn() -> f64 + 'static,
    ) -> Self {
        Self {
            search: Rc::new(EmptySearch),
            submission: Rc::new(SimulatedSubmission::new(scheduler, config.form.simulated_delay_ms)),
            stats: Rc::new(RandomWalkStats::new(random)),
        }
    }
}

/// Point-in-time view of the page state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppSnapshot {
    pub started: bool,
    pub scroll: ScrollState,
    pub notification: Option<Notification>,
    pub menu_open: Option<bool>,
    pub form_state: Option<FormState>,
    pub form_outcome: Option<FormState>,
    pub theme: Option<Theme>,
    pub pending_reveals: usize,
}

#[derive(Default)]
struct Controllers {
    scroll: Option<Rc<RefCell<ScrollCoordinator>>>,
    menu: Option<Rc<MenuController>>,
    back_to_top: Option<ElementRef>,
    reveal: Option<Rc<RefCell<ViewportRevealController>>>,
    form: Option<FormController>,
    stats: Option<Rc<StatsRefresher>>,
    typing: Option<Rc<TypingEffect>>,
    preference: Option<Rc<PreferenceController>>,
    search: Option<SearchController>,
}

/// The page's controllers and the services they share
pub struct PortfolioApp {
    platform: Platform,
    collaborators: Collaborators,
    config: PortfolioConfig,
    notifications: NotificationCenter,
    animator: NumberAnimator,
    controllers: RefCell<Controllers>,
    subscriptions: RefCell<Vec<SubscriptionId>>,
    started: Cell<bool>,
}

impl PortfolioApp {
    pub fn new(platform: Platform, collaborators: Collaborators, config: PortfolioConfig) -> Rc<Self> {
        let notifications = NotificationCenter::new(
            platform.document.clone(),
            platform.scheduler.clone(),
            config.notifications.clone(),
        );
        let animator = NumberAnimator::new(platform.scheduler.clone());

        Rc::new(Self {
            platform,
            collaborators,
            config,
            notifications,
            animator,
            controllers: RefCell::new(Controllers::default()),
            subscriptions: RefCell::new(Vec::new()),
            started: Cell::new(false),
        })
    }

    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.started.get()
    }

    /// Initialise every controller; a second call fails with
    /// [`PortfolioError::AlreadyStarted`]
    pub fn start(&self) -> Result<()> {
        if self.started.replace(true) {
            return Err(PortfolioError::AlreadyStarted);
        }
        tracing::info!("starting portfolio page controllers");

        self.init_navigation();
        self.init_mobile_menu();
        self.init_back_to_top();
        self.init_smooth_scrolling();
        self.init_animations();
        self.init_form();
        self.init_github_stats();

        self.init_typing_effect();
        self.init_parallax();
        self.init_lazy_loading();
        self.init_theme();
        self.init_search();
        self.init_notifications();

        tracing::info!(
            subscriptions = self.subscriptions.borrow().len(),
            "portfolio page ready"
        );
        Ok(())
    }

    /// Unsubscribe every handler and stop the stats refresh
    pub fn shutdown(&self) {
        for id in self.subscriptions.borrow_mut().drain(..) {
            self.platform.bus.unsubscribe(id);
        }
        let controllers = self.controllers.borrow();
        if let Some(stats) = &controllers.stats {
            stats.stop();
        }
        if let Some(typing) = &controllers.typing {
            typing.cancel();
        }
        tracing::info!("portfolio page controllers stopped");
    }

    /// Show a toast; `severity` is parsed leniently (unknown means info)
    pub fn show_notification(&self, message: &str, severity: &str) -> Option<Notification> {
        let severity = severity.parse::<Severity>().unwrap_or_default();
        self.notifications.notify(message, severity)
    }

    /// Refresh the GitHub counters now; returns how many changed
    pub fn update_github_stats(&self) -> usize {
        let running = self.controllers.borrow().stats.clone();
        match running {
            Some(stats) => stats.refresh(),
            None => self.stats_refresher().refresh(),
        }
    }

    /// Query the search provider directly, without touching the page
    pub fn perform_search(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.collaborators.search.search(&normalize_query(query))
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn animator(&self) -> &NumberAnimator {
        &self.animator
    }

    pub fn snapshot(&self) -> AppSnapshot {
        let controllers = self.controllers.borrow();
        AppSnapshot {
            started: self.started.get(),
            scroll: controllers
                .scroll
                .as_ref()
                .map(|scroll| scroll.borrow().state())
                .unwrap_or_default(),
            notification: self.notifications.visible(),
            menu_open: controllers.menu.as_ref().map(|menu| menu.is_open()),
            form_state: controllers.form.as_ref().map(FormController::state),
            form_outcome: controllers.form.as_ref().and_then(FormController::last_outcome),
            theme: controllers.preference.as_ref().and_then(|prefs| prefs.current()),
            pending_reveals: controllers
                .reveal
                .as_ref()
                .map(|reveal| reveal.borrow().pending_count())
                .unwrap_or(0),
        }
    }

    fn on<F>(&self, kind: EventKind, handler: F)
    where
        F: FnMut(&PageEvent) + 'static,
    {
        let id = self.platform.bus.on(kind, handler);
        self.subscriptions.borrow_mut().push(id);
    }

    fn document(&self) -> &dyn Document {
        self.platform.document.as_ref()
    }

    fn stats_refresher(&self) -> Rc<StatsRefresher> {
        StatsRefresher::new(
            self.platform.document.clone(),
            self.platform.scheduler.clone(),
            self.collaborators.stats.clone(),
            self.animator.clone(),
            self.config.animation.number_duration_ms,
        )
    }

    fn init_navigation(&self) {
        let scroll = Rc::new(RefCell::new(ScrollCoordinator::new(
            self.document(),
            self.config.scroll.clone(),
        )));

        let handler = scroll.clone();
        self.on(EventKind::Scroll, move |event| {
            if let PageEvent::Scroll { offset } = event {
                handler.borrow_mut().on_scroll(*offset);
            }
        });
        self.controllers.borrow_mut().scroll = Some(scroll);
    }

    fn init_mobile_menu(&self) {
        let Some(menu) = MenuController::new(self.platform.document.clone()) else {
            return;
        };
        let menu = Rc::new(menu);

        let handler = menu.clone();
        self.on(EventKind::Click, move |event| {
            if let PageEvent::Click(click) = event {
                handler.on_click(click);
            }
        });
        self.controllers.borrow_mut().menu = Some(menu);
    }

    fn init_back_to_top(&self) {
        let mut controllers = self.controllers.borrow_mut();
        let button = controllers
            .scroll
            .as_ref()
            .and_then(|scroll| scroll.borrow().back_to_top().cloned());
        if button.is_none() {
            tracing::debug!("no back-to-top button on page");
        }
        controllers.back_to_top = button;
    }

    fn init_smooth_scrolling(&self) {
        let back_to_top = self.controllers.borrow().back_to_top.clone();
        let anchors = AnchorNavigator::new(self.platform.document.clone(), self.config.scroll.anchor_offset)
            .with_back_to_top(back_to_top);

        self.on(EventKind::Click, move |event| {
            if let PageEvent::Click(click) = event {
                anchors.on_click(click);
            }
        });
    }

    fn init_animations(&self) {
        let mut reveal =
            ViewportRevealController::new(self.platform.document.clone(), self.config.reveal.clone());
        reveal.register_animations();
        let reveal = Rc::new(RefCell::new(reveal));

        let handler = reveal.clone();
        self.on(EventKind::Visibility, move |event| {
            if let PageEvent::Visibility(entry) = event {
                handler.borrow_mut().on_visibility(entry);
            }
        });
        self.controllers.borrow_mut().reveal = Some(reveal);
    }

    fn init_form(&self) {
        let Some(form) = FormController::new(
            self.document(),
            self.collaborators.submission.clone(),
            self.notifications.clone(),
        ) else {
            return;
        };

        let handler = form.clone();
        self.on(EventKind::Submit, move |event| {
            if let PageEvent::Submit { form: target } = event {
                if handler.form().is_same(target.as_ref()) {
                    handler.submit();
                }
            }
        });
        self.controllers.borrow_mut().form = Some(form);
    }

    fn init_github_stats(&self) {
        let stats = self.stats_refresher();
        stats.start(self.config.stats.refresh_interval_ms);
        self.controllers.borrow_mut().stats = Some(stats);
    }

    fn init_typing_effect(&self) {
        let typing = TypingEffect::start(
            self.document(),
            self.platform.scheduler.clone(),
            self.config.animation.typing_interval_ms,
        );
        self.controllers.borrow_mut().typing = typing;
    }

    fn init_parallax(&self) {
        let layers = ParallaxLayer::collect(self.document(), self.config.animation.default_parallax_speed);
        if layers.is_empty() {
            return;
        }
        if let Some(scroll) = &self.controllers.borrow().scroll {
            scroll.borrow_mut().attach_parallax(layers);
        }
    }

    fn init_lazy_loading(&self) {
        if let Some(reveal) = &self.controllers.borrow().reveal {
            reveal.borrow_mut().register_lazy_images();
        }
    }

    fn init_theme(&self) {
        let prefs = Rc::new(PreferenceController::new(
            self.document(),
            self.platform.storage.clone(),
        ));
        prefs.init();

        let handler = prefs.clone();
        self.on(EventKind::Click, move |event| {
            if let PageEvent::Click(click) = event {
                handler.on_click(click);
            }
        });
        self.controllers.borrow_mut().preference = Some(prefs);
    }

    fn init_search(&self) {
        let Some(search) = SearchController::new(
            self.platform.document.clone(),
            self.platform.scheduler.clone(),
            self.collaborators.search.clone(),
            self.notifications.clone(),
            &self.config.search,
        ) else {
            return;
        };

        let handler = search.clone();
        self.on(EventKind::Input, move |event| {
            if let PageEvent::Input { target, value } = event {
                if handler.input().is_same(target.as_ref()) {
                    handler.on_input(value);
                }
            }
        });
        self.controllers.borrow_mut().search = Some(search);
    }

    fn init_notifications(&self) {
        let notifications = self.notifications.clone();
        self.on(EventKind::Click, move |event| {
            if let PageEvent::Click(click) = event {
                notifications.on_click(click);
            }
        });
    }
}
