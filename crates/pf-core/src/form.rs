//! Contact form validation and submission
//!
//! A submission walks `Idle -> Validating -> Invalid | Submitting`, and a
//! submission in flight ends in `Success` or `Failure`; every path settles
//! back in `Idle`. Delivery is delegated to a [`SubmissionService`].

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dom::{Document, Element, ElementRef};
use crate::error::{Result, ValidationError};
use crate::notifications::{NotificationCenter, Severity};
use crate::timing::Scheduler;

pub const FORM_SELECTOR: &str = "form";
const SUBMIT_BUTTON_SELECTOR: &str = r#"button[type="submit"]"#;

pub const SENDING_LABEL: &str = "Sending...";
pub const SUCCESS_MESSAGE: &str = "Thank you for your message! I'll get back to you soon.";
pub const FAILURE_MESSAGE: &str = "Sorry, your message could not be sent. Please try again later.";

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormState {
    Idle,
    Validating,
    Invalid,
    Submitting,
    Success,
    Failure,
}

/// The four required fields of the contact form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    fn fields(&self) -> [&str; 4] {
        [&self.name, &self.email, &self.subject, &self.message].map(String::as_str)
    }
}

/// Check required fields first, then the email shape
pub fn validate(message: &ContactMessage) -> std::result::Result<(), ValidationError> {
    if message.fields().iter().any(|field| field.is_empty()) {
        return Err(ValidationError::MissingFields);
    }
    if !EMAIL_PATTERN.is_match(&message.email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Called exactly once with the delivery outcome
pub type SubmitCallback = Box<dyn FnOnce(Result<()>)>;

/// Delivers a validated message somewhere
pub trait SubmissionService {
    fn submit(&self, message: ContactMessage, done: SubmitCallback);
}

/// Pretends to deliver; always succeeds after a fixed delay
pub struct SimulatedSubmission {
    scheduler: Rc<dyn Scheduler>,
    delay_ms: f64,
}

impl SimulatedSubmission {
    pub fn new(scheduler: Rc<dyn Scheduler>, delay_ms: f64) -> Self {
        Self { scheduler, delay_ms }
    }
}

impl SubmissionService for SimulatedSubmission {
    fn submit(&self, message: ContactMessage, done: SubmitCallback) {
        tracing::info!(subject = %message.subject, "simulating message delivery");
        self.scheduler.set_timeout(self.delay_ms, Box::new(move || done(Ok(()))));
    }
}

struct Inner {
    form: ElementRef,
    button: Option<ElementRef>,
    service: Rc<dyn SubmissionService>,
    notifications: NotificationCenter,
    state: Cell<FormState>,
    last_outcome: Cell<Option<FormState>>,
    button_label: RefCell<Option<String>>,
}

/// Drives the contact form
#[derive(Clone)]
pub struct FormController {
    inner: Rc<Inner>,
}

impl FormController {
    /// `None` when the page has no form
    pub fn new(
        document: &dyn Document,
        service: Rc<dyn SubmissionService>,
        notifications: NotificationCenter,
    ) -> Option<Self> {
        let Some(form) = document.query(FORM_SELECTOR) else {
            tracing::debug!("no contact form on page");
            return None;
        };
        let button = form.query(SUBMIT_BUTTON_SELECTOR);

        Some(Self {
            inner: Rc::new(Inner {
                form,
                button,
                service,
                notifications,
                state: Cell::new(FormState::Idle),
                last_outcome: Cell::new(None),
                button_label: RefCell::new(None),
            }),
        })
    }

    pub fn form(&self) -> &dyn Element {
        self.inner.form.as_ref()
    }

    /// `Idle` or `Submitting`
    pub fn state(&self) -> FormState {
        self.inner.state.get()
    }

    /// How the most recent submission ended: `Invalid`, `Success` or `Failure`
    pub fn last_outcome(&self) -> Option<FormState> {
        self.inner.last_outcome.get()
    }

    /// Validate and send the form
    ///
    /// Returns `Invalid` when validation failed, otherwise the state after
    /// handing the message over (`Submitting`, or `Idle` when the service
    /// finished synchronously). A submit while one is in flight is ignored.
    pub fn submit(&self) -> FormState {
        let inner = &self.inner;
        if inner.state.get() == FormState::Submitting {
            tracing::debug!("submission already in flight, ignoring submit");
            return FormState::Submitting;
        }

        inner.state.set(FormState::Validating);
        let message = inner.read_message();
        if let Err(err) = validate(&message) {
            tracing::debug!(%err, "contact form rejected");
            inner.notifications.notify(&err.to_string(), Severity::Error);
            inner.settle(FormState::Invalid);
            return FormState::Invalid;
        }

        inner.state.set(FormState::Submitting);
        inner.set_busy(true);

        let weak: Weak<Inner> = Rc::downgrade(inner);
        inner.service.submit(
            message,
            Box::new(move |outcome| {
                if let Some(inner) = weak.upgrade() {
                    inner.complete(outcome);
                }
            }),
        );
        inner.state.get()
    }
}

impl Inner {
    fn read_message(&self) -> ContactMessage {
        let field = |name: &str| {
            self.form
                .query(&format!(r#"[name="{name}"]"#))
                .and_then(|control| control.value())
                .unwrap_or_default()
        };
        ContactMessage {
            name: field("name"),
            email: field("email"),
            subject: field("subject"),
            message: field("message"),
        }
    }

    fn set_busy(&self, busy: bool) {
        let Some(button) = &self.button else { return };
        if busy {
            *self.button_label.borrow_mut() = Some(button.text());
            button.set_text(SENDING_LABEL);
        } else if let Some(label) = self.button_label.borrow_mut().take() {
            button.set_text(&label);
        }
        button.set_disabled(busy);
    }

    fn complete(&self, outcome: Result<()>) {
        match outcome {
            Ok(()) => {
                tracing::info!("contact message delivered");
                self.notifications.notify(SUCCESS_MESSAGE, Severity::Success);
                self.form.reset();
                self.set_busy(false);
                self.settle(FormState::Success);
            }
            Err(err) => {
                tracing::warn!(error = %err, "contact message delivery failed");
                self.notifications.notify(FAILURE_MESSAGE, Severity::Error);
                self.set_busy(false);
                self.settle(FormState::Failure);
            }
        }
    }

    fn settle(&self, outcome: FormState) {
        self.last_outcome.set(Some(outcome));
        self.state.set(FormState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotificationSettings;
    use crate::dom::MemoryDocument;
    use crate::error::PortfolioError;
    use crate::timing::ManualScheduler;

    /// Holds every submission until the test completes it
    #[derive(Default)]
    struct Deferred {
        pending: RefCell<Vec<(ContactMessage, SubmitCallback)>>,
    }

    impl SubmissionService for Deferred {
        fn submit(&self, message: ContactMessage, done: SubmitCallback) {
            self.pending.borrow_mut().push((message, done));
        }
    }

    impl Deferred {
        fn finish(&self, outcome: Result<()>) {
            let (_, done) = self.pending.borrow_mut().remove(0);
            done(outcome);
        }
    }

    struct Page {
        doc: MemoryDocument,
        scheduler: Rc<ManualScheduler>,
        notifications: NotificationCenter,
        button: ElementRef,
    }

    fn page(fields: [&str; 4]) -> Page {
        let doc = MemoryDocument::new();
        let form = doc.spawn(None, "form#contact");
        for (name, value) in ["name", "email", "subject", "message"].iter().zip(fields) {
            let tag = if *name == "message" { "textarea" } else { "input" };
            let control = doc.spawn(Some(&form), &format!(r#"{tag}[name="{name}"]"#));
            control.set_value(value);
        }
        let button = doc.spawn_text(Some(&form), r#"button[type="submit"]"#, "Send Message");
        let scheduler = Rc::new(ManualScheduler::new());
        let notifications = NotificationCenter::new(
            Rc::new(doc.clone()),
            scheduler.clone(),
            NotificationSettings::default(),
        );
        Page {
            doc,
            scheduler,
            notifications,
            button,
        }
    }

    const VALID: [&str; 4] = ["Ada", "ada@example.com", "Hello", "Nice site"];

    fn toast_text(doc: &MemoryDocument) -> String {
        doc.query(".notification").map(|t| t.text()).unwrap_or_default()
    }

    #[test]
    fn test_validation_order() {
        let mut message = ContactMessage {
            name: "Ada".into(),
            email: "not-an-email".into(),
            subject: "Hi".into(),
            message: String::new(),
        };
        assert_eq!(validate(&message), Err(ValidationError::MissingFields));
        message.message = "Hello".into();
        assert_eq!(validate(&message), Err(ValidationError::InvalidEmail));
        message.email = "ada@example.com".into();
        assert_eq!(validate(&message), Ok(()));
    }

    #[test]
    fn test_blank_but_non_empty_field_counts_as_filled() {
        let message = ContactMessage {
            name: " ".into(),
            email: "a@b.co".into(),
            subject: "Hi".into(),
            message: "Hello".into(),
        };
        assert_eq!(validate(&message), Ok(()));
    }

    #[test]
    fn test_email_pattern() {
        for good in ["a@b.co", "first.last@sub.example.org"] {
            assert!(EMAIL_PATTERN.is_match(good), "{good}");
        }
        for bad in ["not-an-email", "a@b", "a b@c.de", "@c.de", "a@@b.de"] {
            assert!(!EMAIL_PATTERN.is_match(bad), "{bad}");
        }
    }

    #[test]
    fn test_invalid_email_never_reaches_service() {
        let p = page(["Ada", "not-an-email", "Hello", "Nice site"]);
        let service = Rc::new(Deferred::default());
        let form = FormController::new(&p.doc, service.clone(), p.notifications.clone()).unwrap();

        assert_eq!(form.submit(), FormState::Invalid);
        assert!(service.pending.borrow().is_empty());
        assert_eq!(toast_text(&p.doc), "Please enter a valid email address");
        assert!(p.doc.query(".notification").unwrap().has_class("bg-red-500"));
        assert_eq!(form.state(), FormState::Idle);
        assert_eq!(form.last_outcome(), Some(FormState::Invalid));
    }

    #[test]
    fn test_missing_field_reported_first() {
        let p = page(["", "not-an-email", "Hello", "Nice site"]);
        let form = FormController::new(&p.doc, Rc::new(Deferred::default()), p.notifications.clone())
            .unwrap();

        form.submit();
        assert_eq!(toast_text(&p.doc), "Please fill in all fields");
    }

    #[test]
    fn test_simulated_submission_succeeds_after_delay() {
        let p = page(VALID);
        let service = Rc::new(SimulatedSubmission::new(p.scheduler.clone(), 2000.0));
        let form = FormController::new(&p.doc, service, p.notifications.clone()).unwrap();

        assert_eq!(form.submit(), FormState::Submitting);
        assert_eq!(p.button.text(), SENDING_LABEL);
        assert!(p.button.is_disabled());

        p.scheduler.advance(1999.0);
        assert_eq!(form.state(), FormState::Submitting);

        p.scheduler.advance(1.0);
        assert_eq!(form.state(), FormState::Idle);
        assert_eq!(form.last_outcome(), Some(FormState::Success));
        assert_eq!(toast_text(&p.doc), SUCCESS_MESSAGE);
        assert_eq!(p.button.text(), "Send Message");
        assert!(!p.button.is_disabled());

        let email = p.doc.query(r#"[name="email"]"#).unwrap();
        assert_eq!(email.value().as_deref(), Some(""));
    }

    #[test]
    fn test_double_submit_is_ignored() {
        let p = page(VALID);
        let service = Rc::new(Deferred::default());
        let form = FormController::new(&p.doc, service.clone(), p.notifications.clone()).unwrap();

        form.submit();
        assert_eq!(form.submit(), FormState::Submitting);
        assert_eq!(service.pending.borrow().len(), 1);
        assert_eq!(service.pending.borrow()[0].0.email, "ada@example.com");
    }

    #[test]
    fn test_failed_delivery_keeps_form_and_reports() {
        let p = page(VALID);
        let service = Rc::new(Deferred::default());
        let form = FormController::new(&p.doc, service.clone(), p.notifications.clone()).unwrap();

        form.submit();
        service.finish(Err(PortfolioError::collaborator("contact form", "503")));

        assert_eq!(form.last_outcome(), Some(FormState::Failure));
        assert_eq!(toast_text(&p.doc), FAILURE_MESSAGE);
        assert!(!p.button.is_disabled());
        assert_eq!(p.button.text(), "Send Message");
        let name = p.doc.query(r#"[name="name"]"#).unwrap();
        assert_eq!(name.value().as_deref(), Some("Ada"));

        // The form can be sent again afterwards
        assert_eq!(form.submit(), FormState::Submitting);
    }

    #[test]
    fn test_instant_delivery_reports_settled_state() {
        struct Instant;
        impl SubmissionService for Instant {
            fn submit(&self, _message: ContactMessage, done: SubmitCallback) {
                done(Ok(()));
            }
        }

        let p = page(VALID);
        let form = FormController::new(&p.doc, Rc::new(Instant), p.notifications.clone()).unwrap();

        assert_eq!(form.submit(), FormState::Idle);
        assert_eq!(form.last_outcome(), Some(FormState::Success));
        assert!(!p.button.is_disabled());
    }

    #[test]
    fn test_page_without_form() {
        let doc = MemoryDocument::new();
        let scheduler = Rc::new(ManualScheduler::new());
        let notifications =
            NotificationCenter::new(Rc::new(doc.clone()), scheduler, NotificationSettings::default());
        assert!(FormController::new(&doc, Rc::new(Deferred::default()), notifications).is_none());
    }
}
