//! Capability traits over the page's document
//!
//! Controllers only ever talk to the page through [`Document`] and
//! [`Element`], so the same code runs against the browser bridge and the
//! in-memory page used in tests and the simulator.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

mod memory;
mod selector;

pub use memory::{MemoryDocument, MemoryObserver};
pub use selector::{AttributeMatch, Selector};

/// Shared handle to a page element
pub type ElementRef = Rc<dyn Element>;

/// A single node of the page that controllers may read and mutate
pub trait Element {
    /// Lower-case tag name
    fn tag(&self) -> String;

    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);
    fn has_class(&self, class: &str) -> bool;

    /// Inline style property, if set
    fn style(&self, property: &str) -> Option<String>;
    fn set_style(&self, property: &str, value: &str);

    /// Text content of this node and its descendants
    fn text(&self) -> String;

    /// Replace all children with a single text node
    fn set_text(&self, text: &str);

    fn attribute(&self, name: &str) -> Option<String>;
    fn set_attribute(&self, name: &str, value: &str);

    /// Current value of a form control; `None` for non-controls
    fn value(&self) -> Option<String>;
    fn set_value(&self, value: &str);

    /// Reset every control of a form to empty
    fn reset(&self);

    fn set_disabled(&self, disabled: bool);
    fn is_disabled(&self) -> bool;

    fn append_child(&self, child: &dyn Element);
    fn clear_children(&self);

    /// Detach from the page
    fn remove(&self);
    fn is_connected(&self) -> bool;

    /// True when `other` is this node or one of its descendants
    fn contains(&self, other: &dyn Element) -> bool;
    fn is_same(&self, other: &dyn Element) -> bool;

    /// Nearest inclusive ancestor matching a selector
    fn closest(&self, selector: &str) -> Option<ElementRef>;

    /// First matching descendant
    fn query(&self, selector: &str) -> Option<ElementRef>;

    /// Distance from the top of the document in CSS pixels
    fn offset_top(&self) -> f64;

    fn as_any(&self) -> &dyn Any;
}

impl fmt::Debug for dyn Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.attribute("id") {
            Some(id) => write!(f, "<{}#{}>", self.tag(), id),
            None => write!(f, "<{}>", self.tag()),
        }
    }
}

/// The page as a whole
pub trait Document {
    fn query(&self, selector: &str) -> Option<ElementRef>;
    fn query_all(&self, selector: &str) -> Vec<ElementRef>;
    fn by_id(&self, id: &str) -> Option<ElementRef>;

    /// Create a detached element
    fn create(&self, tag: &str) -> Option<ElementRef>;

    fn body(&self) -> Option<ElementRef>;

    /// The document element (`<html>`)
    fn root(&self) -> Option<ElementRef>;

    /// Vertical scroll position of the window
    fn scroll_offset(&self) -> f64;
    fn scroll_to(&self, top: f64, smooth: bool);

    /// Create a visibility observer; `None` when the platform has none
    fn observe_visibility(&self, options: &ObserverOptions) -> Option<Rc<dyn VisibilityObserver>>;
}

/// Identifies which observer produced a visibility entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u32);

/// Options for a visibility observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverOptions {
    /// Visible fraction at which the observer reports
    pub threshold: f64,

    /// Pixels cut from the bottom of the viewport
    pub bottom_margin_px: f64,
}

impl ObserverOptions {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            bottom_margin_px: 0.0,
        }
    }

    pub fn with_bottom_margin(mut self, px: f64) -> Self {
        self.bottom_margin_px = px;
        self
    }

    /// CSS root margin string understood by `IntersectionObserver`
    pub fn root_margin(&self) -> String {
        if self.bottom_margin_px == 0.0 {
            "0px".to_string()
        } else {
            format!("0px 0px -{}px 0px", self.bottom_margin_px)
        }
    }
}

/// Watches elements and reports their visibility through the event bus
pub trait VisibilityObserver {
    fn id(&self) -> ObserverId;
    fn observe(&self, element: &dyn Element);
    fn unobserve(&self, element: &dyn Element);
}

/// Add every whitespace-separated class in `classes`
pub fn add_classes(element: &dyn Element, classes: &str) {
    for class in classes.split_whitespace() {
        element.add_class(class);
    }
}

/// Remove every whitespace-separated class in `classes`
pub fn remove_classes(element: &dyn Element, classes: &str) {
    for class in classes.split_whitespace() {
        element.remove_class(class);
    }
}

/// Create an element carrying the given classes
pub fn create_with_classes(document: &dyn Document, tag: &str, classes: &str) -> Option<ElementRef> {
    let element = document.create(tag)?;
    add_classes(element.as_ref(), classes);
    Some(element)
}

/// Replace an element's children with a single Font Awesome icon
pub fn set_icon(document: &dyn Document, element: &dyn Element, glyph: &str) {
    element.clear_children();
    if let Some(icon) = create_with_classes(document, "i", &format!("fas {glyph}")) {
        element.append_child(icon.as_ref());
    }
}
