//! `web-sys` implementations of the page capability traits

use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use pf_core::dom::{Document, Element, ElementRef, ObserverId, ObserverOptions, VisibilityObserver};
use pf_core::events::{EventBus, PageEvent, VisibilityEntry};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    HtmlElement, HtmlFormElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement,
    IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, ScrollBehavior,
    ScrollToOptions,
};

/// A live DOM element
#[derive(Clone)]
pub struct BrowserElement {
    inner: web_sys::Element,
}

impl BrowserElement {
    pub fn wrap(inner: web_sys::Element) -> ElementRef {
        Rc::new(Self { inner })
    }

    pub fn raw(&self) -> &web_sys::Element {
        &self.inner
    }

    /// The underlying DOM node of any element created by this module
    pub fn unwrap_ref(element: &dyn Element) -> Option<&web_sys::Element> {
        element.as_any().downcast_ref::<Self>().map(|e| &e.inner)
    }

    fn html(&self) -> Option<&HtmlElement> {
        self.inner.dyn_ref::<HtmlElement>()
    }
}

impl Element for BrowserElement {
    fn tag(&self) -> String {
        self.inner.tag_name().to_lowercase()
    }

    fn add_class(&self, class: &str) {
        let _ = self.inner.class_list().add_1(class);
    }

    fn remove_class(&self, class: &str) {
        let _ = self.inner.class_list().remove_1(class);
    }

    fn has_class(&self, class: &str) -> bool {
        self.inner.class_list().contains(class)
    }

    fn style(&self, property: &str) -> Option<String> {
        self.html()
            .and_then(|html| html.style().get_property_value(property).ok())
            .filter(|value| !value.is_empty())
    }

    fn set_style(&self, property: &str, value: &str) {
        if let Some(html) = self.html() {
            if let Err(err) = html.style().set_property(property, value) {
                tracing::debug!(property, ?err, "style rejected");
            }
        }
    }

    fn text(&self) -> String {
        self.inner.text_content().unwrap_or_default()
    }

    fn set_text(&self, text: &str) {
        self.inner.set_text_content(Some(text));
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.inner.get_attribute(name)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        if let Err(err) = self.inner.set_attribute(name, value) {
            tracing::debug!(name, ?err, "attribute rejected");
        }
    }

    fn value(&self) -> Option<String> {
        if let Some(input) = self.inner.dyn_ref::<HtmlInputElement>() {
            Some(input.value())
        } else if let Some(area) = self.inner.dyn_ref::<HtmlTextAreaElement>() {
            Some(area.value())
        } else {
            self.inner.dyn_ref::<HtmlSelectElement>().map(|select| select.value())
        }
    }

    fn set_value(&self, value: &str) {
        if let Some(input) = self.inner.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = self.inner.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else if let Some(select) = self.inner.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
        }
    }

    fn reset(&self) {
        if let Some(form) = self.inner.dyn_ref::<HtmlFormElement>() {
            form.reset();
        }
    }

    fn set_disabled(&self, disabled: bool) {
        let _ = self.inner.toggle_attribute_with_force("disabled", disabled);
    }

    fn is_disabled(&self) -> bool {
        self.inner.has_attribute("disabled")
    }

    fn append_child(&self, child: &dyn Element) {
        if let Some(child) = Self::unwrap_ref(child) {
            let _ = self.inner.append_child(child);
        }
    }

    fn clear_children(&self) {
        while let Some(child) = self.inner.first_child() {
            if self.inner.remove_child(&child).is_err() {
                break;
            }
        }
    }

    fn remove(&self) {
        self.inner.remove();
    }

    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn contains(&self, other: &dyn Element) -> bool {
        Self::unwrap_ref(other)
            .map(|other| {
                let other: &web_sys::Node = other;
                self.inner.contains(Some(other))
            })
            .unwrap_or(false)
    }

    fn is_same(&self, other: &dyn Element) -> bool {
        Self::unwrap_ref(other)
            .map(|other| {
                let other: &web_sys::Node = other;
                self.inner.is_same_node(Some(other))
            })
            .unwrap_or(false)
    }

    fn closest(&self, selector: &str) -> Option<ElementRef> {
        match self.inner.closest(selector) {
            Ok(found) => found.map(Self::wrap),
            Err(err) => {
                tracing::debug!(selector, ?err, "invalid selector");
                None
            }
        }
    }

    fn query(&self, selector: &str) -> Option<ElementRef> {
        match self.inner.query_selector(selector) {
            Ok(found) => found.map(Self::wrap),
            Err(err) => {
                tracing::debug!(selector, ?err, "invalid selector");
                None
            }
        }
    }

    fn offset_top(&self) -> f64 {
        self.html().map(|html| html.offset_top() as f64).unwrap_or(0.0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The window's document
///
/// Visibility observers it creates publish their entries on `bus`.
pub struct BrowserDocument {
    window: web_sys::Window,
    document: web_sys::Document,
    bus: Rc<EventBus>,
    next_observer: Cell<u32>,
}

impl BrowserDocument {
    pub fn new(bus: Rc<EventBus>) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        Ok(Self {
            window,
            document,
            bus,
            next_observer: Cell::new(0),
        })
    }

    pub fn raw(&self) -> &web_sys::Document {
        &self.document
    }
}

impl Document for BrowserDocument {
    fn query(&self, selector: &str) -> Option<ElementRef> {
        match self.document.query_selector(selector) {
            Ok(found) => found.map(BrowserElement::wrap),
            Err(err) => {
                tracing::debug!(selector, ?err, "invalid selector");
                None
            }
        }
    }

    fn query_all(&self, selector: &str) -> Vec<ElementRef> {
        let Ok(nodes) = self.document.query_selector_all(selector) else {
            tracing::debug!(selector, "invalid selector");
            return Vec::new();
        };
        (0..nodes.length())
            .filter_map(|i| nodes.get(i))
            .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
            .map(BrowserElement::wrap)
            .collect()
    }

    fn by_id(&self, id: &str) -> Option<ElementRef> {
        self.document.get_element_by_id(id).map(BrowserElement::wrap)
    }

    fn create(&self, tag: &str) -> Option<ElementRef> {
        self.document.create_element(tag).ok().map(BrowserElement::wrap)
    }

    fn body(&self) -> Option<ElementRef> {
        self.document
            .body()
            .map(|body| BrowserElement::wrap(body.unchecked_into()))
    }

    fn root(&self) -> Option<ElementRef> {
        self.document.document_element().map(BrowserElement::wrap)
    }

    fn scroll_offset(&self) -> f64 {
        self.window.scroll_y().unwrap_or(0.0)
    }

    fn scroll_to(&self, top: f64, smooth: bool) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        if smooth {
            options.set_behavior(ScrollBehavior::Smooth);
        }
        self.window.scroll_to_with_scroll_to_options(&options);
    }

    fn observe_visibility(&self, options: &ObserverOptions) -> Option<Rc<dyn VisibilityObserver>> {
        let id = ObserverId(self.next_observer.get());
        self.next_observer.set(id.0 + 1);
        match BrowserObserver::new(id, options, self.bus.clone()) {
            Ok(observer) => Some(Rc::new(observer)),
            Err(err) => {
                tracing::warn!(?err, "IntersectionObserver unavailable");
                None
            }
        }
    }
}

type EntriesCallback = Closure<dyn FnMut(js_sys::Array, IntersectionObserver)>;

/// `IntersectionObserver` publishing [`PageEvent::Visibility`] entries
pub struct BrowserObserver {
    id: ObserverId,
    observer: IntersectionObserver,
    _callback: EntriesCallback,
}

impl BrowserObserver {
    fn new(id: ObserverId, options: &ObserverOptions, bus: Rc<EventBus>) -> Result<Self, JsValue> {
        let callback: EntriesCallback = Closure::wrap(Box::new(
            move |entries: js_sys::Array, _observer: IntersectionObserver| {
                for entry in entries.iter() {
                    let Ok(entry) = entry.dyn_into::<IntersectionObserverEntry>() else {
                        continue;
                    };
                    bus.publish(PageEvent::Visibility(VisibilityEntry {
                        observer: id,
                        target: BrowserElement::wrap(entry.target()),
                        ratio: entry.intersection_ratio(),
                        intersecting: entry.is_intersecting(),
                    }));
                }
            },
        ));

        let init = IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(options.threshold));
        init.set_root_margin(&options.root_margin());
        let observer =
            IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)?;

        Ok(Self {
            id,
            observer,
            _callback: callback,
        })
    }
}

impl VisibilityObserver for BrowserObserver {
    fn id(&self) -> ObserverId {
        self.id
    }

    fn observe(&self, element: &dyn Element) {
        if let Some(element) = BrowserElement::unwrap_ref(element) {
            self.observer.observe(element);
        }
    }

    fn unobserve(&self, element: &dyn Element) {
        if let Some(element) = BrowserElement::unwrap_ref(element) {
            self.observer.unobserve(element);
        }
    }
}

impl Drop for BrowserObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
