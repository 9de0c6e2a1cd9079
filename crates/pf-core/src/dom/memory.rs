//! In-memory page used by tests and the headless simulator

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use super::{Document, Element, ElementRef, ObserverId, ObserverOptions, Selector, VisibilityObserver};

const ROOT: usize = 0;
const BODY: usize = 1;

#[derive(Debug, Default)]
struct Node {
    tag: String,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    styles: Vec<(String, String)>,
    text: String,
    value: Option<String>,
    disabled: bool,
    offset_top: f64,
    parent: Option<usize>,
    children: Vec<usize>,
}

impl Node {
    fn new(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let value = is_control(&tag).then(String::new);
        Self {
            tag,
            value,
            ..Default::default()
        }
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        if name == "class" {
            self.classes = value.split_whitespace().map(str::to_string).collect();
            return;
        }
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn matches(&self, selector: &Selector) -> bool {
        selector.matches(&self.tag, &self.classes, |name| self.attribute(name))
    }
}

fn is_control(tag: &str) -> bool {
    matches!(tag, "input" | "textarea" | "select")
}

struct Page {
    nodes: Vec<Node>,
    scroll_offset: f64,
    scroll_requests: Vec<(f64, bool)>,
    observers: Vec<Rc<MemoryObserver>>,
    observers_supported: bool,
}

impl Page {
    fn new(observers_supported: bool) -> Self {
        let mut root = Node::new("html");
        root.children.push(BODY);
        let mut body = Node::new("body");
        body.parent = Some(ROOT);

        Self {
            nodes: vec![root, body],
            scroll_offset: 0.0,
            scroll_requests: Vec::new(),
            observers: Vec::new(),
            observers_supported,
        }
    }

    fn insert(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Pre-order descendants of `start`, excluding `start` itself
    fn descendants(&self, start: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.nodes[start].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    fn is_inclusive_ancestor(&self, ancestor: usize, mut node: usize) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes[node].parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    fn detach(&mut self, id: usize) {
        if let Some(parent) = self.nodes[id].parent.take() {
            self.nodes[parent].children.retain(|&child| child != id);
        }
    }

    fn text_of(&self, id: usize) -> String {
        let mut text = self.nodes[id].text.clone();
        for &child in &self.nodes[id].children {
            text.push_str(&self.text_of(child));
        }
        text
    }

    fn find(&self, start: usize, selector: &str) -> Vec<usize> {
        match Selector::parse(selector) {
            Some(selector) => self
                .descendants(start)
                .into_iter()
                .filter(|&id| self.nodes[id].matches(&selector))
                .collect(),
            None => {
                tracing::debug!(selector, "unsupported selector in memory page");
                Vec::new()
            }
        }
    }
}

/// A page held entirely in memory
///
/// Nodes live in an arena and are never freed: removed or detached elements
/// stay in it so every outstanding [`ElementRef`] remains usable. Memory grows
/// with the number of elements ever created, which suits tests and bounded
/// simulations but not long-running pages.
#[derive(Clone)]
pub struct MemoryDocument {
    page: Rc<RefCell<Page>>,
}

impl MemoryDocument {
    /// An empty `<html><body></body></html>` page
    pub fn new() -> Self {
        Self {
            page: Rc::new(RefCell::new(Page::new(true))),
        }
    }

    /// A page whose platform offers no visibility observers
    pub fn without_observers() -> Self {
        Self {
            page: Rc::new(RefCell::new(Page::new(false))),
        }
    }

    fn handle(&self, id: usize) -> ElementRef {
        Rc::new(MemoryElement {
            id,
            page: self.page.clone(),
        })
    }

    /// Build an element from a compound selector such as
    /// `div#stats.card[data-github-stat="stars"]` and append it to `parent`
    /// (the body when `None`)
    pub fn spawn(&self, parent: Option<&ElementRef>, descriptor: &str) -> ElementRef {
        let selector = Selector::parse(descriptor).unwrap_or_default();
        let mut node = Node::new(selector.tag.as_deref().unwrap_or("div"));
        node.classes = selector.classes.clone();
        if let Some(id) = &selector.id {
            node.set_attribute("id", id);
        }
        for test in &selector.attributes {
            match test {
                super::AttributeMatch::Exists(name) => node.set_attribute(name, ""),
                super::AttributeMatch::Equals(name, value)
                | super::AttributeMatch::Prefix(name, value) => node.set_attribute(name, value),
            }
        }

        let parent_id = parent
            .and_then(|p| p.as_any().downcast_ref::<MemoryElement>().map(|e| e.id))
            .unwrap_or(BODY);

        let id = {
            let mut page = self.page.borrow_mut();
            node.parent = Some(parent_id);
            let id = page.insert(node);
            page.nodes[parent_id].children.push(id);
            id
        };
        self.handle(id)
    }

    /// Like [`spawn`](Self::spawn) but also sets the text content
    pub fn spawn_text(&self, parent: Option<&ElementRef>, descriptor: &str, text: &str) -> ElementRef {
        let element = self.spawn(parent, descriptor);
        element.set_text(text);
        element
    }

    pub fn set_offset_top(&self, element: &dyn Element, top: f64) {
        if let Some(element) = element.as_any().downcast_ref::<MemoryElement>() {
            self.page.borrow_mut().nodes[element.id].offset_top = top;
        }
    }

    pub fn set_scroll_offset(&self, offset: f64) {
        self.page.borrow_mut().scroll_offset = offset;
    }

    /// Every `scroll_to` request made so far as `(top, smooth)`
    pub fn scroll_requests(&self) -> Vec<(f64, bool)> {
        self.page.borrow().scroll_requests.clone()
    }

    pub fn observers(&self) -> Vec<Rc<MemoryObserver>> {
        self.page.borrow().observers.clone()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn query(&self, selector: &str) -> Option<ElementRef> {
        let found = self.page.borrow().find(ROOT, selector).first().copied();
        found.map(|id| self.handle(id))
    }

    fn query_all(&self, selector: &str) -> Vec<ElementRef> {
        let found = self.page.borrow().find(ROOT, selector);
        found.into_iter().map(|id| self.handle(id)).collect()
    }

    fn by_id(&self, id: &str) -> Option<ElementRef> {
        self.query(&format!("#{id}"))
    }

    fn create(&self, tag: &str) -> Option<ElementRef> {
        let id = self.page.borrow_mut().insert(Node::new(tag));
        Some(self.handle(id))
    }

    fn body(&self) -> Option<ElementRef> {
        Some(self.handle(BODY))
    }

    fn root(&self) -> Option<ElementRef> {
        Some(self.handle(ROOT))
    }

    fn scroll_offset(&self) -> f64 {
        self.page.borrow().scroll_offset
    }

    fn scroll_to(&self, top: f64, smooth: bool) {
        let mut page = self.page.borrow_mut();
        page.scroll_requests.push((top, smooth));
        page.scroll_offset = top.max(0.0);
    }

    fn observe_visibility(&self, options: &ObserverOptions) -> Option<Rc<dyn VisibilityObserver>> {
        let mut page = self.page.borrow_mut();
        if !page.observers_supported {
            return None;
        }
        let observer = Rc::new(MemoryObserver {
            id: ObserverId(page.observers.len() as u32),
            options: *options,
            observed: RefCell::new(Vec::new()),
        });
        page.observers.push(observer.clone());
        Some(observer)
    }
}

/// Handle to a node of a [`MemoryDocument`]
pub struct MemoryElement {
    id: usize,
    page: Rc<RefCell<Page>>,
}

impl MemoryElement {
    fn other_id(&self, other: &dyn Element) -> Option<usize> {
        other
            .as_any()
            .downcast_ref::<MemoryElement>()
            .filter(|e| Rc::ptr_eq(&e.page, &self.page))
            .map(|e| e.id)
    }

    fn handle(&self, id: usize) -> ElementRef {
        Rc::new(MemoryElement {
            id,
            page: self.page.clone(),
        })
    }
}

impl Element for MemoryElement {
    fn tag(&self) -> String {
        self.page.borrow().nodes[self.id].tag.clone()
    }

    fn add_class(&self, class: &str) {
        let mut page = self.page.borrow_mut();
        let classes = &mut page.nodes[self.id].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, class: &str) {
        self.page.borrow_mut().nodes[self.id]
            .classes
            .retain(|c| c != class);
    }

    fn has_class(&self, class: &str) -> bool {
        self.page.borrow().nodes[self.id]
            .classes
            .iter()
            .any(|c| c == class)
    }

    fn style(&self, property: &str) -> Option<String> {
        self.page.borrow().nodes[self.id]
            .styles
            .iter()
            .find(|(key, _)| key == property)
            .map(|(_, value)| value.clone())
    }

    fn set_style(&self, property: &str, value: &str) {
        let mut page = self.page.borrow_mut();
        let styles = &mut page.nodes[self.id].styles;
        match styles.iter_mut().find(|(key, _)| key == property) {
            Some(entry) => entry.1 = value.to_string(),
            None => styles.push((property.to_string(), value.to_string())),
        }
    }

    fn text(&self) -> String {
        self.page.borrow().text_of(self.id)
    }

    fn set_text(&self, text: &str) {
        self.clear_children();
        self.page.borrow_mut().nodes[self.id].text = text.to_string();
    }

    fn attribute(&self, name: &str) -> Option<String> {
        let page = self.page.borrow();
        let node = &page.nodes[self.id];
        if name == "class" {
            return Some(node.classes.join(" "));
        }
        node.attribute(name).map(str::to_string)
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.page.borrow_mut().nodes[self.id].set_attribute(name, value);
    }

    fn value(&self) -> Option<String> {
        self.page.borrow().nodes[self.id].value.clone()
    }

    fn set_value(&self, value: &str) {
        let mut page = self.page.borrow_mut();
        let node = &mut page.nodes[self.id];
        if node.value.is_some() {
            node.value = Some(value.to_string());
        }
    }

    fn reset(&self) {
        let mut page = self.page.borrow_mut();
        for id in page.descendants(self.id) {
            if let Some(value) = page.nodes[id].value.as_mut() {
                value.clear();
            }
        }
    }

    fn set_disabled(&self, disabled: bool) {
        self.page.borrow_mut().nodes[self.id].disabled = disabled;
    }

    fn is_disabled(&self) -> bool {
        self.page.borrow().nodes[self.id].disabled
    }

    fn append_child(&self, child: &dyn Element) {
        let Some(child_id) = self.other_id(child) else {
            return;
        };
        let mut page = self.page.borrow_mut();
        if page.is_inclusive_ancestor(child_id, self.id) {
            return;
        }
        page.detach(child_id);
        page.nodes[child_id].parent = Some(self.id);
        page.nodes[self.id].children.push(child_id);
    }

    fn clear_children(&self) {
        let mut page = self.page.borrow_mut();
        let children = std::mem::take(&mut page.nodes[self.id].children);
        for child in children {
            page.nodes[child].parent = None;
        }
        page.nodes[self.id].text.clear();
    }

    fn remove(&self) {
        self.page.borrow_mut().detach(self.id);
    }

    fn is_connected(&self) -> bool {
        self.page.borrow().is_inclusive_ancestor(ROOT, self.id)
    }

    fn contains(&self, other: &dyn Element) -> bool {
        self.other_id(other)
            .map(|other| self.page.borrow().is_inclusive_ancestor(self.id, other))
            .unwrap_or(false)
    }

    fn is_same(&self, other: &dyn Element) -> bool {
        self.other_id(other) == Some(self.id)
    }

    fn closest(&self, selector: &str) -> Option<ElementRef> {
        let selector = Selector::parse(selector)?;
        let found = {
            let page = self.page.borrow();
            let mut current = Some(self.id);
            let mut found = None;
            while let Some(id) = current {
                if page.nodes[id].matches(&selector) {
                    found = Some(id);
                    break;
                }
                current = page.nodes[id].parent;
            }
            found
        };
        found.map(|id| self.handle(id))
    }

    fn query(&self, selector: &str) -> Option<ElementRef> {
        let found = self.page.borrow().find(self.id, selector).first().copied();
        found.map(|id| self.handle(id))
    }

    fn offset_top(&self) -> f64 {
        self.page.borrow().nodes[self.id].offset_top
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Visibility observer that only records which elements it watches;
/// visibility itself is reported by publishing entries on the event bus
pub struct MemoryObserver {
    id: ObserverId,
    options: ObserverOptions,
    observed: RefCell<Vec<usize>>,
}

impl MemoryObserver {
    pub fn options(&self) -> ObserverOptions {
        self.options
    }

    pub fn observed_count(&self) -> usize {
        self.observed.borrow().len()
    }

    pub fn is_observing(&self, element: &dyn Element) -> bool {
        element_id(element)
            .map(|id| self.observed.borrow().contains(&id))
            .unwrap_or(false)
    }
}

fn element_id(element: &dyn Element) -> Option<usize> {
    element.as_any().downcast_ref::<MemoryElement>().map(|e| e.id)
}

impl VisibilityObserver for MemoryObserver {
    fn id(&self) -> ObserverId {
        self.id
    }

    fn observe(&self, element: &dyn Element) {
        if let Some(id) = element_id(element) {
            let mut observed = self.observed.borrow_mut();
            if !observed.contains(&id) {
                observed.push(id);
            }
        }
    }

    fn unobserve(&self, element: &dyn Element) {
        if let Some(id) = element_id(element) {
            self.observed.borrow_mut().retain(|&o| o != id);
        }
    }
}
