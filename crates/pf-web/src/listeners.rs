//! Translate browser events into page events

use std::rc::Rc;

use pf_core::events::{ClickEvent, EventBus, PageEvent};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::dom::BrowserElement;

fn event_element(event: &web_sys::Event) -> Option<web_sys::Element> {
    event.target()?.dyn_into::<web_sys::Element>().ok()
}

fn listen(
    target: &web_sys::EventTarget,
    name: &str,
    handler: impl FnMut(web_sys::Event) + 'static,
) -> Result<(), JsValue> {
    let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web_sys::Event)>);
    target.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())?;
    // Listeners live as long as the page
    callback.forget();
    Ok(())
}

/// Wire scroll, click, input and submit listeners to `bus`
pub fn install(window: &web_sys::Window, document: &web_sys::Document, bus: Rc<EventBus>) -> Result<(), JsValue> {
    {
        let bus = bus.clone();
        let source = window.clone();
        listen(window, "scroll", move |_event| {
            let offset = source.scroll_y().unwrap_or(0.0);
            bus.publish(PageEvent::Scroll { offset });
        })?;
    }

    {
        let bus = bus.clone();
        listen(document, "click", move |event| {
            let Some(target) = event_element(&event) else {
                return;
            };
            let click = ClickEvent::new(BrowserElement::wrap(target));
            bus.publish(PageEvent::Click(click.clone()));
            if click.default_prevented() {
                event.prevent_default();
            }
        })?;
    }

    {
        let bus = bus.clone();
        listen(document, "input", move |event| {
            let Some(target) = event_element(&event) else {
                return;
            };
            let target = BrowserElement::wrap(target);
            let value = target.value().unwrap_or_default();
            bus.publish(PageEvent::Input { target, value });
        })?;
    }

    listen(document, "submit", move |event| {
        event.prevent_default();
        if let Some(form) = event_element(&event) {
            bus.publish(PageEvent::Submit {
                form: BrowserElement::wrap(form),
            });
        }
    })?;

    tracing::debug!("browser listeners installed");
    Ok(())
}
