//! Parallax layers moved against the scroll direction

use crate::dom::{Document, Element, ElementRef};

pub const PARALLAX_SELECTOR: &str = ".parallax";

/// An element shifted by `-(offset * speed)` pixels on scroll
pub struct ParallaxLayer {
    element: ElementRef,
    speed: f64,
}

impl ParallaxLayer {
    /// Read the speed from `data-speed`, falling back to `default_speed`
    pub fn new(element: ElementRef, default_speed: f64) -> Self {
        let speed = parse_speed(element.attribute("data-speed").as_deref(), default_speed);
        Self { element, speed }
    }

    /// Every `.parallax` element on the page
    pub fn collect(document: &dyn Document, default_speed: f64) -> Vec<Self> {
        document
            .query_all(PARALLAX_SELECTOR)
            .into_iter()
            .map(|element| Self::new(element, default_speed))
            .collect()
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn element(&self) -> &dyn Element {
        self.element.as_ref()
    }

    pub(crate) fn apply(&self, offset: f64) {
        let y = -(offset * self.speed);
        // Avoid rendering "-0px" at the top of the page
        let y = if y == 0.0 { 0.0 } else { y };
        self.element.set_style("transform", &format!("translateY({y}px)"));
    }
}

fn parse_speed(raw: Option<&str>, default_speed: f64) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|speed| speed.is_finite())
        .unwrap_or(default_speed)
}
