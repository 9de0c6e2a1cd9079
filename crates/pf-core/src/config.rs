//! Tunable thresholds and timings for the page controllers

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-level configuration, grouped per controller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
    pub scroll: ScrollSettings,
    pub reveal: RevealSettings,
    pub notifications: NotificationSettings,
    pub animation: AnimationSettings,
    pub search: SearchSettings,
    pub form: FormSettings,
    pub stats: StatsSettings,
}

impl PortfolioConfig {
    /// Parse a (possibly partial) JSON document; absent keys keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Scroll offsets (in CSS pixels) that drive navbar and back-to-top state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollSettings {
    /// Navbar turns opaque above this offset
    pub solid_after: f64,

    /// Navbar may hide while scrolling down above this offset
    pub hide_after: f64,

    /// Back-to-top button shows above this offset
    pub back_to_top_after: f64,

    /// Height of the fixed navbar subtracted from anchor targets
    pub anchor_offset: f64,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            solid_after: 100.0,
            hide_after: 200.0,
            back_to_top_after: 300.0,
            anchor_offset: 80.0,
        }
    }
}

/// Visible-fraction thresholds for the one-shot reveal pools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealSettings {
    pub fade_threshold: f64,

    /// Shrinks the viewport's bottom edge for fade reveals
    pub fade_bottom_margin_px: f64,

    pub skill_threshold: f64,

    pub lazy_image_threshold: f64,
}

impl Default for RevealSettings {
    fn default() -> Self {
        Self {
            fade_threshold: 0.1,
            fade_bottom_margin_px: 50.0,
            skill_threshold: 0.5,
            lazy_image_threshold: 0.0,
        }
    }
}

/// Toast lifecycle timings in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enter_delay_ms: f64,
    pub lifetime_ms: f64,
    pub exit_ms: f64,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enter_delay_ms: 100.0,
            lifetime_ms: 5000.0,
            exit_ms: 300.0,
        }
    }
}

/// Counter, typing and parallax animation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub number_duration_ms: f64,
    pub typing_interval_ms: f64,
    pub default_parallax_speed: f64,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            number_duration_ms: 1000.0,
            typing_interval_ms: 100.0,
            default_parallax_speed: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub debounce_ms: f64,
    pub min_query_chars: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 300.0,
            min_query_chars: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    /// Delay used by the simulated submission service
    pub simulated_delay_ms: f64,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            simulated_delay_ms: 2000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSettings {
    pub refresh_interval_ms: f64,
}

impl Default for StatsSettings {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 300_000.0,
        }
    }
}
