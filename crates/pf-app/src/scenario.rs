//! Scripted sessions replayed by the simulator

use std::path::Path;

use anyhow::{Context, Result};
use pf_core::config::PortfolioConfig;
use pf_core::search::SearchResult;
use serde::Deserialize;

/// The page shipped with the simulator, used when no scenario file is given
pub const DEFAULT_SCENARIO: &str = include_str!("../scenarios/portfolio.json");

/// A page plus the visitor actions to replay on it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub config: PortfolioConfig,

    /// Elements appended to `<body>` in order
    pub page: Vec<PageNode>,

    /// Theme already persisted before the visit
    pub stored_theme: Option<String>,

    /// Replaces the empty search backend when present
    pub search_index: Option<Vec<SearchResult>>,

    /// Random draws fed to the stats random walk, cycled; `0.5` (no change)
    /// when empty
    pub rolls: Vec<f64>,

    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid scenario")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::from_json(&json).with_context(|| format!("in {}", path.display()))
    }
}

/// One element of the simulated page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageNode {
    /// Compound selector describing the element, e.g.
    /// `div.skill-progress[data-width="90%"]`
    pub element: String,
    pub text: Option<String>,
    pub offset_top: Option<f64>,
    pub children: Vec<PageNode>,
}

/// A visitor action or an inspection point
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Scroll {
        offset: f64,
    },
    Click {
        selector: String,
    },
    /// Set a control's value and fire an input event
    Input {
        selector: String,
        value: String,
    },
    /// Fill named form fields before a submit
    Fill {
        #[serde(default = "default_form")]
        form: String,
        fields: Vec<(String, String)>,
    },
    Submit {
        #[serde(default = "default_form")]
        selector: String,
    },
    /// Advance virtual time
    Wait {
        ms: f64,
    },
    /// Report the element as entering the viewport
    Reveal {
        selector: String,
        #[serde(default = "full_ratio")]
        ratio: f64,
    },
    Notify {
        message: String,
        #[serde(default)]
        severity: String,
    },
    RefreshStats,
    /// Record the current presentation state
    Snapshot,
}

fn default_form() -> String {
    "form".to_string()
}

fn full_ratio() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_parses() {
        let scenario = Scenario::from_json(DEFAULT_SCENARIO).unwrap();
        assert!(!scenario.page.is_empty());
        assert!(!scenario.steps.is_empty());
    }

    #[test]
    fn test_step_defaults() {
        let steps: Vec<Step> = serde_json::from_str(
            r#"[
                {"action": "submit"},
                {"action": "reveal", "selector": ".skill-progress"},
                {"action": "wait", "ms": 300}
            ]"#,
        )
        .unwrap();
        assert_eq!(
            steps,
            vec![
                Step::Submit {
                    selector: "form".to_string()
                },
                Step::Reveal {
                    selector: ".skill-progress".to_string(),
                    ratio: 1.0
                },
                Step::Wait { ms: 300.0 },
            ]
        );
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let scenario =
            Scenario::from_json(r#"{"config": {"search": {"debounce_ms": 50}}, "steps": []}"#).unwrap();
        assert_eq!(scenario.config.search.debounce_ms, 50.0);
        assert_eq!(scenario.config.search.min_query_chars, 2);
        assert_eq!(scenario.config.scroll.anchor_offset, 80.0);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        assert!(Scenario::from_json(r#"{"steps": [{"action": "hover"}]}"#).is_err());
    }
}
