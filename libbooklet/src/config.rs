//! Booklet settings.
//!
//! Options are supplied as a sparse JSON object and deep-merged over the
//! defaults below, so a host only names what it wants to change:
//!
//! ```json
//! {
//!   "container": ".booklet",
//!   "panels": { "left": ".booklet-pane-left", "right": ".booklet-pane-right" },
//!   "controls": {
//!     "container": ".booklet-controls",
//!     "next": ".booklet-next",
//!     "prev": ".booklet-prev",
//!     "close": ".booklet-close"
//!   },
//!   "page": { "width": 290, "height": 304 },
//!   "speed": 720,
//!   "disabledButtonClass": "disabled",
//!   "serializeTurns": false
//! }
//! ```
//!
//! Unknown keys are rejected to catch typos early. `null` leaves the default
//! in place.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Panels {
    pub left: String,
    pub right: String,
}

impl Default for Panels {
    fn default() -> Self {
        Self {
            left: ".booklet-pane-left".to_string(),
            right: ".booklet-pane-right".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Controls {
    pub container: String,
    pub next: String,
    pub prev: String,
    pub close: String,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            container: ".booklet-controls".to_string(),
            next: ".booklet-next".to_string(),
            prev: ".booklet-prev".to_string(),
            close: ".booklet-close".to_string(),
        }
    }
}

/// Pixel size of one page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

impl Default for PageSize {
    fn default() -> Self {
        Self {
            width: 290,
            height: 304,
        }
    }
}

/// Resolved booklet settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Settings {
    /// Selector for the widget root.
    pub container: String,
    pub panels: Panels,
    pub controls: Controls,
    pub page: PageSize,
    /// Duration of one page animation, in milliseconds.
    pub speed: u32,
    /// Class toggled on a control while it must not turn pages.
    pub disabled_button_class: String,
    /// Reject new turns while the previous one is still animating.
    pub serialize_turns: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            container: ".booklet".to_string(),
            panels: Panels::default(),
            controls: Controls::default(),
            page: PageSize::default(),
            speed: 720,
            disabled_button_class: "disabled".to_string(),
            serialize_turns: false,
        }
    }
}

impl Settings {
    /// Deep-merges `overrides` over the defaults and validates the result.
    pub fn from_options(overrides: &Value) -> Result<Self, ConfigError> {
        if !overrides.is_object() && !overrides.is_null() {
            return Err(ConfigError::Validation(format!(
                "options must be a JSON object, got {}",
                overrides
            )));
        }
        let mut merged = serde_json::to_value(Settings::default())?;
        merge_values(&mut merged, overrides);
        let settings: Settings = serde_json::from_value(merged)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_str(options: &str) -> Result<Self, ConfigError> {
        if options.trim().is_empty() {
            return Ok(Settings::default());
        }
        let overrides: Value = serde_json::from_str(options)?;
        Self::from_options(&overrides)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page.width == 0 || self.page.height == 0 {
            return Err(ConfigError::Validation(format!(
                "page dimensions must be non-zero, got {}x{}",
                self.page.width, self.page.height
            )));
        }
        if i32::try_from(self.page.width).is_err() {
            return Err(ConfigError::Validation(format!(
                "page width {} is too large",
                self.page.width
            )));
        }
        if i32::try_from(self.page.height).is_err() {
            return Err(ConfigError::Validation(format!(
                "page height {} is too large",
                self.page.height
            )));
        }
        Ok(())
    }

    /// Animation endpoints derived from the page width.
    pub fn anim_css(&self) -> PanelCss {
        PanelCss::for_width(self.page.width)
    }
}

/// Recursively copies `overrides` into `target`. Objects merge key by key,
/// everything else replaces. `null` overrides are skipped.
pub fn merge_values(target: &mut Value, overrides: &Value) {
    match (target, overrides) {
        (Value::Object(target), Value::Object(overrides)) => {
            for (key, value) in overrides {
                if value.is_null() {
                    continue;
                }
                match target.get_mut(key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (target, overrides) => *target = overrides.clone(),
    }
}

/// The animated part of a page's style: its width and its `right` offset,
/// both in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleState {
    pub width: i32,
    pub right: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimCss {
    pub start: StyleState,
    pub end: StyleState,
}

/// Start/end states for both panels.
///
/// Left pages grow from nothing to full width while parked one page width
/// right of the seam; right pages shrink towards the seam. Together the two
/// meet in the middle of the open book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelCss {
    pub left: AnimCss,
    pub right: AnimCss,
}

impl PanelCss {
    pub fn for_width(width: u32) -> Self {
        let w = i32::try_from(width).unwrap_or(i32::MAX);
        Self {
            left: AnimCss {
                start: StyleState { width: 0, right: -w },
                end: StyleState { width: w, right: -w },
            },
            right: AnimCss {
                start: StyleState { width: w, right: 0 },
                end: StyleState { width: 0, right: w },
            },
        }
    }
}
