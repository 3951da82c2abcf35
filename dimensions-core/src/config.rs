//! Observation options.
//!
//! [`DimensionsConfig`] holds the data options and deserializes from the
//! same camelCase names browser callers use:
//!
//! ```json
//! { "useBorderBoxSize": true, "breakpoints": { "SM": 0, "MD": 640 }, "updateOnBreakpointChange": true }
//! ```
//!
//! [`Options`] adds the callbacks, the polyfill and the initial target.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::breakpoint::Breakpoints;
use crate::dimensions::ResizeEvent;
use crate::error::{DimensionsError, DimensionsResult};
use crate::observer::ObserverFactory;
use crate::policy::ShouldUpdate;
use crate::state::Reading;

/// Callback invoked with each resize event that passes the callback gate.
pub type OnResize<T> = Box<dyn FnMut(&ResizeEvent<T>)>;

/// Sink for non-fatal diagnostics.
pub type OnDiagnostic = Box<dyn FnMut(&DimensionsError)>;

/// Serializable observation settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DimensionsConfig {
    /// Measure the border box instead of the content box.
    pub use_border_box_size: bool,
    /// Breakpoint table; `None` disables classification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakpoints: Option<Breakpoints>,
    /// Only commit when the breakpoint label changes.
    pub update_on_breakpoint_change: bool,
}

impl DimensionsConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionsError::Config`] if the JSON is malformed.
    pub fn from_json(json: &str) -> DimensionsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> DimensionsResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Full set of options for [`Dimensions`](crate::Dimensions).
pub struct Options<T> {
    /// Data options.
    pub config: DimensionsConfig,
    /// Commit predicate.
    pub should_update: Option<ShouldUpdate>,
    /// Resize callback.
    pub on_resize: Option<OnResize<T>>,
    /// Observer used when the platform has no native one.
    pub polyfill: Option<Rc<dyn ObserverFactory<T>>>,
    /// Element to observe from construction.
    pub target: Option<T>,
    /// Diagnostic sink, in addition to `tracing`.
    pub on_diagnostic: Option<OnDiagnostic>,
}

impl<T> Default for Options<T> {
    fn default() -> Self {
        Self {
            config: DimensionsConfig::default(),
            should_update: None,
            on_resize: None,
            polyfill: None,
            target: None,
            on_diagnostic: None,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Options<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("config", &self.config)
            .field("should_update", &self.should_update.is_some())
            .field("on_resize", &self.on_resize.is_some())
            .field("polyfill", &self.polyfill.is_some())
            .field("target", &self.target)
            .field("on_diagnostic", &self.on_diagnostic.is_some())
            .finish()
    }
}

impl<T> Options<T> {
    /// Options with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options from a data configuration.
    #[must_use]
    pub fn from_config(config: DimensionsConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Prefer border-box measurement.
    #[must_use]
    pub fn use_border_box_size(mut self, enabled: bool) -> Self {
        self.config.use_border_box_size = enabled;
        self
    }

    /// Classify widths against `breakpoints`.
    #[must_use]
    pub fn breakpoints(mut self, breakpoints: Breakpoints) -> Self {
        self.config.breakpoints = Some(breakpoints);
        self
    }

    /// Only commit readings whose label changed.
    #[must_use]
    pub fn update_on_breakpoint_change(mut self, enabled: bool) -> Self {
        self.config.update_on_breakpoint_change = enabled;
        self
    }

    /// Skip commits for which `predicate` returns `false`.
    #[must_use]
    pub fn should_update(mut self, predicate: impl Fn(&Reading) -> bool + 'static) -> Self {
        self.should_update = Some(Rc::new(predicate));
        self
    }

    /// Call `callback` on resize.
    #[must_use]
    pub fn on_resize(mut self, callback: impl FnMut(&ResizeEvent<T>) + 'static) -> Self {
        self.on_resize = Some(Box::new(callback));
        self
    }

    /// Fall back to `factory` when the platform has no native observer.
    #[must_use]
    pub fn polyfill(mut self, factory: Rc<dyn ObserverFactory<T>>) -> Self {
        self.polyfill = Some(factory);
        self
    }

    /// Observe `target` as soon as the handle is created.
    #[must_use]
    pub fn target(mut self, target: T) -> Self {
        self.target = Some(target);
        self
    }

    /// Also report diagnostics to `sink`.
    #[must_use]
    pub fn on_diagnostic(mut self, sink: impl FnMut(&DimensionsError) + 'static) -> Self {
        self.on_diagnostic = Some(Box::new(sink));
        self
    }
}
