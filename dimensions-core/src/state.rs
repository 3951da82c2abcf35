//! Observable reading state.

use serde::{Deserialize, Serialize};

use crate::entry::ResizeEntry;
use crate::normalize::Size;

/// The externally visible size state of an observed element.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reading {
    /// Current breakpoint label, empty when unclassified.
    pub label: String,
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
    /// The notification record this reading was computed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<ResizeEntry>,
}

impl Reading {
    /// Reading computed from a notification.
    #[must_use]
    pub fn new(label: impl Into<String>, size: Size, entry: ResizeEntry) -> Self {
        Self {
            label: label.into(),
            width: size.width,
            height: size.height,
            entry: Some(entry),
        }
    }

    /// Width and height as a [`Size`].
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Whether a notification has been committed yet.
    #[must_use]
    pub const fn is_measured(&self) -> bool {
        self.entry.is_some()
    }

    /// Serialize the reading to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::DimensionsResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
