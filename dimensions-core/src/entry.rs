//! Notification records delivered by a resize observer.
//!
//! The shape follows the browser's `ResizeObserverEntry`: an optional
//! border-box size, an optional content-box size and the legacy
//! `contentRect`. Some implementations hand box sizes over as a
//! one-element sequence instead of a single value, so both forms are
//! accepted.
//!
//! The platform's own record can ride along as an opaque [`RawRecord`], so
//! callers get back exactly what the observer delivered.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// One box measurement in logical axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxSize {
    /// Size along the inline axis (width in horizontal writing modes).
    pub inline_size: f64,
    /// Size along the block axis (height in horizontal writing modes).
    pub block_size: f64,
}

impl BoxSize {
    /// Create a box size from width and height.
    #[must_use]
    pub const fn new(inline_size: f64, block_size: f64) -> Self {
        Self {
            inline_size,
            block_size,
        }
    }
}

/// A box-size field as reported by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoxSizes {
    /// A single measurement.
    Single(BoxSize),
    /// A sequence of measurements, one per fragment.
    Sequence(Vec<BoxSize>),
}

impl BoxSizes {
    /// The measurement to use: the value itself, or the first of a sequence.
    #[must_use]
    pub fn first(&self) -> Option<BoxSize> {
        match self {
            Self::Single(size) => Some(*size),
            Self::Sequence(sizes) => sizes.first().copied(),
        }
    }
}

impl From<BoxSize> for BoxSizes {
    fn from(size: BoxSize) -> Self {
        Self::Single(size)
    }
}

/// The legacy content rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentRect {
    /// Content width.
    #[serde(default)]
    pub width: f64,
    /// Content height.
    #[serde(default)]
    pub height: f64,
}

/// The untouched platform record, e.g. a browser `ResizeObserverEntry`.
pub type RawRecord = Rc<dyn Any>;

/// A single resize notification record.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeEntry {
    /// Border-box size, if the platform reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_box_size: Option<BoxSizes>,
    /// Content-box size, if the platform reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_box_size: Option<BoxSizes>,
    /// Legacy content rectangle.
    #[serde(default)]
    pub content_rect: ContentRect,
    /// The record as the platform delivered it. Not serialized.
    #[serde(skip)]
    pub raw: Option<RawRecord>,
}

impl fmt::Debug for ResizeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeEntry")
            .field("border_box_size", &self.border_box_size)
            .field("content_box_size", &self.content_box_size)
            .field("content_rect", &self.content_rect)
            .field("raw", &self.raw.is_some())
            .finish()
    }
}

// Raw records compare by identity.
impl PartialEq for ResizeEntry {
    fn eq(&self, other: &Self) -> bool {
        let same_raw = match (&self.raw, &other.raw) {
            (None, None) => true,
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        };
        same_raw
            && self.border_box_size == other.border_box_size
            && self.content_box_size == other.content_box_size
            && self.content_rect == other.content_rect
    }
}

impl ResizeEntry {
    /// Entry carrying only a content rectangle.
    #[must_use]
    pub fn from_rect(width: f64, height: f64) -> Self {
        Self {
            content_rect: ContentRect { width, height },
            ..Self::default()
        }
    }

    /// Entry carrying a content-box size.
    #[must_use]
    pub fn from_content_box(width: f64, height: f64) -> Self {
        Self {
            content_box_size: Some(BoxSize::new(width, height).into()),
            content_rect: ContentRect { width, height },
            ..Self::default()
        }
    }

    /// Set the border-box size.
    #[must_use]
    pub fn with_border_box(mut self, width: f64, height: f64) -> Self {
        self.border_box_size = Some(BoxSize::new(width, height).into());
        self
    }

    /// Attach the platform record this entry was read from.
    #[must_use]
    pub fn with_raw(mut self, raw: impl Any) -> Self {
        self.raw = Some(Rc::new(raw));
        self
    }

    /// The platform record, if one is attached and has type `R`.
    #[must_use]
    pub fn raw<R: Any>(&self) -> Option<&R> {
        self.raw.as_deref()?.downcast_ref::<R>()
    }

    /// Parse an entry from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe an entry.
    pub fn from_json(json: &str) -> crate::DimensionsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the entry to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::DimensionsResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
