//! Size normalization and no-op suppression.

use serde::{Deserialize, Serialize};

use crate::entry::ResizeEntry;
use crate::error::DimensionsError;

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
}

impl Size {
    /// Create a size.
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Extracts a size from notification records and drops repeats.
#[derive(Debug, Clone, Default)]
pub struct SizeNormalizer {
    use_border_box: bool,
    warned: bool,
    previous: Option<Size>,
}

impl SizeNormalizer {
    /// Create a normalizer, optionally preferring border-box measurement.
    #[must_use]
    pub fn new(use_border_box: bool) -> Self {
        Self {
            use_border_box,
            ..Self::default()
        }
    }

    /// Size of `entry`, ignoring the previous reading.
    ///
    /// Pushes [`DimensionsError::BorderBoxUnsupported`] into `diagnostics`
    /// the first time a border-box size is requested but missing.
    pub fn size_of(
        &mut self,
        entry: &ResizeEntry,
        diagnostics: &mut Vec<DimensionsError>,
    ) -> Size {
        let mut preferred = None;
        if self.use_border_box {
            preferred = entry.border_box_size.as_ref().and_then(|s| s.first());
            if preferred.is_none() && !self.warned {
                self.warned = true;
                tracing::warn!("{}", DimensionsError::BorderBoxUnsupported);
                diagnostics.push(DimensionsError::BorderBoxUnsupported);
            }
        }

        match preferred.or_else(|| entry.content_box_size.as_ref().and_then(|s| s.first())) {
            Some(size) => Size::new(size.inline_size, size.block_size),
            None => Size::new(entry.content_rect.width, entry.content_rect.height),
        }
    }

    /// Size of `entry`, or `None` if it equals the last accepted size.
    pub fn measure(
        &mut self,
        entry: &ResizeEntry,
        diagnostics: &mut Vec<DimensionsError>,
    ) -> Option<Size> {
        let size = self.size_of(entry, diagnostics);
        if self.previous == Some(size) {
            return None;
        }
        self.previous = Some(size);
        Some(size)
    }

    /// Last accepted size.
    #[must_use]
    pub fn previous(&self) -> Option<Size> {
        self.previous
    }

    /// Whether the border-box warning has been emitted.
    #[must_use]
    pub fn has_warned(&self) -> bool {
        self.warned
    }

    /// Forget the cached size and re-arm the border-box warning.
    pub fn reset(&mut self) {
        self.previous = None;
        self.warned = false;
    }
}
