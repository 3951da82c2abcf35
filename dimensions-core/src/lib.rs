//! # Saorsa Dimensions Core
//!
//! Tracks the box size of one observed element and exposes it, together
//! with a breakpoint label, as reactive state.
//! Compiles to WASM for use with the browser's `ResizeObserver`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │             dimensions-core.wasm            │
//! ├─────────────────────────────────────────────┤
//! │  Observation     │  Normalization           │
//! │  - Target slot   │  - Border/content box    │
//! │  - Subscribe     │  - Legacy contentRect    │
//! │  - Polyfill      │  - No-op suppression     │
//! ├─────────────────────────────────────────────┤
//! │  Classification  │  Update Policy           │
//! │  - Breakpoints   │  - Callback gate         │
//! │  - Label lookup  │  - Commit gate           │
//! │                  │  - Next-frame commit     │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod breakpoint;
pub mod config;
pub mod dimensions;
pub mod entry;
pub mod error;
pub mod frame;
pub mod normalize;
pub mod observer;
pub mod policy;
pub mod state;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use breakpoint::{classify, Breakpoints};
pub use config::{DimensionsConfig, OnDiagnostic, OnResize, Options};
pub use dimensions::{Controls, Dimensions, ResizeEvent, Subscriber, SubscriptionId};
pub use entry::{BoxSize, BoxSizes, ContentRect, RawRecord, ResizeEntry};
pub use error::{DimensionsError, DimensionsResult, BORDER_BOX_UNSUPPORTED, OBSERVER_UNAVAILABLE};
pub use frame::{FrameId, FrameScheduler, FrameTask, ImmediateFrames, ManualFrames};
pub use normalize::{Size, SizeNormalizer};
pub use observer::{
    ObservationManager, ObservationState, ObserveOutcome, ObserverFactory, Platform,
    ResizeHandler, ResizeObserver, TargetSlot,
};
pub use policy::{Decision, ShouldUpdate, UpdatePolicy};
pub use state::Reading;

/// Dimensions core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
