//! # Observation Manager
//!
//! Owns the single resize subscription of a [`Dimensions`](crate::Dimensions)
//! handle and the element it targets.
//!
//! ```text
//!          observe(target)            observe(same)
//!   Idle ──────────────────▶ Observing ◀──────────┐
//!    ▲  ◀──────────────────      │  └─────────────┘
//!    │        unobserve          │ observe(other): disconnect, observe
//!    └─ unobserve (no-op)        ▼
//! ```
//!
//! The platform seam is three small traits: a [`Platform`] reports the
//! native observer if there is one, an [`ObserverFactory`] creates an
//! observer bound to a handler, and a [`ResizeObserver`] watches a target.

use std::fmt;
use std::rc::Rc;

use crate::entry::ResizeEntry;
use crate::error::DimensionsResult;

/// Handler an observer invokes with each batch of notification records.
pub type ResizeHandler = Rc<dyn Fn(&[ResizeEntry])>;

/// A live resize observer.
pub trait ResizeObserver<T> {
    /// Start delivering notifications for `target`.
    fn observe(&mut self, target: &T);

    /// Stop delivering notifications for every target.
    fn disconnect(&mut self);
}

/// Creates resize observers. Implemented by native bindings and polyfills.
pub trait ObserverFactory<T> {
    /// Create an observer that reports to `handler`.
    ///
    /// # Errors
    ///
    /// Returns [`DimensionsError::CapabilityUnavailable`](crate::DimensionsError::CapabilityUnavailable)
    /// if the observer cannot be constructed.
    fn create(&self, handler: ResizeHandler) -> DimensionsResult<Box<dyn ResizeObserver<T>>>;
}

/// Host environment capabilities.
pub trait Platform<T> {
    /// The native observer factory, or `None` if the environment lacks it.
    fn native_observer(&self) -> Option<Rc<dyn ObserverFactory<T>>>;
}

/// Single-slot holder for the observed element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSlot<T> {
    current: Option<T>,
}

impl<T> Default for TargetSlot<T> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<T: PartialEq> TargetSlot<T> {
    /// Slot holding `target`, if any.
    #[must_use]
    pub fn new(target: Option<T>) -> Self {
        Self { current: target }
    }

    /// The held element.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Store `target` unless it equals the held element. Returns whether
    /// the slot changed.
    pub fn replace_if_changed(&mut self, target: T) -> bool {
        if self.current.as_ref() == Some(&target) {
            return false;
        }
        self.current = Some(target);
        true
    }
}

/// Subscription state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObservationState {
    /// No active subscription.
    #[default]
    Idle,
    /// Watching the held target.
    Observing,
}

/// What an [`ObservationManager::observe`] call did.
#[derive(Debug)]
pub enum ObserveOutcome {
    /// No element to observe.
    NoTarget,
    /// Already observing the same element.
    AlreadyObserving,
    /// Subscribed to the held element.
    Started,
    /// Switched to a new element.
    Retargeted,
    /// No observer could be created.
    Unavailable(crate::DimensionsError),
}

/// Lifecycle of the resize subscription for one element at a time.
pub struct ObservationManager<T> {
    target: TargetSlot<T>,
    observer: Option<Box<dyn ResizeObserver<T>>>,
    state: ObservationState,
}

impl<T: fmt::Debug> fmt::Debug for ObservationManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservationManager")
            .field("target", &self.target)
            .field("connected", &self.observer.is_some())
            .field("state", &self.state)
            .finish()
    }
}

impl<T: PartialEq> ObservationManager<T> {
    /// Create an idle manager, optionally holding an initial target.
    #[must_use]
    pub fn new(target: Option<T>) -> Self {
        Self {
            target: TargetSlot::new(target),
            observer: None,
            state: ObservationState::Idle,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ObservationState {
        self.state
    }

    /// Whether a subscription is active.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.state == ObservationState::Observing
    }

    /// The held element.
    #[must_use]
    pub fn target(&self) -> Option<&T> {
        self.target.get()
    }

    /// Observe `element`, or the held element when `None`.
    ///
    /// `connect` is called to create the observer the first time one is
    /// needed; the observer is then reused across stop/start cycles.
    pub fn observe<F>(&mut self, element: Option<T>, connect: F) -> ObserveOutcome
    where
        F: FnOnce() -> DimensionsResult<Box<dyn ResizeObserver<T>>>,
    {
        let retarget = element.is_some_and(|el| self.target.replace_if_changed(el));
        if retarget {
            self.unobserve();
        }

        let Some(target) = self.target.get() else {
            return ObserveOutcome::NoTarget;
        };
        if self.state == ObservationState::Observing {
            return ObserveOutcome::AlreadyObserving;
        }

        if self.observer.is_none() {
            match connect() {
                Ok(observer) => self.observer = Some(observer),
                Err(err) => return ObserveOutcome::Unavailable(err),
            }
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.observe(target);
        }
        self.state = ObservationState::Observing;

        if retarget {
            ObserveOutcome::Retargeted
        } else {
            ObserveOutcome::Started
        }
    }

    /// Stop observing. Returns whether a subscription was torn down.
    pub fn unobserve(&mut self) -> bool {
        if self.state == ObservationState::Idle {
            return false;
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.disconnect();
        }
        self.state = ObservationState::Idle;
        true
    }
}
