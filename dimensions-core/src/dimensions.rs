//! # Dimensions Handle
//!
//! Composes observation, normalization, classification and the update
//! policy into one reactive handle.
//!
//! ```text
//! notification ─▶ normalize ─▶ classify ─▶ on_resize (callback gate)
//!   (dedup)                           └──▶ commit gate ─▶ next frame ─▶ reading
//! ```
//!
//! All state lives behind an `Rc` shared with the platform handler, which
//! only holds a `Weak` reference. No `RefCell` borrow is held while user
//! callbacks run, so callbacks may call back into the handle.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::breakpoint::Breakpoints;
use crate::config::{OnDiagnostic, OnResize, Options};
use crate::entry::ResizeEntry;
use crate::error::{DimensionsError, DimensionsResult};
use crate::frame::{FrameId, FrameScheduler};
use crate::normalize::SizeNormalizer;
use crate::observer::{
    ObservationManager, ObserveOutcome, ObserverFactory, Platform, ResizeHandler, ResizeObserver,
};
use crate::policy::{ShouldUpdate, UpdatePolicy};
use crate::state::Reading;

/// Listener notified after every commit.
pub type Subscriber = Rc<dyn Fn(&Reading)>;

/// Identifier returned by [`Dimensions::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Record passed to the resize callback.
pub struct ResizeEvent<T> {
    /// Breakpoint label, empty when unclassified.
    pub label: String,
    /// Width in CSS pixels.
    pub width: f64,
    /// Height in CSS pixels.
    pub height: f64,
    /// The notification record.
    pub entry: ResizeEntry,
    /// Start/stop controls of the emitting handle.
    pub controls: Controls<T>,
}

impl<T> fmt::Debug for ResizeEvent<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeEvent")
            .field("label", &self.label)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("entry", &self.entry)
            .finish_non_exhaustive()
    }
}

impl<T: Clone + PartialEq + 'static> ResizeEvent<T> {
    /// Observe `element`, or restart on the current one.
    pub fn observe(&self, element: Option<T>) {
        self.controls.observe(element);
    }

    /// Stop observing.
    pub fn unobserve(&self) {
        self.controls.unobserve();
    }
}

/// Weak start/stop handle, usable from inside callbacks.
pub struct Controls<T> {
    shared: Weak<Shared<T>>,
}

impl<T> Clone for Controls<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Controls<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controls")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Controls<T> {
    /// Observe `element`, or restart on the current one. No-op once disposed.
    pub fn observe(&self, element: Option<T>) {
        if let Some(shared) = self.shared.upgrade() {
            shared.observe(element);
        }
    }

    /// Stop observing. No-op once disposed.
    pub fn unobserve(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.unobserve();
        }
    }

    /// Latest committed reading, if the handle is alive.
    #[must_use]
    pub fn reading(&self) -> Option<Reading> {
        self.shared
            .upgrade()
            .map(|shared| shared.committed.borrow().clone())
    }
}

struct Shared<T> {
    platform: Rc<dyn Platform<T>>,
    scheduler: Rc<dyn FrameScheduler>,
    breakpoints: Option<Breakpoints>,
    manager: RefCell<ObservationManager<T>>,
    normalizer: RefCell<SizeNormalizer>,
    policy: RefCell<UpdatePolicy>,
    committed: RefCell<Reading>,
    pending: RefCell<Option<Reading>>,
    frame: Cell<Option<FrameId>>,
    on_resize: RefCell<Option<OnResize<T>>>,
    on_diagnostic: RefCell<Option<OnDiagnostic>>,
    polyfill: RefCell<Option<Rc<dyn ObserverFactory<T>>>>,
    subscribers: RefCell<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: Cell<u64>,
    disposed: Cell<bool>,
}

impl<T: Clone + PartialEq + 'static> Shared<T> {
    fn observe(self: &Rc<Self>, element: Option<T>) {
        if self.disposed.get() {
            return;
        }

        let outcome = self
            .manager
            .borrow_mut()
            .observe(element, || self.connect());

        match outcome {
            ObserveOutcome::Started => tracing::debug!("Resize observation started"),
            ObserveOutcome::Retargeted => {
                self.normalizer.borrow_mut().reset();
                self.policy.borrow_mut().reset();
                tracing::debug!("Resize observation moved to a new target");
            }
            ObserveOutcome::Unavailable(err) => {
                tracing::error!("{err}");
                self.report(&err);
            }
            ObserveOutcome::NoTarget | ObserveOutcome::AlreadyObserving => {}
        }
    }

    fn unobserve(&self) {
        if self.manager.borrow_mut().unobserve() {
            tracing::debug!("Resize observation stopped");
        }
    }

    fn connect(self: &Rc<Self>) -> DimensionsResult<Box<dyn ResizeObserver<T>>> {
        let factory = match self.platform.native_observer() {
            Some(native) => native,
            None => self
                .polyfill
                .borrow()
                .clone()
                .ok_or(DimensionsError::CapabilityUnavailable)?,
        };

        let weak = Rc::downgrade(self);
        let handler: ResizeHandler = Rc::new(move |entries: &[ResizeEntry]| {
            if let Some(shared) = weak.upgrade() {
                shared.handle(entries);
            }
        });
        factory.create(handler)
    }

    fn handle(self: &Rc<Self>, entries: &[ResizeEntry]) {
        if self.disposed.get() {
            return;
        }
        let Some(entry) = entries.first() else {
            return;
        };

        let mut diagnostics = Vec::new();
        let size = self.normalizer.borrow_mut().measure(entry, &mut diagnostics);
        for diagnostic in &diagnostics {
            self.report(diagnostic);
        }
        let Some(size) = size else {
            tracing::trace!("Resize notification without size change ignored");
            return;
        };

        let label = self
            .breakpoints
            .as_ref()
            .map(|table| table.classify(size.width))
            .unwrap_or_default();
        let candidate = Reading::new(label, size, entry.clone());

        // The label only counts as notified once a callback has seen it.
        let has_callback = self.on_resize.borrow().is_some();
        if has_callback && self.policy.borrow_mut().should_notify(&candidate.label) {
            self.notify(&candidate, entry);
        }

        let latest = self.latest();
        let commit = self.policy.borrow().should_commit(&candidate, &latest);
        if commit {
            self.schedule_commit(candidate);
        }
    }

    fn notify(self: &Rc<Self>, candidate: &Reading, entry: &ResizeEntry) {
        let callback = self.on_resize.borrow_mut().take();
        let Some(mut callback) = callback else {
            return;
        };

        let event = ResizeEvent {
            label: candidate.label.clone(),
            width: candidate.width,
            height: candidate.height,
            entry: entry.clone(),
            controls: Controls {
                shared: Rc::downgrade(self),
            },
        };
        callback(&event);

        let mut slot = self.on_resize.borrow_mut();
        if slot.is_none() {
            *slot = Some(callback);
        }
    }

    fn latest(&self) -> Reading {
        let pending = self.pending.borrow().clone();
        pending.unwrap_or_else(|| self.committed.borrow().clone())
    }

    fn schedule_commit(self: &Rc<Self>, reading: Reading) {
        *self.pending.borrow_mut() = Some(reading);
        if self.frame.get().is_some() {
            return;
        }

        let weak = Rc::downgrade(self);
        let id = self.scheduler.request_frame(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.frame.set(None);
                shared.flush();
            }
        }));
        // Schedulers that run the task inline have already flushed.
        if self.pending.borrow().is_some() {
            self.frame.set(Some(id));
        }
    }

    fn flush(&self) {
        let Some(reading) = self.pending.borrow_mut().take() else {
            return;
        };
        if self.disposed.get() {
            return;
        }

        tracing::debug!(
            label = %reading.label,
            width = reading.width,
            height = reading.height,
            "Committing reading"
        );
        *self.committed.borrow_mut() = reading.clone();

        let subscribers: Vec<Subscriber> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(_, subscriber)| Rc::clone(subscriber))
            .collect();
        for subscriber in subscribers {
            subscriber(&reading);
        }
    }

    fn report(&self, diagnostic: &DimensionsError) {
        let sink = self.on_diagnostic.borrow_mut().take();
        if let Some(mut sink) = sink {
            sink(diagnostic);
            let mut slot = self.on_diagnostic.borrow_mut();
            if slot.is_none() {
                *slot = Some(sink);
            }
        }
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.unobserve();
        if let Some(id) = self.frame.take() {
            self.scheduler.cancel_frame(id);
        }
        self.pending.borrow_mut().take();
        tracing::debug!("Dimensions disposed");
    }
}

/// Reactive size state of one observed element.
///
/// Dropping the handle disposes it: the subscription is torn down and any
/// pending commit is cancelled.
pub struct Dimensions<T: Clone + PartialEq + 'static> {
    shared: Rc<Shared<T>>,
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for Dimensions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dimensions")
            .field("reading", &*self.shared.committed.borrow())
            .field("manager", &*self.shared.manager.borrow())
            .field("disposed", &self.shared.disposed.get())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + PartialEq + 'static> Dimensions<T> {
    /// Create a handle. Starts observing immediately if `options.target` is set.
    #[must_use]
    pub fn new(
        platform: Rc<dyn Platform<T>>,
        scheduler: Rc<dyn FrameScheduler>,
        options: Options<T>,
    ) -> Self {
        let Options {
            config,
            should_update,
            on_resize,
            polyfill,
            target,
            on_diagnostic,
        } = options;

        let classifying = config.breakpoints.is_some();
        let has_target = target.is_some();
        let shared = Rc::new(Shared {
            platform,
            scheduler,
            breakpoints: config.breakpoints,
            manager: RefCell::new(ObservationManager::new(target)),
            normalizer: RefCell::new(SizeNormalizer::new(config.use_border_box_size)),
            policy: RefCell::new(UpdatePolicy::new(
                classifying,
                config.update_on_breakpoint_change,
                should_update,
            )),
            committed: RefCell::new(Reading::default()),
            pending: RefCell::new(None),
            frame: Cell::new(None),
            on_resize: RefCell::new(on_resize),
            on_diagnostic: RefCell::new(on_diagnostic),
            polyfill: RefCell::new(polyfill),
            subscribers: RefCell::new(Vec::new()),
            next_subscription: Cell::new(0),
            disposed: Cell::new(false),
        });

        if has_target {
            shared.observe(None);
        }
        Self { shared }
    }

    /// Observe `element`, or (re)start on the held element when `None`.
    pub fn observe(&self, element: Option<T>) {
        self.shared.observe(element);
    }

    /// Stop observing. Safe to call when idle.
    pub fn unobserve(&self) {
        self.shared.unobserve();
    }

    /// Whether a subscription is active.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.shared.manager.borrow().is_observing()
    }

    /// The held element.
    #[must_use]
    pub fn target(&self) -> Option<T> {
        self.shared.manager.borrow().target().cloned()
    }

    /// Latest committed reading.
    #[must_use]
    pub fn reading(&self) -> Reading {
        self.shared.committed.borrow().clone()
    }

    /// Committed breakpoint label.
    #[must_use]
    pub fn label(&self) -> String {
        self.shared.committed.borrow().label.clone()
    }

    /// Committed width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.shared.committed.borrow().width
    }

    /// Committed height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.shared.committed.borrow().height
    }

    /// Notification record of the committed reading.
    #[must_use]
    pub fn entry(&self) -> Option<ResizeEntry> {
        self.shared.committed.borrow().entry.clone()
    }

    /// Whether a commit is waiting for the next frame.
    #[must_use]
    pub fn has_pending_commit(&self) -> bool {
        self.shared.pending.borrow().is_some()
    }

    /// Weak start/stop controls.
    #[must_use]
    pub fn controls(&self) -> Controls<T> {
        Controls {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Replace the resize callback.
    pub fn set_on_resize(&self, callback: Option<OnResize<T>>) {
        *self.shared.on_resize.borrow_mut() = callback;
    }

    /// Replace the commit predicate. Applies from the next notification.
    pub fn set_should_update(&self, should_update: Option<ShouldUpdate>) {
        self.shared.policy.borrow_mut().set_should_update(should_update);
    }

    /// Supply a fallback observer; takes effect on the next `observe`.
    pub fn set_polyfill(&self, factory: Rc<dyn ObserverFactory<T>>) {
        *self.shared.polyfill.borrow_mut() = Some(factory);
    }

    /// Call `listener` after every commit.
    pub fn subscribe(&self, listener: impl Fn(&Reading) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.shared.next_subscription.get());
        self.shared.next_subscription.set(id.0 + 1);
        self.shared
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.shared.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(registered, _)| *registered != id);
        subscribers.len() != before
    }

    /// Tear down observation and cancel any pending commit.
    ///
    /// Called automatically on drop; later calls are no-ops.
    pub fn dispose(&self) {
        self.shared.dispose();
    }

    /// Whether the handle has been disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.get()
    }
}

impl<T: Clone + PartialEq + 'static> Drop for Dimensions<T> {
    fn drop(&mut self) {
        self.shared.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoint::Breakpoints;
    use crate::frame::{ImmediateFrames, ManualFrames};

    type Handler = Rc<RefCell<Option<ResizeHandler>>>;

    struct Recorder {
        observed: Rc<Cell<usize>>,
        disconnected: Rc<Cell<usize>>,
    }

    impl ResizeObserver<u32> for Recorder {
        fn observe(&mut self, _target: &u32) {
            self.observed.set(self.observed.get() + 1);
        }

        fn disconnect(&mut self) {
            self.disconnected.set(self.disconnected.get() + 1);
        }
    }

    #[derive(Default)]
    struct TestPlatform {
        handler: Handler,
        observed: Rc<Cell<usize>>,
        disconnected: Rc<Cell<usize>>,
    }

    impl ObserverFactory<u32> for TestPlatform {
        fn create(&self, handler: ResizeHandler) -> DimensionsResult<Box<dyn ResizeObserver<u32>>> {
            *self.handler.borrow_mut() = Some(handler);
            Ok(Box::new(Recorder {
                observed: Rc::clone(&self.observed),
                disconnected: Rc::clone(&self.disconnected),
            }))
        }
    }

    struct Native(Rc<TestPlatform>);

    impl Platform<u32> for Native {
        fn native_observer(&self) -> Option<Rc<dyn ObserverFactory<u32>>> {
            Some(Rc::clone(&self.0) as Rc<dyn ObserverFactory<u32>>)
        }
    }

    fn fire(platform: &TestPlatform, entry: ResizeEntry) {
        let handler = platform.handler.borrow().clone().expect("observer created");
        handler(&[entry]);
    }

    fn setup(options: Options<u32>) -> (Rc<TestPlatform>, Dimensions<u32>) {
        let platform = Rc::new(TestPlatform::default());
        let dims = Dimensions::new(
            Rc::new(Native(Rc::clone(&platform))),
            Rc::new(ImmediateFrames::new()),
            options.target(1),
        );
        (platform, dims)
    }

    #[test]
    fn test_initial_reading_is_zero() {
        let (_platform, dims) = setup(Options::new());
        assert!(dims.is_observing());
        assert!(dims.label().is_empty());
        assert!((dims.width() - 0.0).abs() < f64::EPSILON);
        assert!((dims.height() - 0.0).abs() < f64::EPSILON);
        assert!(dims.entry().is_none());
    }

    #[test]
    fn test_commits_measured_size() {
        let (platform, dims) = setup(Options::new());
        fire(&platform, ResizeEntry::from_content_box(100.0, 50.0));
        assert!((dims.width() - 100.0).abs() < f64::EPSILON);
        assert!((dims.height() - 50.0).abs() < f64::EPSILON);
        assert_eq!(dims.entry(), Some(ResizeEntry::from_content_box(100.0, 50.0)));
    }

    #[test]
    fn test_empty_batch_ignored() {
        let (platform, dims) = setup(Options::new());
        let handler = platform.handler.borrow().clone().expect("observer created");
        handler(&[]);
        assert!(dims.entry().is_none());
    }

    #[test]
    fn test_label_committed_with_breakpoints() {
        let (platform, dims) =
            setup(Options::new().breakpoints(Breakpoints::new().with("T0", 0.0).with("T1", 100.0)));
        fire(&platform, ResizeEntry::from_rect(150.0, 10.0));
        assert_eq!(dims.label(), "T1");
    }

    #[test]
    fn test_subscribers_see_commits() {
        let (platform, dims) = setup(Options::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = dims.subscribe(move |reading| sink.borrow_mut().push(reading.width));

        fire(&platform, ResizeEntry::from_rect(10.0, 1.0));
        assert!(dims.unsubscribe(id));
        assert!(!dims.unsubscribe(id));
        fire(&platform, ResizeEntry::from_rect(20.0, 1.0));

        assert_eq!(*seen.borrow(), vec![10.0]);
    }

    #[test]
    fn test_manual_frames_coalesce_last_write() {
        let platform = Rc::new(TestPlatform::default());
        let frames = Rc::new(ManualFrames::new());
        let dims = Dimensions::new(
            Rc::new(Native(Rc::clone(&platform))),
            Rc::clone(&frames) as Rc<dyn FrameScheduler>,
            Options::new().target(1),
        );
        let commits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&commits);
        dims.subscribe(move |_| counter.set(counter.get() + 1));

        fire(&platform, ResizeEntry::from_rect(10.0, 1.0));
        fire(&platform, ResizeEntry::from_rect(20.0, 1.0));
        fire(&platform, ResizeEntry::from_rect(30.0, 1.0));

        assert_eq!(frames.pending(), 1);
        assert!(dims.has_pending_commit());
        assert!((dims.width() - 0.0).abs() < f64::EPSILON);

        frames.run_frame();
        assert!((dims.width() - 30.0).abs() < f64::EPSILON);
        assert_eq!(commits.get(), 1);
        assert!(!dims.has_pending_commit());
    }

    #[test]
    fn test_drop_disconnects_and_cancels_frame() {
        let platform = Rc::new(TestPlatform::default());
        let frames = Rc::new(ManualFrames::new());
        let dims = Dimensions::new(
            Rc::new(Native(Rc::clone(&platform))),
            Rc::clone(&frames) as Rc<dyn FrameScheduler>,
            Options::new().target(1),
        );
        fire(&platform, ResizeEntry::from_rect(10.0, 1.0));
        drop(dims);

        assert_eq!(platform.disconnected.get(), 1);
        assert_eq!(frames.cancelled(), 1);
        assert_eq!(frames.run_frame(), 0);

        // The platform may still hold the handler; it is inert now.
        fire(&platform, ResizeEntry::from_rect(20.0, 1.0));
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let (platform, dims) = setup(Options::new());
        dims.dispose();
        dims.dispose();
        assert!(dims.is_disposed());
        drop(dims);
        assert_eq!(platform.disconnected.get(), 1);
    }

    #[test]
    fn test_observe_after_dispose_is_ignored() {
        let (platform, dims) = setup(Options::new());
        dims.dispose();
        dims.observe(Some(2));
        assert!(!dims.is_observing());
        assert_eq!(platform.observed.get(), 1);
    }

    #[test]
    fn test_controls_outlive_handle_safely() {
        let (_platform, dims) = setup(Options::new());
        let controls = dims.controls();
        assert!(controls.reading().is_some());
        drop(dims);
        controls.observe(None);
        controls.unobserve();
        assert!(controls.reading().is_none());
    }

    #[test]
    fn test_set_on_resize_replaces_callback() {
        let (platform, dims) = setup(Options::new());
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        dims.set_on_resize(Some(Box::new(move |_| counter.set(counter.get() + 1))));
        fire(&platform, ResizeEntry::from_rect(10.0, 1.0));
        dims.set_on_resize(None);
        fire(&platform, ResizeEntry::from_rect(20.0, 1.0));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_set_should_update_blocks_commits() {
        let (platform, dims) = setup(Options::new());
        fire(&platform, ResizeEntry::from_rect(10.0, 1.0));
        dims.set_should_update(Some(Rc::new(|reading: &Reading| reading.width < 50.0)));

        fire(&platform, ResizeEntry::from_rect(80.0, 1.0));
        assert!((dims.width() - 10.0).abs() < f64::EPSILON);
        fire(&platform, ResizeEntry::from_rect(30.0, 1.0));
        assert!((dims.width() - 30.0).abs() < f64::EPSILON);
    }
}
