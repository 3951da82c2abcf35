//! Mock platform shared by the integration tests.
//!
//! Records every observe/disconnect call and keeps the registered handler
//! so tests can deliver notifications by hand.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dimensions_core::{
    Dimensions, DimensionsResult, FrameScheduler, ImmediateFrames, ManualFrames, ObserverFactory,
    Options, Platform, ResizeEntry, ResizeHandler, ResizeObserver,
};

/// Stand-in for a DOM element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Div(pub u32);

/// Everything the mock observer was asked to do.
#[derive(Default)]
pub struct ObserverLog {
    pub created: Cell<usize>,
    pub observed: Cell<usize>,
    pub disconnected: Cell<usize>,
    pub targets: RefCell<Vec<Div>>,
    handler: RefCell<Option<ResizeHandler>>,
}

impl ObserverLog {
    /// Deliver one notification record, as the platform would.
    pub fn trigger(&self, entry: ResizeEntry) {
        let handler = self
            .handler
            .borrow()
            .clone()
            .expect("an observer should have been created");
        handler(&[entry]);
    }
}

struct MockObserver {
    log: Rc<ObserverLog>,
}

impl ResizeObserver<Div> for MockObserver {
    fn observe(&mut self, target: &Div) {
        self.log.observed.set(self.log.observed.get() + 1);
        self.log.targets.borrow_mut().push(target.clone());
    }

    fn disconnect(&mut self) {
        self.log.disconnected.set(self.log.disconnected.get() + 1);
    }
}

/// Observer factory that reports to an [`ObserverLog`].
pub struct MockFactory {
    pub log: Rc<ObserverLog>,
}

impl MockFactory {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            log: Rc::new(ObserverLog::default()),
        })
    }
}

impl ObserverFactory<Div> for MockFactory {
    fn create(&self, handler: ResizeHandler) -> DimensionsResult<Box<dyn ResizeObserver<Div>>> {
        self.log.created.set(self.log.created.get() + 1);
        *self.log.handler.borrow_mut() = Some(handler);
        Ok(Box::new(MockObserver {
            log: Rc::clone(&self.log),
        }))
    }
}

/// Platform with or without native resize observation.
pub struct MockPlatform {
    native: Option<Rc<MockFactory>>,
}

impl MockPlatform {
    pub fn supported(factory: &Rc<MockFactory>) -> Rc<Self> {
        Rc::new(Self {
            native: Some(Rc::clone(factory)),
        })
    }

    pub fn unsupported() -> Rc<Self> {
        Rc::new(Self { native: None })
    }
}

impl Platform<Div> for MockPlatform {
    fn native_observer(&self) -> Option<Rc<dyn ObserverFactory<Div>>> {
        self.native
            .as_ref()
            .map(|factory| Rc::clone(factory) as Rc<dyn ObserverFactory<Div>>)
    }
}

/// A handle observing `Div(1)` with a native mock observer and inline frames.
pub struct Harness {
    pub dims: Dimensions<Div>,
    pub log: Rc<ObserverLog>,
}

pub fn render(options: Options<Div>) -> Harness {
    render_with(options, Rc::new(ImmediateFrames::new()))
}

pub fn render_with(options: Options<Div>, scheduler: Rc<dyn FrameScheduler>) -> Harness {
    let factory = MockFactory::new();
    let dims = Dimensions::new(
        MockPlatform::supported(&factory),
        scheduler,
        options.target(Div(1)),
    );
    Harness {
        dims,
        log: Rc::clone(&factory.log),
    }
}

/// Like [`render`] but with frames that only run on demand.
pub fn render_deferred(options: Options<Div>) -> (Harness, Rc<ManualFrames>) {
    let frames = Rc::new(ManualFrames::new());
    let harness = render_with(options, Rc::clone(&frames) as Rc<dyn FrameScheduler>);
    (harness, frames)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < f64::EPSILON,
        "expected {expected}, got {actual}"
    );
}
