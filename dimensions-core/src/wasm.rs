//! WebAssembly bindings for dimensions-core.
//!
//! Adapts the browser's `ResizeObserver` and `requestAnimationFrame` to the
//! platform traits, and exposes a JavaScript-callable handle.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use gloo_render::{request_animation_frame, AnimationFrame};
use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Element;

use crate::{
    BoxSize, BoxSizes, ContentRect, Dimensions, DimensionsConfig, DimensionsError,
    DimensionsResult, FrameId, FrameScheduler, FrameTask, ObserverFactory, OnResize, Options,
    Platform, Reading, ResizeEntry, ResizeEvent, ResizeHandler, ResizeObserver, ShouldUpdate,
};

/// Initialize the dimensions WASM module.
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();
}

fn number(value: &JsValue, key: &str) -> Option<f64> {
    Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_f64())
}

fn set_field(target: &Object, key: &str, value: &JsValue) {
    if let Err(e) = Reflect::set(target, &JsValue::from_str(key), value) {
        tracing::warn!("Failed to set {} on JS object: {:?}", key, e);
    }
}

fn box_size_from_js(value: &JsValue) -> Option<BoxSize> {
    Some(BoxSize::new(
        number(value, "inlineSize")?,
        number(value, "blockSize")?,
    ))
}

fn box_sizes_from_js(entry: &JsValue, key: &str) -> Option<BoxSizes> {
    let value = Reflect::get(entry, &JsValue::from_str(key)).ok()?;
    if value.is_undefined() || value.is_null() {
        return None;
    }
    if Array::is_array(&value) {
        let sizes = Array::from(&value)
            .iter()
            .filter_map(|size| box_size_from_js(&size))
            .collect();
        return Some(BoxSizes::Sequence(sizes));
    }
    box_size_from_js(&value).map(BoxSizes::Single)
}

/// Convert a `ResizeObserverEntry` (native or polyfilled) into a [`ResizeEntry`].
///
/// The JS object itself is kept as the entry's raw record.
#[must_use]
pub fn entry_from_js(entry: &JsValue) -> ResizeEntry {
    let rect = Reflect::get(entry, &JsValue::from_str("contentRect")).unwrap_or(JsValue::UNDEFINED);
    ResizeEntry {
        border_box_size: box_sizes_from_js(entry, "borderBoxSize"),
        content_box_size: box_sizes_from_js(entry, "contentBoxSize"),
        content_rect: ContentRect {
            width: number(&rect, "width").unwrap_or(0.0),
            height: number(&rect, "height").unwrap_or(0.0),
        },
        raw: None,
    }
    .with_raw(entry.clone())
}

/// The JS record behind `entry`, or its JSON form when it came from Rust.
fn entry_to_js(entry: &ResizeEntry) -> JsValue {
    if let Some(raw) = entry.raw::<JsValue>() {
        return raw.clone();
    }
    entry
        .to_json()
        .ok()
        .and_then(|json| js_sys::JSON::parse(&json).ok())
        .unwrap_or(JsValue::UNDEFINED)
}

fn state_to_js(label: &str, width: f64, height: f64, entry: Option<&ResizeEntry>) -> Object {
    let state = Object::new();
    set_field(&state, "currentBreakpoint", &JsValue::from_str(label));
    set_field(&state, "width", &JsValue::from_f64(width));
    set_field(&state, "height", &JsValue::from_f64(height));
    set_field(&state, "entry", &entry.map_or(JsValue::UNDEFINED, entry_to_js));
    state
}

fn call_method(target: &JsValue, name: &str, args: &Array) -> Result<JsValue, JsValue> {
    let method: Function = Reflect::get(target, &JsValue::from_str(name))?.dyn_into()?;
    method.apply(target, args)
}

/// A JavaScript resize observer instance.
pub struct JsResizeObserver {
    observer: JsValue,
    _callback: Closure<dyn FnMut(Array)>,
}

impl ResizeObserver<Element> for JsResizeObserver {
    fn observe(&mut self, target: &Element) {
        if let Err(e) = call_method(&self.observer, "observe", &Array::of1(target)) {
            tracing::warn!("ResizeObserver.observe failed: {:?}", e);
        }
    }

    fn disconnect(&mut self) {
        if let Err(e) = call_method(&self.observer, "disconnect", &Array::new()) {
            tracing::warn!("ResizeObserver.disconnect failed: {:?}", e);
        }
    }
}

/// Constructs observers from a `ResizeObserver`-compatible constructor.
pub struct JsObserverFactory {
    constructor: Function,
}

impl JsObserverFactory {
    /// Wrap a constructor, either the native one or a polyfill.
    #[must_use]
    pub fn new(constructor: Function) -> Self {
        Self { constructor }
    }
}

impl ObserverFactory<Element> for JsObserverFactory {
    fn create(&self, handler: ResizeHandler) -> DimensionsResult<Box<dyn ResizeObserver<Element>>> {
        let callback = Closure::wrap(Box::new(move |entries: Array| {
            let entries: Vec<ResizeEntry> = entries.iter().map(|e| entry_from_js(&e)).collect();
            handler(&entries);
        }) as Box<dyn FnMut(Array)>);

        let observer = Reflect::construct(&self.constructor, &Array::of1(callback.as_ref()))
            .map_err(|e| {
                tracing::warn!("Failed to construct ResizeObserver: {:?}", e);
                DimensionsError::CapabilityUnavailable
            })?;

        Ok(Box::new(JsResizeObserver {
            observer,
            _callback: callback,
        }))
    }
}

/// Browser platform: uses the global `ResizeObserver` when present.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebPlatform;

impl Platform<Element> for WebPlatform {
    fn native_observer(&self) -> Option<Rc<dyn ObserverFactory<Element>>> {
        let global: JsValue = js_sys::global().into();
        let has = |name: &str| Reflect::has(&global, &JsValue::from_str(name)).unwrap_or(false);
        if !has("ResizeObserver") || !has("ResizeObserverEntry") {
            return None;
        }

        let constructor = Reflect::get(&global, &JsValue::from_str("ResizeObserver"))
            .ok()?
            .dyn_into::<Function>()
            .ok()?;
        Some(Rc::new(JsObserverFactory::new(constructor)))
    }
}

struct ScheduledFrame {
    id: FrameId,
    fired: Rc<Cell<bool>>,
    _handle: AnimationFrame,
}

/// `requestAnimationFrame`-backed scheduler.
///
/// Each outstanding frame is held as an [`AnimationFrame`]; dropping it
/// cancels the browser callback and frees the task.
#[derive(Default)]
pub struct AnimationFrameScheduler {
    next_id: Cell<i32>,
    frames: RefCell<Vec<ScheduledFrame>>,
}

impl fmt::Debug for AnimationFrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationFrameScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

impl AnimationFrameScheduler {
    /// Create a scheduler with no outstanding frames.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames requested but neither run nor cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.frames
            .borrow()
            .iter()
            .filter(|frame| !frame.fired.get())
            .count()
    }

    /// Release handles of frames that already ran.
    fn prune(&self) {
        let finished: Vec<ScheduledFrame> = {
            let mut frames = self.frames.borrow_mut();
            let (finished, live): (Vec<ScheduledFrame>, Vec<ScheduledFrame>) =
                frames.drain(..).partition(|frame| frame.fired.get());
            *frames = live;
            finished
        };
        drop(finished);
    }
}

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&self, task: FrameTask) -> FrameId {
        if web_sys::window().is_none() {
            tracing::debug!("No window, running frame task inline");
            task();
            return FrameId(0);
        }

        self.prune();
        let id = FrameId(self.next_id.get().wrapping_add(1));
        self.next_id.set(id.0);

        let fired = Rc::new(Cell::new(false));
        let done = Rc::clone(&fired);
        // Marked after the task returns, so a task that requests another
        // frame never releases its own handle mid-call.
        let handle = request_animation_frame(move |_timestamp| {
            task();
            done.set(true);
        });

        self.frames.borrow_mut().push(ScheduledFrame {
            id,
            fired,
            _handle: handle,
        });
        id
    }

    fn cancel_frame(&self, id: FrameId) {
        let cancelled = {
            let mut frames = self.frames.borrow_mut();
            frames
                .iter()
                .position(|frame| frame.id == id)
                .map(|index| frames.remove(index))
        };
        if cancelled.is_none() {
            tracing::trace!("Frame {:?} already ran or was cancelled", id);
        }
    }
}

/// JS view of a [`ResizeEvent`].
///
/// Its `observe` and `unobserve` functions only work while this value is
/// alive, i.e. for the duration of the `onResize` call.
struct JsResizeEvent {
    value: Object,
    _observe: Closure<dyn FnMut(Option<Element>)>,
    _unobserve: Closure<dyn FnMut()>,
}

impl JsResizeEvent {
    fn new(event: &ResizeEvent<Element>) -> Self {
        let value = state_to_js(&event.label, event.width, event.height, Some(&event.entry));

        let controls = event.controls.clone();
        let observe = Closure::wrap(Box::new(move |element: Option<Element>| {
            controls.observe(element);
        }) as Box<dyn FnMut(Option<Element>)>);
        let controls = event.controls.clone();
        let unobserve = Closure::wrap(Box::new(move || {
            controls.unobserve();
        }) as Box<dyn FnMut()>);

        set_field(&value, "observe", observe.as_ref());
        set_field(&value, "unobserve", unobserve.as_ref());

        Self {
            value,
            _observe: observe,
            _unobserve: unobserve,
        }
    }
}

/// Wrap a JS `shouldUpdate(state)` function. A throwing predicate skips the commit.
fn should_update_from_js(predicate: Function) -> ShouldUpdate {
    Rc::new(move |reading: &Reading| {
        let state = state_to_js(
            &reading.label,
            reading.width,
            reading.height,
            reading.entry.as_ref(),
        );
        match predicate.call1(&JsValue::NULL, &state) {
            Ok(result) => result.is_truthy(),
            Err(e) => {
                tracing::warn!("shouldUpdate threw: {:?}", e);
                false
            }
        }
    })
}

/// Dimensions handle for JavaScript.
#[wasm_bindgen]
pub struct WasmDimensions {
    inner: Dimensions<Element>,
}

#[wasm_bindgen]
impl WasmDimensions {
    /// Create a handle from an optional JSON configuration and polyfill constructor.
    ///
    /// # Errors
    ///
    /// Returns an error string if the configuration JSON is malformed.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>, polyfill: Option<Function>) -> Result<WasmDimensions, JsValue> {
        let config = match config_json {
            Some(json) => DimensionsConfig::from_json(&json).map_err(|e| e.to_string())?,
            None => DimensionsConfig::default(),
        };

        let mut options: Options<Element> = Options::from_config(config);
        if let Some(constructor) = polyfill {
            options = options.polyfill(Rc::new(JsObserverFactory::new(constructor)));
        }

        Ok(Self {
            inner: Dimensions::new(
                Rc::new(WebPlatform),
                Rc::new(AnimationFrameScheduler::new()),
                options,
            ),
        })
    }

    /// Observe `element`, or restart on the current one.
    pub fn observe(&self, element: Option<Element>) {
        self.inner.observe(element);
    }

    /// Stop observing.
    pub fn unobserve(&self) {
        self.inner.unobserve();
    }

    /// Committed width.
    #[wasm_bindgen(getter)]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.inner.width()
    }

    /// Committed height.
    #[wasm_bindgen(getter)]
    #[must_use]
    pub fn height(&self) -> f64 {
        self.inner.height()
    }

    /// Committed breakpoint label.
    #[wasm_bindgen(getter, js_name = currentBreakpoint)]
    #[must_use]
    pub fn current_breakpoint(&self) -> String {
        self.inner.label()
    }

    /// The `ResizeObserverEntry` behind the committed reading.
    #[wasm_bindgen(getter)]
    #[must_use]
    pub fn entry(&self) -> JsValue {
        self.inner
            .entry()
            .map_or(JsValue::UNDEFINED, |entry| entry_to_js(&entry))
    }

    /// Committed box sizes as JSON.
    #[wasm_bindgen(js_name = entryJson)]
    #[must_use]
    pub fn entry_json(&self) -> Option<String> {
        self.inner.entry().and_then(|entry| entry.to_json().ok())
    }

    /// Committed reading as JSON.
    #[wasm_bindgen(js_name = readingJson)]
    #[must_use]
    pub fn reading_json(&self) -> String {
        self.inner.reading().to_json().unwrap_or_default()
    }

    /// Set or clear the resize callback.
    #[wasm_bindgen(js_name = setOnResize)]
    pub fn set_on_resize(&self, callback: Option<Function>) {
        let callback = callback.map(|f| {
            Box::new(move |event: &ResizeEvent<Element>| {
                let js_event = JsResizeEvent::new(event);
                if let Err(e) = f.call1(&JsValue::NULL, &js_event.value) {
                    tracing::warn!("onResize callback threw: {:?}", e);
                }
            }) as OnResize<Element>
        });
        self.inner.set_on_resize(callback);
    }

    /// Set or clear the commit predicate.
    #[wasm_bindgen(js_name = setShouldUpdate)]
    pub fn set_should_update(&self, predicate: Option<Function>) {
        self.inner
            .set_should_update(predicate.map(should_update_from_js));
    }

    /// Tear down observation and cancel any pending commit.
    pub fn dispose(&self) {
        self.inner.dispose();
    }
}
