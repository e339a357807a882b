//! Attach/destroy and the per-document instance registry.
//!
//! The registry owns every engine; callers get [`SpinnerHandle`]s holding
//! weak references, so a handle outliving its spinner degrades to no-ops.

use crate::clock::{Clock, SystemClock};
use crate::dom::HostDocument;
use crate::engine::{Hits, SpinEngine};
use crate::error::AttachError;
use crate::interactions::{self, DomEvent};
use crate::renderer::{NullRenderer, RendererContract};
use crate::scheduler::SpinPhase;
use crate::settings::{Settings, SpinOptions};
use bus::{HandlerId, SpinEvent, SpinEventKind};
use core_types::ElementId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Instant;

const LOG_TARGET: &str = "touchspin.lifecycle";

type EngineCell = Rc<RefCell<SpinEngine>>;
type RendererFactory = Box<dyn Fn() -> Box<dyn RendererContract>>;

#[derive(Default)]
struct Registry {
    engines: HashMap<ElementId, EngineCell>,
}

impl Registry {
    /// Snapshot, so engines can be driven while the registry is unborrowed.
    fn all(&self) -> Vec<EngineCell> {
        let mut ids: Vec<_> = self.engines.keys().copied().collect();
        ids.sort();
        ids.iter().filter_map(|id| self.engines.get(id).cloned()).collect()
    }
}

/// Owns the document, the clock and every spinner bound into the document.
pub struct SpinnerHost {
    doc: Rc<RefCell<HostDocument>>,
    clock: Rc<dyn Clock>,
    registry: Rc<RefCell<Registry>>,
    renderer_factory: RendererFactory,
}

impl SpinnerHost {
    pub fn new(doc: HostDocument) -> Self {
        Self {
            doc: Rc::new(RefCell::new(doc)),
            clock: Rc::new(SystemClock),
            registry: Rc::new(RefCell::new(Registry::default())),
            renderer_factory: Box::new(|| Box::new(NullRenderer) as Box<dyn RendererContract>),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    /// Renderer used by [`attach`](Self::attach); headless by default.
    pub fn with_renderer<R, F>(mut self, factory: F) -> Self
    where
        R: RendererContract + 'static,
        F: Fn() -> R + 'static,
    {
        self.renderer_factory = Box::new(move || Box::new(factory()) as Box<dyn RendererContract>);
        self
    }

    pub fn document(&self) -> &Rc<RefCell<HostDocument>> {
        &self.doc
    }

    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Bind a spinner to `element`.
    ///
    /// Attaching to an element that already has a live spinner returns the
    /// existing handle and ignores `options`.
    pub fn attach(&self, element: ElementId, options: SpinOptions) -> Result<SpinnerHandle, AttachError> {
        self.attach_with_renderer(element, options, (self.renderer_factory)())
    }

    pub fn attach_with_renderer(
        &self,
        element: ElementId,
        options: SpinOptions,
        renderer: Box<dyn RendererContract>,
    ) -> Result<SpinnerHandle, AttachError> {
        if let Some(existing) = self.get(element) {
            log::debug!(target: LOG_TARGET, "{element} already has a spinner; returning it");
            return Ok(existing);
        }
        self.check_bindable(element).inspect_err(|err| {
            log::warn!(target: LOG_TARGET, "attach refused: {err}");
        })?;

        let engine = SpinEngine::attach(
            element,
            Rc::clone(&self.doc),
            Rc::clone(&self.clock),
            &options,
            renderer,
        );
        let cell = Rc::new(RefCell::new(engine));
        let handle = self.handle_for(element, &cell);
        self.registry.borrow_mut().engines.insert(element, cell);
        Ok(handle)
    }

    /// The live spinner on `element`, if any.
    pub fn get(&self, element: ElementId) -> Option<SpinnerHandle> {
        let registry = self.registry.borrow();
        let cell = registry.engines.get(&element)?;
        let live = cell.try_borrow().map_or(true, |e| !e.is_destroyed());
        live.then(|| self.handle_for(element, cell))
    }

    pub fn is_attached(&self, element: ElementId) -> bool {
        self.get(element).is_some()
    }

    pub fn attached(&self) -> Vec<ElementId> {
        let mut ids: Vec<_> = self.registry.borrow().engines.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Run due spin ticks everywhere. Spinners whose element left the
    /// document are destroyed and unregistered.
    pub fn poll(&self) {
        let now = self.clock.now();
        let mut gone = Vec::new();
        let engines = self.registry.borrow().all();
        for cell in engines {
            let outbox = {
                let Ok(mut engine) = cell.try_borrow_mut() else {
                    continue;
                };
                if !self.doc.borrow().exists(engine.element()) {
                    gone.push(engine.element());
                    continue;
                }
                engine.poll(now);
                engine.take_outbox()
            };
            outbox.deliver();
        }
        for element in gone {
            log::debug!(target: LOG_TARGET, "{element} left the document; dropping its spinner");
            self.destroy(element);
        }
    }

    /// Earliest pending spin tick across all spinners.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.registry
            .borrow()
            .all()
            .iter()
            .filter_map(|cell| cell.try_borrow().ok()?.next_deadline())
            .min()
    }

    /// Route a host DOM event to every spinner. Returns `true` if one consumed it.
    pub fn dispatch(&self, event: DomEvent) -> bool {
        let mut consumed = false;
        let engines = self.registry.borrow().all();
        for cell in engines {
            let outbox = match cell.try_borrow_mut() {
                Ok(mut engine) => {
                    consumed |= interactions::route(&mut engine, &event);
                    engine.take_outbox()
                }
                Err(_) => {
                    log::debug!(target: LOG_TARGET, "skipping busy spinner for {event:?}");
                    continue;
                }
            };
            outbox.deliver();
        }
        consumed
    }

    /// Move focus to `element`, delivering the focus events that implies.
    pub fn focus(&self, element: ElementId) {
        let previous = self.doc.borrow_mut().focus(element);
        if let Some(prev) = previous.filter(|p| *p != element) {
            self.dispatch(DomEvent::FocusOut {
                target: prev,
                related: Some(element),
            });
        }
        self.dispatch(DomEvent::FocusIn { target: element });
    }

    pub fn blur(&self) {
        let previous = self.doc.borrow_mut().blur();
        if let Some(prev) = previous {
            self.dispatch(DomEvent::FocusOut {
                target: prev,
                related: None,
            });
        }
    }

    /// Destroy the spinner on `element`. No-op without one.
    pub fn destroy(&self, element: ElementId) {
        if let Some(handle) = self.get(element) {
            handle.destroy();
        } else {
            self.registry.borrow_mut().engines.remove(&element);
        }
    }

    pub fn destroy_all(&self) {
        for element in self.attached() {
            self.destroy(element);
        }
    }

    fn check_bindable(&self, element: ElementId) -> Result<(), AttachError> {
        let doc = self.doc.borrow();
        let Some(tag) = doc.tag(element) else {
            return Err(AttachError::UnknownElement(element));
        };
        if !doc.is_text_input(element) {
            let tag = match doc.attr(element, "type") {
                Some(ty) if tag == "input" => format!("input type={ty}"),
                _ => tag.to_string(),
            };
            return Err(AttachError::NotAnInput { element, tag });
        }
        Ok(())
    }

    fn handle_for(&self, element: ElementId, cell: &EngineCell) -> SpinnerHandle {
        SpinnerHandle {
            element,
            engine: Rc::downgrade(cell),
            registry: Rc::downgrade(&self.registry),
        }
    }
}

/// Caller-side reference to one spinner.
///
/// Every method is a no-op (returning `None`/defaults) once the spinner is
/// destroyed. Event handlers may call back into their own spinner: events
/// are delivered only after the operation that produced them has finished.
#[derive(Clone)]
pub struct SpinnerHandle {
    element: ElementId,
    engine: Weak<RefCell<SpinEngine>>,
    registry: Weak<RefCell<Registry>>,
}

impl SpinnerHandle {
    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn is_destroyed(&self) -> bool {
        match self.engine.upgrade() {
            None => true,
            Some(cell) => cell.try_borrow().is_ok_and(|e| e.is_destroyed()),
        }
    }

    pub fn up_once(&self) -> Option<Hits> {
        self.with("upOnce", |e| e.up_once())
    }

    pub fn down_once(&self) -> Option<Hits> {
        self.with("downOnce", |e| e.down_once())
    }

    pub fn start_up_spin(&self) {
        self.with("startUpSpin", |e| e.start_up_spin());
    }

    pub fn start_down_spin(&self) {
        self.with("startDownSpin", |e| e.start_down_spin());
    }

    pub fn stop_spin(&self) {
        self.with("stopSpin", |e| e.stop_spin());
    }

    pub fn set_value<V: ToString>(&self, value: V) {
        self.with("setValue", |e| e.set_value(value));
    }

    pub fn get_value(&self) -> Option<f64> {
        self.with("getValue", |e| e.get_value()).flatten()
    }

    pub fn update_settings(&self, options: SpinOptions) {
        self.with("updateSettings", |e| e.update_settings(&options));
    }

    pub fn settings(&self) -> Option<Rc<Settings>> {
        self.with("settings", |e| e.settings())
    }

    pub fn spin_phase(&self) -> SpinPhase {
        self.with("spinPhase", |e| e.spin_phase())
            .unwrap_or(SpinPhase::Idle)
    }

    pub fn sync_disabled(&self) {
        self.with("syncDisabled", |e| e.sync_disabled());
    }

    pub fn on(&self, kind: SpinEventKind, handler: impl FnMut(&SpinEvent) + 'static) -> Option<HandlerId> {
        self.with("on", |e| e.on(kind, handler)).flatten()
    }

    /// Subscribe by event name (`"change"`, `"touchspin.on.startspin"`, ...).
    pub fn on_named(&self, name: &str, handler: impl FnMut(&SpinEvent) + 'static) -> Option<HandlerId> {
        match name.parse::<SpinEventKind>() {
            Ok(kind) => self.on(kind, handler),
            Err(err) => {
                log::warn!(target: LOG_TARGET, "{err}");
                None
            }
        }
    }

    pub fn off(&self, kind: SpinEventKind, handler: Option<HandlerId>) -> usize {
        self.with("off", |e| e.off(kind, handler)).unwrap_or(0)
    }

    /// Tear the spinner down and unregister it. Idempotent.
    pub fn destroy(&self) {
        let Some(cell) = self.engine.upgrade() else {
            return;
        };
        if self.with("destroy", |e| e.destroy()).is_none() {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.borrow_mut();
            if registry
                .engines
                .get(&self.element)
                .is_some_and(|c| Rc::ptr_eq(c, &cell))
            {
                registry.engines.remove(&self.element);
            }
        }
    }

    fn with<R>(&self, op: &str, f: impl FnOnce(&mut SpinEngine) -> R) -> Option<R> {
        let Some(cell) = self.engine.upgrade() else {
            log::debug!(target: LOG_TARGET, "{op} on {}: spinner not initialized", self.element);
            return None;
        };
        let (result, outbox) = {
            // Only a calculation hook calling back into its own spinner gets here.
            let Ok(mut engine) = cell.try_borrow_mut() else {
                log::debug!(target: LOG_TARGET, "{op} on {}: spinner is mid-calculation", self.element);
                return None;
            };
            if engine.is_destroyed() {
                log::debug!(target: LOG_TARGET, "{op} on {}: spinner destroyed", self.element);
                return None;
            }
            let result = f(&mut engine);
            (result, engine.take_outbox())
        };
        outbox.deliver();
        Some(result)
    }
}

impl std::fmt::Debug for SpinnerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinnerHandle")
            .field("element", &self.element)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn host_with_input(value: &str) -> (SpinnerHost, ElementId) {
        let mut doc = HostDocument::new();
        let body = doc.body();
        let input = doc.create_element_with("input", &[("type", "number"), ("value", value)]);
        doc.append_child(body, input).unwrap();
        (SpinnerHost::new(doc).with_clock(ManualClock::new()), input)
    }

    #[test]
    fn attach_twice_returns_the_same_spinner() {
        let (host, input) = host_with_input("5");
        let a = host.attach(input, SpinOptions::new().step(1.0)).unwrap();
        let b = host.attach(input, SpinOptions::new().step(10.0)).unwrap();

        b.up_once();
        assert_eq!(a.get_value(), Some(6.0));
        assert_eq!(host.attached(), vec![input]);
    }

    #[test]
    fn attach_refuses_non_inputs_without_mutation() {
        let (host, _) = host_with_input("5");
        let div = host.document().borrow_mut().create_element("div");
        let checkbox = host
            .document()
            .borrow_mut()
            .create_element_with("input", &[("type", "checkbox")]);

        assert!(matches!(
            host.attach(div, SpinOptions::new()),
            Err(AttachError::NotAnInput { .. })
        ));
        assert!(matches!(
            host.attach(checkbox, SpinOptions::new()),
            Err(AttachError::NotAnInput { .. })
        ));
        assert_eq!(
            host.attach(ElementId(999), SpinOptions::new()).unwrap_err(),
            AttachError::UnknownElement(ElementId(999))
        );
        assert!(host.attached().is_empty());
    }

    #[test]
    fn destroyed_handle_is_inert() {
        let (host, input) = host_with_input("5");
        let handle = host.attach(input, SpinOptions::new()).unwrap();
        handle.destroy();
        handle.destroy();

        assert!(handle.is_destroyed());
        assert_eq!(handle.up_once(), None);
        assert_eq!(handle.get_value(), None);
        assert!(!host.is_attached(input));
        assert_eq!(host.document().borrow().value(input), Some("5"));
    }

    #[test]
    fn change_handler_reads_the_new_value() {
        let (host, input) = host_with_input("5");
        let handle = host.attach(input, SpinOptions::new()).unwrap();
        let inner = handle.clone();
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        handle.on(SpinEventKind::Change, move |_| {
            *s.borrow_mut() = inner.get_value();
        });

        handle.up_once();
        assert_eq!(*seen.borrow(), Some(6.0));
    }

    #[test]
    fn spin_handler_can_stop_the_spin() {
        let (host, input) = host_with_input("5");
        let handle = host.attach(input, SpinOptions::new()).unwrap();
        let inner = handle.clone();
        handle.on(SpinEventKind::StartUpSpin, move |_| inner.stop_spin());
        let stops = Rc::new(RefCell::new(0));
        let s = Rc::clone(&stops);
        handle.on(SpinEventKind::StopSpin, move |_| *s.borrow_mut() += 1);

        handle.start_up_spin();
        assert_eq!(handle.spin_phase(), SpinPhase::Idle);
        assert_eq!(*stops.borrow(), 1);
    }

    #[test]
    fn handler_can_destroy_its_spinner() {
        let (host, input) = host_with_input("5");
        let handle = host.attach(input, SpinOptions::new()).unwrap();
        let inner = handle.clone();
        handle.on(SpinEventKind::Change, move |_| inner.destroy());
        let later = Rc::new(RefCell::new(0));
        let l = Rc::clone(&later);
        handle.on(SpinEventKind::Change, move |_| *l.borrow_mut() += 1);

        handle.up_once();
        assert!(handle.is_destroyed());
        assert!(!host.is_attached(input));
        assert_eq!(*later.borrow(), 0);
        assert_eq!(host.document().borrow().value(input), Some("6"));
    }

    #[test]
    fn handler_stepping_its_spinner_is_not_reentered() {
        let (host, input) = host_with_input("5");
        let handle = host.attach(input, SpinOptions::new()).unwrap();
        let inner = handle.clone();
        let calls = Rc::new(RefCell::new(0));
        let c = Rc::clone(&calls);
        handle.on(SpinEventKind::Change, move |_| {
            *c.borrow_mut() += 1;
            inner.up_once();
        });

        handle.up_once();
        assert_eq!(*calls.borrow(), 1);
        assert_eq!(handle.get_value(), Some(7.0));
    }

    #[test]
    fn unknown_event_name_is_not_subscribed() {
        let (host, input) = host_with_input("5");
        let handle = host.attach(input, SpinOptions::new()).unwrap();
        assert!(handle.on_named("touchspin.on.max", |_| {}).is_some());
        assert!(handle.on_named("spin", |_| {}).is_none());
    }

    #[test]
    fn removed_element_is_dropped_on_poll() {
        let (host, input) = host_with_input("5");
        let handle = host.attach(input, SpinOptions::new()).unwrap();
        host.document().borrow_mut().remove(input);

        host.poll();
        assert!(handle.is_destroyed());
        assert!(!host.is_attached(input));
    }
}
