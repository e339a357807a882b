//! The per-element spinner: settings, value pipeline, spin timing and events
//! composed behind one API.
//!
//! Operations never call event handlers themselves. They queue events in an
//! [`Outbox`] that the caller delivers once it has released the engine, so
//! handlers are free to read the document and to call back into the spinner.

use crate::clock::Clock;
use crate::dom::HostDocument;
use crate::renderer::{RendererContract, WrapperHandle};
use crate::scheduler::{SpinPhase, SpinScheduler, StartOutcome};
use crate::settings::{Settings, SettingsResolver, SpinOptions};
use crate::value::{self, CheckOptions, CheckOutcome, ValueEngine};
use bus::{EventBus, HandlerId, SpinEvent, SpinEventKind};
use core_types::{ElementId, SpinDirection};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

const LOG_TARGET: &str = "touchspin.spin";

/// Ticks run by one `poll` before missed ones are dropped.
const MAX_CATCH_UP: usize = 32;

/// Boundaries a step or check ran into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hits {
    pub min: bool,
    pub max: bool,
}

impl Hits {
    pub fn toward(self, direction: SpinDirection) -> bool {
        match direction {
            SpinDirection::Up => self.max,
            SpinDirection::Down => self.min,
        }
    }
}

/// Events queued by engine operations, bound for the engine's bus.
#[must_use = "queued events are lost unless delivered"]
pub struct Outbox {
    bus: Rc<RefCell<EventBus>>,
    events: Vec<SpinEvent>,
    close: bool,
}

impl Outbox {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && !self.close
    }

    /// Emit in order. After a destroy the bus is cleared once its final
    /// events are out.
    pub fn deliver(self) {
        for event in self.events {
            bus::dispatch(&self.bus, event);
        }
        if self.close {
            self.bus.borrow_mut().clear();
        }
    }
}

pub struct SpinEngine {
    element: ElementId,
    doc: Rc<RefCell<HostDocument>>,
    clock: Rc<dyn Clock>,
    settings: Rc<Settings>,
    scheduler: SpinScheduler,
    bus: Rc<RefCell<EventBus>>,
    outbox: Vec<SpinEvent>,
    /// Destroyed since the last drain; the bus is cleared on delivery.
    close_bus: bool,
    renderer: Box<dyn RendererContract>,
    wrapper: WrapperHandle,
    /// Text as of the last commit; a commit that ends elsewhere is a change.
    committed: String,
    disabled: bool,
    destroyed: bool,
}

impl SpinEngine {
    /// Bind to `element`, which the caller has checked is a text input.
    ///
    /// The initial sanitising pass commits silently: there are no subscribers yet.
    pub fn attach(
        element: ElementId,
        doc: Rc<RefCell<HostDocument>>,
        clock: Rc<dyn Clock>,
        options: &SpinOptions,
        mut renderer: Box<dyn RendererContract>,
    ) -> Self {
        let (settings, wrapper, committed, disabled) = {
            let mut d = doc.borrow_mut();
            let settings = SettingsResolver::resolve(
                d.attributes(element),
                options,
                None,
                &renderer.defaults(),
            );

            if d.value(element).is_some_and(str::is_empty) && !settings.init_value.is_empty() {
                d.set_value(element, settings.init_value.clone());
            }

            let wrapper = match renderer.create_wrapper(&mut d, element, &settings) {
                Ok(handle) => handle,
                Err(err) => {
                    log::warn!(target: "touchspin.lifecycle", "renderer failed for {element}: {err}; running headless");
                    WrapperHandle::headless(element)
                }
            };

            let current = d.value(element).unwrap_or("").to_string();
            if !current.is_empty() {
                let commit = CheckOptions { commit: true, populate: false };
                ValueEngine::new(&settings).check_value(&mut d, element, &current, commit);
            }
            let committed = d.value(element).unwrap_or("").to_string();

            let disabled = element_disabled(&d, element);
            if disabled {
                renderer.set_disabled(&mut d, &wrapper, true);
            }
            (Rc::new(settings), wrapper, committed, disabled)
        };

        log::debug!(target: "touchspin.lifecycle", "attached to {element} with value {committed:?}");
        Self {
            element,
            doc,
            clock,
            settings,
            scheduler: SpinScheduler::new(),
            bus: Rc::new(RefCell::new(EventBus::new())),
            outbox: Vec::new(),
            close_bus: false,
            renderer,
            wrapper,
            committed,
            disabled,
            destroyed: false,
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn settings(&self) -> Rc<Settings> {
        Rc::clone(&self.settings)
    }

    pub fn wrapper(&self) -> &WrapperHandle {
        &self.wrapper
    }

    pub fn document(&self) -> &Rc<RefCell<HostDocument>> {
        &self.doc
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn spin_phase(&self) -> SpinPhase {
        self.scheduler.phase()
    }

    pub fn spin_direction(&self) -> Option<SpinDirection> {
        self.scheduler.direction()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Live `disabled`/`readonly` state of the bound element.
    pub fn is_disabled(&self) -> bool {
        element_disabled(&self.doc.borrow(), self.element)
    }

    /// Whether interaction is possible right now.
    pub fn is_interactive(&self) -> bool {
        !self.destroyed && !self.is_disabled()
    }

    pub fn up_once(&mut self) -> Hits {
        self.step_once(SpinDirection::Up)
    }

    pub fn down_once(&mut self) -> Hits {
        self.step_once(SpinDirection::Down)
    }

    pub fn step_once(&mut self, direction: SpinDirection) -> Hits {
        if !self.is_interactive() {
            return Hits::default();
        }
        let mut events = Vec::new();
        let hits = self.step(direction, self.settings.step, None, &mut events);
        self.queue(events);
        hits
    }

    pub fn start_up_spin(&mut self) {
        self.start_spin(SpinDirection::Up);
    }

    pub fn start_down_spin(&mut self) {
        self.start_spin(SpinDirection::Down);
    }

    pub fn start_spin(&mut self, direction: SpinDirection) {
        if !self.is_interactive() {
            return;
        }
        let now = self.clock.now();
        let replaced = match self.scheduler.start(direction, now, &self.settings) {
            StartOutcome::AlreadyActive => return,
            StartOutcome::Started { replaced } => replaced,
        };
        let mut events = Vec::new();
        if let Some(old) = replaced {
            self.push_stop_events(old.direction, &mut events);
        }
        let value = self.current_value();
        events.push(self.event(SpinEventKind::StartSpin, value));
        events.push(self.event(SpinEventKind::start_for(direction), value));
        self.queue(events);
    }

    /// Cancel any held spin. Safe without one.
    pub fn stop_spin(&mut self) {
        if self.destroyed {
            return;
        }
        let mut events = Vec::new();
        self.stop_into(&mut events);
        self.queue(events);
    }

    /// Run every tick due at `now`.
    pub fn poll(&mut self, now: Instant) {
        if self.destroyed {
            return;
        }
        for _ in 0..MAX_CATCH_UP {
            let Some(tick) = self.scheduler.due_tick(now) else {
                return;
            };
            let mut events = Vec::new();
            if tick.generation != self.settings.generation {
                log::debug!(
                    target: LOG_TARGET,
                    "{}: settings changed mid-spin, abandoning {} spin",
                    self.element,
                    tick.direction.as_str()
                );
                self.stop_into(&mut events);
                self.queue(events);
                return;
            }
            if self.is_disabled() {
                self.stop_into(&mut events);
                self.queue(events);
                return;
            }
            let (step, capped) = value::boosted_step(self.settings.step, tick.spincount, &self.settings);
            self.step(tick.direction, step, capped.then_some(step), &mut events);
            self.queue(events);
            if !self.scheduler.is_active() {
                return;
            }
        }
        log::debug!(target: LOG_TARGET, "{}: dropping missed spin ticks", self.element);
        self.scheduler.resync(now);
    }

    /// Write `value` through the full pipeline.
    pub fn set_value<V: ToString>(&mut self, value: V) {
        if self.destroyed {
            return;
        }
        let text = value.to_string();
        let mut events = Vec::new();
        self.check_into(&text, &mut events);
        self.queue(events);
    }

    /// The number the element currently shows, unsanitised.
    pub fn get_value(&self) -> Option<f64> {
        if self.destroyed {
            return None;
        }
        self.current_value_opt()
    }

    /// Commit whatever the element holds now (what a blur does).
    pub fn commit(&mut self) {
        if self.destroyed {
            return;
        }
        let text = self.text();
        let mut events = Vec::new();
        self.check_into(&text, &mut events);
        self.queue(events);
    }

    /// Replace settings with a new generation built on top of the current one.
    pub fn update_settings(&mut self, options: &SpinOptions) {
        if self.destroyed {
            return;
        }
        let next = {
            let d = self.doc.borrow();
            SettingsResolver::resolve(
                d.attributes(self.element),
                options,
                Some(self.settings.as_ref()),
                &self.renderer.defaults(),
            )
        };
        self.settings = Rc::new(next);
        {
            let mut d = self.doc.borrow_mut();
            self.renderer
                .update_buttons(&mut d, &mut self.wrapper, &self.settings);
            self.renderer
                .update_prefix_postfix(&mut d, &mut self.wrapper, &self.settings);
        }
        if !self.text().is_empty() {
            self.commit();
        }
    }

    /// Re-read `disabled`/`readonly` and reflect it in the chrome.
    pub fn sync_disabled(&mut self) {
        if self.destroyed {
            return;
        }
        let disabled = self.is_disabled();
        if disabled == self.disabled {
            return;
        }
        self.disabled = disabled;
        {
            let mut d = self.doc.borrow_mut();
            self.renderer.set_disabled(&mut d, &self.wrapper, disabled);
        }
        if disabled {
            self.stop_spin();
        }
    }

    pub fn on(&mut self, kind: SpinEventKind, handler: impl FnMut(&SpinEvent) + 'static) -> Option<HandlerId> {
        if self.destroyed {
            return None;
        }
        Some(self.bus.borrow_mut().on(kind, handler))
    }

    pub fn off(&mut self, kind: SpinEventKind, handler: Option<HandlerId>) -> usize {
        self.bus.borrow_mut().off(kind, handler)
    }

    /// Hand over everything queued since the last call.
    pub fn take_outbox(&mut self) -> Outbox {
        Outbox {
            bus: Rc::clone(&self.bus),
            events: std::mem::take(&mut self.outbox),
            close: std::mem::take(&mut self.close_bus),
        }
    }

    /// Deliver queued events right away. For an engine owned outright; a
    /// shared engine is drained with [`take_outbox`](Self::take_outbox) and
    /// delivered after its borrow ends.
    pub fn flush(&mut self) {
        self.take_outbox().deliver();
    }

    /// Stop, unsubscribe everyone, and remove the chrome. Idempotent.
    ///
    /// Handlers still see the stop events of an active spin; they are
    /// unsubscribed when the outbox holding those events is delivered.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.stop_spin();
        self.close_bus = true;
        let handle = std::mem::replace(&mut self.wrapper, WrapperHandle::headless(self.element));
        self.renderer.destroy(&mut self.doc.borrow_mut(), handle);
        self.destroyed = true;
        log::debug!(target: "touchspin.lifecycle", "destroyed spinner on {}", self.element);
    }

    /// One step of `step` in `direction`, then boundary bookkeeping.
    fn step(
        &mut self,
        direction: SpinDirection,
        step: f64,
        snap: Option<f64>,
        events: &mut Vec<SpinEvent>,
    ) -> Hits {
        let outcome = {
            let mut d = self.doc.borrow_mut();
            let engine = ValueEngine::new(&self.settings);
            let text = d.value(self.element).unwrap_or("").to_string();
            let candidate = match engine.parse(&text) {
                Some(current) => engine.step_from(current, step, direction, snap),
                None => match self.settings.first_click_value_if_empty {
                    Some(first) => first,
                    None => engine.step_from(engine.recover(false), step, direction, None),
                },
            };
            engine.check_number(&mut d, self.element, candidate, true)
        };
        log::trace!(
            target: LOG_TARGET,
            "{} step {} by {step} -> {}",
            self.element,
            direction.as_str(),
            outcome.text
        );
        self.record(outcome, events)
    }

    fn check_into(&mut self, text: &str, events: &mut Vec<SpinEvent>) -> Hits {
        let outcome = {
            let mut d = self.doc.borrow_mut();
            let commit = CheckOptions { commit: true, populate: false };
            ValueEngine::new(&self.settings).check_value(&mut d, self.element, text, commit)
        };
        self.record(outcome, events)
    }

    /// Turn a committed outcome into events: boundaries, then change, then an
    /// automatic stop when a held spin ran into the limit it was moving toward.
    fn record(&mut self, outcome: CheckOutcome, events: &mut Vec<SpinEvent>) -> Hits {
        let hits = Hits {
            min: outcome.hit_min,
            max: outcome.hit_max,
        };
        if hits.min {
            events.push(self.event(SpinEventKind::Min, outcome.value));
        }
        if hits.max {
            events.push(self.event(SpinEventKind::Max, outcome.value));
        }
        if outcome.changed || outcome.text != self.committed {
            events.push(self.event(SpinEventKind::Change, outcome.value));
        }
        self.committed = outcome.text;

        if let Some(direction) = self.scheduler.direction() {
            if hits.toward(direction) {
                log::trace!(target: LOG_TARGET, "{} reached its limit, stopping", self.element);
                self.stop_into(events);
            }
        }
        hits
    }

    fn stop_into(&mut self, events: &mut Vec<SpinEvent>) {
        if let Some(session) = self.scheduler.stop() {
            self.push_stop_events(session.direction, events);
        }
    }

    fn push_stop_events(&self, direction: SpinDirection, events: &mut Vec<SpinEvent>) {
        let value = self.current_value();
        events.push(self.event(SpinEventKind::stop_for(direction), value));
        events.push(self.event(SpinEventKind::StopSpin, value));
    }

    fn queue(&mut self, events: Vec<SpinEvent>) {
        self.outbox.extend(events);
    }

    fn event(&self, kind: SpinEventKind, value: f64) -> SpinEvent {
        SpinEvent {
            kind,
            value,
            target: self.element,
        }
    }

    fn text(&self) -> String {
        self.doc
            .borrow()
            .value(self.element)
            .unwrap_or("")
            .to_string()
    }

    fn current_value_opt(&self) -> Option<f64> {
        self.doc.borrow().value(self.element).and_then(value::parse_number)
    }

    /// Payload for spin events; `NaN` while the field holds no number.
    fn current_value(&self) -> f64 {
        self.current_value_opt().unwrap_or(f64::NAN)
    }
}

impl std::fmt::Debug for SpinEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinEngine")
            .field("element", &self.element)
            .field("generation", &self.settings.generation)
            .field("phase", &self.scheduler.phase())
            .field("committed", &self.committed)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

fn element_disabled(doc: &HostDocument, element: ElementId) -> bool {
    doc.has_attr(element, "disabled") || doc.has_attr(element, "readonly")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::renderer::NullRenderer;
    use std::time::Duration;

    struct Fixture {
        doc: Rc<RefCell<HostDocument>>,
        clock: ManualClock,
        input: ElementId,
    }

    impl Fixture {
        fn new(value: &str) -> Self {
            let mut doc = HostDocument::new();
            let body = doc.body();
            let input = doc.create_element_with("input", &[("type", "text"), ("value", value)]);
            doc.append_child(body, input).unwrap();
            Self {
                doc: Rc::new(RefCell::new(doc)),
                clock: ManualClock::new(),
                input,
            }
        }

        fn attach(&self, options: SpinOptions) -> SpinEngine {
            SpinEngine::attach(
                self.input,
                Rc::clone(&self.doc),
                Rc::new(self.clock.clone()),
                &options,
                Box::new(NullRenderer),
            )
        }

        fn value(&self) -> String {
            self.doc.borrow().value(self.input).unwrap_or("").to_string()
        }
    }

    fn record(engine: &mut SpinEngine) -> Rc<RefCell<Vec<(SpinEventKind, f64)>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        for kind in SpinEventKind::ALL {
            let log = Rc::clone(&log);
            engine.on(kind, move |e| log.borrow_mut().push((e.kind, e.value)));
        }
        log
    }

    #[test]
    fn attach_sanitises_silently() {
        let fx = Fixture::new("42");
        let mut engine = fx.attach(SpinOptions::new().step(5.0));
        let log = record(&mut engine);
        assert_eq!(fx.value(), "40");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn attach_uses_initval_for_empty_field() {
        let fx = Fixture::new("");
        fx.attach(SpinOptions::new().init_value("12"));
        assert_eq!(fx.value(), "12");
    }

    #[test]
    fn up_once_steps_and_emits_change() {
        let fx = Fixture::new("10");
        let mut engine = fx.attach(SpinOptions::new());
        let log = record(&mut engine);

        engine.up_once();
        assert!(log.borrow().is_empty());
        engine.flush();
        assert_eq!(fx.value(), "11");
        assert_eq!(*log.borrow(), vec![(SpinEventKind::Change, 11.0)]);
    }

    #[test]
    fn boundary_precedes_change() {
        let fx = Fixture::new("99");
        let mut engine = fx.attach(SpinOptions::new());
        let log = record(&mut engine);

        engine.up_once();
        engine.up_once();
        engine.flush();
        assert_eq!(
            *log.borrow(),
            vec![
                (SpinEventKind::Max, 100.0),
                (SpinEventKind::Change, 100.0),
                (SpinEventKind::Max, 100.0),
            ]
        );
    }

    #[test]
    fn first_click_populates_empty_field() {
        let fx = Fixture::new("");
        let mut engine = fx.attach(SpinOptions::new().first_click_value_if_empty(Some(25.0)));
        engine.up_once();
        assert_eq!(fx.value(), "25");
    }

    #[test]
    fn disabled_element_ignores_steps() {
        let fx = Fixture::new("5");
        fx.doc.borrow_mut().set_flag(fx.input, "disabled", true);
        let mut engine = fx.attach(SpinOptions::new());
        engine.up_once();
        engine.start_up_spin();
        assert_eq!(fx.value(), "5");
        assert_eq!(engine.spin_phase(), SpinPhase::Idle);
    }

    #[test]
    fn spin_ticks_after_delay() {
        let fx = Fixture::new("0");
        let mut engine = fx.attach(SpinOptions::new());
        engine.start_up_spin();
        assert_eq!(engine.spin_phase(), SpinPhase::Armed);

        fx.clock.advance(Duration::from_millis(499));
        engine.poll(fx.clock.now());
        assert_eq!(fx.value(), "0");

        fx.clock.advance(Duration::from_millis(1));
        engine.poll(fx.clock.now());
        assert_eq!(fx.value(), "1");
        assert_eq!(engine.spin_phase(), SpinPhase::Spinning);
    }

    #[test]
    fn destroy_is_idempotent_and_disables_api() {
        let fx = Fixture::new("3");
        let mut engine = fx.attach(SpinOptions::new());
        engine.destroy();
        engine.destroy();
        engine.up_once();
        engine.set_value(9);
        assert!(engine.is_destroyed());
        assert_eq!(engine.get_value(), None);
        assert_eq!(fx.value(), "3");
        assert!(engine.on(SpinEventKind::Change, |_| {}).is_none());
    }

    #[test]
    fn destroy_delivers_stop_events_then_unsubscribes() {
        let fx = Fixture::new("3");
        let mut engine = fx.attach(SpinOptions::new());
        let log = record(&mut engine);
        engine.start_down_spin();
        engine.flush();
        log.borrow_mut().clear();

        engine.destroy();
        let outbox = engine.take_outbox();
        assert!(!outbox.is_empty());
        outbox.deliver();
        assert_eq!(
            *log.borrow(),
            vec![(SpinEventKind::StopDownSpin, 3.0), (SpinEventKind::StopSpin, 3.0)]
        );
        assert!(engine.take_outbox().is_empty());
    }
}
