use core_types::{ElementId, SpinDirection};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpinEventKind {
    // Boundaries
    Min,
    Max,
    // Spin lifecycle
    StartSpin,
    StartUpSpin,
    StartDownSpin,
    StopSpin,
    StopUpSpin,
    StopDownSpin,
    // Value
    Change,
}

impl SpinEventKind {
    pub const ALL: [SpinEventKind; 9] = [
        SpinEventKind::Min,
        SpinEventKind::Max,
        SpinEventKind::StartSpin,
        SpinEventKind::StartUpSpin,
        SpinEventKind::StartDownSpin,
        SpinEventKind::StopSpin,
        SpinEventKind::StopUpSpin,
        SpinEventKind::StopDownSpin,
        SpinEventKind::Change,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpinEventKind::Min => "min",
            SpinEventKind::Max => "max",
            SpinEventKind::StartSpin => "startspin",
            SpinEventKind::StartUpSpin => "startupspin",
            SpinEventKind::StartDownSpin => "startdownspin",
            SpinEventKind::StopSpin => "stopspin",
            SpinEventKind::StopUpSpin => "stopupspin",
            SpinEventKind::StopDownSpin => "stopdownspin",
            SpinEventKind::Change => "change",
        }
    }

    pub fn start_for(direction: SpinDirection) -> Self {
        match direction {
            SpinDirection::Up => SpinEventKind::StartUpSpin,
            SpinDirection::Down => SpinEventKind::StartDownSpin,
        }
    }

    pub fn stop_for(direction: SpinDirection) -> Self {
        match direction {
            SpinDirection::Up => SpinEventKind::StopUpSpin,
            SpinDirection::Down => SpinEventKind::StopDownSpin,
        }
    }
}

impl fmt::Display for SpinEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown spinner event name: {0:?}")]
pub struct UnknownEvent(pub String);

impl FromStr for SpinEventKind {
    type Err = UnknownEvent;

    /// Accepts the bare name (`"change"`) and the namespaced form
    /// (`"touchspin.on.change"`) binding adapters tend to use.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.trim().strip_prefix("touchspin.on.").unwrap_or(s.trim());
        SpinEventKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(bare))
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

/// One emission. Not persisted; handed to handlers by reference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpinEvent {
    pub kind: SpinEventKind,
    pub value: f64,
    pub target: ElementId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

pub type Handler = Rc<RefCell<dyn FnMut(&SpinEvent)>>;

struct Subscription {
    id: HandlerId,
    kind: SpinEventKind,
    handler: Handler,
}

/// Synchronous, ordered event delivery.
///
/// Handlers run on the caller's stack in registration order. A panicking
/// handler is logged and skipped; the rest of the emission still runs.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscriptions: Vec<Subscription>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&mut self, kind: SpinEventKind, handler: impl FnMut(&SpinEvent) + 'static) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        let handler: Handler = Rc::new(RefCell::new(handler));
        self.subscriptions.push(Subscription { id, kind, handler });
        id
    }

    /// Remove one handler, or every handler for `kind` when `handler` is `None`.
    ///
    /// Returns how many subscriptions were removed.
    pub fn off(&mut self, kind: SpinEventKind, handler: Option<HandlerId>) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions
            .retain(|s| s.kind != kind || handler.is_some_and(|h| h != s.id));
        before - self.subscriptions.len()
    }

    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }

    pub fn handler_count(&self, kind: SpinEventKind) -> usize {
        self.subscriptions.iter().filter(|s| s.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn is_subscribed(&self, id: HandlerId) -> bool {
        self.subscriptions.iter().any(|s| s.id == id)
    }

    /// Handlers for `kind` in registration order, detached from the bus.
    fn listeners(&self, kind: SpinEventKind) -> Vec<(HandlerId, Handler)> {
        self.subscriptions
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| (s.id, Rc::clone(&s.handler)))
            .collect()
    }

    /// Deliver `event` to every handler registered for its kind.
    ///
    /// Returns the number of handlers that completed without panicking.
    pub fn emit(&mut self, event: SpinEvent) -> usize {
        log::trace!(target: "touchspin.bus", "emit {} value={} target={}", event.kind, event.value, event.target);
        self.listeners(event.kind)
            .into_iter()
            .filter(|(_, handler)| call(handler, &event))
            .count()
    }
}

/// Deliver `event` through a shared bus.
///
/// The bus is not borrowed while a handler runs, so handlers may subscribe,
/// unsubscribe, or trigger further emissions on the same bus. A handler
/// removed mid-emission is not called; a handler that is already running
/// does not receive the nested event.
pub fn dispatch(bus: &RefCell<EventBus>, event: SpinEvent) -> usize {
    log::trace!(target: "touchspin.bus", "emit {} value={} target={}", event.kind, event.value, event.target);
    let listeners = bus.borrow().listeners(event.kind);
    let mut delivered = 0;
    for (id, handler) in listeners {
        if !bus.borrow().is_subscribed(id) {
            continue;
        }
        if call(&handler, &event) {
            delivered += 1;
        }
    }
    delivered
}

fn call(handler: &Handler, event: &SpinEvent) -> bool {
    let Ok(mut handler) = handler.try_borrow_mut() else {
        log::debug!(target: "touchspin.bus", "{} handler is already running; skipping nested delivery", event.kind);
        return false;
    };
    run_isolated(event.kind.name(), || (&mut *handler)(event)).is_some()
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

/// Run user code, turning a panic into a logged `None`.
pub fn run_isolated<R>(what: &str, f: impl FnOnce() -> R) -> Option<R> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(r) => Some(r),
        Err(payload) => {
            log::warn!(target: "touchspin.bus", "{what}: user code panicked: {}", panic_message(&*payload));
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string panic payload>")
}
