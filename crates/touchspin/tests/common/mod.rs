#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use touchspin::{
    ElementId, HostDocument, ManualClock, PlainRenderer, SpinEvent, SpinEventKind, SpinOptions,
    SpinnerHandle, SpinnerHost,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub struct Page {
    pub host: SpinnerHost,
    pub clock: ManualClock,
    pub input: ElementId,
}

impl Page {
    /// One `<input type="text">` in the body, headless host.
    pub fn with_value(value: &str) -> Self {
        Self::build(value, &[], false)
    }

    pub fn with_attrs(value: &str, attrs: &[(&str, &str)]) -> Self {
        Self::build(value, attrs, false)
    }

    /// Same page, but spinners get plain markup chrome.
    pub fn rendered(value: &str) -> Self {
        Self::build(value, &[], true)
    }

    fn build(value: &str, attrs: &[(&str, &str)], rendered: bool) -> Self {
        init_logging();
        let mut doc = HostDocument::new();
        let body = doc.body();
        let mut all = vec![("type", "text"), ("value", value)];
        all.extend_from_slice(attrs);
        let input = doc.create_element_with("input", &all);
        doc.append_child(body, input).unwrap();

        let clock = ManualClock::new();
        let mut host = SpinnerHost::new(doc).with_clock(clock.clone());
        if rendered {
            host = host.with_renderer(|| PlainRenderer);
        }
        Self { host, clock, input }
    }

    pub fn attach(&self, options: SpinOptions) -> SpinnerHandle {
        self.host.attach(self.input, options).unwrap()
    }

    pub fn value(&self) -> String {
        self.host
            .document()
            .borrow()
            .value(self.input)
            .unwrap_or("")
            .to_string()
    }

    pub fn type_text(&self, text: &str) {
        self.host.focus(self.input);
        self.host.document().borrow_mut().type_text(self.input, text);
    }

    /// Advance the clock by `ms` in 10ms slices, polling after each.
    pub fn wait(&self, ms: u64) {
        let mut left = ms;
        while left > 0 {
            let slice = left.min(10);
            self.clock.advance(Duration::from_millis(slice));
            self.host.poll();
            left -= slice;
        }
    }
}

pub type EventLog = Rc<RefCell<Vec<(SpinEventKind, f64)>>>;

/// Subscribe to every event kind, recording `(kind, value)` in order.
pub fn record(handle: &SpinnerHandle) -> EventLog {
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    for kind in SpinEventKind::ALL {
        let log = Rc::clone(&log);
        handle.on(kind, move |e: &SpinEvent| log.borrow_mut().push((e.kind, e.value)));
    }
    log
}

pub fn kinds(log: &EventLog) -> Vec<SpinEventKind> {
    log.borrow().iter().map(|(k, _)| *k).collect()
}

pub fn count(log: &EventLog, kind: SpinEventKind) -> usize {
    log.borrow().iter().filter(|(k, _)| *k == kind).count()
}
