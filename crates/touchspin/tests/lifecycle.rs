mod common;

use common::{Page, count, record};
use std::cell::RefCell;
use std::rc::Rc;
use touchspin::{
    AttachError, HostDocument, NullRenderer, SpinEventKind, SpinOptions, SpinPhase, SpinnerHost,
};

#[test]
fn destroy_stops_spin_then_drops_handlers() {
    let page = Page::with_value("10");
    let spinner = page.attach(SpinOptions::new());
    let log = record(&spinner);

    spinner.start_up_spin();
    spinner.destroy();
    assert_eq!(count(&log, SpinEventKind::StopSpin), 1);

    let before = log.borrow().len();
    spinner.up_once();
    spinner.start_down_spin();
    spinner.set_value(3);
    assert_eq!(log.borrow().len(), before);
    assert_eq!(page.value(), "10");
}

#[test]
fn destroy_cancels_pending_ticks() {
    let page = Page::with_value("10");
    let spinner = page.attach(SpinOptions::new());
    spinner.start_up_spin();
    spinner.destroy();

    page.wait(2_000);
    assert_eq!(page.value(), "10");
    assert_eq!(page.host.next_deadline(), None);
}

#[test]
fn double_destroy_is_a_no_op() {
    let page = Page::with_value("10");
    let spinner = page.attach(SpinOptions::new());
    spinner.destroy();
    spinner.destroy();
    page.host.destroy(page.input);
    assert!(spinner.is_destroyed());
}

#[test]
fn reattach_after_destroy_is_fresh() {
    let page = Page::with_value("10");
    let first = page.attach(SpinOptions::new().step(5.0));
    let old_log = record(&first);
    first.start_up_spin();
    first.destroy();
    let old_events = old_log.borrow().len();

    let second = page.attach(SpinOptions::new());
    assert!(!second.is_destroyed());
    assert_eq!(second.spin_phase(), SpinPhase::Idle);
    assert_eq!(second.settings().unwrap().step, 1.0);

    let log = record(&second);
    second.up_once();
    assert_eq!(page.value(), "11");
    assert_eq!(count(&log, SpinEventKind::Change), 1);
    assert_eq!(old_log.borrow().len(), old_events);
    assert!(first.is_destroyed());
}

#[test]
fn stale_handle_stays_inert_after_reattach() {
    let page = Page::with_value("10");
    let first = page.attach(SpinOptions::new());
    first.destroy();
    let _second = page.attach(SpinOptions::new());

    assert_eq!(first.up_once(), None);
    assert_eq!(page.value(), "10");
}

#[test]
fn lookup_without_attach_is_not_initialized() {
    let page = Page::with_value("10");
    assert!(page.host.get(page.input).is_none());

    let spinner = page.attach(SpinOptions::new());
    assert!(page.host.get(page.input).is_some());
    spinner.destroy();
    assert!(page.host.get(page.input).is_none());
}

#[test]
fn refused_attach_leaves_no_markup() {
    let mut doc = HostDocument::new();
    let body = doc.body();
    let div = doc.create_element("div");
    doc.append_child(body, div).unwrap();
    let host = SpinnerHost::new(doc).with_renderer(|| touchspin::PlainRenderer);

    let err = host.attach(div, SpinOptions::new()).unwrap_err();
    assert!(matches!(err, AttachError::NotAnInput { .. }));
    assert_eq!(host.document().borrow().children(body), &[div]);
}

#[test]
fn renderer_markup_is_removed_on_destroy() {
    let page = Page::rendered("10");
    let body = page.host.document().borrow().body();
    let spinner = page.attach(SpinOptions::new().prefix("$"));
    {
        let doc = page.host.document().borrow();
        let wrapper = doc.parent(page.input).unwrap();
        assert_ne!(wrapper, body);
        assert!(doc.has_class(wrapper, "touchspin"));
    }

    spinner.destroy();
    let doc = page.host.document().borrow();
    assert_eq!(doc.children(body), &[page.input]);
    assert_eq!(doc.value(page.input), Some("10"));
}

#[test]
fn engines_work_without_any_renderer() {
    let page = Page::with_value("10");
    let spinner = page
        .host
        .attach_with_renderer(page.input, SpinOptions::new(), Box::new(NullRenderer))
        .unwrap();
    spinner.up_once();
    assert_eq!(page.value(), "11");
    assert_eq!(
        page.host.document().borrow().children(page.host.document().borrow().body()),
        &[page.input]
    );
}

#[test]
fn spinners_on_different_elements_are_independent() {
    let page = Page::with_value("10");
    let other = {
        let mut doc = page.host.document().borrow_mut();
        let body = doc.body();
        let other = doc.create_element_with("input", &[("value", "50")]);
        doc.append_child(body, other).unwrap();
        other
    };
    let a = page.attach(SpinOptions::new());
    let b = page.host.attach(other, SpinOptions::new().step(10.0)).unwrap();

    a.up_once();
    b.down_once();
    a.destroy();
    b.down_once();

    assert_eq!(page.value(), "11");
    assert_eq!(page.host.document().borrow().value(other), Some("30"));
}

#[test]
fn disabled_sync_reaches_renderer_and_stops_spin() {
    let page = Page::rendered("10");
    let spinner = page.attach(SpinOptions::new());
    let log = record(&spinner);
    spinner.start_up_spin();

    page.host
        .document()
        .borrow_mut()
        .set_flag(page.input, "disabled", true);
    spinner.sync_disabled();

    assert_eq!(spinner.spin_phase(), SpinPhase::Idle);
    assert_eq!(count(&log, SpinEventKind::StopSpin), 1);
    let doc = page.host.document().borrow();
    let wrapper = doc.parent(page.input).unwrap();
    let buttons: Vec<_> = doc
        .children(wrapper)
        .iter()
        .copied()
        .filter(|el| doc.tag(*el) == Some("button"))
        .collect();
    assert_eq!(buttons.len(), 2);
    assert!(buttons.iter().all(|b| doc.has_attr(*b, "disabled")));
}

#[test]
fn handlers_may_read_the_document() {
    let page = Page::with_value("10");
    let spinner = page.attach(SpinOptions::new());
    let seen = Rc::new(RefCell::new(String::new()));
    let doc = Rc::clone(page.host.document());
    let input = page.input;
    let s = Rc::clone(&seen);
    spinner.on(SpinEventKind::Change, move |_| {
        *s.borrow_mut() = doc.borrow().value(input).unwrap_or("").to_string();
    });

    spinner.up_once();
    assert_eq!(*seen.borrow(), "11");
}
