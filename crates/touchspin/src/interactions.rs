//! Routing of host DOM events onto spinner operations.

use crate::engine::SpinEngine;
use core_types::{ElementId, SpinDirection};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Space,
    Enter,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "ArrowUp" | "Up" => Key::ArrowUp,
            "ArrowDown" | "Down" => Key::ArrowDown,
            " " | "Spacebar" => Key::Space,
            "Enter" => Key::Enter,
            _ => Key::Other,
        }
    }

    fn arrow_direction(self) -> Option<SpinDirection> {
        match self {
            Key::ArrowUp => Some(SpinDirection::Up),
            Key::ArrowDown => Some(SpinDirection::Down),
            _ => None,
        }
    }

    fn activates_button(self) -> bool {
        matches!(self, Key::Space | Key::Enter)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DomEvent {
    KeyDown { target: ElementId, key: Key },
    KeyUp { target: ElementId, key: Key },
    MouseDown { target: ElementId },
    MouseUp { target: ElementId },
    Click { target: ElementId },
    TouchStart { target: ElementId },
    TouchEnd { target: ElementId },
    TouchCancel { target: ElementId },
    Wheel { target: ElementId, delta_y: f64 },
    FocusIn { target: ElementId },
    /// `related` is the element receiving focus, if any.
    FocusOut { target: ElementId, related: Option<ElementId> },
}

/// Apply `event` to `engine`. Returns `true` when the spinner consumed it
/// (the host should suppress its default action).
pub fn route(engine: &mut SpinEngine, event: &DomEvent) -> bool {
    if engine.is_destroyed() {
        return false;
    }
    match *event {
        // Releases anywhere end a held spin, even on a disabled spinner.
        DomEvent::MouseUp { .. } | DomEvent::TouchEnd { .. } | DomEvent::TouchCancel { .. } => {
            let spinning = engine.spin_direction().is_some();
            engine.stop_spin();
            spinning
        }
        DomEvent::FocusOut { target, related } => {
            let wrapper = engine.wrapper().clone();
            let leaves = {
                let doc = engine.document().borrow();
                wrapper.contains(&doc, target)
                    && !related.is_some_and(|r| wrapper.contains(&doc, r))
            };
            if leaves {
                engine.commit();
            }
            false
        }
        DomEvent::FocusIn { .. } => false,
        _ if !engine.is_interactive() => false,
        DomEvent::KeyDown { target, key } => match key_direction(engine, target, key) {
            Some(direction) => {
                press(engine, direction);
                true
            }
            None => false,
        },
        DomEvent::KeyUp { target, key } => {
            if key_direction(engine, target, key).is_some() {
                engine.stop_spin();
                true
            } else {
                false
            }
        }
        DomEvent::MouseDown { target } | DomEvent::TouchStart { target } => {
            match button_direction(engine, target) {
                Some(direction) => {
                    press(engine, direction);
                    true
                }
                None => false,
            }
        }
        // The press already stepped.
        DomEvent::Click { target } => button_direction(engine, target).is_some(),
        DomEvent::Wheel { target, delta_y } => wheel(engine, target, delta_y),
    }
}

/// A one-shot step followed by an armed spin, unless the step already hit
/// the limit it was heading for. Repeats of a held press are ignored.
fn press(engine: &mut SpinEngine, direction: SpinDirection) {
    if engine.spin_direction() == Some(direction) {
        return;
    }
    let hits = engine.step_once(direction);
    if !hits.toward(direction) {
        engine.start_spin(direction);
    }
}

fn key_direction(engine: &SpinEngine, target: ElementId, key: Key) -> Option<SpinDirection> {
    if target == engine.element() {
        return key.arrow_direction();
    }
    if key.activates_button() {
        return button_direction(engine, target);
    }
    None
}

fn button_direction(engine: &SpinEngine, target: ElementId) -> Option<SpinDirection> {
    let doc = engine.document().borrow();
    engine.wrapper().direction_of(&doc, target)
}

/// Single step, no acceleration; only while the input has focus.
fn wheel(engine: &mut SpinEngine, target: ElementId, delta_y: f64) -> bool {
    if !engine.settings().mousewheel || delta_y == 0.0 || delta_y.is_nan() {
        return false;
    }
    let applies = {
        let doc = engine.document().borrow();
        doc.focused() == Some(engine.element()) && engine.wrapper().contains(&doc, target)
    };
    if !applies {
        return false;
    }
    if delta_y < 0.0 {
        engine.up_once();
    } else {
        engine.down_once();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::dom::HostDocument;
    use crate::renderer::PlainRenderer;
    use crate::scheduler::SpinPhase;
    use crate::settings::SpinOptions;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn setup(value: &str, options: SpinOptions) -> (Rc<RefCell<HostDocument>>, SpinEngine) {
        let mut doc = HostDocument::new();
        let body = doc.body();
        let input = doc.create_element_with("input", &[("value", value)]);
        doc.append_child(body, input).unwrap();
        let doc = Rc::new(RefCell::new(doc));
        let engine = SpinEngine::attach(
            input,
            Rc::clone(&doc),
            Rc::new(ManualClock::new()),
            &options,
            Box::new(PlainRenderer),
        );
        (doc, engine)
    }

    fn value(doc: &Rc<RefCell<HostDocument>>, engine: &SpinEngine) -> String {
        doc.borrow().value(engine.element()).unwrap_or("").to_string()
    }

    #[test]
    fn dom_key_names() {
        assert_eq!(Key::from_dom_key("ArrowUp"), Key::ArrowUp);
        assert_eq!(Key::from_dom_key(" "), Key::Space);
        assert_eq!(Key::from_dom_key("a"), Key::Other);
    }

    #[test]
    fn mousedown_on_button_steps_and_arms() {
        let (doc, mut engine) = setup("5", SpinOptions::new());
        let up = engine.wrapper().up.unwrap();

        assert!(route(&mut engine, &DomEvent::MouseDown { target: up }));
        assert_eq!(value(&doc, &engine), "6");
        assert_eq!(engine.spin_phase(), SpinPhase::Armed);

        let body = doc.borrow().body();
        assert!(route(&mut engine, &DomEvent::MouseUp { target: body }));
        assert_eq!(engine.spin_phase(), SpinPhase::Idle);
        assert!(route(&mut engine, &DomEvent::Click { target: up }));
        assert_eq!(value(&doc, &engine), "6");
    }

    #[test]
    fn press_at_limit_does_not_arm() {
        let (_doc, mut engine) = setup("99", SpinOptions::new());
        let up = engine.wrapper().up.unwrap();
        route(&mut engine, &DomEvent::TouchStart { target: up });
        assert_eq!(engine.spin_phase(), SpinPhase::Idle);
    }

    #[test]
    fn held_arrow_key_repeats_are_ignored() {
        let (doc, mut engine) = setup("5", SpinOptions::new());
        let input = engine.element();
        let down = DomEvent::KeyDown { target: input, key: Key::ArrowDown };

        route(&mut engine, &down);
        route(&mut engine, &down);
        assert_eq!(value(&doc, &engine), "4");

        route(&mut engine, &DomEvent::KeyUp { target: input, key: Key::ArrowDown });
        assert_eq!(engine.spin_phase(), SpinPhase::Idle);
    }

    #[test]
    fn space_on_button_presses_it() {
        let (doc, mut engine) = setup("5", SpinOptions::new());
        let down = engine.wrapper().down.unwrap();
        assert!(route(&mut engine, &DomEvent::KeyDown { target: down, key: Key::Space }));
        assert_eq!(value(&doc, &engine), "4");
        assert!(!route(&mut engine, &DomEvent::KeyDown { target: down, key: Key::Other }));
    }

    #[test]
    fn wheel_needs_focus_and_option() {
        let (doc, mut engine) = setup("5", SpinOptions::new());
        let input = engine.element();
        let wheel_up = DomEvent::Wheel { target: input, delta_y: -120.0 };

        assert!(!route(&mut engine, &wheel_up));
        doc.borrow_mut().focus(input);
        assert!(route(&mut engine, &wheel_up));
        assert_eq!(value(&doc, &engine), "6");
        assert_eq!(engine.spin_phase(), SpinPhase::Idle);

        let (doc, mut engine) = setup("5", SpinOptions::new().mousewheel(false));
        let input = engine.element();
        doc.borrow_mut().focus(input);
        assert!(!route(&mut engine, &DomEvent::Wheel { target: input, delta_y: 1.0 }));
    }

    #[test]
    fn focus_moving_inside_widget_does_not_commit() {
        let (doc, mut engine) = setup("40", SpinOptions::new().step(5.0));
        let input = engine.element();
        let up = engine.wrapper().up.unwrap();
        {
            let mut d = doc.borrow_mut();
            d.focus(input);
            d.type_text(input, "7");
        }

        route(&mut engine, &DomEvent::FocusOut { target: input, related: Some(up) });
        assert_eq!(value(&doc, &engine), "407");

        route(&mut engine, &DomEvent::FocusOut { target: input, related: None });
        assert_eq!(value(&doc, &engine), "100");
    }

    #[test]
    fn disabled_spinner_ignores_presses() {
        let (doc, mut engine) = setup("5", SpinOptions::new());
        let up = engine.wrapper().up.unwrap();
        doc.borrow_mut().set_flag(engine.element(), "readonly", true);

        assert!(!route(&mut engine, &DomEvent::MouseDown { target: up }));
        assert_eq!(value(&doc, &engine), "5");
    }
}
