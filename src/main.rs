//! Scripted driver for one headless spinner.
//!
//! Reads commands from stdin, one per line, and prints every event the
//! spinner emits:
//!
//! ```text
//! attach {"min": 0, "max": 10, "step": 2}
//! press up
//! wait 700
//! release
//! get
//! ```

use mimalloc::MiMalloc;
use std::io::{self, BufRead, Write};
use std::time::Duration;
use touchspin::{
    DomEvent, ElementId, HostDocument, Key, ManualClock, SpinEvent, SpinEventKind, SpinOptions,
    SpinnerHandle, SpinnerHost,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Poll granularity for `wait`.
const WAIT_SLICE: Duration = Duration::from_millis(5);

struct Session {
    host: SpinnerHost,
    clock: ManualClock,
    input: ElementId,
    spinner: Option<SpinnerHandle>,
}

impl Session {
    fn new() -> Result<Self, touchspin::DomError> {
        let mut doc = HostDocument::new();
        let body = doc.body();
        let input = doc.create_element_with("input", &[("type", "text"), ("value", "")]);
        doc.append_child(body, input)?;
        let clock = ManualClock::new();
        let host = SpinnerHost::new(doc).with_clock(clock.clone());
        Ok(Self {
            host,
            clock,
            input,
            spinner: None,
        })
    }

    fn run(&mut self, line: &str) -> Result<(), String> {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        match command {
            "attach" => self.attach(rest),
            "value" => {
                self.host.document().borrow_mut().set_value(self.input, rest);
                Ok(())
            }
            "up" => self.spinner()?.up_once().map(drop).ok_or_else(inert),
            "down" => self.spinner()?.down_once().map(drop).ok_or_else(inert),
            "press" => self.press(rest),
            "release" => {
                let body = self.host.document().borrow().body();
                self.host.dispatch(DomEvent::MouseUp { target: body });
                Ok(())
            }
            "spin" => {
                match rest {
                    "up" => self.spinner()?.start_up_spin(),
                    "down" => self.spinner()?.start_down_spin(),
                    other => return Err(format!("unknown direction {other:?}")),
                }
                Ok(())
            }
            "stop" => {
                self.spinner()?.stop_spin();
                Ok(())
            }
            "wait" => self.wait(rest),
            "type" => {
                self.host.focus(self.input);
                self.host.document().borrow_mut().type_text(self.input, rest);
                Ok(())
            }
            "blur" => {
                self.host.blur();
                Ok(())
            }
            "set" => {
                self.spinner()?.set_value(rest);
                Ok(())
            }
            "get" => {
                let text = self.host.document().borrow().value(self.input).map(str::to_string);
                println!("value {:?} -> {:?}", text.unwrap_or_default(), self.spinner()?.get_value());
                Ok(())
            }
            "update" => {
                let options = SpinOptions::from_json(rest).map_err(|e| e.to_string())?;
                self.spinner()?.update_settings(options);
                Ok(())
            }
            "destroy" => {
                if let Some(spinner) = self.spinner.take() {
                    spinner.destroy();
                }
                Ok(())
            }
            other => Err(format!("unknown command {other:?}")),
        }
    }

    fn attach(&mut self, json: &str) -> Result<(), String> {
        let options = if json.is_empty() {
            SpinOptions::new()
        } else {
            SpinOptions::from_json(json).map_err(|e| e.to_string())?
        };
        let spinner = self
            .host
            .attach(self.input, options)
            .map_err(|e| e.to_string())?;
        for kind in SpinEventKind::ALL {
            spinner.on(kind, print_event);
        }
        log::info!(target: "touchspin.cli", "attached spinner to {}", self.input);
        self.spinner = Some(spinner);
        Ok(())
    }

    /// Arrow key held on the focused input; `release` lets go.
    fn press(&mut self, direction: &str) -> Result<(), String> {
        self.spinner()?;
        let key = match direction {
            "up" => Key::ArrowUp,
            "down" => Key::ArrowDown,
            other => return Err(format!("unknown direction {other:?}")),
        };
        self.host.focus(self.input);
        self.host.dispatch(DomEvent::KeyDown {
            target: self.input,
            key,
        });
        Ok(())
    }

    fn wait(&mut self, ms: &str) -> Result<(), String> {
        let ms: u64 = ms.parse().map_err(|_| format!("bad duration {ms:?}"))?;
        let mut left = Duration::from_millis(ms);
        while !left.is_zero() {
            let slice = left.min(WAIT_SLICE);
            self.clock.advance(slice);
            self.host.poll();
            left -= slice;
        }
        Ok(())
    }

    fn spinner(&self) -> Result<&SpinnerHandle, String> {
        self.spinner.as_ref().ok_or_else(|| "no spinner attached".to_string())
    }
}

fn inert() -> String {
    "spinner is destroyed or busy".to_string()
}

fn print_event(event: &SpinEvent) {
    println!("event {} {}", event.kind.name(), event.value);
}

fn main() {
    env_logger::init();

    let mut session = match Session::new() {
        Ok(session) => session,
        Err(err) => {
            eprintln!("touchspin: {err}");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                eprintln!("touchspin: {err}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Err(err) = session.run(line) {
            eprintln!("touchspin: {line}: {err}");
        }
        let _ = io::stdout().flush();
    }
}
