//! Headless numeric spinner engine.
//!
//! A [`SpinnerHost`] owns a [`HostDocument`] and binds spinners to its text
//! inputs. Each spinner resolves its [`Settings`], steps and clamps the
//! element value, runs press-and-hold spins off a [`Clock`], and reports
//! what happened on its event bus.
//!
//! ```
//! use touchspin::{HostDocument, SpinOptions, SpinnerHost, SpinEventKind};
//!
//! let mut doc = HostDocument::new();
//! let input = doc.create_element_with("input", &[("value", "42")]);
//! let body = doc.body();
//! doc.append_child(body, input).unwrap();
//!
//! let host = SpinnerHost::new(doc);
//! let spinner = host.attach(input, SpinOptions::new().step(5.0)).unwrap();
//! assert_eq!(spinner.get_value(), Some(40.0));
//!
//! spinner.on(SpinEventKind::Change, |e| println!("now {}", e.value));
//! spinner.up_once();
//! assert_eq!(spinner.get_value(), Some(45.0));
//! ```

pub mod clock;
pub mod dom;
pub mod engine;
pub mod error;
pub mod interactions;
pub mod lifecycle;
pub mod renderer;
pub mod scheduler;
pub mod settings;
pub mod value;

pub use bus::{EventBus, HandlerId, SpinEvent, SpinEventKind, UnknownEvent};
pub use clock::{Clock, ManualClock, SystemClock};
pub use core_types::{ElementId, Generation, SpinDirection};
pub use dom::{DomError, HostDocument};
pub use engine::{Hits, Outbox, SpinEngine};
pub use error::{AttachError, SettingsError};
pub use interactions::{DomEvent, Key};
pub use lifecycle::{SpinnerHandle, SpinnerHost};
pub use renderer::{NullRenderer, PlainRenderer, RendererContract, WrapperHandle};
pub use scheduler::{SpinPhase, SpinScheduler};
pub use settings::{
    CalculationHook, Cosmetic, CosmeticOptions, Settings, SettingsResolver, SpinOptions,
    StepDivisibility,
};
pub use value::{CheckOptions, CheckOutcome, ValueEngine};
