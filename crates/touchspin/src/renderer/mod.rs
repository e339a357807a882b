//! Visual chrome around a bound input.
//!
//! The engine only ever calls into a renderer; renderers never call back.
//! Every method is required. [`NullRenderer`] is the headless variant.

mod plain;

pub use plain::PlainRenderer;

use crate::dom::{DomError, HostDocument};
use crate::settings::{CosmeticOptions, Settings};
use core_types::{ElementId, SpinDirection};

/// Elements a renderer injected for one spinner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrapperHandle {
    pub input: ElementId,
    pub wrapper: Option<ElementId>,
    pub up: Option<ElementId>,
    pub down: Option<ElementId>,
    pub prefix: Option<ElementId>,
    pub postfix: Option<ElementId>,
    /// Container of the buttons in vertical layout.
    pub vertical: Option<ElementId>,
}

impl WrapperHandle {
    /// A handle with no chrome: the widget is the input alone.
    pub fn headless(input: ElementId) -> Self {
        Self {
            input,
            wrapper: None,
            up: None,
            down: None,
            prefix: None,
            postfix: None,
            vertical: None,
        }
    }

    /// Whether `element` belongs to this widget.
    pub fn contains(&self, doc: &HostDocument, element: ElementId) -> bool {
        match self.wrapper {
            Some(wrapper) => doc.contains(wrapper, element),
            None => element == self.input,
        }
    }

    /// The direction of the button `target` sits in, if any.
    pub fn direction_of(&self, doc: &HostDocument, target: ElementId) -> Option<SpinDirection> {
        let within = |button: Option<ElementId>| button.is_some_and(|b| doc.contains(b, target));
        if within(self.up) {
            Some(SpinDirection::Up)
        } else if within(self.down) {
            Some(SpinDirection::Down)
        } else {
            None
        }
    }
}

pub trait RendererContract {
    /// Cosmetic defaults. Only fill fields no other source set.
    fn defaults(&self) -> CosmeticOptions;

    fn create_wrapper(
        &mut self,
        doc: &mut HostDocument,
        input: ElementId,
        settings: &Settings,
    ) -> Result<WrapperHandle, DomError>;

    fn update_buttons(&mut self, doc: &mut HostDocument, handle: &mut WrapperHandle, settings: &Settings);

    fn update_prefix_postfix(
        &mut self,
        doc: &mut HostDocument,
        handle: &mut WrapperHandle,
        settings: &Settings,
    );

    fn set_disabled(&mut self, doc: &mut HostDocument, handle: &WrapperHandle, disabled: bool);

    /// Remove everything `create_wrapper` injected, leaving the input in place.
    fn destroy(&mut self, doc: &mut HostDocument, handle: WrapperHandle);
}

/// Renders nothing. Numeric and event behavior is unaffected.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl RendererContract for NullRenderer {
    fn defaults(&self) -> CosmeticOptions {
        CosmeticOptions::default()
    }

    fn create_wrapper(
        &mut self,
        _doc: &mut HostDocument,
        input: ElementId,
        _settings: &Settings,
    ) -> Result<WrapperHandle, DomError> {
        Ok(WrapperHandle::headless(input))
    }

    fn update_buttons(&mut self, _doc: &mut HostDocument, _handle: &mut WrapperHandle, _settings: &Settings) {}

    fn update_prefix_postfix(
        &mut self,
        _doc: &mut HostDocument,
        _handle: &mut WrapperHandle,
        _settings: &Settings,
    ) {
    }

    fn set_disabled(&mut self, _doc: &mut HostDocument, _handle: &WrapperHandle, _disabled: bool) {}

    fn destroy(&mut self, _doc: &mut HostDocument, _handle: WrapperHandle) {}
}
