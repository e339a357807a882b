use super::{RendererContract, WrapperHandle};
use crate::dom::{DomError, HostDocument};
use crate::settings::{Cosmetic, CosmeticOptions, Settings};
use core_types::ElementId;

const WRAPPER_CLASS: &str = "touchspin";
const VERTICAL_CLASS: &str = "touchspin-vertical";

/// Framework-free markup:
///
/// ```text
/// horizontal: div.touchspin > [span.touchspin-prefix] button.touchspin-down input button.touchspin-up [span.touchspin-postfix]
/// vertical:   div.touchspin > [span.touchspin-prefix] input [span.touchspin-postfix] span.touchspin-vertical > (up, down)
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainRenderer;

impl RendererContract for PlainRenderer {
    fn defaults(&self) -> CosmeticOptions {
        CosmeticOptions {
            buttonup_class: Some("touchspin-btn".into()),
            buttondown_class: Some("touchspin-btn".into()),
            verticalupclass: Some("touchspin-btn touchspin-btn-vertical".into()),
            verticaldownclass: Some("touchspin-btn touchspin-btn-vertical".into()),
            ..CosmeticOptions::default()
        }
    }

    fn create_wrapper(
        &mut self,
        doc: &mut HostDocument,
        input: ElementId,
        settings: &Settings,
    ) -> Result<WrapperHandle, DomError> {
        let wrapper = doc.create_element_with("div", &[("class", WRAPPER_CLASS)]);
        if let Some(parent) = doc.parent(input) {
            if let Err(err) = doc.insert_before(parent, wrapper, input) {
                doc.remove(wrapper);
                return Err(err);
            }
        }
        if let Err(err) = doc.append_child(wrapper, input) {
            doc.remove(wrapper);
            return Err(err);
        }

        let up = doc.create_element_with("button", &[("type", "button"), ("tabindex", "-1")]);
        let down = doc.create_element_with("button", &[("type", "button"), ("tabindex", "-1")]);
        let mut handle = WrapperHandle {
            input,
            wrapper: Some(wrapper),
            up: Some(up),
            down: Some(down),
            prefix: None,
            postfix: None,
            vertical: None,
        };
        self.update_prefix_postfix(doc, &mut handle, settings);
        self.update_buttons(doc, &mut handle, settings);
        Ok(handle)
    }

    fn update_buttons(&mut self, doc: &mut HostDocument, handle: &mut WrapperHandle, settings: &Settings) {
        let c = &settings.cosmetic;
        let vertical = c.vertical_buttons;
        let (up_txt, up_class, down_txt, down_class) = if vertical {
            (&c.verticalup, &c.verticalupclass, &c.verticaldown, &c.verticaldownclass)
        } else {
            (&c.buttonup_txt, &c.buttonup_class, &c.buttondown_txt, &c.buttondown_class)
        };
        if let Some(up) = handle.up {
            doc.set_text(up, up_txt.as_str());
            doc.set_attr(up, "class", classes("touchspin-up", up_class));
        }
        if let Some(down) = handle.down {
            doc.set_text(down, down_txt.as_str());
            doc.set_attr(down, "class", classes("touchspin-down", down_class));
        }

        match (vertical, handle.vertical) {
            (true, None) => {
                handle.vertical = Some(doc.create_element_with("span", &[("class", VERTICAL_CLASS)]));
            }
            (false, Some(stack)) => {
                handle.vertical = None;
                for button in [handle.up, handle.down].into_iter().flatten() {
                    doc.detach(button);
                }
                doc.remove(stack);
            }
            _ => {}
        }
        if let Err(err) = layout(doc, handle) {
            log::warn!(target: "touchspin.lifecycle", "button layout failed: {err}");
        }
    }

    fn update_prefix_postfix(
        &mut self,
        doc: &mut HostDocument,
        handle: &mut WrapperHandle,
        settings: &Settings,
    ) {
        let c: &Cosmetic = &settings.cosmetic;
        handle.prefix = affix(doc, handle.prefix, &c.prefix, "touchspin-prefix", &c.prefix_extraclass);
        handle.postfix = affix(doc, handle.postfix, &c.postfix, "touchspin-postfix", &c.postfix_extraclass);
        if let Err(err) = layout(doc, handle) {
            log::warn!(target: "touchspin.lifecycle", "prefix/postfix layout failed: {err}");
        }
    }

    fn set_disabled(&mut self, doc: &mut HostDocument, handle: &WrapperHandle, disabled: bool) {
        for button in [handle.up, handle.down].into_iter().flatten() {
            doc.set_flag(button, "disabled", disabled);
        }
    }

    fn destroy(&mut self, doc: &mut HostDocument, handle: WrapperHandle) {
        let Some(wrapper) = handle.wrapper else {
            return;
        };
        match doc.parent(wrapper) {
            Some(parent) => {
                if let Err(err) = doc.insert_before(parent, handle.input, wrapper) {
                    log::warn!(target: "touchspin.lifecycle", "could not restore input: {err}");
                    doc.detach(handle.input);
                }
            }
            None => doc.detach(handle.input),
        }
        doc.remove(wrapper);
    }
}

fn classes(base: &str, extra: &str) -> String {
    if extra.trim().is_empty() {
        base.to_string()
    } else {
        format!("{base} {}", extra.trim())
    }
}

/// Create, refresh, or drop a prefix/postfix span. Empty text means no span.
fn affix(
    doc: &mut HostDocument,
    existing: Option<ElementId>,
    text: &str,
    class: &str,
    extra: &str,
) -> Option<ElementId> {
    if text.is_empty() {
        if let Some(el) = existing {
            doc.remove(el);
        }
        return None;
    }
    let el = existing.unwrap_or_else(|| doc.create_element("span"));
    doc.set_text(el, text);
    doc.set_attr(el, "class", classes(class, extra));
    Some(el)
}

/// Re-append the wrapper's children in layout order.
fn layout(doc: &mut HostDocument, handle: &WrapperHandle) -> Result<(), DomError> {
    let Some(wrapper) = handle.wrapper else {
        return Ok(());
    };
    let order: Vec<ElementId> = match handle.vertical {
        Some(stack) => {
            for button in [handle.up, handle.down].into_iter().flatten() {
                doc.append_child(stack, button)?;
            }
            [handle.prefix, Some(handle.input), handle.postfix, Some(stack)]
                .into_iter()
                .flatten()
                .collect()
        }
        None => [
            handle.prefix,
            handle.down,
            Some(handle.input),
            handle.up,
            handle.postfix,
        ]
        .into_iter()
        .flatten()
        .collect(),
    };
    for child in order {
        doc.append_child(wrapper, child)?;
    }
    Ok(())
}
