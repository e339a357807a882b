//! Minimal host document: the elements a spinner binds to and injects.
//!
//! Input values live in an [`InputValueStore`]; everything else (tags,
//! attributes, tree shape, focus) lives in a flat element map.

use core_types::ElementId;
use input_core::{InputId, InputValueStore};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("unknown element {0}")]
    UnknownElement(ElementId),

    #[error("inserting {child} under {parent} would create a cycle")]
    CycleDetected { parent: ElementId, child: ElementId },

    #[error("{before} is not a child of {parent}")]
    InvalidSibling { parent: ElementId, before: ElementId },
}

#[derive(Clone, Debug)]
struct ElementRecord {
    tag: String,
    attributes: Vec<(String, Option<String>)>,
    text: String,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

impl ElementRecord {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    fn is_input(&self) -> bool {
        self.tag == "input"
    }
}

#[inline]
fn to_input_id(id: ElementId) -> InputId {
    InputId::from(id.0)
}

#[derive(Debug)]
pub struct HostDocument {
    nodes: HashMap<ElementId, ElementRecord>,
    next_id: u32,
    body: ElementId,
    values: InputValueStore,
    focused: Option<ElementId>,
}

impl Default for HostDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDocument {
    pub fn new() -> Self {
        let body = ElementId(0);
        let mut nodes = HashMap::new();
        nodes.insert(body, ElementRecord::new("body"));
        Self {
            nodes,
            next_id: 1,
            body,
            values: InputValueStore::new(),
            focused: None,
        }
    }

    pub fn body(&self) -> ElementId {
        self.body
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, ElementRecord::new(tag));
        id
    }

    pub fn create_element_with(&mut self, tag: &str, attributes: &[(&str, &str)]) -> ElementId {
        let id = self.create_element(tag);
        for (name, value) in attributes {
            self.set_attr(id, name, *value);
        }
        id
    }

    pub fn exists(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.tag.as_str())
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.nodes
            .get(&id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// `true` if `node` is `ancestor` or lies anywhere below it.
    pub fn contains(&self, ancestor: ElementId, node: ElementId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.parent(id);
        }
        false
    }

    /// Append `child` to `parent`, moving it out of its current parent first.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.detach(child);
        self.link(parent, child, None);
        Ok(())
    }

    pub fn insert_before(
        &mut self,
        parent: ElementId,
        child: ElementId,
        before: ElementId,
    ) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        if child == before {
            return Ok(());
        }
        if self.parent(before) != Some(parent) {
            return Err(DomError::InvalidSibling { parent, before });
        }
        self.detach(child);
        self.link(parent, child, Some(before));
        Ok(())
    }

    /// Unlink `id` from its parent; the element itself stays alive.
    pub fn detach(&mut self, id: ElementId) {
        let Some(parent) = self.nodes.get_mut(&id).and_then(|n| n.parent.take()) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != id);
        }
    }

    /// Remove `id` and its whole subtree, dropping any input values and focus inside it.
    pub fn remove(&mut self, id: ElementId) {
        if id == self.body || !self.exists(id) {
            return;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            let Some(record) = self.nodes.remove(&cur) else {
                continue;
            };
            if record.is_input() {
                self.values.remove(to_input_id(cur));
            }
            if self.focused == Some(cur) {
                self.focused = None;
            }
            stack.extend(record.children);
        }
    }

    pub fn attributes(&self, id: ElementId) -> &[(String, Option<String>)] {
        self.nodes
            .get(&id)
            .map(|n| n.attributes.as_slice())
            .unwrap_or(&[])
    }

    /// Attribute value; a valueless attribute reads as `""`.
    pub fn attr(&self, id: ElementId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, id: ElementId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: ElementId, name: &str, value: impl Into<String>) {
        self.put_attr(id, name, Some(value.into()));
    }

    /// Add or remove a valueless (boolean) attribute such as `disabled`.
    pub fn set_flag(&mut self, id: ElementId, name: &str, on: bool) {
        if on {
            self.put_attr(id, name, None);
        } else {
            self.remove_attr(id, name);
        }
    }

    pub fn remove_attr(&mut self, id: ElementId, name: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.attributes.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        }
    }

    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn text(&self, id: ElementId) -> &str {
        self.nodes.get(&id).map(|n| n.text.as_str()).unwrap_or("")
    }

    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.text = text.into();
        }
    }

    /// `<input>` whose type is text-like (missing type defaults to text).
    pub fn is_text_input(&self, id: ElementId) -> bool {
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        if !node.is_input() {
            return false;
        }
        match self.attr(id, "type").map(str::trim).filter(|t| !t.is_empty()) {
            None => true,
            Some(t) => ["text", "number", "tel", "search"]
                .iter()
                .any(|ok| t.eq_ignore_ascii_case(ok)),
        }
    }

    /// Live value of an input. Before any edit this is its `value` attribute.
    pub fn value(&self, id: ElementId) -> Option<&str> {
        let node = self.nodes.get(&id)?;
        if !node.is_input() {
            return None;
        }
        Some(
            self.values
                .get(to_input_id(id))
                .or_else(|| self.attr(id, "value"))
                .unwrap_or(""),
        )
    }

    /// Overwrite an input's value. Returns `true` if the text changed.
    pub fn set_value(&mut self, id: ElementId, value: impl Into<String>) -> bool {
        if !self.nodes.get(&id).is_some_and(ElementRecord::is_input) {
            return false;
        }
        self.ensure_value(id);
        self.values.set(to_input_id(id), value.into())
    }

    /// Revision counter of an input's value; bumps on every text mutation.
    pub fn value_revision(&self, id: ElementId) -> u64 {
        self.values.value_revision(to_input_id(id))
    }

    /// Simulate typing at the caret.
    pub fn type_text(&mut self, id: ElementId, text: &str) {
        if self.ensure_value(id) {
            self.values.insert_text(to_input_id(id), text);
        }
    }

    pub fn backspace(&mut self, id: ElementId) {
        if self.ensure_value(id) {
            self.values.backspace(to_input_id(id));
        }
    }

    pub fn select_all(&mut self, id: ElementId) {
        if self.ensure_value(id) {
            self.values.select_all(to_input_id(id));
        }
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    /// Move focus to `id`. Returns the previously focused element.
    pub fn focus(&mut self, id: ElementId) -> Option<ElementId> {
        if !self.exists(id) {
            return self.focused;
        }
        let previous = self.blur();
        if self.ensure_value(id) {
            self.values.focus(to_input_id(id));
        }
        self.focused = Some(id);
        previous
    }

    pub fn blur(&mut self) -> Option<ElementId> {
        let previous = self.focused.take();
        if let Some(prev) = previous {
            self.values.blur(to_input_id(prev));
        }
        previous
    }

    /// Seed the value store from the `value` attribute. `false` for non-inputs.
    fn ensure_value(&mut self, id: ElementId) -> bool {
        if !self.nodes.get(&id).is_some_and(ElementRecord::is_input) {
            return false;
        }
        let initial = self.attr(id, "value").unwrap_or("").to_string();
        self.values.ensure_initial(to_input_id(id), initial);
        true
    }

    fn put_attr(&mut self, id: ElementId, name: &str, value: Option<String>) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        match node
            .attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value,
            None => node.attributes.push((name.to_string(), value)),
        }
    }

    fn check_insert(&self, parent: ElementId, child: ElementId) -> Result<(), DomError> {
        for id in [parent, child] {
            if !self.exists(id) {
                return Err(DomError::UnknownElement(id));
            }
        }
        if self.contains(child, parent) {
            return Err(DomError::CycleDetected { parent, child });
        }
        Ok(())
    }

    fn link(&mut self, parent: ElementId, child: ElementId, before: Option<ElementId>) {
        if let Some(p) = self.nodes.get_mut(&parent) {
            let pos = before
                .and_then(|b| p.children.iter().position(|c| *c == b))
                .unwrap_or(p.children.len());
            p.children.insert(pos, child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = Some(parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_input(value: &str) -> (HostDocument, ElementId) {
        let mut doc = HostDocument::new();
        let input = doc.create_element_with("input", &[("type", "text"), ("value", value)]);
        let body = doc.body();
        doc.append_child(body, input).unwrap();
        (doc, input)
    }

    #[test]
    fn value_falls_back_to_attribute_until_edited() {
        let (mut doc, input) = doc_with_input("42");
        assert_eq!(doc.value(input), Some("42"));

        doc.focus(input);
        doc.type_text(input, "7");
        assert_eq!(doc.value(input), Some("427"));
        assert_eq!(doc.attr(input, "value"), Some("42"));
    }

    #[test]
    fn non_inputs_have_no_value() {
        let mut doc = HostDocument::new();
        let div = doc.create_element("div");
        assert_eq!(doc.value(div), None);
        assert!(!doc.set_value(div, "1"));
        assert!(!doc.is_text_input(div));
    }

    #[test]
    fn text_like_input_types_are_accepted() {
        let mut doc = HostDocument::new();
        let plain = doc.create_element("input");
        let number = doc.create_element_with("input", &[("type", "NUMBER")]);
        let checkbox = doc.create_element_with("input", &[("type", "checkbox")]);

        assert!(doc.is_text_input(plain));
        assert!(doc.is_text_input(number));
        assert!(!doc.is_text_input(checkbox));
    }

    #[test]
    fn append_moves_and_insert_before_orders() {
        let mut doc = HostDocument::new();
        let body = doc.body();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let wrap = doc.create_element("div");

        doc.append_child(body, a).unwrap();
        doc.append_child(body, b).unwrap();
        doc.insert_before(body, wrap, a).unwrap();
        assert_eq!(doc.children(body), &[wrap, a, b]);

        doc.append_child(wrap, a).unwrap();
        assert_eq!(doc.children(body), &[wrap, b]);
        assert_eq!(doc.parent(a), Some(wrap));
        assert!(doc.contains(body, a));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut doc = HostDocument::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner).unwrap();

        assert_eq!(
            doc.append_child(inner, outer),
            Err(DomError::CycleDetected {
                parent: inner,
                child: outer
            })
        );
    }

    #[test]
    fn remove_drops_subtree_values_and_focus() {
        let (mut doc, input) = doc_with_input("5");
        let body = doc.body();
        let wrap = doc.create_element("div");
        doc.insert_before(body, wrap, input).unwrap();
        doc.append_child(wrap, input).unwrap();
        doc.focus(input);

        doc.remove(wrap);
        assert!(!doc.exists(input));
        assert_eq!(doc.focused(), None);
        assert!(doc.children(body).is_empty());
    }

    #[test]
    fn flags_and_classes() {
        let mut doc = HostDocument::new();
        let button = doc.create_element_with("button", &[("class", "btn touchspin-up")]);

        doc.set_flag(button, "disabled", true);
        assert_eq!(doc.attr(button, "disabled"), Some(""));
        doc.set_flag(button, "disabled", false);
        assert!(!doc.has_attr(button, "disabled"));
        assert!(doc.has_class(button, "touchspin-up"));
        assert!(!doc.has_class(button, "touchspin"));
    }

    #[test]
    fn focus_returns_previous_element() {
        let (mut doc, input) = doc_with_input("");
        let other = doc.create_element("button");

        assert_eq!(doc.focus(input), None);
        assert_eq!(doc.focus(other), Some(input));
        assert_eq!(doc.blur(), Some(other));
        assert_eq!(doc.focused(), None);
    }
}
