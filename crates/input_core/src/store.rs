//! Central store for input values, caret positions, and selections.
//!
//! The store performs no validation of numeric content: it holds whatever the
//! page, the user, or the engine last wrote. Readers treat it as ground truth.

use crate::id::InputId;
use crate::selection::SelectionRange;
use crate::state::InputState;
use crate::text::{clamp_to_char_boundary, filter_single_line, prev_cursor_boundary};
use std::collections::HashMap;

/// Value/caret/selection state for every bound input.
///
/// # Example
///
/// ```
/// use input_core::{InputId, InputValueStore};
///
/// let mut store = InputValueStore::new();
/// let id = InputId::from_raw(1);
///
/// store.ensure_initial(id, "40".to_string());
/// store.focus(id);
/// store.insert_text(id, "7");
///
/// assert_eq!(store.get(id), Some("407"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct InputValueStore {
    values: HashMap<InputId, InputState>,
}

impl InputValueStore {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Insert an entry with `initial` as its value unless one already exists.
    pub fn ensure_initial(&mut self, id: InputId, initial: String) {
        self.values.entry(id).or_insert_with(|| {
            let value = filter_single_line(&initial).into_owned();
            InputState {
                caret: value.len(),
                value,
                ..InputState::default()
            }
        });
    }

    /// Drop the entry for `id`. Returns the last value, if any.
    pub fn remove(&mut self, id: InputId) -> Option<String> {
        self.values.remove(&id).map(|s| s.value)
    }

    pub fn get(&self, id: InputId) -> Option<&str> {
        self.values.get(&id).map(|s| s.value.as_str())
    }

    /// Monotonic revision counter for the input's value.
    pub fn value_revision(&self, id: InputId) -> u64 {
        self.values.get(&id).map(|s| s.value_rev).unwrap_or(0)
    }

    /// Overwrite the value. The caret moves to the end and any selection is cleared.
    ///
    /// Returns `true` if the text actually changed.
    pub fn set(&mut self, id: InputId, value: String) -> bool {
        let value = filter_single_line(&value).into_owned();
        let st = self.values.entry(id).or_default();
        let changed = st.value != value;
        if changed {
            st.value = value;
            mark_text_dirty(st);
        }
        st.caret = st.value.len();
        st.selection_anchor = None;
        changed
    }

    /// Focus collapses any selection.
    pub fn focus(&mut self, id: InputId) {
        let st = self.values.entry(id).or_default();
        clamp_state(st);
        st.selection_anchor = None;
    }

    pub fn blur(&mut self, id: InputId) {
        if let Some(st) = self.values.get_mut(&id) {
            clamp_state(st);
            st.selection_anchor = None;
        }
    }

    /// Insert text at the caret, replacing the selection if there is one.
    pub fn insert_text(&mut self, id: InputId, s: &str) {
        let s = filter_single_line(s);
        if s.is_empty() {
            return;
        }
        let st = self.values.entry(id).or_default();
        clamp_state(st);
        delete_selection_if_any(st);

        let caret = st.caret;
        st.value.insert_str(caret, &s);
        st.caret = caret + s.len();
        mark_text_dirty(st);
    }

    pub fn backspace(&mut self, id: InputId) {
        let Some(st) = self.values.get_mut(&id) else {
            return;
        };
        clamp_state(st);
        if delete_selection_if_any(st) || st.caret == 0 {
            return;
        }
        let prev = prev_cursor_boundary(&st.value, st.caret);
        st.value.drain(prev..st.caret);
        st.caret = prev;
        mark_text_dirty(st);
    }

    pub fn select_all(&mut self, id: InputId) {
        if let Some(st) = self.values.get_mut(&id) {
            st.selection_anchor = Some(0);
            st.caret = st.value.len();
            if st.caret == 0 {
                st.selection_anchor = None;
            }
        }
    }
}

fn selection_range(value: &str, anchor: Option<usize>, caret: usize) -> Option<SelectionRange> {
    let anchor = clamp_to_char_boundary(value, anchor?);
    let caret = clamp_to_char_boundary(value, caret);
    let range = SelectionRange::new(anchor, caret);
    (!range.is_empty()).then_some(range)
}

fn delete_selection_if_any(st: &mut InputState) -> bool {
    let Some(sel) = selection_range(&st.value, st.selection_anchor, st.caret) else {
        st.selection_anchor = None;
        return false;
    };

    st.value.drain(sel.start..sel.end);
    st.caret = sel.start;
    st.selection_anchor = None;
    mark_text_dirty(st);
    true
}

fn clamp_state(st: &mut InputState) {
    st.caret = clamp_to_char_boundary(&st.value, st.caret);
    if let Some(a) = st.selection_anchor {
        st.selection_anchor = Some(clamp_to_char_boundary(&st.value, a));
    }
}

fn mark_text_dirty(st: &mut InputState) {
    st.value_rev = st.value_rev.wrapping_add(1);
}
