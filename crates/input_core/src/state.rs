//! Per-input state held by the store.

#[derive(Clone, Debug, Default)]
pub(crate) struct InputState {
    /// Current text.
    pub value: String,

    /// Bumped on every text mutation, whoever made it.
    pub value_rev: u64,

    /// Caret byte index, always on a char boundary.
    pub caret: usize,

    /// Selection spans `min(anchor, caret)..max(anchor, caret)` when set.
    pub selection_anchor: Option<usize>,
}
