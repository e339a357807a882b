/// A text selection as a normalized byte range (`start <= end`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    #[inline]
    pub(crate) fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
