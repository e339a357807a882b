//! # input_core
//!
//! UI-agnostic value store for the `<input>` elements a spinner binds to.
//!
//! The text held here is the single source of truth for a spinner's value:
//! the engine parses it on every operation and writes back only formatted
//! results. Page code (or a simulated user typing) edits the same text, so
//! this crate provides plain single-line editing semantics as well:
//! - [`InputId`]: opaque identifier for an input element
//! - [`InputValueStore`]: values, caret positions, selections and revisions
//!
//! It depends only on `std`.

mod id;
mod selection;
mod state;
mod store;
mod text;

pub use id::InputId;
pub use store::InputValueStore;
