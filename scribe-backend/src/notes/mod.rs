//! Note form validation — required fields, slug derivation, and the
//! unique-slug check that backs the note creation flow.

pub mod form;

pub use form::{NoteForm, WARNING};
