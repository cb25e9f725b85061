//! The note submission form.
//!
//! Title and text are required; slug is optional and derived from the
//! title when blank. A slug collision attaches a field error whose
//! message is the conflicting slug followed by the fixed `WARNING`
//! suffix, and nothing is persisted.

use rusqlite::Result as SqliteResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::db::Database;

/// Fixed suffix appended to the conflicting slug in the field error.
pub const WARNING: &str = " - a note with this slug already exists, pick a unique value";

/// Slugs are capped the way the original column was sized.
const MAX_SLUG_LEN: usize = 100;

const REQUIRED: &str = "This field is required";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub slug: String,
}

/// Field-level validation errors, keyed by form field name.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: String) {
        self.0.entry(field.to_string()).or_default().push(message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&Vec<String>> {
        self.0.get(field)
    }
}

/// A note submission that passed validation and is safe to persist.
#[derive(Debug, Clone)]
pub struct ValidatedNote {
    pub title: String,
    pub text: String,
    pub slug: String,
}

/// Slugify a title (e.g. "Note Title!" -> "note-title")
pub fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<&str>>()
        .join("-")
}

impl NoteForm {
    /// Validate a creation submission. The uniqueness probe hits the
    /// store, so this can also fail with a database error.
    pub fn validate(&self, db: &Database) -> SqliteResult<Result<ValidatedNote, FieldErrors>> {
        let mut errors = FieldErrors::default();

        let title = self.title.trim();
        let text = self.text.trim();

        if title.is_empty() {
            errors.add("title", REQUIRED.to_string());
        }
        if text.is_empty() {
            errors.add("text", REQUIRED.to_string());
        }

        let mut slug = if self.slug.trim().is_empty() {
            slugify(title)
        } else {
            self.slug.trim().to_string()
        };
        if slug.chars().count() > MAX_SLUG_LEN {
            slug = slug.chars().take(MAX_SLUG_LEN).collect();
        }

        if slug.is_empty() {
            // Only reachable when the title is also blank or unslugifiable
            if errors.field("title").is_none() {
                errors.add("slug", REQUIRED.to_string());
            }
        } else if db.slug_exists(&slug)? {
            errors.add("slug", format!("{}{}", slug, WARNING));
        }

        if !errors.is_empty() {
            return Ok(Err(errors));
        }

        Ok(Ok(ValidatedNote {
            title: title.to_string(),
            text: text.to_string(),
            slug,
        }))
    }

    /// Validate an edit submission. Slug is immutable, so only the
    /// required fields are checked.
    pub fn validate_edit(&self) -> Result<(String, String), FieldErrors> {
        let mut errors = FieldErrors::default();

        let title = self.title.trim();
        let text = self.text.trim();

        if title.is_empty() {
            errors.add("title", REQUIRED.to_string());
        }
        if text.is_empty() {
            errors.add("text", REQUIRED.to_string());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok((title.to_string(), text.to_string()))
    }
}
