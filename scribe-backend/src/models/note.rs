use chrono::{DateTime, Utc};
use serde::Serialize;

/// A note row. `id` is the creation-order key; `slug` is globally unique.
/// `slug` and `author_id` never change after creation — edits touch
/// title and text only.
#[derive(Debug, Clone, Serialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub slug: String,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Ownership capability check: only the author may edit or delete.
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.author_id == user_id
    }
}
