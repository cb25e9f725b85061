use chrono::{DateTime, Utc};
use serde::Serialize;

/// A registered account. Anonymous callers have no `User` at all.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
