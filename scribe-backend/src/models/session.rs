use chrono::{DateTime, Utc};
use serde::Serialize;

/// A login session backing the `session` cookie.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
