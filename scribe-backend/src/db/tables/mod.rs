pub mod auth_sessions;
pub mod notes;
pub mod users;
