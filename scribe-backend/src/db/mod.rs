pub mod sqlite;
pub mod tables;

pub use sqlite::{Database, is_unique_violation};
