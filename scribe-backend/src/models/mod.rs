pub mod note;
pub mod session;
pub mod user;

pub use note::Note;
pub use session::Session;
pub use user::User;
