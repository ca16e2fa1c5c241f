pub mod directory;
pub mod dispatcher;
pub mod sender;

pub use directory::{ContactDirectory, InMemoryContactDirectory, SupabaseContactDirectory};
pub use dispatcher::NotificationDispatcher;
pub use sender::{EmailSender, HttpEmailSender, RecordingEmailSender};
