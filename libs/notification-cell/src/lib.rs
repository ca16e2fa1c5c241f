pub mod error;
pub mod models;
pub mod services;
pub mod templates;

pub use error::*;
pub use models::*;
pub use services::*;
