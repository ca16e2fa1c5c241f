pub mod clock;
pub mod guard;
pub mod test_utils;
pub mod token;

pub use clock::{Clock, FixedClock, SystemClock};
pub use guard::{AccessDenied, AccessPolicy, Actor, Ownership};
pub use token::{random_base36, timestamped_token};
