#![forbid(unsafe_code)]

pub mod counter;
pub mod error;
pub mod model;
pub mod session;
pub mod time;

pub use error::{Error, SessionError};
pub use time::Clock;
