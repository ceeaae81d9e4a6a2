//! Data types exchanged between the API core and calling code

pub mod normalized;
pub mod session;

pub use normalized::{ErrorKind, NormalizedError};
pub use session::{Session, UserProfile};
