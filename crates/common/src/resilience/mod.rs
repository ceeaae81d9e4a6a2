//! Time abstraction shared by the TTL-driven components
//!
//! Components that expire entries (resource cache, request deduplication)
//! read time through [`Clock`] so tests can drive expiry with [`MockClock`]
//! instead of sleeping.

mod clock;

pub use clock::{Clock, MockClock, SystemClock};
