//! Storage records and request types.

pub mod sessions;
pub mod users;
