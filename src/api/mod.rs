//! API implementations provided by application.

pub mod client;
pub mod control;
