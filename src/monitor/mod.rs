//! Availability monitoring: target registry, transition rules, probing and scheduling.

pub mod checker;
pub mod clock;
pub mod models;
pub mod scheduler;
pub mod target_store;
pub mod transition;
