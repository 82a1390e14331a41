//! Shelter record workflows: animal intake and browsing, visit reservations,
//! adoptions, visitor accounts, support requests and donations.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
