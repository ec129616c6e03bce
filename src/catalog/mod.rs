//! Canonical skills, job profiles, learning resources and their storage

pub mod skill;
pub mod vocabulary;
pub mod reconciliation;
pub mod registry;
pub mod jobs;
pub mod resources;
pub mod store;
pub mod snapshot;
