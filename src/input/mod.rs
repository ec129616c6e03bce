//! Input processing module
//! Reads candidate skill mentions from files

pub mod mentions;

pub use mentions::{MentionFormat, MentionReader};
