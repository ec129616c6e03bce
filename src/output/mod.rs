//! Report views and formatters

pub mod formatter;
pub mod report;
