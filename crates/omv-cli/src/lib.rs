//! CLI library components for the OpenMRS Metadata Verifier.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
pub mod types;
