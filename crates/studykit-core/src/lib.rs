//! Shared building blocks for StudyKit: configuration and small utilities.

pub mod config;
pub mod utils;
