//! Kunai meeting scheduler - shared types, configuration and errors.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
