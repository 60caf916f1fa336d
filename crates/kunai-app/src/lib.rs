//! HTTP surface of the Kunai scheduler.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
