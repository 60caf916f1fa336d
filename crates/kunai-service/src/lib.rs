//! Meeting storage, per-occurrence exceptions, reminders and the command
//! layer the chat bot talks to.

pub mod clock;
pub mod command;
pub mod depot;
pub mod error;
pub mod exception;
pub mod meeting;
pub mod registry;
pub mod reminder;
pub mod timezone_store;
