//! Bridge between the egui thread and the backend worker: the command enum
//! and the worker runtime that executes commands against the REST API.

pub mod commands;
pub mod runtime;
