//! sentree: sentiment hierarchies and word-frequency views over customer reviews
//!
//! Layers, innermost first: `domain` (no I/O), `application` (services over
//! the `FileSystem` trait), `infrastructure` (wiring), `cli`.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
