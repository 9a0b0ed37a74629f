// Crate root library declaration and module exports.
pub mod cli;
pub mod config;
pub mod document;
pub mod model;
