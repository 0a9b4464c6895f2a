//! Command-line surface: argument model, console output, and table rendering.

pub mod args;
pub mod output;
pub mod ui;

pub use args::Cli;
