//! CLI module for tagflow - command-line interface and subcommands.
//!
//! Provides the entry point for running the parse/apply pipeline offline
//! against saved tagged documents.

pub mod commands;

pub use commands::Cli;
