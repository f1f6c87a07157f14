//! # Hato CLI Library
//!
//! Runs query templates from files against a SPARQL endpoint and exposes
//! the graph store operations as subcommands.

pub mod commands;

pub use commands::*;
