//! Role administration CLI for Open Console.
//!
//! The binary is a thin wrapper; parsing, configuration and command
//! dispatch live here so they can be tested without a process.

pub mod cli;
pub mod config;
pub mod error;
