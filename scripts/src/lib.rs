//! Scripts for compiling, deploying and verifying the Authentico contract.

#![warn(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod errors;
pub mod verify;

/// Our build utils
pub mod build;

/// Our deploy utils
pub mod deploy;

/// Our output utils
mod output_writer;

/// Process helpers
mod utils;

pub mod tx;
