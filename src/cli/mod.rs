//! CLI module for FitTrack API
//!
//! - `serve`: run the HTTP server (default)
//! - `check`: validate configuration and ping the cache store and storage

pub mod check;
pub mod serve;

use clap::{Parser, Subcommand};

/// FitTrack API - fitness tracking backend with cache-aside repositories
#[derive(Parser)]
#[command(name = "fittrack-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Validate configuration and check that backends are reachable
    Check,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}
