//! TrackList - music catalog search, reviews and user roles.
//!
//! Searches a music catalog (tracks and albums), stores user reviews of
//! catalog items, and manages accounts with Regular, Moderator and Admin
//! roles. Everything is driven from the CLI in [`cli`].

pub mod accounts;
pub mod admin;
pub mod auth;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod directory;
pub mod error;
pub mod model;
pub mod reviews;
#[cfg(test)]
pub mod test_utils;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    let args = cli::Cli::parse();

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tracklist=info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli::run_command(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Command failed");
            match e.downcast_ref::<error::Error>() {
                Some(err) => eprintln!("{}", err.kind().user_message()),
                None => eprintln!("{}", e),
            }
            ExitCode::FAILURE
        }
    }
}
