//! Command-line interface for TrackList.
//!
//! Catalog browsing, accounts, reviews and role administration from the
//! terminal. Credentials can come from `--email`/`--password` or the
//! `TRACKLIST_EMAIL`/`TRACKLIST_PASSWORD` environment variables.

mod commands;

pub use commands::{Cli, Commands, run_command};
