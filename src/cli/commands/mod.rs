//! CLI command definitions and dispatch.
//!
//! Each group of subcommands lives in its own submodule:
//! - `catalog`: search, lookups, album tracks, new releases, related artists
//! - `accounts`: sign-up, sign-in, password reset, profile, account deletion
//! - `reviews`: submitting and listing reviews
//! - `admin`: user listing and role changes
//! - `settings`: writing and locating the config file

mod accounts;
mod admin;
mod catalog;
mod reviews;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tokio::runtime::Runtime;

use crate::accounts::AccountService;
use crate::auth::AuthContext;
use crate::config::{self, Config};
use crate::directory::{Directory, SqliteDirectory, db_url};
use crate::error::ResultExt;
use crate::model::{CatalogItem, Role, Session};
use crate::reviews::{DateWindow, LikedFilter};

pub use accounts::{cmd_delete_account, cmd_profile, cmd_reset_password, cmd_signin, cmd_signup};
pub use admin::{cmd_admin_bootstrap, cmd_admin_set_role, cmd_admin_users};
pub use catalog::{
    cmd_album, cmd_album_tracks, cmd_new_releases, cmd_related_artists, cmd_search, cmd_track,
};
pub use reviews::{cmd_review_liked, cmd_review_list, cmd_review_submit};
pub use settings::{cmd_config_init, cmd_config_path};

/// TrackList CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Database path (overrides the config file)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Email and password of the acting user.
#[derive(Args, Debug, Clone)]
pub struct Credentials {
    /// Account email (or set TRACKLIST_EMAIL)
    #[arg(long, env = "TRACKLIST_EMAIL")]
    pub email: String,
    /// Account password (or set TRACKLIST_PASSWORD)
    #[arg(long, env = "TRACKLIST_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Search the catalog for tracks and albums
    Search {
        /// Search text
        query: String,
        /// Show only tracks
        #[arg(long, conflicts_with = "albums")]
        tracks: bool,
        /// Show only albums
        #[arg(long)]
        albums: bool,
    },
    /// Look up a track by id
    Track { id: String },
    /// Look up an album by id
    Album { id: String },
    /// List the tracks of an album
    AlbumTracks { id: String },
    /// Show new album releases
    NewReleases,
    /// List artists related to an artist id
    RelatedArtists { id: String },
    /// Create an account
    Signup {
        /// Full name shown on the profile
        #[arg(long)]
        name: String,
        /// Phone number, e.g. +15551234567
        #[arg(long)]
        phone: String,
        /// Date of birth as DD/MM/YYYY
        #[arg(long)]
        dob: String,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Check credentials and show the signed-in user
    Signin {
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Request a password reset mail
    ResetPassword { email: String },
    /// Show or edit your profile
    Profile {
        #[command(flatten)]
        credentials: Credentials,
        /// New full name
        #[arg(long)]
        name: Option<String>,
        /// New bio
        #[arg(long)]
        bio: Option<String>,
        /// New avatar URL (.png, .jpg or .jpeg)
        #[arg(long)]
        avatar: Option<String>,
    },
    /// Delete your profile and account
    DeleteAccount {
        #[command(flatten)]
        credentials: Credentials,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Write and read reviews
    #[command(subcommand)]
    Review(ReviewCommands),
    /// Administer users and roles
    #[command(subcommand)]
    Admin(AdminCommands),
    /// Manage the config file
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ReviewCommands {
    /// Review a track or album
    Submit {
        /// Catalog id of the reviewed item
        item_id: String,
        /// Star rating, 1 to 5
        #[arg(short, long)]
        rating: u8,
        /// Review text
        #[arg(short, long)]
        text: String,
        /// Tag, may be repeated
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// The item is an album rather than a track
        #[arg(long)]
        album: bool,
        /// Mark the item as liked
        #[arg(long)]
        liked: bool,
        /// Disallow replies
        #[arg(long)]
        no_replies: bool,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// List reviews of an item, newest first
    List {
        item_id: String,
        /// Only your own reviews (needs credentials)
        #[arg(long, requires = "email")]
        mine: bool,
        #[arg(long, env = "TRACKLIST_EMAIL")]
        email: Option<String>,
        #[arg(long, env = "TRACKLIST_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Items you reviewed and liked
    Liked {
        /// Oldest first instead of newest first
        #[arg(long)]
        oldest: bool,
        /// Only likes from the past week, month or year
        #[arg(long, conflicts_with_all = ["from", "to"])]
        since: Option<DateWindow>,
        /// Start of a date range, YYYY-MM-DD
        #[arg(long)]
        from: Option<NaiveDate>,
        /// End of a date range, YYYY-MM-DD (inclusive)
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Only items crediting this artist
        #[arg(long)]
        artist: Option<String>,
        #[command(flatten)]
        credentials: Credentials,
    },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// List users, optionally filtered by name or email
    Users {
        /// Case-insensitive search term
        #[arg(default_value = "")]
        term: String,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Change a user's role
    SetRole {
        user_id: String,
        /// Regular, Moderator or Admin
        role: Role,
        #[command(flatten)]
        credentials: Credentials,
    },
    /// Grant or revoke a role directly in the database (operator only)
    Bootstrap {
        /// Email of the account to change
        email: String,
        #[arg(long, default_value = "Admin")]
        role: Role,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the current settings to the config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file location
    Path,
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let mut config = config::load();
    if let Some(db) = &cli.db {
        config.directory.database = Some(db.clone());
    }

    match &cli.command {
        Commands::Search {
            query,
            tracks,
            albums,
        } => cmd_search(&rt, &config, query, *tracks, *albums),
        Commands::Track { id } => cmd_track(&rt, &config, id),
        Commands::Album { id } => cmd_album(&rt, &config, id),
        Commands::AlbumTracks { id } => cmd_album_tracks(&rt, &config, id),
        Commands::NewReleases => cmd_new_releases(&rt, &config),
        Commands::RelatedArtists { id } => cmd_related_artists(&rt, &config, id),
        Commands::Signup {
            name,
            phone,
            dob,
            credentials,
        } => cmd_signup(&rt, &config, name, phone, dob, credentials),
        Commands::Signin { credentials } => cmd_signin(&rt, &config, credentials),
        Commands::ResetPassword { email } => cmd_reset_password(&rt, &config, email),
        Commands::Profile {
            credentials,
            name,
            bio,
            avatar,
        } => cmd_profile(
            &rt,
            &config,
            credentials,
            name.as_deref(),
            bio.as_deref(),
            avatar.as_deref(),
        ),
        Commands::DeleteAccount { credentials, yes } => {
            cmd_delete_account(&rt, &config, credentials, *yes)
        }
        Commands::Review(ReviewCommands::Submit {
            item_id,
            rating,
            text,
            tags,
            album,
            liked,
            no_replies,
            credentials,
        }) => cmd_review_submit(
            &rt,
            &config,
            credentials,
            reviews::Draft {
                item_id,
                rating: *rating,
                text,
                tags,
                album: *album,
                liked: *liked,
                can_reply: !*no_replies,
            },
        ),
        Commands::Review(ReviewCommands::List {
            item_id,
            mine,
            email,
            password,
        }) => {
            let credentials = match (email, password) {
                (Some(email), Some(password)) => Some(Credentials {
                    email: email.clone(),
                    password: password.clone(),
                }),
                _ => None,
            };
            cmd_review_list(&rt, &config, item_id, *mine, credentials.as_ref())
        }
        Commands::Review(ReviewCommands::Liked {
            oldest,
            since,
            from,
            to,
            artist,
            credentials,
        }) => {
            let window = match (from, to) {
                (None, None) => since.unwrap_or_default(),
                (from, to) => DateWindow::Range {
                    from: from.unwrap_or(NaiveDate::MIN),
                    to: to.unwrap_or(NaiveDate::MAX),
                },
            };
            let filter = LikedFilter {
                window,
                artist: artist.clone(),
            };
            cmd_review_liked(&rt, &config, credentials, *oldest, &filter)
        }
        Commands::Admin(AdminCommands::Users { term, credentials }) => {
            cmd_admin_users(&rt, &config, credentials, term)
        }
        Commands::Admin(AdminCommands::SetRole {
            user_id,
            role,
            credentials,
        }) => cmd_admin_set_role(&rt, &config, credentials, user_id, *role),
        Commands::Admin(AdminCommands::Bootstrap { email, role }) => {
            cmd_admin_bootstrap(&rt, &config, email, *role)
        }
        Commands::Config(ConfigCommands::Init { force }) => cmd_config_init(&config, *force),
        Commands::Config(ConfigCommands::Path) => cmd_config_path(),
    }
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Open the configured directory database, creating its folder if needed.
pub(crate) async fn open_directory(config: &Config) -> anyhow::Result<Arc<SqliteDirectory>> {
    let path = config.directory.database_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    tracing::debug!(db = %path.display(), "Opening directory");

    let directory = SqliteDirectory::open(&db_url(Some(&path)))
        .await
        .with_context(format!("Failed to open database {}", path.display()))?;
    Ok(Arc::new(directory))
}

/// Sign in with `credentials` and return the session the directory now
/// reports as current.
pub(crate) async fn sign_in(
    directory: &Arc<SqliteDirectory>,
    credentials: &Credentials,
) -> anyhow::Result<Session> {
    let auth = AuthContext::for_directory(directory.as_ref());
    AccountService::new(directory.clone())
        .sign_in(&credentials.email, &credentials.password)
        .await
        .with_context("Sign-in failed")?;
    auth.require().map_err(|redirect| anyhow::anyhow!("{redirect}"))
}

/// End a CLI session. Failure only leaves a stale session row behind.
pub(crate) async fn sign_out(directory: &SqliteDirectory, session: &Session) {
    if let Err(e) = directory.sign_out(session).await {
        tracing::warn!(error = %e, "Failed to end session");
    }
}

/// Print one catalog item on a single line.
pub(crate) fn print_item(item: &CatalogItem) {
    println!(
        "[{}] {} - {} ({})  id={}",
        item.kind.label(),
        item.title,
        item.primary_artist,
        item.year,
        item.id
    );
}
