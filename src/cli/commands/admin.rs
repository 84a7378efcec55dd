//! Admin commands: user listing, role changes and operator bootstrap.

use std::sync::Arc;

use tokio::runtime::Runtime;

use super::{Credentials, open_directory, sign_in, sign_out};
use crate::admin::AdminConsole;
use crate::config::Config;
use crate::directory::SqliteDirectory;
use crate::error::ResultExt;
use crate::model::Role;

async fn enter(
    directory: &Arc<SqliteDirectory>,
    credentials: &Credentials,
) -> anyhow::Result<AdminConsole<SqliteDirectory>> {
    let session = sign_in(directory, credentials).await?;

    match AdminConsole::enter(directory.clone(), Some(&session)).await {
        Ok(console) => Ok(console),
        Err(redirect) => {
            sign_out(directory, &session).await;
            anyhow::bail!("{}", redirect)
        }
    }
}

/// List users matching a term
pub fn cmd_admin_users(
    rt: &Runtime,
    config: &Config,
    credentials: &Credentials,
    term: &str,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let directory = open_directory(config).await?;
        let console = enter(&directory, credentials).await?;
        let result = console
            .list_users(term)
            .await
            .with_context("Could not list users");
        sign_out(&directory, console.session()).await;

        let users = result?;
        println!("{} users", users.len());
        for user in &users {
            println!(
                "{:<10} {:<24} {:<32} {}",
                user.role, user.display_name, user.email, user.id
            );
        }
        anyhow::Ok(())
    })
}

/// Change one user's role
pub fn cmd_admin_set_role(
    rt: &Runtime,
    config: &Config,
    credentials: &Credentials,
    user_id: &str,
    role: Role,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let directory = open_directory(config).await?;
        let console = enter(&directory, credentials).await?;
        let result = console
            .change_role(user_id, role)
            .await
            .with_context(format!("Could not change role of {}", user_id));
        sign_out(&directory, console.session()).await;

        let profile = result?;
        println!("{} is now {}", profile.display_name, profile.role);
        anyhow::Ok(())
    })
}

/// Set a role straight in the database, bypassing access rules
pub fn cmd_admin_bootstrap(
    rt: &Runtime,
    config: &Config,
    email: &str,
    role: Role,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let directory = open_directory(config).await?;
        let Some(uid) = directory.find_uid(email.trim()).await.with_context("Lookup failed")? else {
            anyhow::bail!("No account for {}", email.trim());
        };
        directory
            .set_role_out_of_band(&uid, role)
            .await
            .with_context(format!("Could not set role for {}", email.trim()))?;
        println!("{} ({}) is now {}", email.trim(), uid, role);
        anyhow::Ok(())
    })
}
