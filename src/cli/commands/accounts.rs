//! Account commands: sign-up, sign-in, password reset, profile and deletion.

use tokio::runtime::Runtime;

use super::{Credentials, open_directory, sign_in, sign_out};
use crate::accounts::{AccountError, AccountService, ProfileUpdate, SignUpForm};
use crate::config::Config;
use crate::error::ResultExt;
use crate::model::UserProfile;

fn print_profile(profile: &UserProfile) {
    println!("{} <{}>", profile.display_name, profile.email);
    println!("  id:   {}", profile.id);
    println!("  role: {}", profile.role);
    println!("  bio:  {}", profile.bio);
    if !profile.avatar_url.is_empty() {
        println!("  avatar: {}", profile.avatar_url);
    }
}

/// Create an account and its profile
pub fn cmd_signup(
    rt: &Runtime,
    config: &Config,
    name: &str,
    phone: &str,
    dob: &str,
    credentials: &Credentials,
) -> anyhow::Result<()> {
    let form = SignUpForm {
        full_name: name.to_string(),
        email: credentials.email.clone(),
        phone: phone.to_string(),
        date_of_birth: dob.to_string(),
        password: credentials.password.clone(),
    };

    rt.block_on(async {
        let directory = open_directory(config).await?;
        let accounts = AccountService::new(directory.clone());
        let session = accounts.sign_up(&form).await.with_context("Sign-up failed")?;
        println!("Sign-up complete! Your user id is {}", session.user_id);
        sign_out(&directory, &session).await;
        anyhow::Ok(())
    })
}

/// Verify credentials
pub fn cmd_signin(rt: &Runtime, config: &Config, credentials: &Credentials) -> anyhow::Result<()> {
    rt.block_on(async {
        let directory = open_directory(config).await?;
        let session = sign_in(&directory, credentials).await?;
        let profile = AccountService::new(directory.clone())
            .load_profile(&session.user_id)
            .await
            .with_context("Could not load profile")?;
        println!("Signed in as {} ({})", profile.display_name, profile.role);
        sign_out(&directory, &session).await;
        anyhow::Ok(())
    })
}

/// Request a password reset
pub fn cmd_reset_password(rt: &Runtime, config: &Config, email: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let directory = open_directory(config).await?;
        AccountService::new(directory)
            .reset_password(email)
            .await
            .with_context("Password reset failed")?;
        println!("If an account exists for {}, a reset link has been sent.", email.trim());
        anyhow::Ok(())
    })
}

/// Show the profile, applying any edits first
pub fn cmd_profile(
    rt: &Runtime,
    config: &Config,
    credentials: &Credentials,
    name: Option<&str>,
    bio: Option<&str>,
    avatar: Option<&str>,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let directory = open_directory(config).await?;
        let accounts = AccountService::new(directory.clone());
        let session = sign_in(&directory, credentials).await?;

        let result = async {
            let current = accounts.load_profile(&session.user_id).await?;
            if name.is_none() && bio.is_none() && avatar.is_none() {
                return Ok::<_, AccountError>(current);
            }
            let update = ProfileUpdate {
                display_name: name.unwrap_or(&current.display_name).to_string(),
                bio: bio.unwrap_or(&current.bio).to_string(),
                avatar_url: avatar.map(str::to_string),
            };
            accounts.update_profile(&session, &update).await
        }
        .await
        .with_context("Profile update failed");

        sign_out(&directory, &session).await;
        print_profile(&result?);
        anyhow::Ok(())
    })
}

/// Delete the profile and account
pub fn cmd_delete_account(
    rt: &Runtime,
    config: &Config,
    credentials: &Credentials,
    confirmed: bool,
) -> anyhow::Result<()> {
    if !confirmed {
        anyhow::bail!("Refusing to delete {} without --yes", credentials.email);
    }

    rt.block_on(async {
        let directory = open_directory(config).await?;
        let session = sign_in(&directory, credentials).await?;
        AccountService::new(directory.clone())
            .delete_account(&session)
            .await
            .with_context("Account deletion failed")?;
        println!("Account {} deleted.", credentials.email);
        anyhow::Ok(())
    })
}
