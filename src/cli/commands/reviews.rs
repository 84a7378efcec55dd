//! Review commands: submit, list and liked items.

use tokio::runtime::Runtime;

use super::{Credentials, open_directory, sign_in, sign_out};
use crate::catalog::{CatalogClient, Lookup};
use crate::config::Config;
use crate::error::ResultExt;
use crate::model::{ItemKind, NewReview, Review, ReviewScope};
use crate::reviews::{LikedFilter, ReviewSort, ReviewStore, SubmitGuard, liked_artists};

/// Review fields as given on the command line.
pub struct Draft<'a> {
    pub item_id: &'a str,
    pub rating: u8,
    pub text: &'a str,
    pub tags: &'a [String],
    pub album: bool,
    pub liked: bool,
    pub can_reply: bool,
}

fn print_review(review: &Review) {
    let stars = "★".repeat(review.rating as usize);
    let mut title = review.item_title.as_deref().unwrap_or(&review.item_id).to_string();
    if let Some(artist) = &review.item_artist {
        title = format!("{title} - {artist}");
    }
    println!(
        "{:<5} {}  by {}  {}",
        stars,
        title,
        review.author_id,
        review.created_at.format("%Y-%m-%d %H:%M")
    );
    println!("      {}", review.text);
    if !review.tags.is_empty() {
        let tags: Vec<&str> = review.tags.iter().map(String::as_str).collect();
        println!("      tags: {}", tags.join(", "));
    }
}

/// Submit a review, attaching title, artist, year and artwork when the catalog is reachable
pub fn cmd_review_submit(
    rt: &Runtime,
    config: &Config,
    credentials: &Credentials,
    draft: Draft<'_>,
) -> anyhow::Result<()> {
    let mut review = NewReview::new(draft.item_id, draft.rating, draft.text)
        .with_tags(draft.tags.iter().cloned());
    review.liked = draft.liked;
    review.can_reply = draft.can_reply;
    let kind = if draft.album {
        ItemKind::Album
    } else {
        ItemKind::Track
    };

    rt.block_on(async {
        match CatalogClient::from_config(&config.catalog) {
            Ok(client) => match client.lookup(kind, draft.item_id).await {
                Lookup::Found(item) if !item.is_unknown() => review = review.for_item(&item),
                Lookup::Found(_) => tracing::warn!("Catalog unreachable, storing review without item details"),
                Lookup::NotFound => anyhow::bail!("{} {} not found in the catalog", kind.label(), draft.item_id),
            },
            Err(e) => tracing::warn!(error = %e, "Catalog not configured, storing review without item details"),
        }

        let directory = open_directory(config).await?;
        let session = sign_in(&directory, credentials).await?;
        let store = ReviewStore::new(directory.clone());
        let guard = SubmitGuard::new();

        let result = guard
            .run(store.submit(&session, review))
            .await
            .with_context("Review not saved");
        sign_out(&directory, &session).await;

        println!("Review submitted! ({})", result?);
        anyhow::Ok(())
    })
}

/// List reviews of an item
pub fn cmd_review_list(
    rt: &Runtime,
    config: &Config,
    item_id: &str,
    mine: bool,
    credentials: Option<&Credentials>,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let directory = open_directory(config).await?;
        let store = ReviewStore::new(directory.clone());

        let session = match credentials {
            Some(credentials) if mine => Some(sign_in(&directory, credentials).await?),
            _ => None,
        };
        let scope = if mine {
            ReviewScope::CurrentUserOnly
        } else {
            ReviewScope::Everyone
        };

        let result = store
            .list_for(item_id, scope, session.as_ref())
            .await
            .with_context("Could not load reviews");
        if let Some(session) = &session {
            sign_out(&directory, session).await;
        }

        let reviews = result?;
        if reviews.is_empty() {
            println!("No reviews yet for {}", item_id);
        }
        for review in &reviews {
            print_review(review);
        }
        anyhow::Ok(())
    })
}

/// List items the user reviewed and liked
pub fn cmd_review_liked(
    rt: &Runtime,
    config: &Config,
    credentials: &Credentials,
    oldest_first: bool,
    filter: &LikedFilter,
) -> anyhow::Result<()> {
    let order = if oldest_first {
        ReviewSort::OldestFirst
    } else {
        ReviewSort::NewestFirst
    };

    rt.block_on(async {
        let directory = open_directory(config).await?;
        let session = sign_in(&directory, credentials).await?;
        let result = ReviewStore::new(directory.clone())
            .liked_by(&session.user_id, order, filter)
            .await
            .with_context("Could not load liked items");
        sign_out(&directory, &session).await;

        let liked = result?;
        let artist = filter.artist.as_deref().unwrap_or("All artists");
        println!("{} liked items ({}, {})", liked.len(), filter.window.label(), artist);
        for review in &liked {
            print_review(review);
        }
        if filter.artist.is_none() && !liked.is_empty() {
            println!("Artists: {}", liked_artists(&liked).join(", "));
        }
        anyhow::Ok(())
    })
}
