//! Catalog commands: search, lookups and browsing.

use std::sync::Arc;

use tokio::runtime::Runtime;

use super::print_item;
use crate::catalog::{CatalogClient, KindFilter, Lookup, SearchSession};
use crate::config::Config;
use crate::error::ResultExt;
use crate::model::ItemKind;

fn client(config: &Config) -> anyhow::Result<CatalogClient> {
    Ok(CatalogClient::from_config(&config.catalog).with_context("Catalog unavailable")?)
}

/// Search tracks and albums
pub fn cmd_search(
    rt: &Runtime,
    config: &Config,
    query: &str,
    tracks_only: bool,
    albums_only: bool,
) -> anyhow::Result<()> {
    let filter = match (tracks_only, albums_only) {
        (true, _) => KindFilter::Tracks,
        (_, true) => KindFilter::Albums,
        _ => KindFilter::All,
    };
    let session = SearchSession::new(Arc::new(client(config)?), config.search.debounce());

    rt.block_on(session.search(query));

    let results = session.filtered(filter);
    if results.is_empty() {
        println!("No results for \"{}\"", query.trim());
        return Ok(());
    }
    for item in &results {
        print_item(item);
    }
    Ok(())
}

fn print_lookup(kind: ItemKind, id: &str, lookup: Lookup) {
    match lookup {
        Lookup::Found(item) if item.is_unknown() => {
            println!("{} {} could not be loaded right now", kind.label(), id);
            print_item(&item);
        }
        Lookup::Found(item) => {
            print_item(&item);
            if !item.image_url.is_empty() {
                println!("  image: {}", item.image_url);
            }
        }
        Lookup::NotFound => println!("{} {} not found", kind.label(), id),
    }
}

/// Look up one track
pub fn cmd_track(rt: &Runtime, config: &Config, id: &str) -> anyhow::Result<()> {
    let client = client(config)?;
    let lookup = rt.block_on(client.lookup_by_id(id));
    print_lookup(ItemKind::Track, id, lookup);
    Ok(())
}

/// Look up one album
pub fn cmd_album(rt: &Runtime, config: &Config, id: &str) -> anyhow::Result<()> {
    let client = client(config)?;
    let lookup = rt.block_on(client.lookup_album(id));
    print_lookup(ItemKind::Album, id, lookup);
    Ok(())
}

/// List an album's tracks
pub fn cmd_album_tracks(rt: &Runtime, config: &Config, id: &str) -> anyhow::Result<()> {
    let client = client(config)?;
    let tracks = rt.block_on(client.get_tracks_for_album(id));
    if tracks.is_empty() {
        println!("No tracks found for album {}", id);
    }
    for (n, track) in tracks.iter().enumerate() {
        print!("{:>3}. ", n + 1);
        print_item(track);
    }
    Ok(())
}

/// Show new releases
pub fn cmd_new_releases(rt: &Runtime, config: &Config) -> anyhow::Result<()> {
    let client = client(config)?;
    let albums = rt.block_on(client.new_releases());
    println!("{} new releases", albums.len());
    for album in &albums {
        print_item(album);
    }
    Ok(())
}

/// List artists related to an artist
pub fn cmd_related_artists(rt: &Runtime, config: &Config, id: &str) -> anyhow::Result<()> {
    let client = client(config)?;
    let artists = rt.block_on(client.related_artists(id));
    if artists.is_empty() {
        println!("No related artists found for {}", id);
    }
    for artist in &artists {
        if artist.genres.is_empty() {
            println!("{}  id={}", artist.name, artist.id);
        } else {
            println!("{} [{}]  id={}", artist.name, artist.genres.join(", "), artist.id);
        }
    }
    Ok(())
}
