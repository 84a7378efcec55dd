//! Adapter layer: Convert catalog DTOs to domain models
//!
//! This is the ONLY place where catalog DTO types become [`CatalogItem`]s
//! and [`Artist`]s.
//! Every call site gets the same normalization:
//! - all credited artists joined with ", "
//! - the first image, or an empty string
//! - the first four characters of the release date, or "Unknown"

use super::dto;
use crate::model::{Artist, CatalogItem, ItemKind, UNKNOWN};

/// Convert a search response: tracks first, then albums.
pub fn search_to_items(response: dto::SearchResponse) -> Vec<CatalogItem> {
    let tracks = response
        .tracks
        .map(|page| page.items)
        .unwrap_or_default()
        .into_iter()
        .map(track_to_item);
    let albums = response
        .albums
        .map(|page| page.items)
        .unwrap_or_default()
        .into_iter()
        .map(album_to_item);

    tracks.chain(albums).collect()
}

/// Convert a track object. Year and image come from its album.
pub fn track_to_item(track: dto::TrackObject) -> CatalogItem {
    let (year, image_url) = match &track.album {
        Some(album) => (
            release_year(album.release_date.as_deref()),
            first_image(&album.images),
        ),
        None => (UNKNOWN.to_string(), String::new()),
    };

    CatalogItem {
        primary_artist: join_artists(&track.artists),
        id: track.id,
        title: track.name,
        kind: ItemKind::Track,
        year,
        image_url,
    }
}

/// Convert an album object.
pub fn album_to_item(album: dto::AlbumObject) -> CatalogItem {
    CatalogItem {
        primary_artist: join_artists(&album.artists),
        year: release_year(album.release_date.as_deref()),
        image_url: first_image(&album.images),
        id: album.id,
        title: album.name,
        kind: ItemKind::Album,
    }
}

/// Convert the tracks embedded in an album lookup.
///
/// Simplified tracks carry no album, so they inherit the album's year and
/// image.
pub fn album_tracks_to_items(album: dto::AlbumObject) -> Vec<CatalogItem> {
    let year = release_year(album.release_date.as_deref());
    let image_url = first_image(&album.images);

    album
        .tracks
        .map(|page| page.items)
        .unwrap_or_default()
        .into_iter()
        .map(|track| CatalogItem {
            primary_artist: join_artists(&track.artists),
            id: track.id,
            title: track.name,
            kind: ItemKind::Track,
            year: year.clone(),
            image_url: image_url.clone(),
        })
        .collect()
}

/// Convert a new-releases response.
pub fn new_releases_to_items(response: dto::NewReleasesResponse) -> Vec<CatalogItem> {
    response.albums.items.into_iter().map(album_to_item).collect()
}

/// Convert a related-artists response, keeping the vendor's order.
pub fn related_artists_to_artists(response: dto::RelatedArtistsResponse) -> Vec<Artist> {
    response
        .artists
        .into_iter()
        .map(|artist| Artist {
            image_url: first_image(&artist.images),
            id: artist.id,
            name: artist.name,
            genres: artist.genres,
        })
        .collect()
}

/// Join every credited artist name with ", ".
pub fn join_artists(artists: &[dto::ArtistRef]) -> String {
    if artists.is_empty() {
        return UNKNOWN.to_string();
    }
    artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// First four characters of a release date, when they are a year.
pub fn release_year(date: Option<&str>) -> String {
    date.and_then(|d| d.get(..4))
        .filter(|y| y.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn first_image(images: &[dto::Image]) -> String {
    images.first().map(|i| i.url.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn artist(name: &str) -> dto::ArtistRef {
        dto::ArtistRef {
            id: Some(format!("{}-id", name.to_lowercase())),
            name: name.to_string(),
        }
    }

    fn album(id: &str, name: &str, date: Option<&str>) -> dto::AlbumObject {
        dto::AlbumObject {
            id: id.to_string(),
            name: name.to_string(),
            artists: vec![artist("Bad Bunny")],
            images: vec![],
            release_date: date.map(String::from),
            album_type: Some("album".to_string()),
            total_tracks: None,
            tracks: None,
        }
    }

    fn track(id: &str, name: &str, artists: Vec<dto::ArtistRef>) -> dto::TrackObject {
        dto::TrackObject {
            id: id.to_string(),
            name: name.to_string(),
            artists,
            album: None,
            duration_ms: None,
            track_number: None,
            external_urls: None,
        }
    }

    #[test]
    fn test_track_takes_year_and_image_from_album() {
        let mut t = track("t1", "DtMF", vec![artist("Bad Bunny")]);
        let mut a = album("a1", "DeBÍ TiRAR MáS FOToS", Some("2025-01-05"));
        a.images = vec![
            dto::Image {
                url: "https://i.example/640.jpg".to_string(),
                height: Some(640),
                width: Some(640),
            },
            dto::Image {
                url: "https://i.example/64.jpg".to_string(),
                height: Some(64),
                width: Some(64),
            },
        ];
        t.album = Some(a);

        let item = track_to_item(t);

        assert_eq!(item.title, "DtMF");
        assert_eq!(item.primary_artist, "Bad Bunny");
        assert_eq!(item.kind, ItemKind::Track);
        assert_eq!(item.year, "2025");
        assert_eq!(item.image_url, "https://i.example/640.jpg");
    }

    #[test]
    fn test_missing_release_date_is_unknown() {
        let item = album_to_item(album("a1", "Untitled", None));
        assert_eq!(item.year, "Unknown");
        assert!(item.image_url.is_empty());
    }

    #[test]
    fn test_malformed_release_date_is_unknown() {
        assert_eq!(release_year(Some("20")), "Unknown");
        assert_eq!(release_year(Some("n/a-01-01")), "Unknown");
        assert_eq!(release_year(Some("")), "Unknown");
        assert_eq!(release_year(Some("1999-12")), "1999");
    }

    #[test]
    fn test_collaboration_joins_all_artists() {
        let t = track(
            "t1",
            "Under Pressure",
            vec![artist("Queen"), artist("David Bowie")],
        );
        assert_eq!(track_to_item(t).primary_artist, "Queen, David Bowie");
    }

    #[test]
    fn test_search_orders_tracks_before_albums() {
        let response = dto::SearchResponse {
            tracks: Some(dto::Paging {
                items: vec![track("t1", "Song", vec![artist("A")])],
                total: Some(1),
                next: None,
            }),
            albums: Some(dto::Paging {
                items: vec![album("a1", "Record", Some("2024"))],
                total: Some(1),
                next: None,
            }),
        };

        let items = search_to_items(response);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, ItemKind::Track);
        assert_eq!(items[1].kind, ItemKind::Album);
    }

    #[test]
    fn test_album_tracks_inherit_album_year() {
        let mut a = album("a1", "Record", Some("2022-06-01"));
        a.tracks = Some(dto::Paging {
            items: vec![
                track("t1", "One", vec![artist("Mora")]),
                track("t2", "Two", vec![artist("Mora"), artist("Jhayco")]),
            ],
            total: Some(2),
            next: Some("https://api.example/v1/albums/a1/tracks?offset=2".to_string()),
        });

        let items = album_tracks_to_items(a);

        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.year == "2022"));
        assert_eq!(items[1].primary_artist, "Mora, Jhayco");
    }

    #[test]
    fn test_related_artists_take_first_image() {
        let response = dto::RelatedArtistsResponse {
            artists: vec![
                dto::ArtistObject {
                    id: "ar1".to_string(),
                    name: "Feid".to_string(),
                    genres: vec!["reggaeton colombiano".to_string()],
                    images: vec![
                        dto::Image {
                            url: "https://i.example/big.jpg".to_string(),
                            height: Some(640),
                            width: Some(640),
                        },
                        dto::Image {
                            url: "https://i.example/small.jpg".to_string(),
                            height: Some(64),
                            width: Some(64),
                        },
                    ],
                    popularity: Some(80),
                },
                dto::ArtistObject {
                    id: "ar2".to_string(),
                    name: "Karol G".to_string(),
                    genres: Vec::new(),
                    images: Vec::new(),
                    popularity: None,
                },
            ],
        };

        let artists = related_artists_to_artists(response);

        assert_eq!(artists.len(), 2);
        assert_eq!(artists[0].image_url, "https://i.example/big.jpg");
        assert_eq!(artists[0].genres, vec!["reggaeton colombiano"]);
        assert_eq!(artists[1].name, "Karol G");
        assert!(artists[1].image_url.is_empty());
    }

    proptest! {
        #[test]
        fn prop_all_artists_joined(names in prop::collection::vec("[A-Za-z][A-Za-z ]{0,15}", 2..6)) {
            let artists: Vec<_> = names.iter().map(|n| artist(n)).collect();
            let joined = join_artists(&artists);
            prop_assert_eq!(joined, names.join(", "));
        }

        #[test]
        fn prop_year_is_leading_digits(year in 1000u32..10000, rest in "(-[0-9]{2}){0,2}") {
            let date = format!("{}{}", year, rest);
            prop_assert_eq!(release_year(Some(&date)), year.to_string());
        }
    }
}
