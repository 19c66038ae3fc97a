//! Catalog items returned by the music provider and the per-user cache
//! records projected from them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum number of entries kept per cached field.
pub const TOP_ITEMS_LIMIT: usize = 5;

// ============================================================================
// PROVIDER CATALOG ITEMS
// ============================================================================
// Only the fields the cache projects are typed; everything else the provider
// sends is carried through `extra` so `/artists` and `/songs` stay raw.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogArtist {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogTrack {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub album: Album,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ============================================================================
// CACHE RECORDS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopArtistsRecord {
    pub user_id: String,
    pub artist_name: Vec<String>,
    pub artist_images: Vec<Option<String>>,
    pub artist_urls: Vec<Option<String>>,
}

impl TopArtistsRecord {
    /// Project the first five artists into parallel field arrays, in input order.
    pub fn project(user_id: &str, items: &[CatalogArtist]) -> Self {
        let top = &items[..items.len().min(TOP_ITEMS_LIMIT)];

        Self {
            user_id: user_id.to_string(),
            artist_name: top.iter().map(|a| a.name.clone()).collect(),
            artist_images: top
                .iter()
                .map(|a| a.images.first().map(|img| img.url.clone()))
                .collect(),
            artist_urls: top.iter().map(|a| a.external_urls.spotify.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopTracksRecord {
    pub user_id: String,
    pub tracks_name: Vec<String>,
    pub track_artists: Vec<Vec<ArtistRef>>,
    pub track_urls: Vec<Option<String>>,
    pub track_preview_url: Vec<Option<String>>,
    pub track_img: Vec<Vec<Image>>,
}

impl TopTracksRecord {
    /// Project the first five tracks into parallel field arrays, in input order.
    pub fn project(user_id: &str, items: &[CatalogTrack]) -> Self {
        let top = &items[..items.len().min(TOP_ITEMS_LIMIT)];

        Self {
            user_id: user_id.to_string(),
            tracks_name: top.iter().map(|t| t.name.clone()).collect(),
            track_artists: top.iter().map(|t| t.artists.clone()).collect(),
            track_urls: top.iter().map(|t| t.external_urls.spotify.clone()).collect(),
            track_preview_url: top.iter().map(|t| t.preview_url.clone()).collect(),
            track_img: top.iter().map(|t| t.album.images.clone()).collect(),
        }
    }
}

/// A projected record the cache can persist.
pub trait CacheRecord: Clone + Send + Sync + 'static {
    fn user_id(&self) -> &str;

    /// True when the projection carried no items.
    fn is_empty(&self) -> bool;
}

impl CacheRecord for TopArtistsRecord {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn is_empty(&self) -> bool {
        self.artist_name.is_empty()
    }
}

impl CacheRecord for TopTracksRecord {
    fn user_id(&self) -> &str {
        &self.user_id
    }

    fn is_empty(&self) -> bool {
        self.tracks_name.is_empty()
    }
}

// ============================================================================
// SYNC REQUESTS / RESPONSES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TopArtistsSyncRequest {
    pub user_id: String,
    #[serde(rename = "TopArtistList", default)]
    pub top_artist_list: Vec<CatalogArtist>,
}

#[derive(Debug, Deserialize)]
pub struct TopSongsSyncRequest {
    pub user_id: String,
    #[serde(rename = "TopSongsList", default)]
    pub top_songs_list: Vec<CatalogTrack>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Inserted,
    Updated,
    /// Upstream yielded no items (typically an expired access token);
    /// any cached record was left untouched.
    Stale,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse<T> {
    pub status: SyncStatus,
    pub message: String,
    pub record: Option<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn artist(name: &str) -> CatalogArtist {
        serde_json::from_value(json!({
            "id": format!("id-{}", name),
            "name": name,
            "images": [{ "url": format!("https://img/{}.jpg", name), "height": 640, "width": 640 }],
            "external_urls": { "spotify": format!("https://open.spotify.com/artist/{}", name) },
            "genres": ["indie"]
        }))
        .unwrap()
    }

    #[test]
    fn test_artist_projection_keeps_first_five_in_order() {
        let items: Vec<_> = ["A", "B", "C", "D", "E", "F"].iter().map(|n| artist(n)).collect();
        let record = TopArtistsRecord::project("u-1", &items);

        assert_eq!(record.artist_name, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(record.artist_images.len(), TOP_ITEMS_LIMIT);
        assert_eq!(record.artist_images[0].as_deref(), Some("https://img/A.jpg"));
        assert_eq!(
            record.artist_urls[4].as_deref(),
            Some("https://open.spotify.com/artist/E")
        );
    }

    #[test]
    fn test_artist_without_images_projects_none() {
        let items = vec![serde_json::from_value::<CatalogArtist>(json!({
            "name": "Faceless",
            "images": [],
            "external_urls": {}
        }))
        .unwrap()];

        let record = TopArtistsRecord::project("u-1", &items);
        assert_eq!(record.artist_images, vec![None]);
        assert_eq!(record.artist_urls, vec![None]);
    }

    #[test]
    fn test_track_projection() {
        let items: Vec<CatalogTrack> = (1..=7)
            .map(|i| {
                serde_json::from_value(json!({
                    "name": format!("Track {}", i),
                    "artists": [{ "name": "Band", "id": "b1" }],
                    "external_urls": { "spotify": format!("https://open.spotify.com/track/{}", i) },
                    "preview_url": null,
                    "album": { "name": "LP", "images": [{ "url": "https://img/lp.jpg" }] }
                }))
                .unwrap()
            })
            .collect();

        let record = TopTracksRecord::project("u-2", &items);
        assert_eq!(record.tracks_name.len(), TOP_ITEMS_LIMIT);
        assert_eq!(record.tracks_name[0], "Track 1");
        assert_eq!(record.tracks_name[4], "Track 5");
        assert_eq!(record.track_artists[0][0].name, "Band");
        assert_eq!(record.track_preview_url[0], None);
        assert_eq!(record.track_img[2][0].url, "https://img/lp.jpg");
    }

    #[test]
    fn test_unknown_provider_fields_survive_round_trip() {
        let original = json!({
            "name": "A",
            "images": [],
            "external_urls": { "spotify": "https://open.spotify.com/artist/A" },
            "popularity": 77,
            "genres": ["dream pop"]
        });
        let item: CatalogArtist = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(item.extra["popularity"], 77);
        assert_eq!(serde_json::to_value(&item).unwrap(), original);
    }

    #[test]
    fn test_empty_projection() {
        let record = TopArtistsRecord::project("u-1", &[]);
        assert!(record.is_empty());
        assert_eq!(record.user_id(), "u-1");
    }
}
