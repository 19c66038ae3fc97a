pub mod catalog_cache;
pub mod spotify_service;
pub mod token_refresher;

pub use catalog_cache::{CatalogCache, UpsertOutcome};
pub use spotify_service::SpotifyService;
pub use token_refresher::{CatalogSession, RefresherState, SessionRegistry, TokenRefresh, TokenRefresher};
