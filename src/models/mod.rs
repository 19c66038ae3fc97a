pub mod catalog;
pub mod message;
pub mod spotify;
pub mod user;

// Re-export commonly used types
pub use catalog::{
    CatalogArtist, CatalogTrack, SyncStatus, TopArtistsRecord, TopTracksRecord, TOP_ITEMS_LIMIT,
};
pub use message::{Message, NewMessage};
pub use spotify::{RefreshedToken, TokenGrant};
pub use user::{
    normalize_email, InsertResult, MatchRef, NewUser, ProfileUpdate, UpdateResult, User,
    UserCredentials,
};
