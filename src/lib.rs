//! Client-side playback and favourites state for a podcast player.
//!
//! [`SessionCoordinator`] is the entry point for views: it owns the single
//! [`PlaybackEngine`], the [`FavouritesRegistry`] and the [`ProgressTracker`],
//! all backed by one [`DocumentStore`].

pub mod catalog;
pub mod playback;
pub mod records;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_support;

pub use catalog::{Catalog, EpisodeId, EpisodeRef, Show};
pub use playback::{
    AudioDevice, DeviceEvent, LoadToken, PlaybackEngine, PlaybackError, PlaybackFailure,
    PlaybackSnapshot, PlaybackState, PlayerNotice, PlayerUpdate, format_clock,
};
pub use records::{
    FavouriteOrder, FavouriteRecord, FavouritesRegistry, Mutation, ProgressRecord,
    ProgressTracker, Theme, ThemeSetting,
};
pub use session::{SessionConfig, SessionCoordinator, UnloadDecision};
pub use store::{DocumentStore, MemoryStore, SharedStore, SqliteStore, StoreError, WriteOutcome};
