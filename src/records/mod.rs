mod favourites;
pub(crate) mod progress;
mod theme;


pub use favourites::{FavouriteGroup, FavouriteOrder, FavouriteRecord, FavouritesRegistry};
pub use progress::{ProgressRecord, ProgressTracker};
pub use theme::{Theme, ThemeSetting};

use crate::store::WriteOutcome;

/// Effect of a registry mutation. `Unchanged` means nothing was written.
#[derive(Debug)]
#[must_use]
pub enum Mutation {
    Unchanged,
    Applied(WriteOutcome),
}

impl Mutation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn write_outcome(&self) -> Option<&WriteOutcome> {
        match self {
            Self::Unchanged => None,
            Self::Applied(outcome) => Some(outcome),
        }
    }
}
