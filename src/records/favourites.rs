use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Mutation;
use crate::catalog::{EpisodeId, EpisodeRef};
use crate::store::{SharedStore, keys, load_list, save_document};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteRecord {
    #[serde(flatten)]
    pub episode: EpisodeRef,
    pub added_at: DateTime<Utc>,
}

impl FavouriteRecord {
    pub fn episode_id(&self) -> &EpisodeId {
        &self.episode.episode_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavouriteOrder {
    Newest,
    Oldest,
    TitleAsc,
    TitleDesc,
}

#[derive(Debug)]
pub struct FavouriteGroup<'a> {
    pub show_title: &'a str,
    pub records: Vec<&'a FavouriteRecord>,
}

/// Favourited episodes in insertion order, written through to the store on
/// every change.
pub struct FavouritesRegistry {
    store: SharedStore,
    entries: Vec<FavouriteRecord>,
    index: HashMap<EpisodeId, usize>,
}

impl FavouritesRegistry {
    pub fn load(store: SharedStore) -> Self {
        let stored: Vec<FavouriteRecord> = load_list(store.as_ref(), keys::FAVOURITES);
        let mut registry = Self {
            store,
            entries: Vec::with_capacity(stored.len()),
            index: HashMap::new(),
        };
        let mut duplicates = 0;
        for record in stored {
            if registry.index.contains_key(record.episode_id()) {
                duplicates += 1;
                continue;
            }
            registry
                .index
                .insert(record.episode_id().clone(), registry.entries.len());
            registry.entries.push(record);
        }
        if duplicates > 0 {
            warn!(count = duplicates, "dropped duplicate stored favourite(s)");
        }
        registry
    }

    pub fn add(&mut self, episode: EpisodeRef) -> Mutation {
        if self.index.contains_key(&episode.episode_id) {
            return Mutation::Unchanged;
        }
        debug!(episode_id = %episode.episode_id, "adding favourite");
        self.index
            .insert(episode.episode_id.clone(), self.entries.len());
        self.entries.push(FavouriteRecord {
            episode,
            added_at: Utc::now(),
        });
        Mutation::Applied(self.persist())
    }

    pub fn remove(&mut self, episode_id: &EpisodeId) -> Mutation {
        let Some(position) = self.index.remove(episode_id) else {
            return Mutation::Unchanged;
        };
        debug!(episode_id = %episode_id, "removing favourite");
        self.entries.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Mutation::Applied(self.persist())
    }

    /// Adds or removes the episode; returns whether it is now a favourite.
    pub fn toggle(&mut self, episode: EpisodeRef) -> (bool, Mutation) {
        if self.is_favourite(&episode.episode_id) {
            let id = episode.episode_id;
            (false, self.remove(&id))
        } else {
            (true, self.add(episode))
        }
    }

    pub fn is_favourite(&self, episode_id: &EpisodeId) -> bool {
        self.index.contains_key(episode_id)
    }

    pub fn get(&self, episode_id: &EpisodeId) -> Option<&FavouriteRecord> {
        self.index
            .get(episode_id)
            .and_then(|position| self.entries.get(*position))
    }

    pub fn list(&self) -> &[FavouriteRecord] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Groups by show title. Groups appear in order of their first
    /// favourite; records keep insertion order inside a group.
    pub fn grouped_by_show(&self) -> Vec<FavouriteGroup<'_>> {
        let mut groups: Vec<FavouriteGroup<'_>> = Vec::new();
        for record in &self.entries {
            let title = record.episode.show_title.as_str();
            match groups.iter_mut().find(|group| group.show_title == title) {
                Some(group) => group.records.push(record),
                None => groups.push(FavouriteGroup {
                    show_title: title,
                    records: vec![record],
                }),
            }
        }
        groups
    }

    pub fn sorted(&self, order: FavouriteOrder) -> Vec<&FavouriteRecord> {
        let mut records: Vec<&FavouriteRecord> = self.entries.iter().collect();
        records.sort_by(|a, b| compare_records(a, b, order));
        records
    }

    fn persist(&self) -> crate::store::WriteOutcome {
        save_document(self.store.as_ref(), keys::FAVOURITES, &self.entries)
    }
}

fn compare_records(a: &FavouriteRecord, b: &FavouriteRecord, order: FavouriteOrder) -> Ordering {
    match order {
        FavouriteOrder::Newest => b.added_at.cmp(&a.added_at),
        FavouriteOrder::Oldest => a.added_at.cmp(&b.added_at),
        FavouriteOrder::TitleAsc => title_key(a).cmp(&title_key(b)),
        FavouriteOrder::TitleDesc => title_key(b).cmp(&title_key(a)),
    }
}

fn title_key(record: &FavouriteRecord) -> String {
    record.episode.episode_title.trim().to_lowercase()
}
