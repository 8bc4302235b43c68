use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::EpisodeId;
use crate::store::{SharedStore, WriteOutcome, keys, load_map, remove_document, save_document};

/// Last known listening position of one episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    /// Share of the episode already heard, 0 when the duration is unknown.
    pub fn fraction(&self) -> f64 {
        if self.duration_seconds > 0.0 {
            (self.position_seconds / self.duration_seconds).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    fn sanitized(self) -> Self {
        let (position_seconds, duration_seconds) =
            clamp_position(self.position_seconds, self.duration_seconds);
        Self {
            position_seconds,
            duration_seconds,
            updated_at: self.updated_at,
        }
    }
}

pub(crate) fn non_negative_seconds(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Clamps a position into `[0, duration]`; an unknown (zero) duration only
/// bounds the position from below.
pub(crate) fn clamp_position(position: f64, duration: f64) -> (f64, f64) {
    let duration = non_negative_seconds(duration);
    let position = non_negative_seconds(position);
    if duration > 0.0 {
        (position.min(duration), duration)
    } else {
        (position, duration)
    }
}

pub struct ProgressTracker {
    store: SharedStore,
    records: BTreeMap<EpisodeId, ProgressRecord>,
}

impl ProgressTracker {
    pub fn load(store: SharedStore) -> Self {
        let records = load_map::<ProgressRecord>(store.as_ref(), keys::LISTENING_PROGRESS)
            .into_iter()
            .map(|(id, record)| (EpisodeId::from(id), record.sanitized()))
            .collect();
        Self { store, records }
    }

    pub fn get(&self, episode_id: &EpisodeId) -> Option<ProgressRecord> {
        self.records.get(episode_id).copied()
    }

    /// Upserts the record and rewrites the whole progress document.
    pub fn save(
        &mut self,
        episode_id: &EpisodeId,
        position_seconds: f64,
        duration_seconds: f64,
    ) -> WriteOutcome {
        let (position_seconds, duration_seconds) =
            clamp_position(position_seconds, duration_seconds);
        debug!(
            episode_id = %episode_id,
            position = position_seconds,
            duration = duration_seconds,
            "saving listening progress"
        );
        self.records.insert(
            episode_id.clone(),
            ProgressRecord {
                position_seconds,
                duration_seconds,
                updated_at: Utc::now(),
            },
        );
        save_document(self.store.as_ref(), keys::LISTENING_PROGRESS, &self.records)
    }

    pub fn clear_all(&mut self) -> WriteOutcome {
        self.records.clear();
        remove_document(self.store.as_ref(), keys::LISTENING_PROGRESS)
    }

    pub fn all(&self) -> impl Iterator<Item = (&EpisodeId, &ProgressRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
