//! Wires the playback engine to favourites and listening progress.
//!
//! Progress is written only on pause, natural end, episode switch and
//! teardown/unload. Time updates never touch the store. A process killed
//! without any of those signals loses progress since the last save.

mod config;


use crossbeam_channel::Receiver;
use tracing::debug;

pub use config::{RESUME_EPSILON_ENV, SessionConfig};

use crate::catalog::{EpisodeId, EpisodeRef};
use crate::playback::{
    AudioDevice, DeviceEvent, LoadToken, PlaybackEngine, PlaybackSnapshot, PlaybackState,
    PlayerNotice, PlayerUpdate,
};
use crate::records::{FavouritesRegistry, Mutation, ProgressRecord, ProgressTracker};
use crate::store::{SharedStore, WriteOutcome};

#[derive(Debug, Clone, Copy)]
struct PendingResume {
    token: LoadToken,
    position: f64,
}

/// What a page-unload handler should do.
#[derive(Debug)]
pub struct UnloadDecision {
    /// Audio is still playing; the host may ask the user to confirm leaving.
    pub confirm_leave: bool,
    pub progress: Option<WriteOutcome>,
}

pub struct SessionCoordinator<D: AudioDevice> {
    config: SessionConfig,
    engine: PlaybackEngine<D>,
    favourites: FavouritesRegistry,
    progress: ProgressTracker,
    pending_resume: Option<PendingResume>,
}

impl<D: AudioDevice> SessionCoordinator<D> {
    pub fn new(store: SharedStore, device: D, config: SessionConfig) -> Self {
        Self {
            config,
            engine: PlaybackEngine::new(device),
            favourites: FavouritesRegistry::load(store.clone()),
            progress: ProgressTracker::load(store),
            pending_resume: None,
        }
    }

    pub fn init(&mut self) {
        self.engine.init();
    }

    /// Saves progress for the active episode, then releases the device.
    pub fn teardown(&mut self) -> Option<WriteOutcome> {
        let saved = self.persist_progress();
        self.pending_resume = None;
        self.engine.teardown();
        saved
    }

    pub fn on_unload(&mut self) -> UnloadDecision {
        UnloadDecision {
            confirm_leave: self.engine.is_playing(),
            progress: self.persist_progress(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn engine(&self) -> &PlaybackEngine<D> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaybackEngine<D> {
        &mut self.engine
    }

    pub fn subscribe(&mut self) -> Receiver<PlayerUpdate> {
        self.engine.subscribe()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.engine.snapshot()
    }

    pub fn play_episode(&mut self, episode: EpisodeRef) {
        self.persist_progress();

        let resume_at = self
            .progress
            .get(&episode.episode_id)
            .filter(|record| self.should_resume(record))
            .map(|record| record.position_seconds);
        self.engine.play_episode(episode);

        self.pending_resume = match (resume_at, self.engine.active_token()) {
            (Some(position), Some(token)) => Some(PendingResume { token, position }),
            _ => None,
        };
    }

    pub fn pause_episode(&mut self) {
        if self.engine.pause_episode() {
            self.persist_progress();
        }
    }

    pub fn resume_episode(&mut self) {
        match self.engine.state() {
            PlaybackState::Idle => self.replay_current(),
            _ => {
                self.engine.resume_episode();
            }
        }
    }

    pub fn toggle(&mut self) {
        match self.engine.state() {
            PlaybackState::Playing => self.pause_episode(),
            PlaybackState::Loading => {}
            PlaybackState::Idle => self.replay_current(),
            PlaybackState::Paused | PlaybackState::Ended => {
                self.engine.resume_episode();
            }
        }
    }

    /// A user seek overrides any resume still waiting for metadata.
    pub fn seek(&mut self, time: f64) {
        self.pending_resume = None;
        self.engine.seek(time);
    }

    /// Applies one device event and reacts to the resulting transition.
    pub fn handle_device_event(&mut self, event: DeviceEvent) -> Option<PlayerNotice> {
        let notice = self.engine.handle_event(event)?;
        match &notice {
            PlayerNotice::MetadataLoaded { .. } => self.apply_pending_resume(),
            PlayerNotice::Paused { .. } | PlayerNotice::Ended { .. } => {
                self.persist_progress();
            }
            PlayerNotice::Failed(_) => {
                if self.engine.active_token().is_none() {
                    self.pending_resume = None;
                }
            }
            _ => {}
        }
        Some(notice)
    }

    /// Runs one event-loop turn over the device's queued events.
    pub fn pump(&mut self) -> Vec<PlayerNotice> {
        self.engine
            .drain_device_events()
            .into_iter()
            .filter_map(|event| self.handle_device_event(event))
            .collect()
    }

    pub fn favourites(&self) -> &FavouritesRegistry {
        &self.favourites
    }

    pub fn add_favourite(&mut self, episode: EpisodeRef) -> Mutation {
        self.favourites.add(episode)
    }

    /// Removing the playing episode from favourites leaves playback alone.
    pub fn remove_favourite(&mut self, episode_id: &EpisodeId) -> Mutation {
        self.favourites.remove(episode_id)
    }

    pub fn toggle_favourite(&mut self, episode: EpisodeRef) -> (bool, Mutation) {
        self.favourites.toggle(episode)
    }

    pub fn is_favourite(&self, episode_id: &EpisodeId) -> bool {
        self.favourites.is_favourite(episode_id)
    }

    pub fn is_current_favourite(&self) -> bool {
        self.engine
            .current_episode()
            .is_some_and(|episode| self.favourites.is_favourite(&episode.episode_id))
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn saved_progress(&self, episode_id: &EpisodeId) -> Option<ProgressRecord> {
        self.progress.get(episode_id)
    }

    pub fn clear_progress(&mut self) -> WriteOutcome {
        self.progress.clear_all()
    }

    fn should_resume(&self, record: &ProgressRecord) -> bool {
        record.position_seconds > 0.0
            && record.position_seconds < record.duration_seconds - self.config.resume_epsilon_secs
    }

    fn replay_current(&mut self) {
        if let Some(episode) = self.engine.current_episode().cloned() {
            self.play_episode(episode);
        }
    }

    fn apply_pending_resume(&mut self) {
        let Some(pending) = self.pending_resume.take() else {
            return;
        };
        if self.engine.active_token() != Some(pending.token) {
            return;
        }
        debug!(position = pending.position, "resuming from saved progress");
        self.engine.seek(pending.position);
    }

    /// Writes the active episode's position. Skipped while nothing has
    /// played yet, so a load that never got going cannot overwrite a saved
    /// position with zero.
    fn persist_progress(&mut self) -> Option<WriteOutcome> {
        if !matches!(
            self.engine.state(),
            PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Ended
        ) {
            return None;
        }
        if !self.engine.has_started() && self.engine.current_time() <= 0.0 {
            return None;
        }
        if self
            .pending_resume
            .is_some_and(|pending| self.engine.active_token() == Some(pending.token))
        {
            return None;
        }
        let episode_id = self.engine.current_episode()?.episode_id.clone();
        Some(self.progress.save(
            &episode_id,
            self.engine.current_time(),
            self.engine.duration(),
        ))
    }
}
