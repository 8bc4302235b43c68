//! The playback engine: sole owner of the audio device and single source of
//! truth for what is playing.
//!
//! All mutation happens on `&mut self` calls made from the event loop. Device
//! completions arrive as [`DeviceEvent`]s and are applied only if their
//! [`LoadToken`] still matches the active load, so a superseded
//! `play_episode` can never flip the state of its successor.

mod bus;
mod clock;
mod device;


use crossbeam_channel::{Receiver, unbounded};
use tracing::{debug, warn};

pub use clock::format_clock;
pub use device::{AudioDevice, DeviceEvent, LoadToken, PlaybackError};

use self::bus::UpdateBus;
use crate::catalog::{EpisodeId, EpisodeRef};
use crate::records::progress::{clamp_position, non_negative_seconds};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
}

impl PlaybackState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackFailure {
    pub episode_id: EpisodeId,
    pub reason: PlaybackError,
}

impl PlaybackFailure {
    /// Message for a retry prompt.
    pub fn user_message(&self) -> String {
        match self.reason {
            PlaybackError::AutoplayBlocked => {
                "Playback was blocked by the browser. Press play to try again.".to_string()
            }
            _ => "Failed to play the episode. Please try again.".to_string(),
        }
    }
}

/// Read model for views. Everything a player bar needs, without touching the
/// device.
#[derive(Debug, Clone, Default)]
pub struct PlaybackSnapshot {
    pub current_episode: Option<EpisodeRef>,
    pub state: PlaybackState,
    pub current_time: f64,
    pub duration: f64,
    pub last_error: Option<PlaybackFailure>,
}

impl PlaybackSnapshot {
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerNotice {
    Loading { episode_id: EpisodeId },
    Started { episode_id: EpisodeId },
    Paused { episode_id: EpisodeId },
    Ended { episode_id: EpisodeId },
    Stopped { episode_id: EpisodeId },
    Failed(PlaybackFailure),
    MetadataLoaded { duration: f64 },
    TimeUpdated { position: f64 },
    Seeked { position: f64 },
}

#[derive(Debug, Clone)]
pub struct PlayerUpdate {
    pub notice: PlayerNotice,
    pub snapshot: PlaybackSnapshot,
}

pub struct PlaybackEngine<D: AudioDevice> {
    device: D,
    events: Option<Receiver<DeviceEvent>>,
    session: PlaybackSnapshot,
    active: Option<LoadToken>,
    /// The device has reported playback for the active load at least once.
    confirmed: bool,
    next_token: u64,
    bus: UpdateBus,
}

impl<D: AudioDevice> PlaybackEngine<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            events: None,
            session: PlaybackSnapshot::default(),
            active: None,
            confirmed: false,
            next_token: 1,
            bus: UpdateBus::default(),
        }
    }

    /// Attaches to the device event stream. Calling it again is a no-op.
    pub fn init(&mut self) {
        if self.events.is_some() {
            return;
        }
        let (tx, rx) = unbounded();
        self.device.attach(tx);
        self.events = Some(rx);
    }

    /// Stops playback, detaches from the device and disconnects subscribers.
    pub fn teardown(&mut self) {
        self.stop_active();
        if self.events.take().is_some() {
            self.device.detach();
        }
        self.session.state = PlaybackState::Idle;
        self.bus.close();
    }

    pub fn is_initialized(&self) -> bool {
        self.events.is_some()
    }

    pub fn subscribe(&mut self) -> Receiver<PlayerUpdate> {
        self.bus.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.bus.len()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.session.clone()
    }

    pub fn state(&self) -> PlaybackState {
        self.session.state
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_playing()
    }

    pub fn current_episode(&self) -> Option<&EpisodeRef> {
        self.session.current_episode.as_ref()
    }

    pub fn current_time(&self) -> f64 {
        self.session.current_time
    }

    pub fn duration(&self) -> f64 {
        self.session.duration
    }

    pub fn last_error(&self) -> Option<&PlaybackFailure> {
        self.session.last_error.as_ref()
    }

    /// Token of the load currently owning the device, if any.
    pub fn active_token(&self) -> Option<LoadToken> {
        self.active
    }

    pub fn has_started(&self) -> bool {
        self.active.is_some() && self.confirmed
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Tears down whatever is loaded and starts loading `episode`. The new
    /// episode becomes current immediately; `is_playing` waits for the
    /// device to confirm.
    pub fn play_episode(&mut self, episode: EpisodeRef) {
        self.stop_active();

        let token = LoadToken(self.next_token);
        self.next_token += 1;
        let episode_id = episode.episode_id.clone();
        let url = episode.url.clone();

        self.active = Some(token);
        self.confirmed = false;
        self.session.current_episode = Some(episode);
        self.session.state = PlaybackState::Loading;
        self.session.current_time = 0.0;
        self.session.duration = 0.0;
        self.session.last_error = None;
        debug!(episode_id = %episode_id, token = token.value(), "loading episode");
        self.notify(PlayerNotice::Loading {
            episode_id: episode_id.clone(),
        });

        if self.events.is_none() {
            self.fail_load(PlaybackError::Rejected(
                "engine is not initialised".to_string(),
            ));
            return;
        }
        if episode_id.as_str().trim().is_empty() {
            self.fail_load(PlaybackError::InvalidEpisode(
                "episode has no id".to_string(),
            ));
            return;
        }
        if url.trim().is_empty() {
            self.fail_load(PlaybackError::InvalidSource(format!(
                "episode {episode_id} has no media url"
            )));
            return;
        }

        let requested = self
            .device
            .load(token, &url)
            .and_then(|()| self.device.play(token));
        if let Err(reason) = requested {
            self.fail_load(reason);
        }
    }

    pub fn pause_episode(&mut self) -> bool {
        match self.session.state {
            PlaybackState::Playing | PlaybackState::Loading => {
                self.device.pause();
                self.session.state = PlaybackState::Paused;
                self.notify_current(|episode_id| PlayerNotice::Paused { episode_id });
                true
            }
            PlaybackState::Idle | PlaybackState::Paused | PlaybackState::Ended => false,
        }
    }

    /// Resumes a paused episode, or restarts an ended one from the top.
    pub fn resume_episode(&mut self) -> bool {
        let Some(token) = self.active else {
            return false;
        };
        match self.session.state {
            PlaybackState::Paused => self.request_play(token),
            PlaybackState::Ended => {
                if let Err(err) = self.device.seek(0.0) {
                    warn!(error = %err, "device rejected rewind");
                }
                self.session.current_time = 0.0;
                self.request_play(token)
            }
            PlaybackState::Idle | PlaybackState::Loading | PlaybackState::Playing => false,
        }
    }

    /// Pauses while playing, otherwise resumes. An idle engine with a
    /// current episode (e.g. after a failed start) reloads it. Ignored while
    /// loading.
    pub fn toggle(&mut self) {
        match self.session.state {
            PlaybackState::Playing => {
                self.pause_episode();
            }
            PlaybackState::Loading => {}
            PlaybackState::Idle => {
                if let Some(episode) = self.session.current_episode.clone() {
                    self.play_episode(episode);
                }
            }
            PlaybackState::Paused | PlaybackState::Ended => {
                self.resume_episode();
            }
        }
    }

    /// Moves the playhead. The observable position updates immediately; if
    /// the device refuses, the next time update corrects it. Seeking back
    /// into an ended episode leaves it paused at the new position.
    pub fn seek(&mut self, time: f64) -> bool {
        if self.active.is_none() {
            return false;
        }
        let (position, _) = clamp_position(time, self.session.duration);
        if let Err(err) = self.device.seek(position) {
            warn!(error = %err, position = position, "device rejected seek");
        }
        self.session.current_time = position;
        if self.session.state == PlaybackState::Ended
            && (self.session.duration <= 0.0 || position < self.session.duration)
        {
            self.session.state = PlaybackState::Paused;
        }
        self.notify(PlayerNotice::Seeked { position });
        true
    }

    /// Collects device events queued since the last call.
    pub fn drain_device_events(&mut self) -> Vec<DeviceEvent> {
        match &self.events {
            Some(rx) => rx.try_iter().collect(),
            None => Vec::new(),
        }
    }

    /// Applies all queued device events.
    pub fn pump(&mut self) -> Vec<PlayerNotice> {
        self.drain_device_events()
            .into_iter()
            .filter_map(|event| self.handle_event(event))
            .collect()
    }

    /// Applies one device event. Returns `None` when the event is stale or
    /// does not change anything.
    pub fn handle_event(&mut self, event: DeviceEvent) -> Option<PlayerNotice> {
        if self.active != Some(event.token()) {
            debug!(
                token = event.token().value(),
                "ignoring device event for a superseded load"
            );
            return None;
        }
        let episode_id = self.session.current_episode.as_ref()?.episode_id.clone();
        let state = self.session.state;

        let notice = match event {
            DeviceEvent::MetadataLoaded { duration, .. } => {
                let duration = non_negative_seconds(duration);
                self.session.duration = duration;
                self.session.current_time =
                    clamp_position(self.session.current_time, duration).0;
                PlayerNotice::MetadataLoaded { duration }
            }
            DeviceEvent::Started { .. } => {
                let was_confirmed = std::mem::replace(&mut self.confirmed, true);
                match state {
                    PlaybackState::Loading | PlaybackState::Ended => {}
                    // an external resume of audio that was already playing
                    PlaybackState::Paused if was_confirmed => {}
                    PlaybackState::Paused => {
                        self.confirmed = false;
                        debug!(
                            episode_id = %episode_id,
                            "ignoring start of a load paused before it began"
                        );
                        return None;
                    }
                    PlaybackState::Playing | PlaybackState::Idle => return None,
                }
                self.session.state = PlaybackState::Playing;
                self.session.last_error = None;
                PlayerNotice::Started { episode_id }
            }
            DeviceEvent::StartFailed { reason, .. } => match state {
                PlaybackState::Loading => {
                    self.fail_load(reason);
                    return self.session.last_error.clone().map(PlayerNotice::Failed);
                }
                PlaybackState::Playing => {
                    self.session.state = PlaybackState::Paused;
                    self.record_failure(reason)
                }
                PlaybackState::Paused => {
                    debug!(episode_id = %episode_id, "start aborted by pause");
                    return None;
                }
                PlaybackState::Idle | PlaybackState::Ended => return None,
            },
            DeviceEvent::TimeUpdate { position, .. } => {
                if state == PlaybackState::Idle {
                    return None;
                }
                let (position, _) = clamp_position(position, self.session.duration);
                self.session.current_time = position;
                PlayerNotice::TimeUpdated { position }
            }
            DeviceEvent::Paused { .. } => match state {
                PlaybackState::Playing | PlaybackState::Loading => {
                    self.session.state = PlaybackState::Paused;
                    PlayerNotice::Paused { episode_id }
                }
                _ => return None,
            },
            DeviceEvent::Ended { .. } => {
                if matches!(state, PlaybackState::Idle | PlaybackState::Ended) {
                    return None;
                }
                self.session.state = PlaybackState::Ended;
                if self.session.duration > 0.0 {
                    self.session.current_time = self.session.duration;
                }
                PlayerNotice::Ended { episode_id }
            }
        };

        if !matches!(notice, PlayerNotice::TimeUpdated { .. }) {
            debug!(
                state = self.session.state.label(),
                notice = ?notice,
                "device event applied"
            );
        }
        self.notify(notice.clone());
        Some(notice)
    }

    fn request_play(&mut self, token: LoadToken) -> bool {
        match self.device.play(token) {
            Ok(()) => {
                self.session.state = PlaybackState::Playing;
                self.session.last_error = None;
                self.notify_current(|episode_id| PlayerNotice::Started { episode_id });
                true
            }
            Err(reason) => {
                self.session.state = PlaybackState::Paused;
                let notice = self.record_failure(reason);
                self.notify(notice);
                false
            }
        }
    }

    fn stop_active(&mut self) {
        if self.active.take().is_none() {
            return;
        }
        self.device.stop();
        self.notify_current(|episode_id| PlayerNotice::Stopped { episode_id });
    }

    /// A failed start releases the device and leaves the episode current so
    /// it can be retried.
    fn fail_load(&mut self, reason: PlaybackError) {
        if self.active.take().is_some() {
            self.device.stop();
        }
        self.session.state = PlaybackState::Idle;
        let notice = self.record_failure(reason);
        self.notify(notice);
    }

    fn record_failure(&mut self, reason: PlaybackError) -> PlayerNotice {
        let episode_id = self
            .session
            .current_episode
            .as_ref()
            .map(|episode| episode.episode_id.clone())
            .unwrap_or_else(|| EpisodeId::from(""));
        warn!(episode_id = %episode_id, error = %reason, "playback failed");
        let failure = PlaybackFailure { episode_id, reason };
        self.session.last_error = Some(failure.clone());
        PlayerNotice::Failed(failure)
    }

    fn notify_current(&mut self, make: impl FnOnce(EpisodeId) -> PlayerNotice) {
        if let Some(episode) = &self.session.current_episode {
            let notice = make(episode.episode_id.clone());
            self.notify(notice);
        }
    }

    fn notify(&mut self, notice: PlayerNotice) {
        let update = PlayerUpdate {
            notice,
            snapshot: self.session.clone(),
        };
        self.bus.broadcast(update);
    }
}

impl<D: AudioDevice> Drop for PlaybackEngine<D> {
    fn drop(&mut self) {
        if self.is_initialized() {
            self.teardown();
        }
    }
}
