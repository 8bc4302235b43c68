use crossbeam_channel::Sender;

/// Identifies one load request. Every device event carries the token of the
/// load it belongs to so completions of superseded loads can be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadToken(pub(crate) u64);

impl LoadToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybackError {
    #[error("episode cannot be played: {0}")]
    InvalidEpisode(String),

    #[error("media source unavailable: {0}")]
    InvalidSource(String),

    #[error("media could not be decoded: {0}")]
    Decode(String),

    #[error("playback blocked by autoplay policy")]
    AutoplayBlocked,

    #[error("device rejected the request: {0}")]
    Rejected(String),
}

/// Notifications produced by the audio device. Delivery is asynchronous;
/// the engine applies them when the event loop pumps them.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    MetadataLoaded { token: LoadToken, duration: f64 },
    Started { token: LoadToken },
    StartFailed { token: LoadToken, reason: PlaybackError },
    TimeUpdate { token: LoadToken, position: f64 },
    Paused { token: LoadToken },
    Ended { token: LoadToken },
}

impl DeviceEvent {
    pub fn token(&self) -> LoadToken {
        match self {
            Self::MetadataLoaded { token, .. }
            | Self::Started { token }
            | Self::StartFailed { token, .. }
            | Self::TimeUpdate { token, .. }
            | Self::Paused { token }
            | Self::Ended { token } => *token,
        }
    }
}

/// The one audio output owned by the playback engine.
///
/// `load`, `play` and `seek` only issue requests: an `Err` means the device
/// refused outright, while the outcome of an accepted `play` arrives later
/// as `Started` or `StartFailed`.
pub trait AudioDevice {
    /// Registers the event sink. The device sends every event there until
    /// `detach` is called.
    fn attach(&mut self, events: Sender<DeviceEvent>);
    fn detach(&mut self);
    fn load(&mut self, token: LoadToken, url: &str) -> Result<(), PlaybackError>;
    fn play(&mut self, token: LoadToken) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn seek(&mut self, position: f64) -> Result<(), PlaybackError>;
    /// Stops output and drops the loaded source.
    fn stop(&mut self);
}
