use crossbeam_channel::Sender;

use crate::catalog::{EpisodeId, EpisodeRef};
use crate::playback::{AudioDevice, DeviceEvent, LoadToken, PlaybackError};

pub(crate) fn episode(id: &str, show_title: &str) -> EpisodeRef {
    EpisodeRef {
        episode_id: EpisodeId::from(id),
        url: format!("https://cdn.example/{id}.mp3"),
        episode_number: 1,
        episode_title: format!("Episode {id}"),
        episode_description: String::new(),
        show_id: show_title.to_lowercase().replace(' ', "-"),
        show_title: show_title.to_string(),
        season_title: "Season 1".to_string(),
        season_image: String::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DeviceCommand {
    Attach,
    Detach,
    Load { token: LoadToken, url: String },
    Play(LoadToken),
    Pause,
    Seek(f64),
    Stop,
}

/// Device double that records every command and lets tests push events
/// through the attached sink.
#[derive(Debug, Default)]
pub(crate) struct ScriptedDevice {
    pub(crate) commands: Vec<DeviceCommand>,
    pub(crate) events: Option<Sender<DeviceEvent>>,
    pub(crate) refuse_load: Option<PlaybackError>,
    pub(crate) refuse_play: Option<PlaybackError>,
    pub(crate) refuse_seek: bool,
}

impl ScriptedDevice {
    pub(crate) fn emit(&self, event: DeviceEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }

    pub(crate) fn last_loaded_token(&self) -> Option<LoadToken> {
        self.commands.iter().rev().find_map(|command| match command {
            DeviceCommand::Load { token, .. } => Some(*token),
            _ => None,
        })
    }

    pub(crate) fn seeks(&self) -> Vec<f64> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DeviceCommand::Seek(position) => Some(*position),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, wanted: &DeviceCommand) -> usize {
        self.commands
            .iter()
            .filter(|command| *command == wanted)
            .count()
    }
}

impl AudioDevice for ScriptedDevice {
    fn attach(&mut self, events: Sender<DeviceEvent>) {
        self.commands.push(DeviceCommand::Attach);
        self.events = Some(events);
    }

    fn detach(&mut self) {
        self.commands.push(DeviceCommand::Detach);
        self.events = None;
    }

    fn load(&mut self, token: LoadToken, url: &str) -> Result<(), PlaybackError> {
        self.commands.push(DeviceCommand::Load {
            token,
            url: url.to_string(),
        });
        match &self.refuse_load {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    fn play(&mut self, token: LoadToken) -> Result<(), PlaybackError> {
        self.commands.push(DeviceCommand::Play(token));
        match &self.refuse_play {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    fn pause(&mut self) {
        self.commands.push(DeviceCommand::Pause);
    }

    fn seek(&mut self, position: f64) -> Result<(), PlaybackError> {
        self.commands.push(DeviceCommand::Seek(position));
        if self.refuse_seek {
            Err(PlaybackError::Rejected("seek not supported".to_string()))
        } else {
            Ok(())
        }
    }

    fn stop(&mut self) {
        self.commands.push(DeviceCommand::Stop);
    }
}
