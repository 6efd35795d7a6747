use serde::{Deserialize, Serialize};

use crate::core::LoopSettings;

/// Everything that travels the bus between the control deck and the player
/// hosts. All messages are JSON objects tagged by `type` and carrying the
/// mandatory `index` routing key; a receiver drops anything addressed to a
/// different slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ChannelMessage {
    #[serde(rename = "VIDEO_PLAY")]
    Play { index: usize },
    #[serde(rename = "VIDEO_PAUSE")]
    Pause { index: usize },
    #[serde(rename = "VIDEO_SPEED")]
    Speed { index: usize, speed: f64 },
    #[serde(rename = "VIDEO_SEEK")]
    Seek { index: usize, time: f64 },
    #[serde(rename = "VIDEO_LOOP_SETTINGS")]
    LoopUpdate {
        index: usize,
        #[serde(rename = "loopSettings")]
        loop_settings: LoopSettings,
    },
    #[serde(rename = "VIDEO_CHANGE")]
    VideoChange {
        index: usize,
        #[serde(rename = "videoId")]
        video_id: String,
    },
    #[serde(rename = "VIDEO_ENDED")]
    Ended { index: usize },
    #[serde(rename = "VIDEO_TIME_UPDATE")]
    TimeUpdate {
        index: usize,
        #[serde(rename = "currentTime")]
        current_time: f64,
    },
}

impl ChannelMessage {
    /// Slot the message is addressed to.
    pub fn index(&self) -> usize {
        match self {
            Self::Play { index }
            | Self::Pause { index }
            | Self::Speed { index, .. }
            | Self::Seek { index, .. }
            | Self::LoopUpdate { index, .. }
            | Self::VideoChange { index, .. }
            | Self::Ended { index }
            | Self::TimeUpdate { index, .. } => *index,
        }
    }
}

/// The subset of messages a player host executes against its capability.
/// These are what the readiness queue holds while the player is loading.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Play,
    Pause,
    Speed(f64),
    Seek(f64),
    LoopUpdate(LoopSettings),
}

impl PlayerCommand {
    /// Commands ride the same bus as status messages, so a host has to pick
    /// out the ones meant for execution and shrug at the rest.
    pub fn from_message(msg: &ChannelMessage) -> Option<Self> {
        match msg {
            ChannelMessage::Play { .. } => Some(Self::Play),
            ChannelMessage::Pause { .. } => Some(Self::Pause),
            ChannelMessage::Speed { speed, .. } => Some(Self::Speed(*speed)),
            ChannelMessage::Seek { time, .. } => Some(Self::Seek(*time)),
            ChannelMessage::LoopUpdate { loop_settings, .. } => {
                Some(Self::LoopUpdate(*loop_settings))
            }
            _ => None,
        }
    }
}
