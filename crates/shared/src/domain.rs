use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{InvalidControllerId, LoadErrorCode};

/// Process-unique identity of one native ad controller.
///
/// The same string names the controller's dedicated channel and keys its
/// registration on the shared endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ControllerId(String);

impl ControllerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidControllerId> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(InvalidControllerId);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ControllerId {
    type Error = InvalidControllerId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ControllerId> for String {
    fn from(value: ControllerId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum AdEvent {
    Impression,
    Clicked,
    LoadFailed { error_code: i64 },
    Loaded,
    Loading,
    Muted,
    Undefined,
}

impl AdEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AdEvent::Impression => "impression",
            AdEvent::Clicked => "clicked",
            AdEvent::LoadFailed { .. } => "load_failed",
            AdEvent::Loaded => "loaded",
            AdEvent::Loading => "loading",
            AdEvent::Muted => "muted",
            AdEvent::Undefined => "undefined",
        }
    }

    /// Classified error for `LoadFailed`; `None` for every other event.
    pub fn load_error(&self) -> Option<LoadErrorCode> {
        match self {
            AdEvent::LoadFailed { error_code } => Some(LoadErrorCode::from_code(*error_code)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdVideoEvent {
    Start,
    Play,
    Pause,
    End,
    Mute,
}

impl AdVideoEvent {
    /// Maps the part of an `onVideo*` method name after the prefix.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "Start" => Some(AdVideoEvent::Start),
            "Play" => Some(AdVideoEvent::Play),
            "Pause" => Some(AdVideoEvent::Pause),
            "Mute" => Some(AdVideoEvent::Mute),
            "End" => Some(AdVideoEvent::End),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AdVideoEvent::Start => "start",
            AdVideoEvent::Play => "play",
            AdVideoEvent::Pause => "pause",
            AdVideoEvent::End => "end",
            AdVideoEvent::Mute => "mute",
        }
    }
}

/// User-facing "mute this ad" reasons last reported by the native side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MuteThisAdInfo {
    pub reasons: Vec<String>,
    pub custom_mute_enabled: bool,
}

impl MuteThisAdInfo {
    pub fn new(reasons: Vec<String>, custom_mute_enabled: bool) -> Self {
        Self {
            reasons,
            custom_mute_enabled,
        }
    }

    pub fn reason(&self, index: usize) -> Option<&str> {
        self.reasons.get(index).map(String::as_str)
    }
}
