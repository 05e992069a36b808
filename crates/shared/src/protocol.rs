use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::ControllerId;

/// Name of the shared endpoint carrying registration notices.
pub const REGISTRATION_CHANNEL: &str = "native_ad";

pub const METHOD_INIT_CONTROLLER: &str = "initController";
pub const METHOD_DISPOSE_CONTROLLER: &str = "disposeController";

pub const METHOD_LOAD_AD: &str = "loadAd";
pub const METHOD_UPDATE_UI: &str = "updateUI";
pub const METHOD_MUTE_AD: &str = "muteAd";

pub const VIDEO_METHOD_PREFIX: &str = "onVideo";
pub const METHOD_LOADING: &str = "loading";
pub const METHOD_AD_FAILED_TO_LOAD: &str = "onAdFailedToLoad";
pub const METHOD_AD_LOADED: &str = "onAdLoaded";
pub const METHOD_AD_CLICKED: &str = "onAdClicked";
pub const METHOD_AD_IMPRESSION: &str = "onAdImpression";
pub const METHOD_AD_MUTED: &str = "onAdMuted";
pub const METHOD_MUTE_THIS_AD_INFO: &str = "muteThisAdInfo";

pub const ARG_ERROR_CODE: &str = "errorCode";
pub const ARG_MUTE_REASONS: &str = "muteThisAdReasons";
pub const ARG_CUSTOM_MUTE_ENABLED: &str = "isCustomMuteThisAdEnabled";

pub type Arguments = Map<String, Value>;

/// One message on a channel: a method name plus an optional argument map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Arguments>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: None,
        }
    }

    pub fn with_arguments(method: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            method: method.into(),
            arguments: Some(arguments),
        }
    }

    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.as_ref().and_then(|args| args.get(key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum RegistrationNotice {
    Register(ControllerId),
    Deregister(ControllerId),
}

impl RegistrationNotice {
    pub fn controller_id(&self) -> &ControllerId {
        match self {
            RegistrationNotice::Register(id) | RegistrationNotice::Deregister(id) => id,
        }
    }

    pub fn to_method_call(&self) -> MethodCall {
        let method = match self {
            RegistrationNotice::Register(_) => METHOD_INIT_CONTROLLER,
            RegistrationNotice::Deregister(_) => METHOD_DISPOSE_CONTROLLER,
        };
        let mut arguments = Arguments::new();
        arguments.insert("id".into(), json!(self.controller_id().as_str()));
        MethodCall::with_arguments(method, arguments)
    }
}

/// Commands sent from application code to one native ad instance.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerCommand {
    LoadAd {
        unit_id: String,
        options: NativeAdOptions,
    },
    UpdateUi {
        layout: Arguments,
    },
    MuteAd {
        reason: Option<u32>,
    },
}

impl ControllerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ControllerCommand::LoadAd { .. } => METHOD_LOAD_AD,
            ControllerCommand::UpdateUi { .. } => METHOD_UPDATE_UI,
            ControllerCommand::MuteAd { .. } => METHOD_MUTE_AD,
        }
    }

    pub fn into_method_call(self) -> Result<MethodCall, serde_json::Error> {
        let method = self.name();
        let mut arguments = Arguments::new();
        match self {
            ControllerCommand::LoadAd { unit_id, options } => {
                arguments.insert("unitId".into(), Value::String(unit_id));
                arguments.insert("options".into(), serde_json::to_value(options)?);
            }
            ControllerCommand::UpdateUi { layout } => {
                arguments.insert("layout".into(), Value::Object(layout));
            }
            ControllerCommand::MuteAd { reason } => {
                arguments.insert("reason".into(), json!(reason));
            }
        }
        Ok(MethodCall::with_arguments(method, arguments))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdChoicesPlacement {
    TopLeft,
    #[default]
    TopRight,
    BottomRight,
    BottomLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaAspectRatio {
    #[default]
    Any,
    Landscape,
    Portrait,
    Square,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoOptions {
    pub start_muted: bool,
    pub custom_controls_requested: bool,
    pub click_to_expand_requested: bool,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            start_muted: true,
            custom_controls_requested: false,
            click_to_expand_requested: false,
        }
    }
}

/// Request options forwarded verbatim to the native ad loader.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NativeAdOptions {
    pub ad_choices_placement: AdChoicesPlacement,
    pub media_aspect_ratio: MediaAspectRatio,
    pub request_custom_mute_this_ad: bool,
    pub request_multiple_images: bool,
    pub return_urls_for_image_assets: bool,
    pub video_options: VideoOptions,
}
