//! Classification of inbound native messages into typed outcomes.
//!
//! Rules are checked in order and the first match wins: the `onVideo`
//! prefix, then the fixed lifecycle table, then `Undefined` for anything
//! unknown so newer native modules never break older controllers.

use serde_json::Value;
use shared::{
    domain::{AdEvent, AdVideoEvent, MuteThisAdInfo},
    protocol::{
        Arguments, MethodCall, ARG_CUSTOM_MUTE_ENABLED, ARG_ERROR_CODE, ARG_MUTE_REASONS,
        METHOD_AD_CLICKED, METHOD_AD_FAILED_TO_LOAD, METHOD_AD_IMPRESSION, METHOD_AD_LOADED,
        METHOD_AD_MUTED, METHOD_LOADING, METHOD_MUTE_THIS_AD_INFO, VIDEO_METHOD_PREFIX,
    },
};
use tracing::debug;

/// Error code reported when a load failure arrives without a usable code.
pub const FALLBACK_ERROR_CODE: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Ad(AdEvent),
    Video(AdVideoEvent),
    /// Replaces the mute-this-ad snapshot; publishes nothing.
    MuteInfo(MuteThisAdInfo),
    /// `onVideo*` with a suffix outside the video table; publishes nothing.
    UnknownVideo(String),
}

pub fn classify(method: &str, arguments: Option<&Arguments>) -> Dispatch {
    if let Some(suffix) = method.strip_prefix(VIDEO_METHOD_PREFIX) {
        return match AdVideoEvent::from_suffix(suffix) {
            Some(event) => Dispatch::Video(event),
            None => Dispatch::UnknownVideo(suffix.to_string()),
        };
    }

    match method {
        METHOD_LOADING => Dispatch::Ad(AdEvent::Loading),
        METHOD_AD_FAILED_TO_LOAD => Dispatch::Ad(AdEvent::LoadFailed {
            error_code: error_code(arguments),
        }),
        METHOD_AD_LOADED => Dispatch::Ad(AdEvent::Loaded),
        METHOD_AD_CLICKED => Dispatch::Ad(AdEvent::Clicked),
        METHOD_AD_IMPRESSION => Dispatch::Ad(AdEvent::Impression),
        METHOD_AD_MUTED => Dispatch::Ad(AdEvent::Muted),
        METHOD_MUTE_THIS_AD_INFO => Dispatch::MuteInfo(mute_info(arguments)),
        _ => Dispatch::Ad(AdEvent::Undefined),
    }
}

pub fn classify_call(call: &MethodCall) -> Dispatch {
    classify(&call.method, call.arguments.as_ref())
}

fn error_code(arguments: Option<&Arguments>) -> i64 {
    match arguments.and_then(|args| args.get(ARG_ERROR_CODE)) {
        Some(value) => value.as_i64().unwrap_or_else(|| {
            debug!(%value, "non-integer load error code");
            FALLBACK_ERROR_CODE
        }),
        None => FALLBACK_ERROR_CODE,
    }
}

fn mute_info(arguments: Option<&Arguments>) -> MuteThisAdInfo {
    let Some(args) = arguments else {
        return MuteThisAdInfo::default();
    };

    let reasons = match args.get(ARG_MUTE_REASONS) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(reason) => Some(reason.clone()),
                other => {
                    debug!(%other, "skipping non-string mute reason");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    };
    let custom_mute_enabled = args
        .get(ARG_CUSTOM_MUTE_ENABLED)
        .and_then(Value::as_bool)
        .unwrap_or(false);

    MuteThisAdInfo::new(reasons, custom_mute_enabled)
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
