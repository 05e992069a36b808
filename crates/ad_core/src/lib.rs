//! Controller identity and event dispatch for native ad units.
//!
//! A [`ControllerRegistry`] hands out [`NativeAdController`]s, each with its
//! own id and channel to the native ad module. Commands flow out through the
//! controller (`load`, `request_ad_ui_update`, `mute_this_ad`); native
//! messages flow back through [`dispatch::classify`] onto the controller's
//! lifecycle and video event streams.

pub mod controller;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod settings;

pub use controller::{EventStream, NativeAdController};
pub use error::{AdError, Result};
pub use registry::ControllerRegistry;
pub use settings::{load_settings, AdSettings, DEFAULT_SETTINGS_FILE};

pub use shared::{
    domain::{AdEvent, AdVideoEvent, ControllerId, MuteThisAdInfo},
    protocol::NativeAdOptions,
};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
