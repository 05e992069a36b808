//! Types shared between the controller core and the native side of the bridge.

pub mod domain;
pub mod error;
pub mod protocol;
