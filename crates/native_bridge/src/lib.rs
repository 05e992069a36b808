//! Boundary between the controller core and the platform-native ad module.

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use shared::{
    domain::ControllerId,
    protocol::{MethodCall, RegistrationNotice},
};
use tokio::sync::mpsc;

mod memory;

pub use memory::{InMemoryBridge, OutboundCall};

/// Outbound half of a per-controller channel.
#[async_trait]
pub trait MethodInvoker: Send + Sync {
    /// Delivers one command. Resolves once the native side has accepted it;
    /// there is no reply payload.
    async fn invoke(&self, call: MethodCall) -> anyhow::Result<()>;
}

/// Both halves of the dedicated channel opened for one controller.
pub struct NativeChannel {
    pub outbound: Arc<dyn MethodInvoker>,
    pub inbound: mpsc::Receiver<MethodCall>,
}

#[async_trait]
pub trait NativeAdBridge: Send + Sync {
    /// Opens the channel named by `id`. Inbound messages for that controller
    /// arrive on the returned receiver in the order the native side sent them.
    async fn open_channel(
        &self,
        id: &ControllerId,
        inbound_capacity: usize,
    ) -> anyhow::Result<NativeChannel>;

    /// Tears down a channel whose controller never became live, such as
    /// one the native side refused to register.
    async fn close_channel(&self, id: &ControllerId) -> anyhow::Result<()>;

    /// Sends a notice on the shared registration endpoint.
    async fn notify(&self, notice: RegistrationNotice) -> anyhow::Result<()>;
}

pub struct UnavailableBridge;

#[async_trait]
impl NativeAdBridge for UnavailableBridge {
    async fn open_channel(
        &self,
        id: &ControllerId,
        _inbound_capacity: usize,
    ) -> anyhow::Result<NativeChannel> {
        Err(anyhow!("native ad module unavailable for controller {id}"))
    }

    async fn close_channel(&self, id: &ControllerId) -> anyhow::Result<()> {
        Err(anyhow!("native ad module unavailable for controller {id}"))
    }

    async fn notify(&self, notice: RegistrationNotice) -> anyhow::Result<()> {
        Err(anyhow!(
            "native ad module unavailable for controller {}",
            notice.controller_id()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_bridge_rejects_everything() {
        let id = ControllerId::new("ctl-x").expect("id");
        let open = UnavailableBridge.open_channel(&id, 8).await;
        assert!(open.is_err());

        let err = UnavailableBridge
            .notify(RegistrationNotice::Register(id))
            .await
            .expect_err("notify must fail");
        assert!(err.to_string().contains("ctl-x"));
    }
}
