use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use native_bridge::NativeAdBridge;
use shared::{domain::ControllerId, protocol::RegistrationNotice};
use tracing::{debug, info, warn};

use crate::{
    controller::NativeAdController,
    error::{AdError, Result},
    settings::AdSettings,
};

/// Issues controller identities and keeps the native side informed about
/// which controllers exist.
///
/// Cloning is cheap; clones share the same live-id set and bridge.
#[derive(Clone)]
pub struct ControllerRegistry {
    shared: Arc<RegistryShared>,
}

pub(crate) struct RegistryShared {
    pub(crate) bridge: Arc<dyn NativeAdBridge>,
    pub(crate) settings: AdSettings,
    /// Plain mutex so `Drop` can release an id; never held across an await.
    live: Mutex<HashSet<ControllerId>>,
}

impl ControllerRegistry {
    pub fn new(bridge: Arc<dyn NativeAdBridge>, settings: AdSettings) -> Self {
        Self {
            shared: Arc::new(RegistryShared {
                bridge,
                settings,
                live: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn settings(&self) -> &AdSettings {
        &self.shared.settings
    }

    /// Allocates a fresh id, opens its channel and registers it with the
    /// native side. The returned controller is live and unattached.
    pub async fn create(&self) -> Result<NativeAdController> {
        self.create_with_id(ControllerId::generate()).await
    }

    pub(crate) async fn create_with_id(&self, id: ControllerId) -> Result<NativeAdController> {
        if !self.shared.live().insert(id.clone()) {
            return Err(AdError::DuplicateControllerId { id });
        }

        match self.open_and_register(&id).await {
            Ok(controller) => {
                info!(controller_id = %id, "native ad controller created");
                Ok(controller)
            }
            Err(err) => {
                self.shared.live().remove(&id);
                warn!(controller_id = %id, %err, "native ad controller creation failed");
                Err(err)
            }
        }
    }

    async fn open_and_register(&self, id: &ControllerId) -> Result<NativeAdController> {
        let channel = self
            .shared
            .bridge
            .open_channel(id, self.shared.settings.inbound_capacity)
            .await
            .map_err(AdError::Bridge)?;
        debug!(controller_id = %id, "controller channel opened");

        if let Err(err) = self
            .shared
            .bridge
            .notify(RegistrationNotice::Register(id.clone()))
            .await
        {
            drop(channel);
            if let Err(close_err) = self.shared.bridge.close_channel(id).await {
                warn!(controller_id = %id, %close_err, "failed to close channel of refused controller");
            }
            return Err(AdError::Bridge(err));
        }

        Ok(NativeAdController::spawn(
            id.clone(),
            channel,
            Arc::clone(&self.shared),
        ))
    }

    pub async fn is_live(&self, id: &ControllerId) -> bool {
        self.shared.live().contains(id)
    }

    pub async fn live_count(&self) -> usize {
        self.shared.live().len()
    }

    pub async fn live_ids(&self) -> Vec<ControllerId> {
        let mut ids: Vec<ControllerId> = self.shared.live().iter().cloned().collect();
        ids.sort();
        ids
    }
}

impl RegistryShared {
    pub(crate) fn release(&self, id: &ControllerId) {
        if !self.live().remove(id) {
            warn!(controller_id = %id, "released an id that was not live");
        }
    }

    fn live(&self) -> MutexGuard<'_, HashSet<ControllerId>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
