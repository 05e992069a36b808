//! In-process stand-in for the native ad module.
//!
//! Records every registration notice and outbound command, and lets the
//! caller play the native side by delivering inbound messages to a
//! controller's channel.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use shared::{
    domain::ControllerId,
    protocol::{MethodCall, RegistrationNotice, REGISTRATION_CHANNEL},
};
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, info};

use crate::{MethodInvoker, NativeAdBridge, NativeChannel};

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundCall {
    pub controller_id: ControllerId,
    pub call: MethodCall,
}

#[derive(Clone)]
pub struct InMemoryBridge {
    state: Arc<BridgeState>,
}

struct BridgeState {
    inbound: Mutex<HashMap<ControllerId, mpsc::Sender<MethodCall>>>,
    notices: Mutex<Vec<RegistrationNotice>>,
    outbound_log: Mutex<Vec<OutboundCall>>,
    outbound_events: broadcast::Sender<OutboundCall>,
    fail_registration: AtomicBool,
}

impl Default for InMemoryBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBridge {
    pub fn new() -> Self {
        let (outbound_events, _) = broadcast::channel(1024);
        Self {
            state: Arc::new(BridgeState {
                inbound: Mutex::new(HashMap::new()),
                notices: Mutex::new(Vec::new()),
                outbound_log: Mutex::new(Vec::new()),
                outbound_events,
                fail_registration: AtomicBool::new(false),
            }),
        }
    }

    /// Makes subsequent `Register` notices fail, as a native module that
    /// cannot allocate controller state would.
    pub fn fail_registrations(&self, fail: bool) {
        self.state.fail_registration.store(fail, Ordering::SeqCst);
    }

    /// Plays the native side: queues `call` on the inbound half of `id`'s
    /// channel.
    pub async fn deliver(&self, id: &ControllerId, call: MethodCall) -> anyhow::Result<()> {
        let sender = {
            let inbound = self.state.inbound.lock().await;
            inbound
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow!("no open channel for controller {id}"))?
        };
        debug!(controller_id = %id, method = %call.method, "native -> controller");
        sender
            .send(call)
            .await
            .map_err(|_| anyhow!("channel for controller {id} is closed"))
    }

    pub async fn notices(&self) -> Vec<RegistrationNotice> {
        self.state.notices.lock().await.clone()
    }

    /// Ids with a registered, not yet deregistered controller.
    pub async fn registered_ids(&self) -> Vec<ControllerId> {
        let notices = self.state.notices.lock().await;
        let mut live: Vec<ControllerId> = Vec::new();
        for notice in notices.iter() {
            match notice {
                RegistrationNotice::Register(id) => live.push(id.clone()),
                RegistrationNotice::Deregister(id) => live.retain(|known| known != id),
            }
        }
        live
    }

    pub async fn outbound_calls(&self) -> Vec<OutboundCall> {
        self.state.outbound_log.lock().await.clone()
    }

    pub async fn outbound_calls_for(&self, id: &ControllerId) -> Vec<MethodCall> {
        self.state
            .outbound_log
            .lock()
            .await
            .iter()
            .filter(|entry| &entry.controller_id == id)
            .map(|entry| entry.call.clone())
            .collect()
    }

    /// Live feed of outbound commands, for a scripted native side that
    /// reacts to what the controller asks for.
    pub fn subscribe_outbound(&self) -> broadcast::Receiver<OutboundCall> {
        self.state.outbound_events.subscribe()
    }
}

#[async_trait]
impl NativeAdBridge for InMemoryBridge {
    async fn open_channel(
        &self,
        id: &ControllerId,
        inbound_capacity: usize,
    ) -> anyhow::Result<NativeChannel> {
        let mut inbound = self.state.inbound.lock().await;
        if inbound.contains_key(id) {
            bail!("channel for controller {id} is already open");
        }
        let (tx, rx) = mpsc::channel(inbound_capacity.max(1));
        inbound.insert(id.clone(), tx);
        debug!(controller_id = %id, "opened in-memory channel");

        Ok(NativeChannel {
            outbound: Arc::new(MemoryInvoker {
                controller_id: id.clone(),
                state: Arc::clone(&self.state),
            }),
            inbound: rx,
        })
    }

    async fn close_channel(&self, id: &ControllerId) -> anyhow::Result<()> {
        match self.state.inbound.lock().await.remove(id) {
            Some(_) => {
                debug!(controller_id = %id, "closed in-memory channel");
                Ok(())
            }
            None => bail!("no open channel for controller {id}"),
        }
    }

    async fn notify(&self, notice: RegistrationNotice) -> anyhow::Result<()> {
        debug!(
            channel = REGISTRATION_CHANNEL,
            notice = %notice.to_method_call().method,
            controller_id = %notice.controller_id(),
            "registration notice"
        );
        match &notice {
            RegistrationNotice::Register(id) => {
                if self.state.fail_registration.load(Ordering::SeqCst) {
                    bail!("native module refused controller {id}");
                }
                info!(controller_id = %id, "native controller state allocated");
            }
            RegistrationNotice::Deregister(id) => {
                // Native teardown closes the inbound half of the channel.
                self.state.inbound.lock().await.remove(id);
                info!(controller_id = %id, "native controller state released");
            }
        }
        self.state.notices.lock().await.push(notice);
        Ok(())
    }
}

struct MemoryInvoker {
    controller_id: ControllerId,
    state: Arc<BridgeState>,
}

#[async_trait]
impl MethodInvoker for MemoryInvoker {
    async fn invoke(&self, call: MethodCall) -> anyhow::Result<()> {
        debug!(controller_id = %self.controller_id, method = %call.method, "controller -> native");
        let entry = OutboundCall {
            controller_id: self.controller_id.clone(),
            call,
        };
        self.state.outbound_log.lock().await.push(entry.clone());
        let _ = self.state.outbound_events.send(entry);
        Ok(())
    }
}
