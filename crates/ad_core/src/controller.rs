//! Application-facing handle for one native ad instance.
//!
//! Events are delivered on two `tokio::sync::broadcast` streams. Every
//! listener subscribed at publish time sees every event in arrival order;
//! nothing is replayed, so a listener that subscribes late misses earlier
//! events, and one that falls more than `event_capacity` events behind loses
//! the oldest ones.

use std::{
    fmt,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    task::{ready, Context, Poll},
};

use native_bridge::{MethodInvoker, NativeChannel};
use shared::{
    domain::{AdEvent, AdVideoEvent, ControllerId, MuteThisAdInfo},
    protocol::{Arguments, ControllerCommand, MethodCall, NativeAdOptions, RegistrationNotice},
};
use tokio::{
    sync::{broadcast, mpsc, Mutex, MutexGuard, RwLock},
    task::JoinHandle,
};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    Stream,
};
use tracing::{debug, info, warn};

use crate::{
    dispatch::{classify_call, Dispatch},
    error::{AdError, Result},
    registry::RegistryShared,
};

pub struct NativeAdController {
    id: ControllerId,
    inner: Arc<ControllerInner>,
    forwarder: JoinHandle<()>,
}

struct ControllerInner {
    id: ControllerId,
    outbound: Arc<dyn MethodInvoker>,
    registry: Arc<RegistryShared>,
    /// `None` once disposed.
    state: Mutex<Option<LiveState>>,
    /// Set by `dispose` before the id is released; read by `Drop`.
    disposed: AtomicBool,
    mute_info: RwLock<MuteThisAdInfo>,
}

type StateGuard<'a> = MutexGuard<'a, Option<LiveState>>;

struct LiveState {
    attached: bool,
    events: broadcast::Sender<AdEvent>,
    video_events: broadcast::Sender<AdVideoEvent>,
}

impl NativeAdController {
    pub(crate) fn spawn(
        id: ControllerId,
        channel: NativeChannel,
        registry: Arc<RegistryShared>,
    ) -> Self {
        let capacity = registry.settings.event_capacity.max(1);
        let (events, _) = broadcast::channel(capacity);
        let (video_events, _) = broadcast::channel(capacity);

        let inner = Arc::new(ControllerInner {
            id: id.clone(),
            outbound: channel.outbound,
            registry,
            state: Mutex::new(Some(LiveState {
                attached: false,
                events,
                video_events,
            })),
            disposed: AtomicBool::new(false),
            mute_info: RwLock::new(MuteThisAdInfo::default()),
        });
        let forwarder = spawn_forwarder(Arc::clone(&inner), channel.inbound);

        Self {
            id,
            inner,
            forwarder,
        }
    }

    pub fn id(&self) -> &ControllerId {
        &self.id
    }

    /// Binds the controller to its ad surface. A controller serves exactly
    /// one surface, so a second call fails.
    pub async fn attach(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let live = state.as_mut().ok_or_else(|| self.disposed())?;
        if live.attached {
            return Err(AdError::PreconditionViolation(format!(
                "controller {} is already attached to an ad surface",
                self.id
            )));
        }
        live.attached = true;
        debug!(controller_id = %self.id, "controller attached");
        Ok(())
    }

    pub async fn is_attached(&self) -> bool {
        matches!(self.inner.state.lock().await.as_ref(), Some(live) if live.attached)
    }

    pub async fn is_disposed(&self) -> bool {
        self.inner.state.lock().await.is_none()
    }

    /// Deregisters the controller and closes both event streams for good.
    ///
    /// Only the first call does anything; later calls fail with
    /// `UseAfterDispose` and send nothing. Commands already delivered to the
    /// native side are not recalled.
    ///
    /// The controller is disposed and its id released even when the native
    /// side rejects the `Deregister` notice; that error is returned but the
    /// call cannot be retried.
    pub async fn dispose(&self) -> Result<()> {
        let live = self
            .inner
            .state
            .lock()
            .await
            .take()
            .ok_or_else(|| self.disposed())?;
        self.inner.disposed.store(true, Ordering::SeqCst);
        self.forwarder.abort();

        let notified = self
            .inner
            .registry
            .bridge
            .notify(RegistrationNotice::Deregister(self.id.clone()))
            .await;

        // Dropping the last senders closes the streams for every listener.
        drop(live);
        self.inner.registry.release(&self.id);
        info!(controller_id = %self.id, "native ad controller disposed");

        notified.map_err(AdError::Bridge)
    }

    /// Requests an ad. `unit_id` overrides the configured default; with
    /// neither available the call fails before anything is sent. The outcome
    /// arrives later as an `AdEvent`.
    pub async fn load(
        &self,
        unit_id: Option<&str>,
        options: Option<NativeAdOptions>,
    ) -> Result<()> {
        let state = self.live_state().await?;
        let unit_id = unit_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .or_else(|| self.inner.registry.settings.default_unit_id())
            .ok_or(AdError::MissingUnitId)?
            .to_string();

        self.send(
            &state,
            ControllerCommand::LoadAd {
                unit_id,
                options: options.unwrap_or_default(),
            },
        )
        .await
    }

    pub async fn request_ad_ui_update(&self, layout: Option<Arguments>) -> Result<()> {
        let state = self.live_state().await?;
        self.send(
            &state,
            ControllerCommand::UpdateUi {
                layout: layout.unwrap_or_default(),
            },
        )
        .await
    }

    /// Asks the native side to mute the ad. `reason` indexes the reasons of
    /// the latest `MuteThisAdInfo`; it is forwarded even when out of range.
    pub async fn mute_this_ad(&self, reason: Option<u32>) -> Result<()> {
        let state = self.live_state().await?;
        if let Some(index) = reason {
            let known = self.inner.mute_info.read().await.reasons.len();
            if index as usize >= known {
                warn!(
                    controller_id = %self.id,
                    reason = index,
                    known_reasons = known,
                    "mute reason index outside the reported reasons"
                );
            }
        }
        self.send(&state, ControllerCommand::MuteAd { reason }).await
    }

    pub async fn mute_this_ad_info(&self) -> MuteThisAdInfo {
        self.inner.mute_info.read().await.clone()
    }

    pub async fn subscribe_events(&self) -> Result<broadcast::Receiver<AdEvent>> {
        let state = self.inner.state.lock().await;
        let live = state.as_ref().ok_or_else(|| self.disposed())?;
        Ok(live.events.subscribe())
    }

    pub async fn subscribe_video_events(&self) -> Result<broadcast::Receiver<AdVideoEvent>> {
        let state = self.inner.state.lock().await;
        let live = state.as_ref().ok_or_else(|| self.disposed())?;
        Ok(live.video_events.subscribe())
    }

    /// Lifecycle events as a stream that ends when the controller is
    /// disposed. Lag gaps are logged and skipped.
    pub async fn event_stream(&self) -> Result<EventStream<AdEvent>> {
        let receiver = self.subscribe_events().await?;
        Ok(EventStream::new(self.id.clone(), receiver))
    }

    pub async fn video_event_stream(&self) -> Result<EventStream<AdVideoEvent>> {
        let receiver = self.subscribe_video_events().await?;
        Ok(EventStream::new(self.id.clone(), receiver))
    }

    /// Applies one inbound native message. The forwarder task calls this for
    /// every message on the controller's channel, in arrival order.
    pub async fn handle_method_call(&self, call: MethodCall) -> Result<()> {
        self.inner.handle_method_call(call).await
    }

    /// The state guard is held until the command is delivered, so a
    /// concurrent `dispose` cannot deregister in between.
    async fn send(&self, _live: &StateGuard<'_>, command: ControllerCommand) -> Result<()> {
        let name = command.name();
        let call = command.into_method_call()?;
        self.inner
            .outbound
            .invoke(call)
            .await
            .map_err(AdError::Bridge)?;
        debug!(controller_id = %self.id, command = name, "command delivered");
        Ok(())
    }

    async fn live_state(&self) -> Result<StateGuard<'_>> {
        let state = self.inner.state.lock().await;
        if state.is_none() {
            return Err(self.disposed());
        }
        Ok(state)
    }

    fn disposed(&self) -> AdError {
        AdError::UseAfterDispose {
            id: self.id.clone(),
        }
    }
}

impl ControllerInner {
    async fn handle_method_call(&self, call: MethodCall) -> Result<()> {
        let dispatch = classify_call(&call);
        let state = self.state.lock().await;
        let live = state.as_ref().ok_or(AdError::StreamClosed)?;

        match dispatch {
            Dispatch::Ad(event) => {
                debug!(controller_id = %self.id, method = %call.method, event = event.name(), "ad event");
                // No listeners means the event is dropped.
                let _ = live.events.send(event);
            }
            Dispatch::Video(event) => {
                debug!(controller_id = %self.id, method = %call.method, event = event.name(), "video event");
                let _ = live.video_events.send(event);
            }
            Dispatch::MuteInfo(info) => {
                debug!(
                    controller_id = %self.id,
                    reasons = info.reasons.len(),
                    custom_mute_enabled = info.custom_mute_enabled,
                    "mute-this-ad info replaced"
                );
                *self.mute_info.write().await = info;
            }
            Dispatch::UnknownVideo(suffix) => {
                warn!(controller_id = %self.id, method = %call.method, suffix = %suffix, "dropping unknown video event");
            }
        }
        Ok(())
    }
}

impl Drop for NativeAdController {
    fn drop(&mut self) {
        self.forwarder.abort();
        if !self.inner.disposed.load(Ordering::SeqCst) {
            self.inner.registry.release(&self.id);
            warn!(controller_id = %self.id, "controller dropped without dispose; native state not released");
        }
    }
}

impl fmt::Debug for NativeAdController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeAdController")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

fn spawn_forwarder(
    inner: Arc<ControllerInner>,
    mut inbound: mpsc::Receiver<MethodCall>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(call) = inbound.recv().await {
            if let Err(err) = inner.handle_method_call(call).await {
                debug!(controller_id = %inner.id, %err, "stopping inbound forwarder");
                break;
            }
        }
        debug!(controller_id = %inner.id, "inbound forwarder finished");
    })
}

/// Broadcast receiver as a `Stream` that skips lag gaps and ends once the
/// controller is disposed.
pub struct EventStream<T> {
    controller_id: ControllerId,
    inner: BroadcastStream<T>,
}

impl<T> EventStream<T>
where
    T: Clone + Send + 'static,
{
    fn new(controller_id: ControllerId, receiver: broadcast::Receiver<T>) -> Self {
        Self {
            controller_id,
            inner: BroadcastStream::new(receiver),
        }
    }
}

impl<T> Stream for EventStream<T>
where
    T: Clone + Send + 'static,
{
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(event)) => return Poll::Ready(Some(event)),
                Some(Err(BroadcastStreamRecvError::Lagged(missed))) => {
                    warn!(controller_id = %self.controller_id, missed, "event listener lagged");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}
