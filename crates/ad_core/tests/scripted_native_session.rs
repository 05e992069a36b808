use std::{sync::Arc, time::Duration};

use ad_core::{AdEvent, AdSettings, AdVideoEvent, ControllerRegistry};
use native_bridge::InMemoryBridge;
use serde_json::json;
use shared::protocol::{MethodCall, RegistrationNotice};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);

/// Answers every `loadAd` the way a native module would: `loading`, then
/// either a fill or a no-fill failure depending on the unit id.
fn spawn_native_responder(bridge: InMemoryBridge) -> tokio::task::JoinHandle<()> {
    let mut outbound = bridge.subscribe_outbound();
    tokio::spawn(async move {
        while let Ok(entry) = outbound.recv().await {
            if entry.call.method != "loadAd" {
                continue;
            }
            let id = entry.controller_id;
            let _ = bridge.deliver(&id, MethodCall::new("loading")).await;
            let unit = entry
                .call
                .argument("unitId")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let reply = if unit.ends_with("/empty") {
                let mut args = shared::protocol::Arguments::new();
                args.insert("errorCode".into(), json!(3));
                MethodCall::with_arguments("onAdFailedToLoad", args)
            } else {
                MethodCall::new("onAdLoaded")
            };
            let _ = bridge.deliver(&id, reply).await;
        }
    })
}

#[tokio::test]
async fn load_round_trip_through_scripted_native_module() {
    let bridge = InMemoryBridge::new();
    let registry = ControllerRegistry::new(
        Arc::new(bridge.clone()),
        AdSettings::with_default_unit_id("ca-app-pub-test/native"),
    );
    let responder = spawn_native_responder(bridge.clone());

    let filled = registry.create().await.expect("filled controller");
    let empty = registry.create().await.expect("empty controller");
    filled.attach().await.expect("attach filled");
    empty.attach().await.expect("attach empty");

    let mut filled_events = filled.subscribe_events().await.expect("filled events");
    let mut empty_events = empty.subscribe_events().await.expect("empty events");
    let mut filled_video = filled.subscribe_video_events().await.expect("filled video");

    filled.load(None, None).await.expect("load filled");
    empty
        .load(Some("ca-app-pub-test/empty"), None)
        .await
        .expect("load empty");

    for expected in [AdEvent::Loading, AdEvent::Loaded] {
        let event = timeout(WAIT, filled_events.recv())
            .await
            .expect("filled timeout")
            .expect("filled event");
        assert_eq!(event, expected);
    }
    for expected in [AdEvent::Loading, AdEvent::LoadFailed { error_code: 3 }] {
        let event = timeout(WAIT, empty_events.recv())
            .await
            .expect("empty timeout")
            .expect("empty event");
        assert_eq!(event, expected);
    }

    bridge
        .deliver(filled.id(), MethodCall::new("onVideoStart"))
        .await
        .expect("video start");
    assert_eq!(
        timeout(WAIT, filled_video.recv())
            .await
            .expect("video timeout")
            .expect("video event"),
        AdVideoEvent::Start
    );

    filled.dispose().await.expect("dispose filled");
    empty.dispose().await.expect("dispose empty");
    assert_eq!(registry.live_count().await, 0);

    let notices = bridge.notices().await;
    assert_eq!(notices.len(), 4);
    assert!(notices.contains(&RegistrationNotice::Deregister(filled.id().clone())));
    assert!(notices.contains(&RegistrationNotice::Deregister(empty.id().clone())));

    responder.abort();
}
