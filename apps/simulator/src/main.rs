use std::{path::PathBuf, sync::Arc};

use ad_core::{load_settings, ControllerRegistry, DEFAULT_SETTINGS_FILE};
use anyhow::{Context, Result};
use clap::Parser;
use native_bridge::InMemoryBridge;
use serde_json::json;
use shared::protocol::MethodCall;
use tokio_stream::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Replays a native ad session against one controller and prints every
/// command and event as a JSON line.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,
    /// Overrides the configured default unit id.
    #[arg(long)]
    unit_id: Option<String>,
    /// JSON array of `{"method": .., "arguments": {..}}` messages from the
    /// native side. A built-in session is replayed when omitted.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Mute the ad with this reason index after the script has run.
    #[arg(long)]
    mute_reason: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings(&args.settings)?;
    let script = match &args.script {
        Some(path) => read_script(path).await?,
        None => builtin_session(),
    };

    let bridge = InMemoryBridge::new();
    let registry = ControllerRegistry::new(Arc::new(bridge.clone()), settings);
    let controller = registry.create().await?;
    controller.attach().await?;
    info!(
        controller_id = %controller.id(),
        default_unit_id = registry.settings().default_unit_id().unwrap_or("<none>"),
        messages = script.len(),
        "replaying native session"
    );

    let mut events = controller.event_stream().await?;
    let ad_printer = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            println!("{}", json!({"stream": "ad", "event": event}));
        }
    });
    let mut video_events = controller.video_event_stream().await?;
    let video_printer = tokio::spawn(async move {
        while let Some(event) = video_events.next().await {
            println!("{}", json!({"stream": "video", "event": event}));
        }
    });

    controller
        .load(args.unit_id.as_deref(), None)
        .await
        .context("load request rejected")?;
    for call in script {
        controller.handle_method_call(call).await?;
    }
    if let Some(index) = args.mute_reason {
        match controller.mute_this_ad_info().await.reason(index as usize) {
            Some(reason) => info!(index, reason, "muting ad"),
            None => warn!(index, "muting ad with an unreported reason"),
        }
        controller.mute_this_ad(Some(index)).await?;
    }

    for entry in bridge.outbound_calls().await {
        println!(
            "{}",
            json!({"outbound": entry.call.method, "arguments": entry.call.arguments})
        );
    }
    println!(
        "{}",
        json!({"mute_this_ad_info": controller.mute_this_ad_info().await})
    );

    controller.dispose().await?;
    // Both streams are closed now; the printers drain what is left and stop.
    ad_printer.await?;
    video_printer.await?;
    Ok(())
}

async fn read_script(path: &PathBuf) -> Result<Vec<MethodCall>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read script '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("script '{}' is not a JSON array of messages", path.display()))
}

fn builtin_session() -> Vec<MethodCall> {
    let mut mute_info = shared::protocol::Arguments::new();
    mute_info.insert(
        "muteThisAdReasons".into(),
        json!(["Not interested", "Seen this ad multiple times"]),
    );
    mute_info.insert("isCustomMuteThisAdEnabled".into(), json!(true));

    vec![
        MethodCall::new("loading"),
        MethodCall::new("onAdLoaded"),
        MethodCall::with_arguments("muteThisAdInfo", mute_info),
        MethodCall::new("onAdImpression"),
        MethodCall::new("onVideoStart"),
        MethodCall::new("onVideoPlay"),
        MethodCall::new("onVideoPause"),
        MethodCall::new("onVideoEnd"),
        MethodCall::new("onAdClicked"),
    ]
}
