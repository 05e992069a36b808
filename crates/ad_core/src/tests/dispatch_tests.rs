use super::*;
use serde_json::json;

fn args(value: Value) -> Arguments {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn lifecycle_table_maps_every_known_method() {
    let cases = [
        ("loading", AdEvent::Loading),
        ("onAdLoaded", AdEvent::Loaded),
        ("onAdClicked", AdEvent::Clicked),
        ("onAdImpression", AdEvent::Impression),
        ("onAdMuted", AdEvent::Muted),
    ];
    for (method, expected) in cases {
        assert_eq!(classify(method, None), Dispatch::Ad(expected), "{method}");
    }
}

#[test]
fn video_prefix_maps_every_known_suffix() {
    let cases = [
        ("onVideoStart", AdVideoEvent::Start),
        ("onVideoPlay", AdVideoEvent::Play),
        ("onVideoPause", AdVideoEvent::Pause),
        ("onVideoMute", AdVideoEvent::Mute),
        ("onVideoEnd", AdVideoEvent::End),
    ];
    for (method, expected) in cases {
        assert_eq!(classify(method, None), Dispatch::Video(expected), "{method}");
    }
}

#[test]
fn failed_load_carries_error_code() {
    let arguments = args(json!({"errorCode": 3}));
    assert_eq!(
        classify("onAdFailedToLoad", Some(&arguments)),
        Dispatch::Ad(AdEvent::LoadFailed { error_code: 3 })
    );
}

#[test]
fn failed_load_without_usable_code_falls_back() {
    assert_eq!(
        classify("onAdFailedToLoad", None),
        Dispatch::Ad(AdEvent::LoadFailed {
            error_code: FALLBACK_ERROR_CODE
        })
    );
    let arguments = args(json!({"errorCode": "three"}));
    assert_eq!(
        classify("onAdFailedToLoad", Some(&arguments)),
        Dispatch::Ad(AdEvent::LoadFailed {
            error_code: FALLBACK_ERROR_CODE
        })
    );
}

#[test]
fn unknown_methods_degrade_to_undefined() {
    for method in ["undefined", "onAdOpened", "", "ONADLOADED"] {
        assert_eq!(classify(method, None), Dispatch::Ad(AdEvent::Undefined), "{method}");
    }
}

#[test]
fn unknown_video_suffix_is_reported_not_published() {
    assert_eq!(
        classify("onVideoUnmute", None),
        Dispatch::UnknownVideo("Unmute".to_string())
    );
    assert_eq!(classify("onVideo", None), Dispatch::UnknownVideo(String::new()));
}

#[test]
fn mute_info_reads_reasons_and_flag() {
    let arguments = args(json!({
        "muteThisAdReasons": ["a", "b"],
        "isCustomMuteThisAdEnabled": true
    }));
    assert_eq!(
        classify("muteThisAdInfo", Some(&arguments)),
        Dispatch::MuteInfo(MuteThisAdInfo::new(vec!["a".into(), "b".into()], true))
    );
}

#[test]
fn mute_info_defaults_when_fields_are_absent() {
    assert_eq!(
        classify("muteThisAdInfo", None),
        Dispatch::MuteInfo(MuteThisAdInfo::default())
    );
    let arguments = args(json!({"muteThisAdReasons": ["only", 7, null]}));
    assert_eq!(
        classify("muteThisAdInfo", Some(&arguments)),
        Dispatch::MuteInfo(MuteThisAdInfo::new(vec!["only".into()], false))
    );
}

#[test]
fn classify_call_reads_arguments_from_the_message() {
    let call = MethodCall::with_arguments("onAdFailedToLoad", args(json!({"errorCode": 2})));
    assert_eq!(
        classify_call(&call),
        Dispatch::Ad(AdEvent::LoadFailed { error_code: 2 })
    );
}
