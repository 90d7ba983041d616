use super::*;
use crate::release::scheduler::TriggerKind;

#[test]
fn empty_document_yields_defaults() {
    let cfg = VitrineConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, VitrineConfig::default());
    assert_eq!(cfg.scheduler.trigger, TriggerKind::FrameBoundary);
    assert_eq!(cfg.scheduler.frames_in_flight, 2);
    assert_eq!(cfg.handle.initial_alpha, 255);
    assert_eq!(cfg.pool.max_retained, 32);
}

#[test]
fn partial_sections_merge_with_defaults() {
    let cfg = VitrineConfig::from_json_str(
        r#"{ "scheduler": { "trigger": "manual" }, "pool": { "max_retained": 3 } }"#,
    )
    .unwrap();
    assert_eq!(cfg.scheduler.trigger, TriggerKind::Manual);
    assert_eq!(cfg.scheduler.frames_in_flight, 2);
    assert_eq!(cfg.pool.max_retained, 3);
    assert!(!cfg.handle.progress_layer);
}

#[test]
fn unknown_fields_are_rejected() {
    let err = VitrineConfig::from_json_str(r#"{ "handle": { "progres_layer": true } }"#)
        .unwrap_err();
    assert!(matches!(err, VitrineError::Serde(_)));
    assert!(err.to_string().contains("progres_layer"));
}

#[test]
fn zero_frames_in_flight_is_a_config_error() {
    let err = VitrineConfig::from_json_str(
        r#"{ "scheduler": { "trigger": "frame_boundary", "frames_in_flight": 0 } }"#,
    )
    .unwrap_err();
    assert!(matches!(err, VitrineError::Config(_)));

    let ok = VitrineConfig::from_json_str(
        r#"{ "scheduler": { "trigger": "immediate", "frames_in_flight": 0 } }"#,
    );
    assert!(ok.is_ok());
}

#[test]
fn json_round_trip_preserves_values() {
    let mut cfg = VitrineConfig::default();
    cfg.handle.debug_overlay_layer = true;
    cfg.scheduler.frames_in_flight = 4;
    let json = cfg.to_json_string().unwrap();
    assert_eq!(VitrineConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn missing_file_is_an_io_error() {
    let path = std::env::temp_dir().join("vitrine-config-does-not-exist.json");
    let err = VitrineConfig::from_json_path(&path).unwrap_err();
    assert!(matches!(err, VitrineError::Io(_)));
}

#[test]
fn reads_config_from_disk() {
    let path = std::env::temp_dir().join(format!("vitrine-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "pool": { "max_retained": 7 } }"#).unwrap();
    let cfg = VitrineConfig::from_json_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(cfg.pool.max_retained, 7);

    let pool = cfg.build_pool();
    assert_eq!(pool.stats().retained, 0);
    assert_eq!(pool.scheduler().opts(), cfg.scheduler);
}

#[test]
fn huge_frames_in_flight_never_releases_early() {
    let cfg = VitrineConfig::from_json_str(
        r#"{ "scheduler": { "trigger": "frame_boundary", "frames_in_flight": 18446744073709551615 } }"#,
    )
    .unwrap();
    let scheduler = cfg.build_scheduler();
    let state = scheduler.create_release_state();

    scheduler.signal_frame_completed();
    assert!(scheduler.schedule_deferred_release(&state, Box::new(|| {})));
    assert_eq!(scheduler.signal_frame_completed(), 0);
    assert!(scheduler.is_release_pending(&state));
}
