use super::*;
use crate::automation::{MacroState, PlaybackOutcome, PointerSample, RecordingInjector};
use crate::capture::StaticCaptureProvider;
use crate::classify::UNKNOWN_LABEL;
use crate::clock::ManualClock;
use crate::config::VisrecConfig;
use crate::error::{ClassificationError, MacroError, PersistenceError, VisrecError};
use crate::events::{EventFilter, VisrecEvent};
use crate::persistence::JsonFilePersistence;
use crate::region::ImageRegion;
use image::{Rgba, RgbaImage};
use std::path::Path;
use std::sync::Arc;

fn region(shade: u8) -> ImageRegion {
    ImageRegion::new(RgbaImage::from_pixel(8, 8, Rgba([shade, shade, shade, 255])))
}

fn create_test_config(state_path: &Path) -> VisrecConfig {
    let mut config = VisrecConfig::default();
    config.features.grid_width = 4;
    config.features.grid_height = 4;
    config.macros.default_repeat_count = 2;
    config.persistence.path = state_path.to_string_lossy().to_string();
    config
}

struct Harness {
    app: VisrecApp,
    capture: Arc<StaticCaptureProvider>,
    injector: Arc<RecordingInjector>,
    clock: Arc<ManualClock>,
}

fn harness(config: VisrecConfig) -> Harness {
    let capture = Arc::new(StaticCaptureProvider::from_regions(Vec::new()));
    let injector = Arc::new(RecordingInjector::new());
    let clock = Arc::new(ManualClock::new(0));

    let app = VisrecApp::builder(config)
        .with_capture_provider(capture.clone())
        .with_input_injector(injector.clone())
        .with_clock(clock.clone())
        .build()
        .unwrap();

    Harness {
        app,
        capture,
        injector,
        clock,
    }
}

#[tokio::test]
async fn test_capture_learn_then_classify() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(create_test_config(&dir.path().join("state.json")));
    let mut events = h.app.subscribe();

    h.capture.push(region(255));
    let first = h.app.capture().await.unwrap();
    let learned = h.app.learn("cat").unwrap();
    assert_eq!(learned.entry_id, first);

    h.app.capture().await.unwrap();
    let result = h.app.classify_current().unwrap();
    assert_eq!(result.label, "cat");
    assert!((result.confidence - 1.0).abs() < 1e-6);

    assert_eq!(h.app.history_len(), 2);
    assert_eq!(h.app.history_position(), Some((2, 2)));
    assert_eq!(h.app.labels(), vec!["cat".to_string()]);

    match events.recv().await.unwrap() {
        VisrecEvent::Captured {
            entry_id, width, ..
        } => {
            assert_eq!(entry_id, first);
            assert_eq!(width, 8);
        }
        other => panic!("Unexpected event {:?}", other),
    }
    assert!(matches!(
        events.recv().await.unwrap(),
        VisrecEvent::Learned { .. }
    ));
}

#[tokio::test]
async fn test_classify_without_examples_is_unknown() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(create_test_config(&dir.path().join("state.json")));

    h.capture.push(region(10));
    h.app.capture().await.unwrap();
    let result = h.app.classify_current().unwrap();

    assert_eq!(result.label, UNKNOWN_LABEL);
    assert_eq!(result.confidence, 0.0);
    assert!(h.app.current_entry().unwrap().result.is_some());
}

#[tokio::test]
async fn test_capture_failure_leaves_history_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(create_test_config(&dir.path().join("state.json")));

    let err = h.app.capture().await.unwrap_err();
    assert!(matches!(
        err,
        VisrecError::Classification(ClassificationError::CaptureUnavailable { .. })
    ));
    assert_eq!(h.app.history_len(), 0);
    assert!(matches!(
        h.app.learn("cat"),
        Err(VisrecError::Classification(
            ClassificationError::NoPendingCapture
        ))
    ));
}

#[tokio::test]
async fn test_history_navigation_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(create_test_config(&dir.path().join("state.json")));

    h.capture.push(region(0));
    let first = h.app.capture().await.unwrap();
    h.capture.push(region(128));
    let second = h.app.capture().await.unwrap();

    assert_eq!(h.app.prev().map(|entry| entry.id), Some(first));
    assert_eq!(h.app.prev().map(|entry| entry.id), Some(first));
    assert_eq!(h.app.next().map(|entry| entry.id), Some(second));

    assert_eq!(h.app.delete_current(), Some(second));
    assert_eq!(h.app.current_entry().map(|entry| entry.id), Some(first));

    assert_eq!(h.app.clear_history(), 1);
    assert_eq!(h.app.delete_current(), None);
    assert_eq!(h.app.history_position(), None);
}

#[tokio::test(start_paused = true)]
async fn test_play_uses_configured_repeat_count() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(create_test_config(&dir.path().join("state.json")));

    h.app.start_recording().unwrap();
    h.app.record_pointer(PointerSample::down(5, 6)).unwrap();
    h.clock.advance(50);
    h.app.record_pointer(PointerSample::up(5, 6)).unwrap();
    let timeline = h.app.stop_recording().unwrap();
    assert_eq!(timeline.span_ms(), 50);
    assert_eq!(h.app.pointer_coords(), Some((5, 6)));

    let handle = h.app.play(None).unwrap();
    assert_eq!(h.app.macro_state(), MacroState::Playing);
    assert!(matches!(
        h.app.start_recording(),
        Err(VisrecError::Macro(MacroError::Busy { .. }))
    ));

    let outcome = handle.wait().await;
    assert_eq!(
        outcome,
        PlaybackOutcome::Completed {
            events_dispatched: 4,
            repetitions: 2
        }
    );
    assert_eq!(h.injector.count(), 4);
    assert_eq!(h.app.macro_state(), MacroState::Idle);
}

#[tokio::test]
async fn test_macro_controls_outside_recording() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(create_test_config(&dir.path().join("state.json")));

    assert!(matches!(
        h.app.record_pointer(PointerSample::moved(1, 1)),
        Err(VisrecError::Macro(MacroError::NotRecording))
    ));
    assert!(matches!(
        h.app.play(Some(1)),
        Err(VisrecError::Macro(MacroError::EmptyTimeline))
    ));
    assert!(!h.app.cancel_playback());
    assert!(!h.app.cancel_recording());

    h.app.track_pointer(320, 200);
    assert_eq!(h.app.pointer_coords(), Some((320, 200)));

    h.app.start_recording().unwrap();
    assert!(h.app.cancel_recording());
    h.app.clear_macro().unwrap();
    assert!(h.app.macro_timeline().is_empty());
}

#[tokio::test]
async fn test_snapshot_round_trip_between_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(&dir.path().join("state.json"));

    {
        let h = harness(config.clone());
        h.capture.push(region(200));
        h.app.capture().await.unwrap();
        h.app.learn("dog").unwrap();

        h.app.start_recording().unwrap();
        h.app.record_pointer(PointerSample::down(1, 2)).unwrap();
        h.clock.advance(30);
        h.app.record_pointer(PointerSample::up(1, 2)).unwrap();
        h.app.stop_recording().unwrap();

        assert!(h.app.save_snapshot().await.unwrap());
    }

    let h = harness(config);
    let mut events = h.app.subscribe();
    assert!(h.app.load_snapshot().await.unwrap());

    assert_eq!(h.app.example_count(), 1);
    assert_eq!(h.app.macro_timeline().len(), 2);
    assert!(matches!(
        events.recv().await.unwrap(),
        VisrecEvent::SnapshotLoaded {
            example_count: 1,
            timeline_events: 2
        }
    ));

    h.capture.push(region(200));
    h.app.capture().await.unwrap();
    assert_eq!(h.app.classify_current().unwrap().label, "dog");
}

#[tokio::test]
async fn test_corrupted_snapshot_keeps_default_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, b"{\"version\": 1, \"examples\": [").unwrap();

    let h = harness(create_test_config(&path));
    let mut events = h.app.subscribe();

    let err = h.app.load_snapshot().await.unwrap_err();
    assert!(matches!(
        err,
        VisrecError::Persistence(PersistenceError::Corrupted { .. })
    ));
    assert_eq!(h.app.example_count(), 0);
    assert!(h.app.macro_timeline().is_empty());
    match events.recv().await.unwrap() {
        VisrecEvent::SystemError { component, error } => {
            assert_eq!(component, "persistence");
            assert_eq!(error, "Saved state is damaged and was ignored");
        }
        other => panic!("Unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_snapshot_with_other_grid_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let config = create_test_config(&path);

    {
        let h = harness(config.clone());
        h.capture.push(region(90));
        h.app.capture().await.unwrap();
        h.app.learn("bird").unwrap();
        h.app.save_snapshot().await.unwrap();
    }

    let mut resized = config;
    resized.features.grid_width = 8;
    let h = harness(resized);

    assert!(matches!(
        h.app.load_snapshot().await,
        Err(VisrecError::Classification(
            ClassificationError::DimensionMismatch { .. }
        ))
    ));
    assert_eq!(h.app.example_count(), 0);
    assert!(h.app.macro_timeline().is_empty());
}

#[tokio::test]
async fn test_without_persistence() {
    let app = VisrecApp::builder(VisrecConfig::default())
        .without_persistence()
        .build()
        .unwrap();

    assert!(!app.load_snapshot().await.unwrap());
    assert!(!app.save_snapshot().await.unwrap());
}

#[tokio::test]
async fn test_explicit_persistence_overrides_config_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = VisrecConfig::default();
    config.persistence.enabled = false;
    let path = dir.path().join("explicit.json");

    let app = VisrecApp::builder(config)
        .with_persistence(Arc::new(JsonFilePersistence::new(&path)))
        .build()
        .unwrap();

    assert!(app.save_snapshot().await.unwrap());
    assert!(path.exists());
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let mut config = VisrecConfig::default();
    config.features.grid_width = 0;

    assert!(matches!(
        VisrecApp::builder(config).build(),
        Err(VisrecError::Config(_))
    ));
}

#[tokio::test]
async fn test_run_saves_on_requested_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let h = harness(create_test_config(&path));

    h.capture.push(region(42));
    h.app.capture().await.unwrap();
    h.app.learn("fish").unwrap();

    assert!(h.app.request_shutdown(ShutdownReason::UserRequest));
    assert!(!h.app.request_shutdown(ShutdownReason::UserRequest));

    assert_eq!(h.app.run().await.unwrap(), 0);
    assert!(path.exists());

    assert!(h.app.run().await.is_err());
}

#[test]
fn test_play_from_ui_thread_outside_runtime() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let h = {
        let _guard = runtime.enter();
        harness(create_test_config(&dir.path().join("state.json")))
    };

    h.app.start_recording().unwrap();
    h.app.record_pointer(PointerSample::down(3, 4)).unwrap();
    h.clock.advance(20);
    h.app.record_pointer(PointerSample::up(3, 4)).unwrap();
    h.app.stop_recording().unwrap();

    let handle = std::thread::scope(|scope| {
        scope
            .spawn(|| h.app.play(Some(1)))
            .join()
            .unwrap()
    })
    .unwrap();

    let outcome = runtime.block_on(handle.wait());
    assert_eq!(
        outcome,
        PlaybackOutcome::Completed {
            events_dispatched: 2,
            repetitions: 1
        }
    );
    assert_eq!(h.app.macro_state(), MacroState::Idle);
    assert!(h.app.clear_macro().is_ok());
}

#[tokio::test]
async fn test_coordinates_readout_subscription() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(create_test_config(&dir.path().join("state.json")));
    let mut coords = h
        .app
        .subscribe_filtered(EventFilter::EventTypes(vec!["pointer_moved"]), "coords");
    let mut log = h.app.subscribe_filtered(EventFilter::All, "log");

    h.app.clear_history();
    h.app.track_pointer(17, 23);

    match coords.recv().await.unwrap() {
        VisrecEvent::PointerMoved { x, y } => assert_eq!((x, y), (17, 23)),
        other => panic!("Unexpected event {:?}", other),
    }
    assert!(coords.try_recv().unwrap().is_none());

    assert!(matches!(
        log.recv().await.unwrap(),
        VisrecEvent::HistoryCleared { removed: 0 }
    ));
    assert!(matches!(
        log.recv().await.unwrap(),
        VisrecEvent::PointerMoved { .. }
    ));
}

#[tokio::test]
async fn test_debug_events_still_deliver() {
    let app = VisrecApp::builder(VisrecConfig::default())
        .without_persistence()
        .with_debug_events(true)
        .build()
        .unwrap();
    let mut events = app.subscribe();

    app.track_pointer(1, 1);
    assert!(matches!(
        events.recv().await.unwrap(),
        VisrecEvent::PointerMoved { x: 1, y: 1 }
    ));
}
