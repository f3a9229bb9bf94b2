// End-to-end editing sessions: a real canvas driven through the history
// manager, persisted in redb.

use std::sync::Arc;
use std::time::{Duration, Instant};

use canvas_pad_config::{AppConfig, HexColor};
use canvas_pad_core::{Canvas, ObjectKind, ShapeKind, TextStyleFlag};
use canvas_pad_mod_history::{
    HistoryConfig, HistoryManager, HistoryStep, Hydration, KeyValueStore, RedbStore,
};

fn open(dir: &std::path::Path, doc: &str) -> HistoryManager<Canvas> {
    let app = AppConfig::default();
    let mut config = HistoryConfig::from_app_config(&app);
    config.data_dir = dir.to_path_buf();
    let store: Arc<dyn KeyValueStore> = RedbStore::open(dir).unwrap();
    HistoryManager::hydrate(doc, config, Canvas::from_config(&app), Some(store))
}

fn settle_after_debounce(mgr: &mut HistoryManager<Canvas>, now: &mut Instant) {
    mgr.poll_at(*now).unwrap();
    *now += Duration::from_millis(301);
    assert!(mgr.poll_at(*now).unwrap());
}

fn shape_types(canvas: &Canvas) -> Vec<&'static str> {
    canvas.objects().iter().map(|o| o.type_name()).collect()
}

#[test]
fn test_shape_session_with_undo_and_branching() {
    let dir = tempfile::tempdir().unwrap();
    let mut mgr = open(dir.path(), "poster");
    let mut now = Instant::now();

    mgr.surface_mut().add_shape(ShapeKind::Rect);
    settle_after_debounce(&mut mgr, &mut now);
    mgr.surface_mut().add_shape(ShapeKind::Circle);
    settle_after_debounce(&mut mgr, &mut now);

    assert_eq!(mgr.undo().unwrap(), HistoryStep::Moved { cursor: 0 });
    assert_eq!(shape_types(mgr.surface()), vec!["rect"]);
    assert!(mgr.can_redo());

    mgr.surface_mut().add_shape(ShapeKind::Triangle);
    settle_after_debounce(&mut mgr, &mut now);
    assert!(!mgr.can_redo());
    assert_eq!(shape_types(mgr.surface()), vec!["rect", "triangle"]);
    assert_eq!(mgr.len(), 2);
}

#[test]
fn test_styling_burst_is_one_undo_step() {
    let dir = tempfile::tempdir().unwrap();
    let mut mgr = open(dir.path(), "styles");
    let mut now = Instant::now();

    let text = mgr.surface_mut().add_text("Your Text");
    settle_after_debounce(&mut mgr, &mut now);

    let canvas = mgr.surface_mut();
    canvas.toggle_text_style(text, TextStyleFlag::Bold, 0, 4).unwrap();
    canvas.toggle_text_style(text, TextStyleFlag::Italic, 5, 9).unwrap();
    canvas.set_background(HexColor::rgb(0x7B, 0x68, 0xEE));
    mgr.poll_at(now).unwrap();
    mgr.poll_at(now + Duration::from_millis(100)).unwrap();
    assert!(mgr.poll_at(now + Duration::from_millis(400)).unwrap());
    assert_eq!(mgr.len(), 2);

    mgr.undo().unwrap();
    let canvas = mgr.surface();
    assert_eq!(canvas.background(), HexColor::WHITE);
    match &canvas.objects()[0].kind {
        ObjectKind::Textbox(tb) => assert!(tb.styles.is_empty()),
        other => panic!("expected text box, got {other:?}"),
    }
}

#[test]
fn test_session_resumes_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let image_id;
    {
        let mut mgr = open(dir.path(), "resume");
        image_id = mgr.surface_mut().add_image("logo.png", 600, 300).unwrap();
        mgr.commit().unwrap();
        mgr.surface_mut().set_opacity(image_id, 0.4).unwrap();
        mgr.commit().unwrap();
        mgr.surface_mut().remove_active();
        mgr.commit().unwrap();
        mgr.undo().unwrap();
        mgr.teardown();
    }

    let mut mgr = open(dir.path(), "resume");
    assert_eq!(mgr.hydration(), Hydration::Resumed { cursor: 1 });
    let image = mgr.surface().object(image_id).expect("image restored");
    assert_eq!(image.opacity, 0.4);
    assert!(mgr.can_redo());

    mgr.redo().unwrap();
    assert!(mgr.surface().is_empty());
}

#[test]
fn test_documents_do_not_share_history() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut a = open(dir.path(), "a");
        a.surface_mut().add_shape(ShapeKind::Rect);
        a.commit().unwrap();
    }
    let b = open(dir.path(), "b");
    assert_eq!(b.hydration(), Hydration::Fresh);
    assert!(b.surface().is_empty());
}

#[test]
fn test_baseline_lets_first_command_be_undone() {
    let dir = tempfile::tempdir().unwrap();
    let app = AppConfig {
        baseline_snapshot: true,
        ..AppConfig::default()
    };
    let mut config = HistoryConfig::from_app_config(&app);
    config.data_dir = dir.path().to_path_buf();
    let store: Arc<dyn KeyValueStore> = RedbStore::open(dir.path()).unwrap();

    {
        let mut mgr = HistoryManager::hydrate(
            "fresh",
            config.clone(),
            Canvas::from_config(&app),
            Some(store.clone()),
        );
        mgr.surface_mut().add_shape(ShapeKind::Rect);
        assert!(mgr.settle().unwrap());
        mgr.teardown();
    }

    let mut mgr =
        HistoryManager::hydrate("fresh", config, Canvas::from_config(&app), Some(store));
    assert_eq!(mgr.hydration(), Hydration::Resumed { cursor: 1 });
    assert_eq!(mgr.undo().unwrap(), HistoryStep::Moved { cursor: 0 });
    assert!(mgr.surface().is_empty());
}
