//! Integration tests for saving and restoring registry layouts.

use railyard::adapters::layout_files::FileLayoutStore;
use railyard::adapters::sim::SimWrite;
use railyard::app::layout::{DEFAULT_LAYOUT, Layout};
use railyard::app::ports::{LayoutError, LayoutStore};
use railyard::drivers::{DeviceKind, SwitchAction};
use railyard::error::{LineError, SwitchError, YardError};
use railyard::pins::ASSIGNABLE_PINS;

use crate::mock_yard::{fixture, fixture_with_store, pins};

fn populate(yard: &mut railyard::app::service::SwitchYard) {
    yard.add(pins("16,18"), DeviceKind::Relay).unwrap();
    yard.add(pins("11"), DeviceKind::Servo).unwrap();
    yard.add(pins("13"), DeviceKind::Servo).unwrap();
    yard.act(&pins("16,18"), SwitchAction::Turn).unwrap();
    yard.act(&pins("11"), SwitchAction::Straight).unwrap();
}

#[test]
fn save_then_load_restores_order_and_state() {
    let mut f = fixture();
    populate(&mut f.yard);
    let saved = f.yard.snapshot();
    assert_eq!(f.yard.save_layout("yard").unwrap(), 3);

    f.yard.remove(&pins("11")).unwrap();
    f.yard.move_device(1, 0).unwrap();
    f.yard.add(pins("22"), DeviceKind::Servo).unwrap();

    assert_eq!(f.yard.load_layout("yard").unwrap(), 3);
    assert_eq!(f.yard.snapshot(), saved);
    assert!(f.yard.pool().contains(&22));
    assert!(!f.yard.pool().contains(&11));
    assert!(!f.board.is_claimed(22));
}

#[test]
fn load_trusts_stored_state_without_moving_hardware() {
    let mut f = fixture();
    populate(&mut f.yard);
    f.yard.save_layout("yard").unwrap();
    f.board.clear_history();

    f.yard.load_layout("yard").unwrap();
    let pulses = f
        .board
        .history()
        .into_iter()
        .filter(|w| matches!(w, SimWrite::Pulse { .. } | SimWrite::Delay(_)))
        .count();
    assert_eq!(pulses, 0);

    // Remembered Straight means a repeated Straight is skipped.
    f.board.clear_history();
    f.yard.act(&pins("11"), SwitchAction::Straight).unwrap();
    assert!(f.board.history().is_empty());
}

#[test]
fn load_missing_layout_leaves_registry_alone() {
    let mut f = fixture();
    populate(&mut f.yard);
    let before = f.yard.snapshot();

    let err = f.yard.load_layout("nope").unwrap_err();
    assert_eq!(err, YardError::Layout(LayoutError::NotFound("nope".into())));
    assert_eq!(f.yard.snapshot(), before);
}

#[test]
fn layout_names_are_validated() {
    let mut f = fixture();
    for bad in ["", "../etc/passwd", "has space", "dot.json"] {
        assert!(
            matches!(
                f.yard.save_layout(bad),
                Err(YardError::Layout(LayoutError::InvalidName(_)))
            ),
            "{bad:?} should be rejected"
        );
    }
    assert!(f.yard.save_layout("  yard_2-b  ").is_ok());
    assert_eq!(f.yard.list_layouts().unwrap(), ["yard_2-b"]);
}

#[test]
fn load_keeps_devices_that_could_be_built() {
    let mut f = fixture();
    populate(&mut f.yard);
    f.yard.save_layout("yard").unwrap();
    f.yard.shutdown();
    f.board.fail_pin(11);

    let err = f.yard.load_layout("yard").unwrap_err();
    assert_eq!(
        err,
        YardError::Switch(SwitchError::Line(LineError::Unavailable(11)))
    );
    assert_eq!(f.yard.order(), ["16,18", "13"]);
    assert!(f.yard.pool().contains(&11));
}

#[test]
fn delete_layout_reports_existence() {
    let mut f = fixture();
    f.yard.save_layout(DEFAULT_LAYOUT).unwrap();
    assert!(f.yard.delete_layout(DEFAULT_LAYOUT).unwrap());
    assert!(!f.yard.delete_layout(DEFAULT_LAYOUT).unwrap());
    assert!(f.yard.list_layouts().unwrap().is_empty());
}

#[test]
fn file_store_round_trips_across_registries() {
    let dir = tempfile::tempdir().unwrap();

    let mut first = fixture_with_store(Box::new(FileLayoutStore::open(dir.path()).unwrap()));
    populate(&mut first.yard);
    first.yard.save_layout(DEFAULT_LAYOUT).unwrap();
    let saved = first.yard.snapshot();
    first.yard.shutdown();
    assert!(dir.path().join("default.json").exists());

    // A fresh process with a fresh header picks the layout back up.
    let mut second = fixture_with_store(Box::new(FileLayoutStore::open(dir.path()).unwrap()));
    assert_eq!(second.yard.pool(), ASSIGNABLE_PINS.to_vec());
    second.yard.load_layout(DEFAULT_LAYOUT).unwrap();
    assert_eq!(second.yard.snapshot(), saved);
    assert!(second.board.is_claimed(16));
}

#[test]
fn corrupted_file_is_rejected_before_closing_devices() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("bad.json"),
        r#"{"devices":[{"kind":"servo","pins":[11]},{"kind":"servo","pins":[11]}]}"#,
    )
    .unwrap();

    let mut f = fixture_with_store(Box::new(FileLayoutStore::open(dir.path()).unwrap()));
    f.yard.add(pins("13"), DeviceKind::Servo).unwrap();

    let err = f.yard.load_layout("bad").unwrap_err();
    assert!(matches!(err, YardError::Layout(LayoutError::Corrupted(_))));
    assert_eq!(f.yard.order(), ["13"]);
}

#[test]
fn file_store_lists_only_layouts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    let mut store = FileLayoutStore::open(dir.path()).unwrap();
    store.save("b", &Layout::default()).unwrap();
    store.save("a", &Layout::default()).unwrap();
    assert_eq!(store.list().unwrap(), ["a", "b"]);
}
