//! Integration tests for the SwitchYard → drivers → GPIO pipeline.
//!
//! Every test drives the registry through its public API and then asserts
//! on what reached the simulated header.

use core::time::Duration;

use railyard::adapters::sim::SimWrite;
use railyard::app::commands::{Direction, YardCommand};
use railyard::app::events::YardEvent;
use railyard::drivers::{ActionOutcome, CoilPair, DeviceKind, SwitchAction, Throw};
use railyard::error::{LineError, PinError, SwitchError, YardError};
use railyard::pins::ASSIGNABLE_PINS;

use crate::mock_yard::{fixture, pins};

// ── Registration ──────────────────────────────────────────────

#[test]
fn add_servo_claims_pin_and_leaves_it_limp() {
    let mut f = fixture();
    f.yard.add(pins("11"), DeviceKind::Servo).unwrap();

    assert_eq!(f.yard.order(), ["11"]);
    assert!(!f.yard.pool().contains(&11));
    assert_eq!(f.yard.pool().len(), ASSIGNABLE_PINS.len() - 1);
    assert!(f.board.is_claimed(11));
    assert_eq!(f.board.pulse(11), None, "no pulse before the first command");

    let view = f.yard.device(&pins("11")).unwrap();
    assert_eq!(view.name, "Servo Train Switch");
    assert_eq!(view.state, None);
    assert!(matches!(f.sink.last(), Some(YardEvent::DeviceAdded { .. })));
}

#[test]
fn add_relay_parks_both_coils_released() {
    let mut f = fixture();
    f.yard.add(pins("16,18"), DeviceKind::Relay).unwrap();

    // Active-low relay board: released means high.
    assert_eq!(f.board.level(16), Some(true));
    assert_eq!(f.board.level(18), Some(true));
    assert_eq!(f.yard.order(), ["16,18"]);
}

#[test]
fn add_rejects_pin_already_in_use() {
    let mut f = fixture();
    f.yard.add(pins("16,18"), DeviceKind::Relay).unwrap();
    let pool_before = f.yard.pool();

    let err = f.yard.add(pins("18"), DeviceKind::Servo).unwrap_err();
    assert_eq!(err, YardError::PinUnavailable(18));
    assert_eq!(f.yard.pool(), pool_before);
    assert_eq!(f.yard.len(), 1);
}

#[test]
fn add_rejects_wrong_pin_count_without_claiming() {
    let mut f = fixture();
    let err = f.yard.add(pins("16"), DeviceKind::Relay).unwrap_err();
    assert!(matches!(
        err,
        YardError::Switch(SwitchError::WrongPinCount {
            kind: DeviceKind::Relay,
            expected: 2,
            found: 1,
        })
    ));
    assert!(!f.board.is_claimed(16));
    assert_eq!(f.yard.pool(), ASSIGNABLE_PINS.to_vec());
    assert!(f.yard.is_empty());
}

#[test]
fn add_reports_hardware_refusal_and_keeps_pool() {
    let mut f = fixture();
    f.board.fail_pin(22);
    let err = f.yard.add(pins("22"), DeviceKind::Servo).unwrap_err();
    assert_eq!(
        err,
        YardError::Switch(SwitchError::Line(LineError::Unavailable(22)))
    );
    assert!(f.yard.pool().contains(&22));
}

#[test]
fn remove_returns_pins_to_pool_and_releases_lines() {
    let mut f = fixture();
    f.yard.add(pins("16,18"), DeviceKind::Relay).unwrap();
    f.yard.add(pins("11"), DeviceKind::Servo).unwrap();

    assert!(f.yard.remove(&pins("16,18")).unwrap());
    assert!(f.yard.pool().contains(&16));
    assert!(f.yard.pool().contains(&18));
    assert!(!f.board.is_claimed(16));
    assert!(!f.board.is_claimed(18));
    assert_eq!(f.yard.order(), ["11"]);

    // Removing again is not an error, just a no-op.
    assert!(!f.yard.remove(&pins("16,18")).unwrap());
}

#[test]
fn removed_pins_can_be_reused() {
    let mut f = fixture();
    f.yard.add(pins("16,18"), DeviceKind::Relay).unwrap();
    f.yard.remove(&pins("16,18")).unwrap();
    f.yard.add(pins("18"), DeviceKind::Servo).unwrap();
    assert_eq!(f.yard.order(), ["18"]);
}

// ── Actions ───────────────────────────────────────────────────

#[test]
fn servo_straight_emits_long_pulse() {
    let mut f = fixture();
    f.yard.add(pins("11"), DeviceKind::Servo).unwrap();

    let outcome = f.yard.act(&pins("11"), SwitchAction::Straight).unwrap();
    assert!(matches!(outcome, ActionOutcome::Thrown(Throw::Angle(a)) if (a - 180.0).abs() < f32::EPSILON));
    assert_eq!(
        f.board.pulse(11),
        Some((Duration::from_millis(20), Duration::from_micros(2400)))
    );

    f.yard.act(&pins("11"), SwitchAction::Turn).unwrap();
    assert_eq!(
        f.board.pulse(11),
        Some((Duration::from_millis(20), Duration::from_micros(400)))
    );
    assert_eq!(
        f.yard.device(&pins("11")).unwrap().state,
        Some(SwitchAction::Turn)
    );
}

#[test]
fn repeated_action_is_skipped_without_hardware_writes() {
    let mut f = fixture();
    f.yard.add(pins("11"), DeviceKind::Servo).unwrap();
    f.yard.act(&pins("11"), SwitchAction::Straight).unwrap();
    f.board.clear_history();

    let outcome = f.yard.act(&pins("11"), SwitchAction::Straight).unwrap();
    assert_eq!(outcome, ActionOutcome::Skipped);
    assert!(f.board.history().is_empty());
    assert!(matches!(f.sink.last(), Some(YardEvent::Skipped { .. })));
}

#[test]
fn relay_turn_blinks_black_red_coil_only() {
    let mut f = fixture();
    f.yard.add(pins("16,18"), DeviceKind::Relay).unwrap();
    f.board.clear_history();

    let outcome = f.yard.act(&pins("16,18"), SwitchAction::Turn).unwrap();
    assert_eq!(outcome, ActionOutcome::Thrown(Throw::Coil(CoilPair::BlackRed)));
    assert_eq!(
        f.board.history(),
        vec![
            SimWrite::Level { pin: 18, high: true },
            SimWrite::Level { pin: 18, high: false },
            SimWrite::Delay(Duration::from_millis(250)),
            SimWrite::Level { pin: 18, high: true },
        ]
    );
}

#[test]
fn relay_straight_blinks_yellow_green_coil() {
    let mut f = fixture();
    f.yard.add(pins("16,18"), DeviceKind::Relay).unwrap();
    f.board.clear_history();

    f.yard.act(&pins("16,18"), SwitchAction::Straight).unwrap();
    let touched: Vec<u8> = f
        .board
        .history()
        .iter()
        .filter_map(|w| match w {
            SimWrite::Level { pin, .. } => Some(*pin),
            _ => None,
        })
        .collect();
    assert_eq!(touched, [16, 16, 16]);
    assert_eq!(f.board.level(16), Some(true), "coil released afterwards");
}

#[test]
fn act_on_unknown_device_is_an_error() {
    let mut f = fixture();
    let err = f.yard.act(&pins("11"), SwitchAction::Turn).unwrap_err();
    assert_eq!(err, YardError::NoSuchDevice("11".into()));
}

#[test]
fn hardware_fault_keeps_previous_state() {
    let mut f = fixture();
    f.yard.add(pins("11"), DeviceKind::Servo).unwrap();
    f.yard.act(&pins("11"), SwitchAction::Straight).unwrap();
    f.board.fail_pin(11);

    let err = f.yard.act(&pins("11"), SwitchAction::Turn).unwrap_err();
    assert!(matches!(err, YardError::Switch(SwitchError::Line(LineError::Io(_)))));
    assert_eq!(
        f.yard.device(&pins("11")).unwrap().state,
        Some(SwitchAction::Straight)
    );
    assert!(matches!(f.sink.last(), Some(YardEvent::SwitchFailed { .. })));

    f.board.heal_pin(11);
    f.yard.act(&pins("11"), SwitchAction::Turn).unwrap();
    assert_eq!(
        f.yard.device(&pins("11")).unwrap().state,
        Some(SwitchAction::Turn)
    );
}

// ── Toggle / reset by position ────────────────────────────────

#[test]
fn toggle_index_is_one_based_and_starts_straight() {
    let mut f = fixture();
    f.yard.add(pins("11"), DeviceKind::Servo).unwrap();
    f.yard.add(pins("13"), DeviceKind::Servo).unwrap();

    f.yard.toggle_index(2).unwrap();
    let snap = f.yard.snapshot();
    assert_eq!(snap[0].state, None);
    assert_eq!(snap[1].state, Some(SwitchAction::Straight));

    f.yard.toggle_index(2).unwrap();
    assert_eq!(f.yard.snapshot()[1].state, Some(SwitchAction::Turn));
}

#[test]
fn toggle_index_out_of_range() {
    let mut f = fixture();
    f.yard.add(pins("11"), DeviceKind::Servo).unwrap();
    assert_eq!(
        f.yard.toggle_index(0).unwrap_err(),
        YardError::IndexOutOfRange { index: 0, len: 1 }
    );
    assert_eq!(
        f.yard.toggle_index(2).unwrap_err(),
        YardError::IndexOutOfRange { index: 2, len: 1 }
    );
}

#[test]
fn reset_forgets_state_so_next_toggle_drives_straight() {
    let mut f = fixture();
    f.yard.add(pins("11"), DeviceKind::Servo).unwrap();
    f.yard.act(&pins("11"), SwitchAction::Straight).unwrap();

    f.yard.reset_index(1).unwrap();
    assert_eq!(f.yard.snapshot()[0].state, None);

    // Unknown state: the toggle re-drives Straight instead of skipping.
    f.board.clear_history();
    let outcome = f.yard.toggle(&pins("11")).unwrap();
    assert!(matches!(outcome, ActionOutcome::Thrown(_)));
    assert!(!f.board.history().is_empty());
    assert_eq!(f.yard.snapshot()[0].state, Some(SwitchAction::Straight));
}

// ── Ordering ──────────────────────────────────────────────────

#[test]
fn nudge_swaps_neighbours_and_stops_at_ends() {
    let mut f = fixture();
    for p in ["11", "13", "15"] {
        f.yard.add(pins(p), DeviceKind::Servo).unwrap();
    }

    f.yard.nudge(&pins("13"), Direction::Up).unwrap();
    assert_eq!(f.yard.order(), ["13", "11", "15"]);

    f.yard.nudge(&pins("13"), Direction::Up).unwrap();
    assert_eq!(f.yard.order(), ["13", "11", "15"]);

    f.yard.nudge(&pins("15"), Direction::Down).unwrap();
    assert_eq!(f.yard.order(), ["13", "11", "15"]);

    f.yard.nudge(&pins("11"), Direction::Down).unwrap();
    assert_eq!(f.yard.order(), ["13", "15", "11"]);
    assert!(matches!(f.sink.last(), Some(YardEvent::Reordered { .. })));
}

#[test]
fn commands_route_through_handle_command() {
    let mut f = fixture();
    f.yard
        .handle_command(YardCommand::Add {
            pins: pins("16,18"),
            kind: DeviceKind::Relay,
        })
        .unwrap();
    f.yard
        .handle_command(YardCommand::Act {
            pins: pins("16,18"),
            action: SwitchAction::Turn,
        })
        .unwrap();
    assert_eq!(f.yard.snapshot()[0].state, Some(SwitchAction::Turn));

    // Removing an absent device is a no-op.
    f.yard
        .handle_command(YardCommand::Remove(pins("11")))
        .unwrap();
    assert_eq!(f.yard.len(), 1);
}

#[test]
fn parse_errors_surface_as_pin_errors() {
    assert_eq!(
        railyard::pins::PinSet::parse("16,16").unwrap_err(),
        PinError::Duplicate(16)
    );
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_parks_everything_and_frees_the_pool() {
    let mut f = fixture();
    f.yard.add(pins("11"), DeviceKind::Servo).unwrap();
    f.yard.add(pins("16,18"), DeviceKind::Relay).unwrap();
    f.yard.act(&pins("11"), SwitchAction::Straight).unwrap();

    assert_eq!(f.yard.shutdown(), 2);
    assert!(f.yard.is_empty());
    assert_eq!(f.yard.pool(), ASSIGNABLE_PINS.to_vec());
    for pin in [11, 16, 18] {
        assert!(!f.board.is_claimed(pin));
    }
    assert!(f.board.history().contains(&SimWrite::Stop { pin: 11 }));
    assert!(matches!(f.sink.last(), Some(YardEvent::Closed { devices: 2 })));
}
