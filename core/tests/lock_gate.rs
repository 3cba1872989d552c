//! Lock gate: progress halts at each turn boundary until released.

use lockstep_core::{EventLog, FramePump, ManualClock, PumpConfig, TimeMode};

fn build_gated(time_mode: TimeMode) -> (FramePump<ManualClock>, EventLog) {
    let _ = env_logger::builder().is_test(true).try_init();
    let log = EventLog::new();
    let config = PumpConfig::new(0.033, 250, true).with_time_mode(time_mode);
    let mut pump = FramePump::new(config, ManualClock::new(), log.step_recorder())
        .expect("valid config");
    pump.register_turn_callback(log.turn_recorder());
    pump.start_check_time().expect("start");
    (pump, log)
}

/// Turn 1 is crossed on the 8th step (8 * 33 = 264 >= 250);
/// nothing after it is emitted in the same tick.
#[test]
fn gate_closes_on_the_step_that_crosses_a_turn() {
    let (mut pump, log) = build_gated(TimeMode::Monotonic);

    pump.clock_mut().advance(1_000);
    let report = pump.tick().unwrap();

    assert_eq!(report.steps, 8);
    assert_eq!(report.turns, vec![1]);
    assert_eq!(pump.simulated_millis(), 264);
    assert!(pump.is_locked());
    assert_eq!(log.turns(), vec![1]);
    assert_eq!(log.steps(), (0..8u64).collect::<Vec<_>>());
}

#[test]
fn closed_gate_freezes_time_and_steps() {
    let (mut pump, log) = build_gated(TimeMode::Monotonic);

    pump.clock_mut().advance(1_000);
    pump.tick().unwrap();
    let entries_before = log.len();

    for _ in 0..10 {
        pump.clock_mut().advance(500);
        let report = pump.tick().unwrap();
        assert!(report.gated);
        assert_eq!(report.steps, 0);
        assert_eq!(report.first_step, 8);
    }

    assert_eq!(pump.step_count(), 8);
    assert_eq!(pump.observed_elapsed_millis(), 1_000, "observed time must not advance while gated");
    assert_eq!(log.len(), entries_before, "no callbacks while gated");
    assert!(pump.status().is_gated());
}

#[test]
fn release_resumes_exactly_where_draining_stopped() {
    let (mut pump, log) = build_gated(TimeMode::Monotonic);

    pump.clock_mut().advance(1_000);
    pump.tick().unwrap();
    pump.clock_mut().advance(500);
    pump.tick().unwrap();

    pump.release();
    assert!(!pump.is_locked());
    let report = pump.tick().unwrap();

    // Picks up at step 8 and runs to the turn 2 crossing at 16 * 33 = 528.
    assert_eq!(report.first_step, 8);
    assert_eq!(report.steps, 8);
    assert_eq!(report.turns, vec![2]);
    assert_eq!(pump.observed_elapsed_millis(), 1_500);
    assert!(pump.is_locked());

    assert_eq!(log.steps(), (0..16u64).collect::<Vec<_>>(), "no step lost or duplicated");
    assert_eq!(log.turns(), vec![1, 2]);
}

#[test]
fn draining_a_long_backlog_takes_one_release_per_turn() {
    let (mut pump, log) = build_gated(TimeMode::Monotonic);

    pump.clock_mut().advance(1_000);
    let mut releases = 0;
    loop {
        let report = pump.tick().unwrap();
        if !pump.is_locked() && report.turns.is_empty() && !report.gated {
            break;
        }
        pump.release();
        releases += 1;
        assert!(releases < 100, "gate never settled");
    }

    assert_eq!(log.turns(), vec![1, 2, 3, 4]);
    assert_eq!(pump.step_count(), 31, "same steps as the ungated run");
    assert_eq!(releases, 4);
}

#[test]
fn releases_are_idempotent_and_do_not_queue() {
    let (mut pump, _log) = build_gated(TimeMode::Monotonic);

    pump.release();
    pump.release();
    pump.release();

    pump.clock_mut().advance(300);
    let report = pump.tick().unwrap();
    assert_eq!(report.turns, vec![1]);
    assert!(pump.is_locked(), "earlier releases must not pre-open the gate");

    pump.clock_mut().advance(300);
    assert!(pump.tick().unwrap().gated);
}

#[test]
fn frame_deltas_during_a_gated_tick_are_dropped() {
    let (mut pump, _log) = build_gated(TimeMode::FrameDelta);

    pump.clock_mut().advance(300);
    pump.tick().unwrap();
    assert!(pump.is_locked());
    assert_eq!(pump.observed_elapsed_millis(), 300);

    pump.clock_mut().advance(100);
    pump.tick().unwrap();
    assert_eq!(pump.observed_elapsed_millis(), 300, "observed time frozen while gated");

    pump.release();
    pump.clock_mut().advance(16);
    let report = pump.tick().unwrap();

    // Only the 16ms frame after release counts: 264 -> 297, 330.
    assert_eq!(pump.observed_elapsed_millis(), 316);
    assert_eq!(report.steps, 2);
    assert!(report.turns.is_empty());
    assert_eq!(pump.step_count(), 10);
}

#[test]
fn long_gate_wait_in_frame_delta_mode_does_not_burst_on_release() {
    let (mut pump, log) = build_gated(TimeMode::FrameDelta);

    pump.clock_mut().advance(300);
    pump.tick().unwrap();
    assert!(pump.is_locked());

    for _ in 0..100 {
        pump.clock_mut().advance(100);
        assert!(pump.tick().unwrap().gated);
    }

    pump.release();
    pump.clock_mut().advance(16);
    let report = pump.tick().unwrap();

    assert_eq!(pump.observed_elapsed_millis(), 316, "10s spent locked must not be replayed");
    assert_eq!(report.steps, 2);
    assert!(!pump.is_locked());
    assert_eq!(log.turns(), vec![1], "no turn may be announced from locked time");
}

#[test]
fn disabled_gate_never_blocks() {
    let log = EventLog::new();
    let mut pump = FramePump::new(PumpConfig::default_test(), ManualClock::new(), log.step_recorder())
        .unwrap();
    pump.start_check_time().unwrap();

    pump.clock_mut().advance(2_000);
    let report = pump.tick().unwrap();

    assert!(!report.gated);
    assert!(!pump.is_locked());
    assert_eq!(report.turns.len(), 8);
}
