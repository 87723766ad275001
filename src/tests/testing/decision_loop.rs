use crate::boot_decision::{ConfigError, Supervisor, SupervisorConfig, TerminalAction};
use crate::constants::{FIRMWARE_ENTRY, SLEEP_DURATION_MINUTES};
use crate::external_power::ExternalPowerWatcher;
use crate::firmware_handoff::{FirmwareHandoff, FirmwareHeader, VTOR_ADDRESS};
use crate::sleep_controller::{SleepController, WakeFlag, WakeReason};
use crate::tests::helpers::{
    count_events, decision_events, flash_firmware_header, flash_valid_firmware,
    queue_sleep_results, queue_voltage_readings, remaining_voltage_readings, reset_sim_state,
    sim_events, test_supervisor, TEST_ENTRY_VECTOR, TEST_STACK_POINTER,
};
use crate::tests::stubs::fake_edge_pin::FakeEdgePin;
use crate::tests::stubs::fake_registers::FakeRegisters;
use crate::tests::stubs::fake_sleep_hardware::FakeSleepHardware;
use crate::tests::stubs::fake_sleeper::FakeSleeper;
use crate::tests::stubs::fake_voltage_sensor::FakeVoltageSensor;
use crate::tests::test_state::test_global_state::{SimEvent, SimInterrupt, TEST_SIM_STATE};
use test_log::test;

const SLEPT: SimEvent = SimEvent::Slept { minutes: SLEEP_DURATION_MINUTES };

fn valid_header() -> FirmwareHeader {
    FirmwareHeader { initial_stack_pointer: TEST_STACK_POINTER, entry_vector: TEST_ENTRY_VECTOR }
}

#[test]
fn full_battery_hands_off_without_sleeping() {
    reset_sim_state();
    flash_valid_firmware();
    queue_voltage_readings(&[4200]);
    let mut supervisor = test_supervisor(SupervisorConfig::DEFAULT);

    assert_eq!(supervisor.step(), Some(TerminalAction::HandOff(valid_header())));
    assert_eq!(decision_events(), vec![SimEvent::SampledVoltage(4200)]);
}

#[test]
fn mid_battery_that_holds_up_hands_off_after_one_sleep() {
    reset_sim_state();
    flash_valid_firmware();
    queue_voltage_readings(&[3500, 3100]);
    let mut supervisor = test_supervisor(SupervisorConfig::DEFAULT);

    assert_eq!(supervisor.step(), Some(TerminalAction::HandOff(valid_header())));
    assert_eq!(
        decision_events(),
        vec![SimEvent::SampledVoltage(3500), SLEPT, SimEvent::SampledVoltage(3100)]
    );
}

#[test]
fn mid_battery_that_sags_starts_over() {
    reset_sim_state();
    flash_valid_firmware();
    queue_voltage_readings(&[3500, 2900]);
    let mut supervisor = test_supervisor(SupervisorConfig::DEFAULT);

    assert_eq!(supervisor.step(), None);
    assert_eq!(
        decision_events(),
        vec![SimEvent::SampledVoltage(3500), SLEPT, SimEvent::SampledVoltage(2900)]
    );
}

#[test]
fn low_battery_sleeps_without_rechecking() {
    reset_sim_state();
    flash_valid_firmware();
    queue_voltage_readings(&[2000]);
    let mut supervisor = test_supervisor(SupervisorConfig::DEFAULT);

    assert_eq!(supervisor.step(), None);
    assert_eq!(decision_events(), vec![SimEvent::SampledVoltage(2000), SLEPT]);
    assert_eq!(remaining_voltage_readings(), 0);
}

#[test]
fn early_wake_from_mid_sleep_skips_the_recheck() {
    reset_sim_state();
    flash_valid_firmware();
    queue_voltage_readings(&[3500]);
    queue_sleep_results(&[WakeReason::Spurious]);
    let mut supervisor = test_supervisor(SupervisorConfig::DEFAULT);

    // A recheck would run the fake sensor dry and panic.
    assert_eq!(supervisor.step(), None);
    assert_eq!(decision_events(), vec![SimEvent::SampledVoltage(3500), SLEPT]);
}

#[test]
fn thresholds_are_strictly_greater_than() {
    reset_sim_state();
    flash_valid_firmware();
    queue_voltage_readings(&[4100, 3000, 3200, 4101]);
    let mut supervisor = test_supervisor(SupervisorConfig::DEFAULT);

    // Exactly the high threshold is treated as mid, and exactly the recheck threshold fails.
    assert_eq!(supervisor.step(), None);
    // Exactly the mid threshold is treated as low.
    assert_eq!(supervisor.step(), None);
    assert_eq!(supervisor.step(), Some(TerminalAction::HandOff(valid_header())));
    assert_eq!(
        decision_events(),
        vec![
            SimEvent::SampledVoltage(4100),
            SLEPT,
            SimEvent::SampledVoltage(3000),
            SimEvent::SampledVoltage(3200),
            SLEPT,
            SimEvent::SampledVoltage(4101),
        ]
    );
}

#[test]
fn recheck_just_above_threshold_hands_off() {
    reset_sim_state();
    flash_valid_firmware();
    queue_voltage_readings(&[3201, 3001]);
    let mut supervisor = test_supervisor(SupervisorConfig::DEFAULT);

    assert_eq!(supervisor.step(), Some(TerminalAction::HandOff(valid_header())));
}

#[test]
fn erased_firmware_is_never_branched_to() {
    reset_sim_state();
    queue_voltage_readings(&[4200]);
    let mut supervisor = test_supervisor(SupervisorConfig::DEFAULT);

    assert_eq!(supervisor.step(), None);
    assert_eq!(decision_events(), vec![SimEvent::SampledVoltage(4200), SLEPT]);
}

#[test]
fn garbage_firmware_header_sleeps_instead_of_branching() {
    reset_sim_state();
    flash_firmware_header(0x1000_0000, TEST_ENTRY_VECTOR);
    queue_voltage_readings(&[3500, 3100]);
    let mut supervisor = test_supervisor(SupervisorConfig::DEFAULT);

    assert_eq!(supervisor.step(), None);
    assert_eq!(
        decision_events(),
        vec![SimEvent::SampledVoltage(3500), SLEPT, SimEvent::SampledVoltage(3100), SLEPT]
    );
}

#[test]
fn power_detect_is_armed_before_the_first_sample_and_only_once() {
    reset_sim_state();
    flash_valid_firmware();
    queue_voltage_readings(&[2000, 3500, 2900, 3500, 3100]);
    let mut supervisor = test_supervisor(SupervisorConfig::DEFAULT);

    assert_eq!(supervisor.run_until_terminal(), TerminalAction::HandOff(valid_header()));
    assert_eq!(
        sim_events()[..3],
        [SimEvent::ClearedEdge, SimEvent::EnabledEdgeInterrupt, SimEvent::SampledVoltage(2000)]
    );
    assert_eq!(count_events(SimEvent::EnabledEdgeInterrupt), 1);
    assert_eq!(count_events(SLEPT), 3);
    assert_eq!(remaining_voltage_readings(), 0);
}

#[test]
fn run_points_vtor_at_the_firmware_then_branches_once() {
    reset_sim_state();
    flash_valid_firmware();
    queue_voltage_readings(&[2000, 4200]);
    let supervisor = test_supervisor(SupervisorConfig::DEFAULT);

    supervisor.run();

    let events = sim_events();
    let vtor_write = SimEvent::WroteRegister { address: VTOR_ADDRESS, value: FIRMWARE_ENTRY };
    let branch =
        SimEvent::Branched { stack_pointer: TEST_STACK_POINTER, entry: TEST_ENTRY_VECTOR | 1 };
    assert_eq!(events[events.len() - 2..], [vtor_write, branch]);
    assert_eq!(count_events(branch), 1);
}

#[test]
fn configured_sleep_duration_is_used() {
    reset_sim_state();
    flash_valid_firmware();
    queue_voltage_readings(&[2000]);
    let mut supervisor = test_supervisor(SupervisorConfig::DEFAULT.with_sleep_minutes(5));

    assert_eq!(supervisor.step(), None);
    assert_eq!(
        decision_events(),
        vec![SimEvent::SampledVoltage(2000), SimEvent::Slept { minutes: 5 }]
    );
    assert_eq!(supervisor.config().sleep_duration.ticks(), 5);
}

#[test]
fn bad_config_is_refused() {
    reset_sim_state();
    let supervisor = Supervisor::new(
        SupervisorConfig::DEFAULT.with_thresholds(3000, 3200, 3100),
        FakeVoltageSensor,
        FakeSleeper,
        ExternalPowerWatcher::new(FakeEdgePin),
        FirmwareHandoff::new(FakeRegisters, FIRMWARE_ENTRY),
    );
    assert!(matches!(supervisor, Err(ConfigError::HighNotAboveMid)));
}

#[test]
fn alarm_without_its_interrupt_restarts_the_loop_through_the_real_sleep_controller() {
    static WAKE_FLAG: WakeFlag = WakeFlag::new();
    reset_sim_state();
    flash_valid_firmware();
    queue_voltage_readings(&[3500]);
    TEST_SIM_STATE.with(|state| {
        state.borrow_mut().interrupts.push_back(SimInterrupt::AlarmWithoutCallback);
    });
    let mut supervisor = Supervisor::new(
        SupervisorConfig::DEFAULT,
        FakeVoltageSensor,
        SleepController::new(FakeSleepHardware::new(&WAKE_FLAG), &WAKE_FLAG),
        ExternalPowerWatcher::new(FakeEdgePin),
        FirmwareHandoff::new(FakeRegisters, FIRMWARE_ENTRY),
    )
    .unwrap();

    assert_eq!(supervisor.step(), None);
    assert_eq!(count_events(SimEvent::CancelledWake), 1);
    assert_eq!(remaining_voltage_readings(), 0);
}
