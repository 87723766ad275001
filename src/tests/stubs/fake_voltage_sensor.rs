use crate::tests::test_state::test_global_state::{SimEvent, TEST_SIM_STATE};
use crate::voltage_sensor::VoltageSensor;

/// Hands out the readings queued in the sim state, in order.
pub struct FakeVoltageSensor;

impl VoltageSensor for FakeVoltageSensor {
    fn read_voltage_millivolts(&mut self) -> u32 {
        TEST_SIM_STATE.with(|state| {
            let mut state = state.borrow_mut();
            let voltage = state
                .voltage_readings
                .pop_front()
                .expect("Test ran out of queued voltage readings");
            state.record(SimEvent::SampledVoltage(voltage));
            voltage
        })
    }
}
