use crate::constants::{
    HIGH_THRESHOLD_MV, MID_THRESHOLD_MV, RECHECK_THRESHOLD_MV, SLEEP_DURATION_MINUTES,
};
use crate::external_power::PowerWatch;
use crate::firmware_handoff::{FirmwareHandoff, FirmwareHeader, RegisterAccess};
use crate::re_exports::log::{error, info, warn};
use crate::sleep_controller::{Sleeper, WakeReason};
use crate::voltage_sensor::VoltageSensor;
use fugit::{ExtU32, MinutesDurationU32};

#[derive(Copy, Clone)]
pub struct SupervisorConfig {
    pub high_threshold_mv: u32,
    pub mid_threshold_mv: u32,
    pub recheck_threshold_mv: u32,
    pub sleep_duration: MinutesDurationU32,
}

#[cfg_attr(feature = "no-std", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigError {
    HighNotAboveMid,
    MidNotAboveRecheck,
    ZeroSleepDuration,
}

impl SupervisorConfig {
    pub const DEFAULT: SupervisorConfig = SupervisorConfig {
        high_threshold_mv: HIGH_THRESHOLD_MV,
        mid_threshold_mv: MID_THRESHOLD_MV,
        recheck_threshold_mv: RECHECK_THRESHOLD_MV,
        sleep_duration: MinutesDurationU32::from_ticks(SLEEP_DURATION_MINUTES),
    };

    pub fn with_thresholds(mut self, high_mv: u32, mid_mv: u32, recheck_mv: u32) -> Self {
        self.high_threshold_mv = high_mv;
        self.mid_threshold_mv = mid_mv;
        self.recheck_threshold_mv = recheck_mv;
        self
    }

    pub fn with_sleep_minutes(mut self, minutes: u32) -> Self {
        self.sleep_duration = minutes.minutes();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.high_threshold_mv <= self.mid_threshold_mv {
            return Err(ConfigError::HighNotAboveMid);
        }
        if self.mid_threshold_mv <= self.recheck_threshold_mv {
            return Err(ConfigError::MidNotAboveRecheck);
        }
        if self.sleep_duration.ticks() == 0 {
            return Err(ConfigError::ZeroSleepDuration);
        }
        Ok(())
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        SupervisorConfig::DEFAULT
    }
}

/// The loop only ever stops by giving control away.
#[cfg_attr(feature = "no-std", derive(defmt::Format))]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TerminalAction {
    HandOff(FirmwareHeader),
}

pub struct Supervisor<V, S, W, R>
where
    V: VoltageSensor,
    S: Sleeper,
    W: PowerWatch,
    R: RegisterAccess,
{
    config: SupervisorConfig,
    sensor: V,
    sleeper: S,
    power_watch: W,
    firmware: FirmwareHandoff<R>,
}

impl<V, S, W, R> Supervisor<V, S, W, R>
where
    V: VoltageSensor,
    S: Sleeper,
    W: PowerWatch,
    R: RegisterAccess,
{
    pub fn new(
        config: SupervisorConfig,
        sensor: V,
        sleeper: S,
        power_watch: W,
        firmware: FirmwareHandoff<R>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Supervisor { config, sensor, sleeper, power_watch, firmware })
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// One pass of the decision loop.  Returns `Some` once control should leave the supervisor.
    pub fn step(&mut self) -> Option<TerminalAction> {
        self.power_watch.arm();
        let voltage = self.sensor.read_voltage_millivolts();
        if voltage > self.config.high_threshold_mv {
            info!("VSYS {}mV, battery full or external power present", voltage);
            return self.try_hand_off();
        }
        if voltage > self.config.mid_threshold_mv {
            info!("VSYS {}mV, sleeping before checking again", voltage);
            if self.sleeper.sleep_for(self.config.sleep_duration) != WakeReason::TimerExpired {
                warn!("Sleep ended early, starting over");
                return None;
            }
            let voltage = self.sensor.read_voltage_millivolts();
            if voltage > self.config.recheck_threshold_mv {
                info!("VSYS {}mV after sleeping", voltage);
                return self.try_hand_off();
            }
            info!("VSYS {}mV after sleeping, too low to boot", voltage);
            return None;
        }
        info!("VSYS {}mV, battery low", voltage);
        let _ = self.sleeper.sleep_for(self.config.sleep_duration);
        None
    }

    fn try_hand_off(&mut self) -> Option<TerminalAction> {
        match self.firmware.validated_header() {
            Ok(header) => Some(TerminalAction::HandOff(header)),
            Err(e) => {
                error!("Firmware header at {:#x} rejected: {:?}", self.firmware.image_base(), e);
                let _ = self.sleeper.sleep_for(self.config.sleep_duration);
                None
            }
        }
    }

    pub fn run_until_terminal(&mut self) -> TerminalAction {
        loop {
            if let Some(action) = self.step() {
                return action;
            }
        }
    }

    /// Runs the loop and hands off.  Never comes back on hardware.
    pub fn run(mut self) -> R::Exit {
        match self.run_until_terminal() {
            TerminalAction::HandOff(header) => self.firmware.boot(header),
        }
    }
}
