// NOTE: The version number here isn't important.  What's important is that we increment it
//  when we do a release, so it shows up in the startup log and we can tell which supervisor is
//  flashed on a returned device.
pub const SUPERVISOR_VERSION: u32 = 3;

// Voltages are VSYS in millivolts.
// Above this the battery is full or we're on USB/solar power, so boot straight away.
pub const HIGH_THRESHOLD_MV: u32 = 4100;
// Above this there's probably enough charge to run, but only after a sleep and a second look.
pub const MID_THRESHOLD_MV: u32 = 3200;
// Post-sleep voltage needed to boot.  Needs to stay above the battery protection circuit's
// cut-off, or the main firmware will brown out mid transmission.
pub const RECHECK_THRESHOLD_MV: u32 = 3000;

// Lines up wake-ups with the main firmware's transmission schedule.
pub const SLEEP_DURATION_MINUTES: u32 = 30;

// A charging cycle can oscillate between battery voltage and a higher input voltage if the
// battery is disconnected, so we average over a lot of samples.
pub const VOLTAGE_SAMPLES: u32 = 1000;

// First two words after the 256 byte XIP boot2 of the main firmware image.
pub const FIRMWARE_ENTRY: u32 = 0x1000_0100;

pub const VSYS_SENSE_PIN: u8 = 29;
pub const VSYS_ADC_CHANNEL: u8 = 3;
pub const POWER_DETECT_PIN: u8 = 24;
// Driven high for as long as the supervisor is asleep.
pub const SLEEP_INDICATOR_PIN: u8 = 15;

pub const XOSC_CRYSTAL_FREQ: u32 = 12_000_000;
// clk_sys divider applied to the ring oscillator while sleeping.
pub const SLEEP_CLOCK_DIVIDER: u32 = 64;

const _: () = assert!(HIGH_THRESHOLD_MV > MID_THRESHOLD_MV);
const _: () = assert!(MID_THRESHOLD_MV > RECHECK_THRESHOLD_MV);
const _: () = assert!(
    VSYS_SENSE_PIN != POWER_DETECT_PIN
        && VSYS_SENSE_PIN != SLEEP_INDICATOR_PIN
        && POWER_DETECT_PIN != SLEEP_INDICATOR_PIN
);
const _: () = assert!(VOLTAGE_SAMPLES > 0);
// VTOR ignores the low 8 bits on the M0+.
const _: () = assert!(FIRMWARE_ENTRY % 256 == 0);
