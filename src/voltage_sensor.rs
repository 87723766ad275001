// VSYS is fed to the ADC through a 1/3 divider, against the 3.3V reference, with 12 bit samples.
pub const VREF_MILLIVOLTS: u32 = 3300;
pub const DIVIDER_RATIO: u32 = 3;
pub const ADC_FULL_SCALE: u32 = (1 << 12) - 1;

pub trait VoltageSensor {
    /// Measured VSYS in millivolts.
    fn read_voltage_millivolts(&mut self) -> u32;
}

/// Converts the sum of `sample_count` raw ADC readings into VSYS millivolts.
pub fn millivolts_from_adc_sum(raw_sum: u32, sample_count: u32) -> u32 {
    if sample_count == 0 {
        return 0;
    }
    let numerator = u64::from(raw_sum) * u64::from(VREF_MILLIVOLTS) * u64::from(DIVIDER_RATIO);
    let denominator = u64::from(sample_count) * u64::from(ADC_FULL_SCALE);
    #[allow(clippy::cast_possible_truncation)]
    let millivolts = (numerator / denominator) as u32;
    millivolts
}

/// Sums `sample_count` consecutive readings from `read_raw`.
pub fn sum_samples(sample_count: u32, mut read_raw: impl FnMut() -> u16) -> u32 {
    (0..sample_count).fold(0u32, |sum, _| sum.saturating_add(u32::from(read_raw())))
}
