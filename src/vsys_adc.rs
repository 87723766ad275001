use crate::constants::{VOLTAGE_SAMPLES, VSYS_ADC_CHANNEL, VSYS_SENSE_PIN};
use crate::re_exports::log::{info, trace};
use crate::voltage_sensor::{millivolts_from_adc_sum, sum_samples, VoltageSensor};
use embedded_hal::adc::OneShot;
use rp2040_hal::adc::{Adc, AdcPin};
use rp2040_hal::gpio::bank0::Gpio29;
use rp2040_hal::gpio::{FunctionNull, Pin, PullNone};

pub type VsysSensePin = AdcPin<Pin<Gpio29, FunctionNull, PullNone>>;

/// VSYS/3 on ADC input 3, as wired on the Pico.
pub struct VsysSensor {
    adc: Adc,
    pin: VsysSensePin,
}

impl VsysSensor {
    pub fn new(adc: Adc, pin: VsysSensePin) -> VsysSensor {
        info!("VSYS sense on gpio{}, adc input {}", VSYS_SENSE_PIN, VSYS_ADC_CHANNEL);
        VsysSensor { adc, pin }
    }
}

impl VoltageSensor for VsysSensor {
    fn read_voltage_millivolts(&mut self) -> u32 {
        let VsysSensor { adc, pin } = self;
        // Owning the `AdcPin` keeps the pad in analog mode (digital input off, no pulls), and
        // each one-shot read selects our input before converting.
        let raw_sum = sum_samples(VOLTAGE_SAMPLES, || {
            let reading: Result<u16, _> = nb::block!(adc.read(pin));
            reading.unwrap_or_else(|_| {
                trace!("Failed ADC conversion");
                0
            })
        });
        millivolts_from_adc_sum(raw_sum, VOLTAGE_SAMPLES)
    }
}
