#![warn(clippy::all, clippy::pedantic)]
mod boot_decision;
mod constants;
mod external_power;
mod firmware_handoff;
mod interrupt_context;
mod re_exports;
mod sleep_controller;
mod tests;
mod voltage_sensor;

fn main() {
    // NOTE: Never called in tests, see ./tests/testing/*
}
