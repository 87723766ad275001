pub mod fake_voltage_sensor;
