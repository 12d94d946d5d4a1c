//! Conversions between Fahrenheit, Celsius and the thermostat's internal
//! temperature encoding.
//!
//! The device unit is an affine map of Fahrenheit: `d = (f - 33) * 56 + 33`.
//! All conversions round half away from zero, which is what `f64::round` does.

fn round(value: f64) -> i32 {
    value.round() as i32
}

pub fn fahrenheit_to_celsius(fahrenheit: i32) -> i32 {
    round((fahrenheit as f64 - 32.0) / 1.8)
}

pub fn celsius_to_fahrenheit(celsius: i32) -> i32 {
    round(celsius as f64 * 1.8 + 32.0)
}

pub fn fahrenheit_to_device(fahrenheit: i32) -> i32 {
    round((fahrenheit as f64 - 33.0) * 56.0 + 33.0)
}

pub fn device_to_fahrenheit(device: i32) -> i32 {
    round((device as f64 - 33.0) / 56.0 + 33.0)
}

/// Goes through whole Fahrenheit degrees, like the vendor's own apps.
pub fn celsius_to_device(celsius: i32) -> i32 {
    fahrenheit_to_device(celsius_to_fahrenheit(celsius))
}

pub fn device_to_celsius(device: i32) -> i32 {
    fahrenheit_to_celsius(device_to_fahrenheit(device))
}
