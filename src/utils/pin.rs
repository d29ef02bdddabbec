// src/utils/pin.rs

use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

/// Digits in a generated PIN.
pub const PIN_LENGTH: usize = 6;

static PIN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4,8}$").expect("PIN pattern is valid"));

/// Random zero-padded 6-digit PIN. Uniqueness is checked by the caller.
pub fn generate_pin() -> String {
    let value = rand::rng().random_range(0..1_000_000u32);
    format!("{:0width$}", value, width = PIN_LENGTH)
}

/// Whether `pin` looks like a PIN at all; anything else is rejected before lookup.
pub fn is_well_formed(pin: &str) -> bool {
    PIN_PATTERN.is_match(pin)
}
