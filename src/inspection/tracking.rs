//! Tracking codes for product labels, derived from delivery-plan SKUs.
//!
//! A SKU looks like `PREFIX-TIMESTAMP-SERIAL1-SERIAL2`. The first twelve digits of the
//! timestamp are split into three groups of four joined by `T`; the first serial has a
//! leading and a trailing `7` replaced by `1`. Anything that does not parse yields
//! [`TRACKING_SENTINEL`] instead of an error so label printing is never blocked by a
//! malformed SKU.

use tracing::debug;

pub const TRACKING_SENTINEL: &str = "TRK-UNRESOLVED";

const TIMESTAMP_DIGITS: usize = 12;

struct DeliveryPlanSku<'a> {
    prefix: &'a str,
    timestamp_digits: String,
    serial: &'a str,
}

impl<'a> DeliveryPlanSku<'a> {
    fn parse(sku: &'a str) -> Option<Self> {
        let segments: Vec<&str> = sku.trim().split('-').collect();
        if segments.len() < 4 {
            return None;
        }
        let prefix = segments[0];
        let serial = segments[2];
        if prefix.is_empty() || serial.is_empty() {
            return None;
        }

        let timestamp_digits: String = segments[1]
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        if timestamp_digits.len() < TIMESTAMP_DIGITS {
            return None;
        }

        Some(Self {
            prefix,
            timestamp_digits,
            serial,
        })
    }

    fn tracking_code(&self) -> String {
        let digits = &self.timestamp_digits;
        format!(
            "{}-{}T{}T{}-{}",
            self.prefix,
            &digits[0..4],
            &digits[4..8],
            &digits[8..12],
            substitute_sevens(self.serial)
        )
    }
}

fn substitute_sevens(serial: &str) -> String {
    let mut chars: Vec<char> = serial.chars().collect();
    if let Some(first) = chars.first_mut() {
        if *first == '7' {
            *first = '1';
        }
    }
    if let Some(last) = chars.last_mut() {
        if *last == '7' {
            *last = '1';
        }
    }
    chars.into_iter().collect()
}

pub fn derive_tracking_number(sku: &str) -> String {
    match DeliveryPlanSku::parse(sku) {
        Some(parsed) => parsed.tracking_code(),
        None => {
            debug!(sku = %sku, "SKU not in delivery-plan form, using tracking sentinel");
            TRACKING_SENTINEL.to_string()
        }
    }
}
