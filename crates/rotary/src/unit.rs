use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};

/// Label appended to the displayed value, e.g. `kg` or `cm`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct Unit(String);

crate::impl_string_newtype!(Unit);

const MAX_DECIMALS: usize = 3;

/// Number of decimals needed to print `x` exactly, capped at three.
pub fn decimals_for(x: f64) -> usize {
    (0..MAX_DECIMALS)
        .find(|&d| {
            let scaled = x * 10f64.powi(d as i32);
            (scaled - scaled.round()).abs() < 1e-6
        })
        .unwrap_or(MAX_DECIMALS)
}

pub fn format_value(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// `value` with the unit label, as shown in the centre of the dial.
pub fn format_with_unit(value: f64, decimals: usize, unit: Option<&Unit>) -> String {
    match unit.filter(|u| !u.trim().is_empty()) {
        Some(unit) => format!("{} {}", format_value(value, decimals), unit.trim()),
        None => format_value(value, decimals),
    }
}
