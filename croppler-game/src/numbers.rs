//! Display helpers for export values.

use crate::constants::BILLION;

/// Render an export value for the breakdown labels.
///
/// Values of a billion or more are scaled and suffixed `B`. Smaller values are
/// printed unscaled with an `M` suffix.
#[must_use]
pub fn format_magnitude(value: f64) -> String {
    if value >= BILLION {
        format!("${:.2}B", value / BILLION)
    } else {
        format!("${value:.2}M")
    }
}
