//! Non-finite coordinates
//!
//! JSON has no NaN or infinity, so serde_json writes them as `null`. Reading
//! `null` back gives NaN, which the `repair` methods on the model types then
//! reset to a usable value.

use serde::{Deserialize, Deserializer};

/// `f64` field that accepts `null` as NaN
pub(crate) fn nullable<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Replace a non-finite `value` with `fallback`. Returns 1 if it did.
pub(crate) fn reset(value: &mut f64, fallback: f64) -> usize {
    if value.is_finite() {
        0
    } else {
        *value = fallback;
        1
    }
}

/// `value` if finite, else `fallback`
pub(crate) fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}
