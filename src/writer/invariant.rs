//! Culture-invariant text rendering of scalar values
//!
//! Every text format (XML content, CSV fields) goes through [`format_scalar`],
//! so the same value always renders the same way regardless of host locale.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;

use crate::record::Scalar;

/// Render a scalar as invariant text
///
/// # Arguments
/// * `value` - Scalar to render
///
/// # Returns
/// * `String` - Empty for `Null`
pub fn format_scalar(value: &Scalar) -> String {
    match value {
        Scalar::Null => String::new(),
        Scalar::Text(s) => s.clone(),
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(x) => format_float(*x),
        Scalar::Decimal(d) => format_decimal(d),
        Scalar::Bool(b) => format_bool(*b).to_string(),
        Scalar::DateTime(dt) => format_datetime(dt),
    }
}

/// Shortest representation that reads back to the same value
pub fn format_float(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x.is_infinite() {
        let text = if x > 0.0 { "INF" } else { "-INF" };
        text.to_string()
    } else {
        x.to_string()
    }
}

/// Decimal text keeping its scale (`19.90` stays `19.90`)
pub fn format_decimal(d: &Decimal) -> String {
    d.to_string()
}

pub fn format_bool(b: bool) -> &'static str {
    if b { "True" } else { "False" }
}

/// RFC 3339 in UTC with a `Z` suffix, fractional seconds only when present
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
