//! Gateway module - single-resource proxy, cross-service joins and health aggregation

pub mod aggregator;
pub mod health_check;
pub mod proxy;

use chrono::{SecondsFormat, Utc};

/// Current time as an RFC 3339 string with millisecond precision
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
