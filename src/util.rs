use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};

use crate::mesh::NodeId;

pub fn node_hex(node_id: NodeId) -> String {
    format!("!{node_id:08x}")
}

/// Accepts `1234`, `!04d2`, `0x04d2`.
pub fn parse_node_id(raw: &str) -> Option<NodeId> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix('!').or_else(|| raw.strip_prefix("0x")) {
        return NodeId::from_str_radix(hex, 16).ok();
    }
    raw.parse().ok()
}

pub fn now_seconds() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

pub fn age_hours(timestamp: Option<f64>, now: f64) -> Option<f64> {
    timestamp
        .filter(|ts| ts.is_finite())
        .map(|ts| (now - ts) / 3600.0)
}

pub fn format_age(age_hours: Option<f64>) -> String {
    let Some(hours) = age_hours.filter(|hours| !hours.is_nan() && *hours >= 0.0) else {
        return "Unknown".to_owned();
    };

    if hours < 1.0 {
        format!("{}m ago", (hours * 60.0).round())
    } else if hours < 24.0 {
        format!("{}h ago", hours.round())
    } else {
        format!("{}d ago", (hours / 24.0).round())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeClass {
    Fresh,
    Recent,
    Old,
}

impl AgeClass {
    pub fn of(age_hours: Option<f64>) -> Self {
        match age_hours {
            Some(hours) if hours < 1.0 => Self::Fresh,
            Some(hours) if hours < 24.0 => Self::Recent,
            _ => Self::Old,
        }
    }
}

/// Parses the timestamp formats the locations API emits for `last_seen_str`:
/// RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS[.fff]` read as local time so it
/// compares consistently with [`parse_window_bound`].
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp_millis() as f64 / 1000.0);
    }

    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.timestamp_millis() as f64 / 1000.0)
}

/// Parses a user-entered window bound. Naive values (`YYYY-MM-DDTHH:MM`) are
/// local time, like a datetime picker; anything with an offset is honoured.
pub fn parse_window_bound(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp_millis() as f64 / 1000.0);
    }

    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|local| local.timestamp_millis() as f64 / 1000.0)
}

pub fn format_window_bound(seconds: f64) -> String {
    Local
        .timestamp_millis_opt((seconds * 1000.0) as i64)
        .earliest()
        .map(|local| local.format("%Y-%m-%dT%H:%M").to_string())
        .unwrap_or_default()
}

pub fn format_clock(seconds: f64) -> String {
    Local
        .timestamp_millis_opt((seconds * 1000.0) as i64)
        .earliest()
        .map(|local| local.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--".to_owned())
}

pub fn node_page_url(base_url: &str, node_id: NodeId) -> String {
    format!("{}/node/{node_id}", base_url.trim_end_matches('/'))
}

pub fn traceroute_history_url(base_url: &str, from: NodeId, to: NodeId) -> String {
    format!(
        "{}/traceroute-hops?from_node={from}&to_node={to}",
        base_url.trim_end_matches('/')
    )
}
