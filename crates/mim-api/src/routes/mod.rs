//! API routes

pub mod compliance;
pub mod geopackage;

use crate::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
    pub uptime: String,
    pub startup_time: String,
    pub current_time: String,
}

/// Liveness with uptime
pub async fn ping(State(state): State<Arc<AppState>>) -> Json<PingResponse> {
    let now = Utc::now();

    Json(PingResponse {
        status: "operational".to_string(),
        uptime: format_uptime(now - state.started_at),
        startup_time: iso_timestamp(state.started_at),
        current_time: iso_timestamp(now),
    })
}

/// `H:MM:SS`, prefixed with `N day(s), ` past 24 hours; whole seconds only
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.num_seconds().max(0);
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let clock = format!("{}:{:02}:{:02}", hours, minutes, seconds);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::seconds(0)), "0:00:00");
        assert_eq!(format_uptime(Duration::milliseconds(59_999)), "0:00:59");
        assert_eq!(format_uptime(Duration::seconds(3_725)), "1:02:05");
        assert_eq!(format_uptime(Duration::seconds(86_400 + 61)), "1 day, 0:01:01");
        assert_eq!(format_uptime(Duration::seconds(3 * 86_400 + 7_200)), "3 days, 2:00:00");
    }

    #[test]
    fn test_iso_timestamp() {
        let at = DateTime::parse_from_rfc3339("2024-05-01T10:20:30.123456Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(iso_timestamp(at), "2024-05-01T10:20:30.123456Z");
    }
}
