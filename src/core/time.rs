use chrono::{DateTime, Utc};

/// Current time, overridable via `SL_FIXED_TIME` for deterministic replay in
/// tests.
pub fn now_utc() -> DateTime<Utc> {
    if let Ok(value) = std::env::var("SL_FIXED_TIME") {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
            return dt.with_timezone(&Utc);
        }
    }
    Utc::now()
}
