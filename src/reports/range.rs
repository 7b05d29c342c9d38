use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

use crate::errors::ServiceError;

pub const MIN_PERIOD_DAYS: i64 = 1;
pub const MAX_PERIOD_DAYS: i64 = 365;

/// Inclusive time window every report query filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ServiceError> {
        if start > end {
            return Err(ServiceError::ValidationError(
                "startDate must not be after endDate".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// The `period` days ending at `end`.
    pub fn trailing(end: DateTime<Utc>, period_days: i64) -> Self {
        Self {
            start: end - Duration::days(period_days),
            end,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

/// Query string of `GET /api/reports/advanced`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// overview | revenue | products | customers | inventory | cohort | conversion
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    /// ISO-8601 date or date-time
    pub start_date: Option<String>,
    /// ISO-8601 date or date-time
    pub end_date: Option<String>,
    /// Look-back window in days (1-365)
    pub period: Option<String>,
}

impl ReportQuery {
    /// Resolves the request's window against `now`.
    ///
    /// A missing end defaults to `now`; a missing start defaults to `period`
    /// days before the end.
    pub fn resolve_range(
        &self,
        default_period_days: u32,
        now: DateTime<Utc>,
    ) -> Result<DateRange, ServiceError> {
        let period = match non_empty(&self.period) {
            Some(raw) => parse_period(raw)?,
            None => i64::from(default_period_days),
        };
        let start = non_empty(&self.start_date)
            .map(|raw| parse_timestamp("startDate", raw))
            .transpose()?;
        let end = non_empty(&self.end_date)
            .map(|raw| parse_timestamp("endDate", raw))
            .transpose()?;

        match (start, end) {
            (Some(start), Some(end)) => DateRange::new(start, end),
            (Some(start), None) => DateRange::new(start, now),
            (None, Some(end)) => Ok(DateRange::trailing(end, period)),
            (None, None) => Ok(DateRange::trailing(now, period)),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_period(raw: &str) -> Result<i64, ServiceError> {
    let days: i64 = raw
        .parse()
        .map_err(|_| ServiceError::ValidationError("period must be a whole number of days".into()))?;
    if !(MIN_PERIOD_DAYS..=MAX_PERIOD_DAYS).contains(&days) {
        return Err(ServiceError::ValidationError(format!(
            "period must be between {} and {} days",
            MIN_PERIOD_DAYS, MAX_PERIOD_DAYS
        )));
    }
    Ok(days)
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (read as UTC) or a bare
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, ServiceError> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| {
            ServiceError::ValidationError(format!("{} is not a valid ISO-8601 date", field))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn query(start: Option<&str>, end: Option<&str>, period: Option<&str>) -> ReportQuery {
        ReportQuery {
            report_type: None,
            start_date: start.map(String::from),
            end_date: end.map(String::from),
            period: period.map(String::from),
        }
    }

    #[test]
    fn omitted_dates_cover_default_period_ending_now() {
        let range = query(None, None, None).resolve_range(30, now()).unwrap();
        assert_eq!(range.end, now());
        assert_eq!(range.start, now() - Duration::days(30));
    }

    #[test]
    fn explicit_period_overrides_default() {
        let range = query(None, None, Some("7")).resolve_range(30, now()).unwrap();
        assert_eq!(range.start, now() - Duration::days(7));
    }

    #[test]
    fn start_only_runs_until_now() {
        let range = query(Some("2024-06-01"), None, None)
            .resolve_range(30, now())
            .unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(range.end, now());
    }

    #[test]
    fn end_only_looks_back_one_period() {
        let range = query(None, Some("2024-03-31T00:00:00Z"), Some("10"))
            .resolve_range(30, now())
            .unwrap();
        assert_eq!(range.end, Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap());
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 3, 21, 0, 0, 0).unwrap());
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let ts = parse_timestamp("startDate", "2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn blank_values_are_treated_as_absent() {
        let range = query(Some(""), Some("  "), Some("")).resolve_range(30, now()).unwrap();
        assert_eq!(range, DateRange::trailing(now(), 30));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = query(Some("2024-05-02"), Some("2024-05-01"), None)
            .resolve_range(30, now())
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        assert_matches!(
            query(Some("yesterday"), None, None).resolve_range(30, now()),
            Err(ServiceError::ValidationError(msg)) if msg.contains("startDate")
        );
        assert_matches!(
            query(None, None, Some("0")).resolve_range(30, now()),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            query(None, None, Some("366")).resolve_range(30, now()),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            query(None, None, Some("two")).resolve_range(30, now()),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = DateRange::trailing(now(), 1);
        assert!(range.contains(range.start));
        assert!(range.contains(range.end));
        assert!(!range.contains(range.end + Duration::seconds(1)));
    }
}
