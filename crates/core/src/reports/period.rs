//! Report period parsing.
//!
//! Dates arrive as `YYYY-MM-DD` in the shop's local offset and are converted
//! to UTC. End dates cover the whole local day.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeDelta, TimeZone, Utc};

use super::error::PeriodError;

/// A reporting window resolved to UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPeriod {
    /// First instant of the start day.
    pub start_date: DateTime<Utc>,
    /// Last second of the end day.
    pub end_date: DateTime<Utc>,
}

impl ReportPeriod {
    /// Parses a `startdate`/`enddate` pair in the given timezone.
    pub fn parse(
        start_date: Option<&str>,
        end_date: Option<&str>,
        timezone: Option<&str>,
    ) -> Result<Self, PeriodError> {
        let offset = parse_offset(timezone.unwrap_or_default())?;
        Ok(Self {
            start_date: parse_start_date("startdate", start_date, offset)?,
            end_date: parse_end_date("enddate", end_date, offset)?,
        })
    }
}

/// Parses an offset like `+07`, `-05`, `+0530` or `+05:30`.
///
/// Empty means UTC. A bare `07` is read as `+07` since `+` decodes to a space
/// in query strings.
pub fn parse_offset(raw: &str) -> Result<FixedOffset, PeriodError> {
    let invalid = || PeriodError::InvalidTimezone(raw.to_string());
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Utc.fix());
    }

    let (sign, digits) = match trimmed.as_bytes()[0] {
        b'+' => (1, &trimmed[1..]),
        b'-' => (-1, &trimmed[1..]),
        b'0'..=b'9' => (1, trimmed),
        _ => return Err(invalid()),
    };
    let digits = digits.replace(':', "");
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let (hours, minutes) = match digits.len() {
        2 => (&digits[..2], "00"),
        4 => (&digits[..2], &digits[2..]),
        _ => return Err(invalid()),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

fn parse_local_midnight(
    field: &'static str,
    value: Option<&str>,
    offset: FixedOffset,
) -> Result<DateTime<Utc>, PeriodError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(PeriodError::Missing(field));
    }

    let invalid = || PeriodError::InvalidDate {
        field,
        value: value.to_string(),
    };

    let midnight = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| invalid())?
        .and_hms_opt(0, 0, 0)
        .ok_or_else(invalid)?;

    offset
        .from_local_datetime(&midnight)
        .single()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(invalid)
}

/// Start of the given local day, in UTC.
pub fn parse_start_date(
    field: &'static str,
    value: Option<&str>,
    offset: FixedOffset,
) -> Result<DateTime<Utc>, PeriodError> {
    parse_local_midnight(field, value, offset)
}

/// Last second of the given local day, in UTC.
pub fn parse_end_date(
    field: &'static str,
    value: Option<&str>,
    offset: FixedOffset,
) -> Result<DateTime<Utc>, PeriodError> {
    let midnight = parse_local_midnight(field, value, offset)?;
    midnight
        .checked_add_signed(TimeDelta::days(1))
        .and_then(|next_day| next_day.checked_sub_signed(TimeDelta::seconds(1)))
        .ok_or_else(|| PeriodError::InvalidDate {
            field,
            value: value.map(str::trim).unwrap_or_default().to_string(),
        })
}
