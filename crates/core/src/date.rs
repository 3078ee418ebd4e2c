use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};

/// Abbreviated pt-BR month names, January first
pub const MONTHS_PT_BR: [&str; 12] = [
    "Jan", "Fev", "Mar", "Abr", "Mai", "Jun", "Jul", "Ago", "Set", "Out", "Nov", "Dez",
];

/// Format an ISO-8601 timestamp for display in Brazilian Portuguese.
///
/// Produces `dd MMM yyyy`, or `dd MMM yyyy às HH:mm` when `with_time` is set.
/// Times are rendered in UTC so builds are reproducible regardless of the
/// machine's timezone.
///
/// ```text
/// format_date("2021-03-25T19:27:35+0000", false) → "25 Mar 2021"
/// format_date("2021-03-25T19:27:35+0000", true)  → "25 Mar 2021 às 19:27"
/// ```
pub fn format_date(date: &str, with_time: bool) -> Result<String> {
    let parsed = parse_timestamp(date)?.with_timezone(&Utc);

    let day_month_year = format!(
        "{:02} {} {}",
        parsed.day(),
        MONTHS_PT_BR[parsed.month0() as usize],
        parsed.year()
    );

    if with_time {
        Ok(format!(
            "{} às {:02}:{:02}",
            day_month_year,
            parsed.hour(),
            parsed.minute()
        ))
    } else {
        Ok(day_month_year)
    }
}

/// Parse the timestamp shapes the CMS emits.
///
/// Accepts RFC 3339 (`+00:00` offsets) as well as the compact `+0000`
/// offset form, with or without fractional seconds.
fn parse_timestamp(date: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = date.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed);
    }

    for format in ["%Y-%m-%dT%H:%M:%S%z", "%Y-%m-%dT%H:%M:%S%.f%z"] {
        if let Ok(parsed) = DateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }

    Err(Error::InvalidDate(date.to_string()))
}
