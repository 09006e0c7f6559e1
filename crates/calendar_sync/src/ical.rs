use chrono::NaiveDate;
use tracing::debug;

use crate::{CalendarError, DateRange};

/// Trait for turning a calendar document into busy periods
pub trait ICalParser: Send + Sync {
    /// Busy periods of every event in `raw`, in document order
    fn parse(&self, raw: &str) -> Result<Vec<DateRange>, CalendarError>;
}

/// Line based iCal (RFC 5545) reader that only looks at `VEVENT` dates.
///
/// Both `DATE` and `DATE-TIME` values are accepted; the time of day is
/// dropped. An event without `DTEND` covers its start day, as does a timed
/// event that starts and ends on the same day. Cancelled events, events ending
/// before they start and events with unreadable dates are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineICalParser;

#[derive(Default)]
struct PendingEvent {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    cancelled: bool,
    malformed: bool,
}

impl PendingEvent {
    fn into_range(self) -> Option<DateRange> {
        if self.cancelled || self.malformed {
            return None;
        }
        let start = self.start?;
        let end = match self.end {
            Some(end) if end > start => end,
            Some(end) if end == start => start.succ_opt()?,
            Some(_) => return None,
            None => start.succ_opt()?,
        };
        Some(DateRange::new(start, end))
    }
}

impl ICalParser for LineICalParser {
    fn parse(&self, raw: &str) -> Result<Vec<DateRange>, CalendarError> {
        let lines = unfold(raw);

        if !lines
            .iter()
            .any(|line| line.trim().eq_ignore_ascii_case("BEGIN:VCALENDAR"))
        {
            return Err(CalendarError::Parse(
                "document has no VCALENDAR component".to_string(),
            ));
        }

        let mut ranges = Vec::new();
        let mut event: Option<PendingEvent> = None;

        for line in &lines {
            let Some((name, value)) = split_property(line) else {
                continue;
            };

            match name.as_str() {
                "BEGIN" if value.eq_ignore_ascii_case("VEVENT") => {
                    event = Some(PendingEvent::default());
                }
                "END" if value.eq_ignore_ascii_case("VEVENT") => {
                    let Some(pending) = event.take() else {
                        continue;
                    };
                    match pending.into_range() {
                        Some(range) => ranges.push(range),
                        None => debug!("Skipping unusable calendar event"),
                    }
                }
                property => {
                    let Some(pending) = event.as_mut() else {
                        continue;
                    };
                    match property {
                        "DTSTART" => match parse_ical_date(value) {
                            Some(date) => pending.start = Some(date),
                            None => pending.malformed = true,
                        },
                        "DTEND" => match parse_ical_date(value) {
                            Some(date) => pending.end = Some(date),
                            None => pending.malformed = true,
                        },
                        "STATUS" if value.eq_ignore_ascii_case("CANCELLED") => {
                            pending.cancelled = true;
                        }
                        _ => {}
                    }
                }
            }
        }

        Ok(ranges)
    }
}

/// Joins continuation lines (those starting with a space or tab) onto the
/// previous line
fn unfold(raw: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in raw.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match (line.strip_prefix([' ', '\t']), lines.last_mut()) {
            (Some(rest), Some(previous)) => previous.push_str(rest),
            _ => lines.push(line.to_string()),
        }
    }
    lines
}

/// Splits `NAME;PARAM=..:VALUE` into an upper-cased name and the value.
/// Colons inside quoted parameter values are not separators.
fn split_property(line: &str) -> Option<(String, &str)> {
    let mut quoted = false;
    let mut colon = None;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ':' if !quoted => {
                colon = Some(index);
                break;
            }
            _ => {}
        }
    }
    let colon = colon?;
    let head = &line[..colon];
    let name = head.split(';').next().unwrap_or(head).trim();
    Some((name.to_ascii_uppercase(), line[colon + 1..].trim()))
}

/// Reads the date part of a `DATE` (`20250701`) or `DATE-TIME`
/// (`20250701T150000Z`) value
fn parse_ical_date(value: &str) -> Option<NaiveDate> {
    let digits = value.get(..8)?;
    NaiveDate::parse_from_str(digits, "%Y%m%d").ok()
}
