use crate::errors::AppError;
use crate::models::{Event, EventForm, EventType};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

/// Two seasons of weekly sessions.
pub const MAX_OCCURRENCES: usize = 104;

/// Validated input for one or more event rows.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub event_type: EventType,
    pub location: String,
    pub start_time: NaiveDateTime,
    pub repeat_until: Option<NaiveDate>,
    pub reason_required_out: bool,
    pub reason_required_maybe: bool,
}

impl EventDraft {
    pub fn from_form(form: &EventForm) -> Result<Self, AppError> {
        let title = form.title.trim();
        if title.is_empty() {
            return Err(AppError::bad_request("title is required"));
        }

        let repeat_until = if checkbox(&form.repeat_weekly) {
            let raw = form.repeat_until.as_deref().map(str::trim).unwrap_or_default();
            if raw.is_empty() {
                return Err(AppError::bad_request(
                    "pick an end date for the recurring event",
                ));
            }
            Some(parse_date(raw)?)
        } else {
            None
        };

        Ok(Self {
            title: title.to_string(),
            event_type: EventType::parse(&form.event_type)?,
            location: form.location.trim().to_string(),
            start_time: parse_start_time(&form.date)?,
            repeat_until,
            reason_required_out: checkbox(&form.req_out),
            reason_required_maybe: checkbox(&form.req_maybe),
        })
    }

    pub fn into_events(self, created_by: Uuid, now: DateTime<Utc>) -> Result<Vec<Event>, AppError> {
        let starts = match self.repeat_until {
            Some(until) => weekly_occurrences(self.start_time, until)?,
            None => vec![self.start_time],
        };

        Ok(starts
            .into_iter()
            .map(|start_time| Event {
                id: Uuid::new_v4(),
                title: self.title.clone(),
                event_type: self.event_type,
                start_time,
                location: self.location.clone(),
                reason_required_out: self.reason_required_out,
                reason_required_maybe: self.reason_required_maybe,
                created_by,
                created_at: now,
            })
            .collect())
    }
}

/// One start per week from `start` through the end of the `until` day.
pub fn weekly_occurrences(
    start: NaiveDateTime,
    until: NaiveDate,
) -> Result<Vec<NaiveDateTime>, AppError> {
    if until < start.date() {
        return Err(AppError::bad_request(
            "repeat-until date is before the start date",
        ));
    }

    let mut occurrences = Vec::new();
    let mut current = start;
    while current.date() <= until {
        if occurrences.len() == MAX_OCCURRENCES {
            return Err(AppError::bad_request(format!(
                "a recurring event can have at most {MAX_OCCURRENCES} occurrences"
            )));
        }
        occurrences.push(current);
        current = current
            .checked_add_signed(Duration::weeks(1))
            .ok_or_else(|| {
                AppError::bad_request("recurring event runs past the supported date range")
            })?;
    }

    Ok(occurrences)
}

/// Accepts `datetime-local` input with or without seconds.
pub fn parse_start_time(value: &str) -> Result<NaiveDateTime, AppError> {
    let value = value.trim();
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| AppError::bad_request(format!("invalid start time '{value}'")))
}

fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("invalid date '{value}'")))
}

fn checkbox(value: &Option<String>) -> bool {
    matches!(value.as_deref(), Some("on" | "true" | "1"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn form(repeat_until: Option<&str>) -> EventForm {
        EventForm {
            title: "  Training  ".to_string(),
            event_type: "training".to_string(),
            location: "Sportpark".to_string(),
            date: "2026-09-01T19:30".to_string(),
            repeat_weekly: repeat_until.map(|_| "on".to_string()),
            repeat_until: repeat_until.map(str::to_string),
            req_out: Some("on".to_string()),
            req_maybe: None,
        }
    }

    #[test]
    fn weekly_occurrences_include_the_final_day() {
        let start = at(2026, 9, 1, 19, 30);
        let until = NaiveDate::from_ymd_opt(2026, 9, 22).unwrap();
        let starts = weekly_occurrences(start, until).unwrap();
        assert_eq!(
            starts,
            vec![
                at(2026, 9, 1, 19, 30),
                at(2026, 9, 8, 19, 30),
                at(2026, 9, 15, 19, 30),
                at(2026, 9, 22, 19, 30),
            ]
        );
    }

    #[test]
    fn weekly_occurrences_stop_before_a_partial_week() {
        let start = at(2026, 9, 1, 19, 30);
        let until = NaiveDate::from_ymd_opt(2026, 9, 21).unwrap();
        assert_eq!(weekly_occurrences(start, until).unwrap().len(), 3);
    }

    #[test]
    fn same_day_end_yields_single_occurrence() {
        let start = at(2026, 9, 1, 19, 30);
        let until = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        assert_eq!(weekly_occurrences(start, until).unwrap(), vec![start]);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let start = at(2026, 9, 1, 19, 30);
        let until = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        assert!(weekly_occurrences(start, until).is_err());
    }

    #[test]
    fn series_at_the_end_of_the_calendar_is_rejected() {
        let start = (NaiveDate::MAX - Duration::days(3))
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let err = weekly_occurrences(start, NaiveDate::MAX).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn runaway_series_is_rejected() {
        let start = at(2026, 1, 1, 10, 0);
        let until = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert!(weekly_occurrences(start, until).is_err());
    }

    #[test]
    fn single_event_draft_from_form() {
        let draft = EventDraft::from_form(&form(None)).unwrap();
        assert_eq!(draft.title, "Training");
        assert_eq!(draft.start_time, at(2026, 9, 1, 19, 30));
        assert!(draft.reason_required_out);
        assert!(!draft.reason_required_maybe);

        let events = draft.into_events(Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn recurring_draft_expands_into_rows_with_shared_fields() {
        let creator = Uuid::new_v4();
        let events = EventDraft::from_form(&form(Some("2026-09-15")))
            .unwrap()
            .into_events(creator, Utc::now())
            .unwrap();
        assert_eq!(events.len(), 3);
        assert!(events
            .iter()
            .all(|event| event.created_by == creator && event.reason_required_out));
        assert_ne!(events[0].id, events[1].id);
    }

    #[test]
    fn recurring_draft_requires_end_date() {
        let mut input = form(Some(""));
        input.repeat_until = Some(String::new());
        assert!(EventDraft::from_form(&input).is_err());
    }

    #[test]
    fn start_time_accepts_seconds() {
        assert_eq!(
            parse_start_time("2026-09-01T19:30:00").unwrap(),
            at(2026, 9, 1, 19, 30)
        );
        assert!(parse_start_time("next tuesday").is_err());
    }
}
