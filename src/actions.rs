use crate::errors::AppError;
use crate::models::{AppData, Attendance, AttendanceStatus, Event, Poll, PollVote, Profile};
use crate::schedule::EventDraft;
use chrono::{DateTime, Utc};
use uuid::Uuid;

fn require_coach(viewer: &Profile) -> Result<(), AppError> {
    if viewer.is_coach() {
        Ok(())
    } else {
        Err(AppError::forbidden("only coaches can do this"))
    }
}

/// Upserts the viewer's attendance for an event.
pub fn record_attendance(
    data: &mut AppData,
    viewer: &Profile,
    event_id: Uuid,
    status: Option<AttendanceStatus>,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Attendance, AppError> {
    let event = data
        .event(event_id)
        .ok_or_else(|| AppError::not_found("event not found"))?;

    let reason = reason
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .map(str::to_string);
    let reason_required = match status {
        Some(AttendanceStatus::Out) => event.reason_required_out,
        Some(AttendanceStatus::Maybe) => event.reason_required_maybe,
        _ => false,
    };
    if reason_required && reason.is_none() {
        return Err(AppError::bad_request(format!(
            "a reason is required when voting '{}' for this event",
            status.map(AttendanceStatus::as_str).unwrap_or_default()
        )));
    }

    let row = Attendance {
        event_id,
        user_id: viewer.id,
        status,
        reason: if status.is_some() { reason } else { None },
        updated_at: now,
    };
    match data
        .attendance
        .iter_mut()
        .find(|existing| existing.event_id == event_id && existing.user_id == viewer.id)
    {
        Some(existing) => *existing = row.clone(),
        None => data.attendance.push(row.clone()),
    }

    Ok(row)
}

/// Upserts the viewer's vote for a poll.
pub fn cast_poll_vote(
    data: &mut AppData,
    viewer: &Profile,
    poll_id: Uuid,
    option_index: usize,
    now: DateTime<Utc>,
) -> Result<PollVote, AppError> {
    let poll = data
        .poll(poll_id)
        .ok_or_else(|| AppError::not_found("poll not found"))?;
    if option_index >= poll.options.len() {
        return Err(AppError::bad_request(format!(
            "option {option_index} does not exist on this poll"
        )));
    }

    let vote = PollVote {
        poll_id,
        user_id: viewer.id,
        option_index,
        updated_at: now,
    };
    match data
        .poll_votes
        .iter_mut()
        .find(|existing| existing.poll_id == poll_id && existing.user_id == viewer.id)
    {
        Some(existing) => *existing = vote.clone(),
        None => data.poll_votes.push(vote.clone()),
    }

    Ok(vote)
}

pub fn create_events(
    data: &mut AppData,
    viewer: &Profile,
    draft: EventDraft,
    now: DateTime<Utc>,
) -> Result<Vec<Event>, AppError> {
    require_coach(viewer)?;
    let events = draft.into_events(viewer.id, now)?;
    data.events.extend(events.iter().cloned());
    Ok(events)
}

pub fn create_poll(
    data: &mut AppData,
    viewer: &Profile,
    question: &str,
    options: &[String],
    now: DateTime<Utc>,
) -> Result<Poll, AppError> {
    require_coach(viewer)?;

    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::bad_request("question is required"));
    }
    let options: Vec<String> = options
        .iter()
        .map(|option| option.trim())
        .filter(|option| !option.is_empty())
        .map(str::to_string)
        .collect();
    if options.len() < 2 {
        return Err(AppError::bad_request("a poll needs at least two options"));
    }

    let poll = Poll {
        id: Uuid::new_v4(),
        question: question.to_string(),
        options,
        created_by: viewer.id,
        created_at: now,
    };
    data.polls.push(poll.clone());
    Ok(poll)
}

pub fn delete_event(
    data: &mut AppData,
    viewer: &Profile,
    event_id: Uuid,
) -> Result<Event, AppError> {
    require_coach(viewer)?;
    let position = data
        .events
        .iter()
        .position(|event| event.id == event_id)
        .ok_or_else(|| AppError::not_found("event not found"))?;
    let event = data.events.remove(position);
    data.attendance.retain(|row| row.event_id != event_id);
    Ok(event)
}

pub fn delete_poll(data: &mut AppData, viewer: &Profile, poll_id: Uuid) -> Result<Poll, AppError> {
    require_coach(viewer)?;
    let position = data
        .polls
        .iter()
        .position(|poll| poll.id == poll_id)
        .ok_or_else(|| AppError::not_found("poll not found"))?;
    let poll = data.polls.remove(position);
    data.poll_votes.retain(|vote| vote.poll_id != poll_id);
    Ok(poll)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus as Status, EventType, Role};
    use axum::http::StatusCode;
    use chrono::NaiveDate;

    fn person(name: &str, role: Role) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    fn draft(repeat_until: Option<NaiveDate>) -> EventDraft {
        EventDraft {
            title: "Training".to_string(),
            event_type: EventType::Training,
            location: "Sportpark".to_string(),
            start_time: NaiveDate::from_ymd_opt(2026, 9, 1)
                .unwrap()
                .and_hms_opt(19, 30, 0)
                .unwrap(),
            repeat_until,
            reason_required_out: true,
            reason_required_maybe: false,
        }
    }

    fn mark(
        data: &mut AppData,
        viewer: &Profile,
        event_id: Uuid,
        status: Option<AttendanceStatus>,
        reason: Option<&str>,
    ) -> Result<Attendance, AppError> {
        record_attendance(data, viewer, event_id, status, reason, Utc::now())
    }

    fn setup() -> (AppData, Profile, Profile, Event) {
        let mut data = AppData::default();
        let coach = person("Coach", Role::Coach);
        let player = person("Player", Role::Member);
        data.profiles.extend([coach.clone(), player.clone()]);
        let event = create_events(&mut data, &coach, draft(None), Utc::now())
            .unwrap()
            .remove(0);
        (data, coach, player, event)
    }

    #[test]
    fn members_cannot_create_or_delete() {
        let (mut data, _coach, player, event) = setup();
        let err = create_events(&mut data, &player, draft(None), Utc::now()).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        let options = vec!["a".to_string(), "b".to_string()];
        assert!(create_poll(&mut data, &player, "Q?", &options, Utc::now()).is_err());
        assert!(delete_event(&mut data, &player, event.id).is_err());
        assert_eq!(data.events.len(), 1);
    }

    #[test]
    fn attendance_upsert_keeps_one_row_per_user() {
        let (mut data, _coach, player, event) = setup();
        mark(&mut data, &player, event.id, Some(Status::In), None).unwrap();
        mark(&mut data, &player, event.id, Some(Status::Maybe), None).unwrap();

        assert_eq!(data.attendance.len(), 1);
        assert_eq!(data.attendance[0].status, Some(Status::Maybe));
    }

    #[test]
    fn reason_is_enforced_when_the_event_requires_it() {
        let (mut data, _coach, player, event) = setup();
        let err = mark(&mut data, &player, event.id, Some(Status::Out), Some("   ")).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(data.attendance.is_empty());

        let row = mark(&mut data, &player, event.id, Some(Status::Out), Some(" sick ")).unwrap();
        assert_eq!(row.reason.as_deref(), Some("sick"));

        // maybe has no requirement on this event
        mark(&mut data, &player, event.id, Some(Status::Maybe), None).unwrap();
    }

    #[test]
    fn clearing_a_vote_drops_the_reason() {
        let (mut data, _coach, player, event) = setup();
        mark(&mut data, &player, event.id, Some(Status::Out), Some("away")).unwrap();
        let row = mark(&mut data, &player, event.id, None, Some("away")).unwrap();
        assert_eq!(row.status, None);
        assert_eq!(row.reason, None);
    }

    #[test]
    fn attendance_for_unknown_event_is_not_found() {
        let (mut data, _coach, player, _event) = setup();
        let err = mark(&mut data, &player, Uuid::new_v4(), Some(Status::In), None).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn poll_creation_drops_blank_options() {
        let (mut data, coach, _player, _event) = setup();
        let options = vec!["Friday".to_string(), "  ".to_string(), " Saturday ".to_string()];
        let poll = create_poll(&mut data, &coach, " Dinner? ", &options, Utc::now()).unwrap();
        assert_eq!(poll.question, "Dinner?");
        assert_eq!(poll.options, vec!["Friday", "Saturday"]);

        let too_few = vec!["Friday".to_string(), "".to_string()];
        assert!(create_poll(&mut data, &coach, "Dinner?", &too_few, Utc::now()).is_err());
    }

    #[test]
    fn poll_vote_upserts_and_checks_range() {
        let (mut data, coach, player, _event) = setup();
        let options = vec!["Yes".to_string(), "No".to_string()];
        let poll = create_poll(&mut data, &coach, "Beer?", &options, Utc::now()).unwrap();

        cast_poll_vote(&mut data, &player, poll.id, 0, Utc::now()).unwrap();
        cast_poll_vote(&mut data, &player, poll.id, 1, Utc::now()).unwrap();
        assert_eq!(data.poll_votes.len(), 1);
        assert_eq!(data.poll_votes[0].option_index, 1);

        assert!(cast_poll_vote(&mut data, &player, poll.id, 2, Utc::now()).is_err());
    }

    #[test]
    fn deletes_cascade_to_votes() {
        let (mut data, coach, player, event) = setup();
        mark(&mut data, &player, event.id, Some(Status::In), None).unwrap();
        let options = vec!["Yes".to_string(), "No".to_string()];
        let poll = create_poll(&mut data, &coach, "Beer?", &options, Utc::now()).unwrap();
        cast_poll_vote(&mut data, &player, poll.id, 0, Utc::now()).unwrap();

        delete_event(&mut data, &coach, event.id).unwrap();
        delete_poll(&mut data, &coach, poll.id).unwrap();

        assert!(data.events.is_empty());
        assert!(data.attendance.is_empty());
        assert!(data.polls.is_empty());
        assert!(data.poll_votes.is_empty());
        assert_eq!(
            delete_poll(&mut data, &coach, poll.id).unwrap_err().status,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn recurring_creation_inserts_every_week() {
        let (mut data, coach, _player, _event) = setup();
        let until = NaiveDate::from_ymd_opt(2026, 9, 29);
        let created = create_events(&mut data, &coach, draft(until), Utc::now()).unwrap();
        assert_eq!(created.len(), 5);
        assert_eq!(data.events.len(), 6);
    }
}
