use crate::actions;
use crate::auth;
use crate::buckets::{
    bucket_attendance, status_of, tally_poll, vote_of, AttendanceBuckets, AttendanceCounts,
    PollTally,
};
use crate::errors::AppError;
use crate::models::{
    AppData, Attendance, AttendanceForm, AttendanceRequest, AttendanceStatus, Event, EventForm,
    HomeQuery, LoginForm, LoginQuery, Poll, PollVote, PollVoteForm, PollVoteRequest, Profile, Tab,
};
use crate::schedule::EventDraft;
use crate::state::AppState;
use crate::storage::persist_data;
use crate::ui::{self, EventCard, EventPage, HomePage, PollCard, PollPage};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct EventSummary {
    #[serde(flatten)]
    pub event: Event,
    pub counts: AttendanceCounts,
    pub my_status: Option<AttendanceStatus>,
}

#[derive(Debug, Serialize)]
pub struct EventDetailResponse {
    pub event: Event,
    pub buckets: AttendanceBuckets,
    pub my_status: Option<AttendanceStatus>,
    pub my_reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PollDetailResponse {
    pub poll: Poll,
    pub tally: PollTally,
    pub my_vote: Option<usize>,
}

pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HomeQuery>,
) -> Response {
    let data = state.data.lock().await;
    let Some(viewer) = auth::viewer(&data, &headers, Utc::now()) else {
        return Redirect::to("/login").into_response();
    };

    let tab = Tab::from_query(query.tab.as_deref());
    let events: Vec<EventCard> = match tab {
        Tab::Schedule => upcoming_events(&data, today())
            .into_iter()
            .map(|event| EventCard {
                event,
                counts: bucket_attendance(event.id, &data.attendance, &data.profiles).counts(),
                mine: status_of(&data.attendance, event.id, viewer.id),
            })
            .collect(),
        _ => Vec::new(),
    };
    let polls: Vec<PollCard> = match tab {
        Tab::Polls => newest_polls(&data)
            .into_iter()
            .map(|poll| poll_card(&data, poll, &viewer))
            .collect(),
        _ => Vec::new(),
    };
    let team = match tab {
        Tab::Team => team_by_name(&data),
        _ => Vec::new(),
    };

    Html(ui::render_home(&HomePage {
        app_name: &state.config.app_name,
        viewer: &viewer,
        tab,
        events,
        polls,
        team,
    }))
    .into_response()
}

pub async fn event_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let data = state.data.lock().await;
    let Some(viewer) = auth::viewer(&data, &headers, Utc::now()) else {
        return Ok(Redirect::to("/login").into_response());
    };
    let event = data
        .event(event_id)
        .ok_or_else(|| AppError::not_found("event not found"))?;

    Ok(Html(ui::render_event(&EventPage {
        app_name: &state.config.app_name,
        viewer: &viewer,
        event,
        buckets: bucket_attendance(event.id, &data.attendance, &data.profiles),
        mine: status_of(&data.attendance, event.id, viewer.id),
    }))
    .into_response())
}

pub async fn poll_detail(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(poll_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let data = state.data.lock().await;
    let Some(viewer) = auth::viewer(&data, &headers, Utc::now()) else {
        return Ok(Redirect::to("/login").into_response());
    };
    let poll = data
        .poll(poll_id)
        .ok_or_else(|| AppError::not_found("poll not found"))?;

    Ok(Html(ui::render_poll(&PollPage {
        app_name: &state.config.app_name,
        viewer: &viewer,
        card: poll_card(&data, poll, &viewer),
    }))
    .into_response())
}

pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Html<String> {
    Html(ui::render_login(
        &state.config.app_name,
        query.message.as_deref(),
    ))
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let now = Utc::now();
    let mut data = state.data.lock().await;

    let result = if form.action == "signup" {
        auth::sign_up(
            &mut data,
            &state.config,
            &form.full_name,
            &form.email,
            &form.password,
            now,
        )
        .and_then(|profile| {
            info!("signed up {} as {:?}", profile.full_name, profile.role);
            auth::sign_in(&mut data, &state.config, &form.email, &form.password, now)
        })
    } else {
        auth::sign_in(&mut data, &state.config, &form.email, &form.password, now)
    };

    let session = match result {
        Ok(session) => session,
        Err(err) => {
            warn!("login rejected for {}: {}", form.email.trim(), err.message);
            let page = ui::render_login(&state.config.app_name, Some(&err.message));
            return (err.status, Html(page)).into_response();
        }
    };

    if let Err(err) = persist_data(&state.data_path, &data).await {
        return err.into_response();
    }
    info!("signed in user {}", session.user_id);

    let cookie = auth::session_cookie(&session, &state.config);
    ([(header::SET_COOKIE, cookie.to_string())], Redirect::to("/")).into_response()
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = auth::session_token(&headers) {
        let mut data = state.data.lock().await;
        auth::sign_out(&mut data, &token);
        persist_data(&state.data_path, &data).await?;
    }

    let cookie = auth::cleared_cookie();
    Ok(([(header::SET_COOKIE, cookie.to_string())], Redirect::to("/login")).into_response())
}

pub async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<EventForm>,
) -> Result<Redirect, AppError> {
    let mut data = state.data.lock().await;
    let viewer = require_viewer(&data, &headers)?;
    let draft = EventDraft::from_form(&form)?;

    let created = actions::create_events(&mut data, &viewer, draft, Utc::now())?;
    persist_data(&state.data_path, &data).await?;

    info!("{} created {} event(s) '{}'", viewer.full_name, created.len(), form.title.trim());
    Ok(Redirect::to("/?tab=schedule"))
}

pub async fn create_poll(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Redirect, AppError> {
    let question = fields
        .iter()
        .find(|(key, _)| key == "question")
        .map(|(_, value)| value.as_str())
        .unwrap_or_default();
    let options: Vec<String> = fields
        .iter()
        .filter(|(key, _)| key == "option")
        .map(|(_, value)| value.clone())
        .collect();

    let mut data = state.data.lock().await;
    let viewer = require_viewer(&data, &headers)?;
    let poll = actions::create_poll(&mut data, &viewer, question, &options, Utc::now())?;
    persist_data(&state.data_path, &data).await?;

    info!("{} created poll {}", viewer.full_name, poll.id);
    Ok(Redirect::to("/?tab=polls"))
}

pub async fn delete_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    let mut data = state.data.lock().await;
    let viewer = require_viewer(&data, &headers)?;
    let event = actions::delete_event(&mut data, &viewer, event_id)?;
    persist_data(&state.data_path, &data).await?;

    info!("{} deleted event '{}' ({})", viewer.full_name, event.title, event.id);
    Ok(Redirect::to("/?tab=schedule"))
}

pub async fn delete_poll(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(poll_id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    let mut data = state.data.lock().await;
    let viewer = require_viewer(&data, &headers)?;
    let poll = actions::delete_poll(&mut data, &viewer, poll_id)?;
    persist_data(&state.data_path, &data).await?;

    info!("{} deleted poll {}", viewer.full_name, poll.id);
    Ok(Redirect::to("/?tab=polls"))
}

pub async fn attendance_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<Uuid>,
    Form(form): Form<AttendanceForm>,
) -> Result<Redirect, AppError> {
    let status = AttendanceStatus::parse(&form.status)?;
    apply_attendance(&state, &headers, event_id, status, form.reason.as_deref()).await?;
    Ok(Redirect::to(&local_return(form.return_to.as_deref(), &format!("/events/{event_id}"))))
}

pub async fn attendance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<AttendanceRequest>,
) -> Result<Json<Attendance>, AppError> {
    let row = apply_attendance(
        &state,
        &headers,
        payload.event_id,
        payload.status,
        payload.reason.as_deref(),
    )
    .await?;
    Ok(Json(row))
}

pub async fn poll_vote_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(poll_id): Path<Uuid>,
    Form(form): Form<PollVoteForm>,
) -> Result<Redirect, AppError> {
    apply_poll_vote(&state, &headers, poll_id, form.option_index).await?;
    Ok(Redirect::to(&local_return(form.return_to.as_deref(), &format!("/polls/{poll_id}"))))
}

pub async fn poll_vote(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(poll_id): Path<Uuid>,
    Json(payload): Json<PollVoteRequest>,
) -> Result<Json<PollVote>, AppError> {
    let vote = apply_poll_vote(&state, &headers, poll_id, payload.option_index).await?;
    Ok(Json(vote))
}

pub async fn get_events(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<EventSummary>>, AppError> {
    let data = state.data.lock().await;
    let viewer = require_viewer(&data, &headers)?;

    let summaries = upcoming_events(&data, today())
        .into_iter()
        .map(|event| EventSummary {
            event: event.clone(),
            counts: bucket_attendance(event.id, &data.attendance, &data.profiles).counts(),
            my_status: status_of(&data.attendance, event.id, viewer.id).and_then(|row| row.status),
        })
        .collect();
    Ok(Json(summaries))
}

pub async fn get_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventDetailResponse>, AppError> {
    let data = state.data.lock().await;
    let viewer = require_viewer(&data, &headers)?;
    let event = data
        .event(event_id)
        .ok_or_else(|| AppError::not_found("event not found"))?;
    let mine = status_of(&data.attendance, event_id, viewer.id);

    Ok(Json(EventDetailResponse {
        event: event.clone(),
        buckets: bucket_attendance(event_id, &data.attendance, &data.profiles),
        my_status: mine.and_then(|row| row.status),
        my_reason: mine.and_then(|row| row.reason.clone()),
    }))
}

pub async fn get_poll(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(poll_id): Path<Uuid>,
) -> Result<Json<PollDetailResponse>, AppError> {
    let data = state.data.lock().await;
    let viewer = require_viewer(&data, &headers)?;
    let poll = data
        .poll(poll_id)
        .ok_or_else(|| AppError::not_found("poll not found"))?;

    Ok(Json(PollDetailResponse {
        poll: poll.clone(),
        tally: tally_poll(poll, &data.poll_votes, &data.profiles),
        my_vote: vote_of(&data.poll_votes, poll_id, viewer.id),
    }))
}

pub async fn manifest(State(state): State<AppState>) -> impl IntoResponse {
    let name = &state.config.app_name;
    (
        [(header::CONTENT_TYPE, "application/manifest+json")],
        Json(json!({
            "name": name,
            "short_name": name,
            "description": format!("{name} team schedule"),
            "start_url": "/",
            "display": "standalone",
            "background_color": "#ffffff",
            "theme_color": "#000000",
        })),
    )
}

async fn apply_attendance(
    state: &AppState,
    headers: &HeaderMap,
    event_id: Uuid,
    status: Option<AttendanceStatus>,
    reason: Option<&str>,
) -> Result<Attendance, AppError> {
    let mut data = state.data.lock().await;
    let viewer = require_viewer(&data, headers)?;
    let row = actions::record_attendance(&mut data, &viewer, event_id, status, reason, Utc::now())?;
    persist_data(&state.data_path, &data).await?;
    Ok(row)
}

async fn apply_poll_vote(
    state: &AppState,
    headers: &HeaderMap,
    poll_id: Uuid,
    option_index: usize,
) -> Result<PollVote, AppError> {
    let mut data = state.data.lock().await;
    let viewer = require_viewer(&data, headers)?;
    let vote = actions::cast_poll_vote(&mut data, &viewer, poll_id, option_index, Utc::now())?;
    persist_data(&state.data_path, &data).await?;
    Ok(vote)
}

fn require_viewer(data: &AppData, headers: &HeaderMap) -> Result<Profile, AppError> {
    auth::viewer(data, headers, Utc::now())
        .ok_or_else(|| AppError::unauthorized("sign in first"))
}

fn poll_card<'a>(data: &AppData, poll: &'a Poll, viewer: &Profile) -> PollCard<'a> {
    PollCard {
        poll,
        tally: tally_poll(poll, &data.poll_votes, &data.profiles),
        my_vote: vote_of(&data.poll_votes, poll.id, viewer.id),
    }
}

/// Events from `today` onwards, soonest first.
fn upcoming_events(data: &AppData, today: NaiveDate) -> Vec<&Event> {
    let mut events: Vec<&Event> = data
        .events
        .iter()
        .filter(|event| event.start_time.date() >= today)
        .collect();
    events.sort_by_key(|event| event.start_time);
    events
}

fn newest_polls(data: &AppData) -> Vec<&Poll> {
    let mut polls: Vec<&Poll> = data.polls.iter().collect();
    polls.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    polls
}

fn team_by_name(data: &AppData) -> Vec<&Profile> {
    let mut team: Vec<&Profile> = data.profiles.iter().collect();
    team.sort_by_cached_key(|profile| profile.full_name.to_lowercase());
    team
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Only same-site paths are accepted as redirect targets.
fn local_return(candidate: Option<&str>, fallback: &str) -> String {
    match candidate {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventType, Role};
    use chrono::{Duration, NaiveDateTime};

    fn profile(name: &str, role: Role) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    fn event(title: &str, start_time: NaiveDateTime) -> Event {
        Event {
            id: Uuid::new_v4(),
            title: title.to_string(),
            event_type: EventType::Training,
            start_time,
            location: String::new(),
            reason_required_out: false,
            reason_required_maybe: false,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    fn poll(question: &str, age_minutes: i64) -> Poll {
        Poll {
            id: Uuid::new_v4(),
            question: question.to_string(),
            options: vec!["Yes".to_string(), "No".to_string()],
            created_by: Uuid::new_v4(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    fn at(day: NaiveDate, hour: u32) -> NaiveDateTime {
        day.and_hms_opt(hour, 0, 0).unwrap()
    }

    #[test]
    fn upcoming_skips_past_days_and_sorts_ascending() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut data = AppData::default();
        data.events.extend([
            event("next week", at(today + Duration::days(7), 19)),
            event("yesterday", at(today - Duration::days(1), 19)),
            event("this morning", at(today, 8)),
            event("tomorrow", at(today + Duration::days(1), 19)),
        ]);

        let titles: Vec<&str> = upcoming_events(&data, today)
            .into_iter()
            .map(|event| event.title.as_str())
            .collect();
        assert_eq!(titles, vec!["this morning", "tomorrow", "next week"]);
    }

    #[test]
    fn polls_are_listed_newest_first() {
        let mut data = AppData::default();
        data.polls.extend([poll("oldest", 60), poll("newest", 1), poll("middle", 30)]);

        let questions: Vec<&str> = newest_polls(&data)
            .into_iter()
            .map(|poll| poll.question.as_str())
            .collect();
        assert_eq!(questions, vec!["newest", "middle", "oldest"]);
    }

    #[test]
    fn team_is_sorted_by_name_ignoring_case() {
        let mut data = AppData::default();
        data.profiles.extend([
            profile("daan", Role::Member),
            profile("Coach Bea", Role::Coach),
            profile("anna", Role::Member),
        ]);

        let names: Vec<&str> = team_by_name(&data)
            .into_iter()
            .map(|profile| profile.full_name.as_str())
            .collect();
        assert_eq!(names, vec!["anna", "Coach Bea", "daan"]);
    }

    #[test]
    fn return_paths_must_stay_local() {
        assert_eq!(local_return(Some("/?tab=polls"), "/"), "/?tab=polls");
        assert_eq!(local_return(Some("//evil.example"), "/"), "/");
        assert_eq!(local_return(Some("https://evil.example"), "/x"), "/x");
        assert_eq!(local_return(None, "/events/1"), "/events/1");
    }
}
