use crate::errors::AppError;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Coach,
    #[default]
    Member,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    pub fn is_coach(&self) -> bool {
        self.role == Role::Coach
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub user_id: Uuid,
    pub email: String,
    pub password_salt: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Training,
    Game,
    Social,
}

impl EventType {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim() {
            "training" => Ok(Self::Training),
            "game" => Ok(Self::Game),
            "social" => Ok(Self::Social),
            other => Err(AppError::bad_request(format!(
                "unknown event type '{other}'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Training => "training",
            Self::Game => "game",
            Self::Social => "social",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub event_type: EventType,
    pub start_time: NaiveDateTime,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub reason_required_out: bool,
    #[serde(default)]
    pub reason_required_maybe: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    In,
    Out,
    Maybe,
}

impl AttendanceStatus {
    /// Parses a form value; `none` and the empty string clear the vote.
    pub fn parse(value: &str) -> Result<Option<Self>, AppError> {
        match value.trim() {
            "in" => Ok(Some(Self::In)),
            "out" => Ok(Some(Self::Out)),
            "maybe" => Ok(Some(Self::Maybe)),
            "none" | "" => Ok(None),
            other => Err(AppError::bad_request(format!(
                "status must be 'in', 'out', 'maybe' or 'none', got '{other}'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::Maybe => "maybe",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attendance {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: Option<AttendanceStatus>,
    #[serde(default)]
    pub reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Poll {
    pub id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollVote {
    pub poll_id: Uuid,
    pub user_id: Uuid,
    pub option_index: usize,
    pub updated_at: DateTime<Utc>,
}

/// Everything the service persists, one vector per table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppData {
    pub profiles: Vec<Profile>,
    pub accounts: Vec<Account>,
    pub sessions: Vec<Session>,
    pub events: Vec<Event>,
    pub attendance: Vec<Attendance>,
    pub polls: Vec<Poll>,
    pub poll_votes: Vec<PollVote>,
}

impl AppData {
    pub fn profile(&self, id: Uuid) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.id == id)
    }

    pub fn event(&self, id: Uuid) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn poll(&self, id: Uuid) -> Option<&Poll> {
        self.polls.iter().find(|poll| poll.id == id)
    }
}

/// Home page tab, selected through the `tab` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Schedule,
    Polls,
    Team,
}

impl Tab {
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("polls") => Self::Polls,
            Some("team") => Self::Team,
            _ => Self::Schedule,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Polls => "polls",
            Self::Team => "team",
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct HomeQuery {
    pub tab: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoginQuery {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct EventForm {
    pub title: String,
    pub event_type: String,
    #[serde(default)]
    pub location: String,
    pub date: String,
    pub repeat_weekly: Option<String>,
    pub repeat_until: Option<String>,
    pub req_out: Option<String>,
    pub req_maybe: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceForm {
    pub status: String,
    pub reason: Option<String>,
    pub return_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PollVoteForm {
    pub option_index: usize,
    pub return_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceRequest {
    pub event_id: Uuid,
    #[serde(default)]
    pub status: Option<AttendanceStatus>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PollVoteRequest {
    pub option_index: usize,
}
