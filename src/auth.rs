use crate::config::Config;
use crate::errors::AppError;
use crate::models::{Account, AppData, Profile, Role, Session};
use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use cookie::{Cookie, SameSite};
use sha2::{Digest, Sha256};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "tipin_session";
const MIN_PASSWORD_LEN: usize = 6;

pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn verify_password(account: &Account, password: &str) -> bool {
    hash_password(&account.password_salt, password) == account.password_hash
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn sign_up(
    data: &mut AppData,
    config: &Config,
    full_name: &str,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<Profile, AppError> {
    let email = normalize_email(email);
    let full_name = full_name.trim();

    if !email.contains('@') {
        return Err(AppError::bad_request("Unable to validate email address: invalid format"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "Password should be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if full_name.is_empty() {
        return Err(AppError::bad_request("Full name is required to sign up"));
    }
    if data.accounts.iter().any(|account| account.email == email) {
        return Err(AppError::conflict("User already registered"));
    }

    let role = if config.is_coach_email(&email) {
        Role::Coach
    } else {
        Role::Member
    };
    let profile = Profile {
        id: Uuid::new_v4(),
        full_name: full_name.to_string(),
        role,
        created_at: now,
    };
    let salt = Uuid::new_v4().simple().to_string();
    data.accounts.push(Account {
        user_id: profile.id,
        password_hash: hash_password(&salt, password),
        password_salt: salt,
        email,
    });
    data.profiles.push(profile.clone());

    Ok(profile)
}

pub fn sign_in(
    data: &mut AppData,
    config: &Config,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<Session, AppError> {
    let email = normalize_email(email);
    let user_id = data
        .accounts
        .iter()
        .find(|account| account.email == email)
        .filter(|account| verify_password(account, password))
        .map(|account| account.user_id)
        .ok_or_else(|| AppError::unauthorized("Invalid login credentials"))?;

    data.sessions.retain(|session| session.expires_at > now);
    let session = Session {
        token: format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple()),
        user_id,
        expires_at: now + Duration::hours(config.session_ttl_hours),
    };
    data.sessions.push(session.clone());

    Ok(session)
}

pub fn sign_out(data: &mut AppData, token: &str) {
    data.sessions.retain(|session| session.token != token);
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

/// Resolves the session cookie to the signed-in profile.
pub fn viewer(data: &AppData, headers: &HeaderMap, now: DateTime<Utc>) -> Option<Profile> {
    let token = session_token(headers)?;
    let session = data
        .sessions
        .iter()
        .find(|session| session.token == token && session.expires_at > now)?;
    data.profile(session.user_id).cloned()
}

pub fn session_cookie(session: &Session, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::hours(config.session_ttl_hours))
        .build()
}

pub fn cleared_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::ZERO)
        .build()
}
