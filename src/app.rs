use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/events", post(handlers::create_event))
        .route("/events/:id", get(handlers::event_detail))
        .route("/events/:id/attendance", post(handlers::attendance_form))
        .route("/events/:id/delete", post(handlers::delete_event))
        .route("/polls", post(handlers::create_poll))
        .route("/polls/:id", get(handlers::poll_detail))
        .route("/polls/:id/vote", post(handlers::poll_vote_form))
        .route("/polls/:id/delete", post(handlers::delete_poll))
        .route("/api/events", get(handlers::get_events))
        .route("/api/events/:id", get(handlers::get_event))
        .route("/api/attendance", post(handlers::attendance))
        .route("/api/polls/:id", get(handlers::get_poll))
        .route("/api/polls/:id/vote", post(handlers::poll_vote))
        .route("/manifest.webmanifest", get(handlers::manifest))
        .with_state(state)
}
