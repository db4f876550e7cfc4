//! Session check shared by the admin routes.

use crate::server::AppState;
use crate::session::{SESSION_COOKIE, Session};
use axum_extra::extract::CookieJar;

/// Check the session cookie and return the session if authenticated.
pub fn check_auth(state: &AppState, jar: &CookieJar) -> Option<Session> {
    let token = jar.get(SESSION_COOKIE)?.value();
    state.gate.validate(token)
}
