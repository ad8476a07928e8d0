use axum::extract::State;
use axum::Json;

use crate::state::{AppState, SessionSnapshot};

/// GET /api/session: current status plus the derived report, if any.
pub async fn get_session(State(app): State<AppState>) -> Json<SessionSnapshot> {
    let session = app.session.lock().await;
    Json(app.snapshot(&session))
}

/// POST /api/reset: back to input. An in-flight analysis is discarded
/// when it lands.
pub async fn reset(State(app): State<AppState>) -> Json<SessionSnapshot> {
    let mut session = app.session.lock().await;
    session.reset();
    let snapshot = app.snapshot(&session);
    app.publish(&snapshot);
    Json(snapshot)
}

/// POST /api/session/dismiss: leave the error state, restoring the last
/// result if there was one.
pub async fn dismiss_error(State(app): State<AppState>) -> Json<SessionSnapshot> {
    let mut session = app.session.lock().await;
    let before = session.revision();
    session.dismiss_error();
    let snapshot = app.snapshot(&session);
    if snapshot.revision != before {
        app.publish(&snapshot);
    }
    Json(snapshot)
}
