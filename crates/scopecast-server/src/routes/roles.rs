use axum::extract::State;
use axum::Json;
use scopecast_core::roles::Roster;

use crate::state::AppState;

/// GET /api/roles: the roster estimates are generated against.
pub async fn list_roles(State(app): State<AppState>) -> Json<Roster> {
    Json(app.config.roles.clone())
}
