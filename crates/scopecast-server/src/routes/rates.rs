use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::error::AppError;
use crate::state::{AppState, SessionSnapshot};

/// Raw form value. Strings go through the same parser as typed input; an
/// empty string clears the rate.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RateInput {
    Text(String),
    Number(f64),
}

impl RateInput {
    fn raw(&self) -> String {
        match self {
            RateInput::Text(s) => s.clone(),
            RateInput::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RateBody {
    pub rate: RateInput,
}

/// PUT /api/rates/{role}: set or clear one role's rate.
pub async fn put_rate(
    State(app): State<AppState>,
    Path(role): Path<String>,
    Json(body): Json<RateBody>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let mut session = app.session.lock().await;
    session.edit_rate(&role, &body.rate.raw())?;
    let snapshot = app.snapshot(&session);
    app.publish(&snapshot);
    Ok(Json(snapshot))
}

/// DELETE /api/rates/{role}: drop the override; tasks fall back to their
/// generated rate.
pub async fn delete_rate(
    State(app): State<AppState>,
    Path(role): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let mut session = app.session.lock().await;
    session.revert_rate(&role)?;
    let snapshot = app.snapshot(&session);
    app.publish(&snapshot);
    Ok(Json(snapshot))
}
