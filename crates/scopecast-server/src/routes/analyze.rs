use axum::extract::State;
use axum::Json;
use scopecast_core::request::AnalyzeRequest;
use scopecast_core::session::Completion;

use crate::error::AppError;
use crate::state::{AppState, SessionSnapshot};

/// POST /api/analyze: generate a new estimate and make it the current result.
///
/// The session lock is released while the generation request is in flight;
/// a reset or a newer analysis in that window makes this one stale.
pub async fn analyze(
    State(app): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    request.validate(app.config.estimate.min_description_chars)?;

    let ticket = {
        let mut session = app.session.lock().await;
        let ticket = session.begin_analysis()?;
        app.publish(&app.snapshot(&session));
        ticket
    };

    let outcome = app.client.estimate(&request, &app.config).await;

    let (result, failure) = match outcome {
        Ok(ingested) => (Ok(ingested), None),
        Err(e) => (Err(e.to_string()), Some(e)),
    };

    let mut session = app.session.lock().await;
    if session.complete(ticket, result) == Completion::Stale {
        return Err(AppError::conflict(
            "analysis was superseded by a reset or a newer request",
        ));
    }
    let snapshot = app.snapshot(&session);
    app.publish(&snapshot);
    drop(session);

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(Json(snapshot)),
    }
}
