use axum::{Json, extract::State, http::Uri};

use crate::{error::Result, models::Outcome, plugin::Route, state::AppState};

/// GET /{*path}
pub async fn dispatch(State(state): State<AppState>, uri: Uri) -> Result<Json<Outcome>> {
    let route = Route::parse(uri.path())?;
    let outcome = state.catalogue.dispatch(&route).await?;
    Ok(Json(outcome))
}

/// GET /healthz
pub async fn health() -> &'static str {
    "ok"
}
