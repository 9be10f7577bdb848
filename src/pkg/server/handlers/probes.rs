use axum::{Json, extract::State};
use serde_json::{Value, json};
use sqlx::query;

use crate::{conf::settings, pkg::server::state::AppState, prelude::Result};

pub async fn livez() -> Result<Json<Value>> {
    tracing::debug!("service is live");
    Ok(Json(json!({ "ok": true, "service": &settings.service_name })))
}

pub async fn healthz(State(state): State<AppState>) -> Result<Json<Value>> {
    query("select 1").execute(&*state.db_pool).await?;
    tracing::debug!("service is healthy");
    Ok(Json(json!({ "ok": true, "database": "up" })))
}
