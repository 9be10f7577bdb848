use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use serde_json::{Value, json};

use crate::{
    pkg::{
        internal::auth::{AuthContext, AuthToken},
        server::state::AppState,
    },
    prelude::Result,
};

pub async fn me(Extension(ctx): Extension<Arc<AuthContext>>) -> Result<Json<Value>> {
    Ok(Json(json!({ "ok": true, "user": &ctx.user })))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
) -> Result<Json<Value>> {
    let revoked = AuthToken::revoke_all(&state, ctx.user_id()).await?;
    tracing::info!("user {} logged out, {} tokens revoked", ctx.user_id(), revoked);
    Ok(Json(json!({ "ok": true, "message": "logged out" })))
}
