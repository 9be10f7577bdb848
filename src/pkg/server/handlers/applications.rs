use std::sync::Arc;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    pkg::{
        internal::{
            adaptors::{
                applications::{
                    mutators::ApplicationMutator,
                    selectors::ApplicationSelector,
                    spec::{ApplicationStatusInput, ApplyInput, BulkStatusInput},
                },
                offers::selectors::OfferSelector,
            },
            auth::{AuthContext, Role},
            intake::Intake,
            notify,
        },
        server::state::{AppState, GetTxn},
    },
    prelude::{AppError, Result},
};

pub async fn apply(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(offer_id): Path<i64>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>)> {
    ctx.require(&[Role::Student])?;
    let input = parse_apply_input(&body)?;
    input.validate()?;
    let mut tx = state.db_pool.begin_txn().await?;
    let application = Intake::new(&mut tx)
        .apply(
            offer_id,
            ctx.user_id(),
            input.cover_letter.as_deref(),
            Utc::now().date_naive(),
        )
        .await?;
    tx.commit().await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "message": "application submitted", "application": application })),
    ))
}

/// The apply body is optional; an empty request applies without a cover letter.
fn parse_apply_input(body: &[u8]) -> Result<ApplyInput> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ApplyInput::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("invalid body: {e}")))
}

pub async fn mine(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Student])?;
    let mut tx = state.db_pool.begin_txn().await?;
    let applications = ApplicationSelector::new(&mut tx)
        .list_for_student(ctx.user_id())
        .await?;
    Ok(Json(json!({ "ok": true, "applications": applications })))
}

pub async fn withdraw(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Student])?;
    let mut tx = state.db_pool.begin_txn().await?;
    if !ApplicationMutator::new(&mut tx)
        .withdraw(id, ctx.user_id())
        .await?
    {
        return Err(AppError::NotFound(format!(
            "no pending application {id} to withdraw"
        )));
    }
    tx.commit().await?;
    tracing::info!("student {} withdrew application {}", ctx.user_id(), id);
    Ok(Json(json!({ "ok": true, "message": "application withdrawn" })))
}

pub async fn list_for_offer(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(offer_id): Path<i64>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Admin])?;
    let mut tx = state.db_pool.begin_txn().await?;
    let offer = OfferSelector::new(&mut tx)
        .get_by_id(offer_id)
        .await?
        .ok_or_else(|| AppError::not_found("offer", offer_id))?;
    let applications = ApplicationSelector::new(&mut tx)
        .list_for_offer(offer.id)
        .await?;
    Ok(Json(json!({ "ok": true, "offer": offer, "applications": applications })))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path((offer_id, id)): Path<(i64, i64)>,
    Json(input): Json<ApplicationStatusInput>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Admin])?;
    let mut tx = state.db_pool.begin_txn().await?;
    let decision = ApplicationMutator::new(&mut tx)
        .update_status(offer_id, id, input.status)
        .await?;
    let decision = match decision {
        Some(decision) => decision,
        None => {
            // unchanged rows are not an error, missing ones are
            if !ApplicationSelector::new(&mut tx).exists(offer_id, id).await? {
                return Err(AppError::not_found("application", id));
            }
            return Ok(Json(json!({ "ok": true, "message": "status unchanged", "updated": 0 })));
        }
    };
    tx.commit().await?;
    tracing::info!("application {} of offer {} set to {:?}", id, offer_id, decision.status);
    notify::dispatch(&state.db_pool, notify::application_decided(&decision).into_iter().collect()).await;
    Ok(Json(json!({
        "ok": true,
        "message": "application updated",
        "updated": 1,
        "application": decision,
    })))
}

pub async fn bulk_update(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Json(input): Json<BulkStatusInput>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Admin])?;
    input.validate()?;
    let mut tx = state.db_pool.begin_txn().await?;
    let decisions = ApplicationMutator::new(&mut tx)
        .bulk_update_status(&input.ids, input.status)
        .await?;
    tx.commit().await?;
    tracing::info!(
        "bulk update to {:?}: {} of {} applications changed",
        input.status,
        decisions.len(),
        input.ids.len()
    );
    let notifications = decisions
        .iter()
        .filter_map(notify::application_decided)
        .collect();
    notify::dispatch(&state.db_pool, notifications).await;
    Ok(Json(json!({
        "ok": true,
        "message": format!("{} applications updated", decisions.len()),
        "updated": decisions.len(),
        "applications": decisions,
    })))
}
