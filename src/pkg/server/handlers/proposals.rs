use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use validator::Validate;

use crate::{
    pkg::{
        internal::{
            adaptors::proposals::{
                selectors::{ProposalSelector, student_view},
                spec::{ApprovalInput, CreateProposalInput, ProposalFilter},
            },
            auth::{AuthContext, Role},
            intake::Intake,
            notify,
            workflow::ApprovalEngine,
        },
        server::state::{AppState, GetTxn},
    },
    prelude::Result,
};

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Json(input): Json<CreateProposalInput>,
) -> Result<(StatusCode, Json<Value>)> {
    ctx.require(&[Role::Teacher])?;
    input.validate()?;
    let mut tx = state.db_pool.begin_txn().await?;
    let proposal = Intake::new(&mut tx)
        .submit_proposal(ctx.user_id(), &input)
        .await?;
    tx.commit().await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "message": "proposal submitted", "proposal": proposal })),
    ))
}

/// Students only ever see approved, available subjects.
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Query(filter): Query<ProposalFilter>,
) -> Result<Json<Value>> {
    let filter = if ctx.is(Role::Student) {
        student_view(filter)
    } else {
        filter
    };
    let mut tx = state.db_pool.begin_txn().await?;
    let (proposals, total) = ProposalSelector::new(&mut tx).list(&filter).await?;
    Ok(Json(json!({
        "ok": true,
        "proposals": proposals,
        "pagination": filter.pages().paginate(total),
    })))
}

pub async fn mine(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Teacher])?;
    let mut tx = state.db_pool.begin_txn().await?;
    let proposals = ProposalSelector::new(&mut tx)
        .list_for_teacher(ctx.user_id())
        .await?;
    Ok(Json(json!({ "ok": true, "proposals": proposals })))
}

pub async fn set_approval(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(id): Path<i64>,
    Json(input): Json<ApprovalInput>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Admin])?;
    let mut tx = state.db_pool.begin_txn().await?;
    let proposal = ApprovalEngine::new(&mut tx, state.capacity)
        .set_approval_status(id, input.approval_status, input.reason.as_deref())
        .await?;
    tx.commit().await?;
    notify::dispatch(
        &state.db_pool,
        notify::proposal_decided(&proposal).into_iter().collect(),
    )
    .await;
    Ok(Json(json!({ "ok": true, "message": "proposal reviewed", "proposal": proposal })))
}

pub async fn archive(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Teacher])?;
    let mut tx = state.db_pool.begin_txn().await?;
    let proposal = ApprovalEngine::new(&mut tx, state.capacity)
        .archive_proposal(id, ctx.user_id())
        .await?;
    tx.commit().await?;
    Ok(Json(json!({ "ok": true, "message": "proposal archived", "proposal": proposal })))
}

pub async fn assign(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Admin])?;
    let mut tx = state.db_pool.begin_txn().await?;
    let proposal = ApprovalEngine::new(&mut tx, state.capacity)
        .assign_proposal(id)
        .await?;
    tx.commit().await?;
    Ok(Json(json!({ "ok": true, "message": "proposal assigned", "proposal": proposal })))
}
