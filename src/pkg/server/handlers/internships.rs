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
            adaptors::internships::{
                mutators::InternshipMutator,
                selectors::InternshipSelector,
                spec::{CreateRequestInput, RequestFilter, RequestStatusInput},
            },
            auth::{AuthContext, Role},
            intake::Intake,
            notify,
            workflow::ApprovalEngine,
        },
        server::state::{AppState, GetTxn},
    },
    prelude::{AppError, Result},
};

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Json(input): Json<CreateRequestInput>,
) -> Result<(StatusCode, Json<Value>)> {
    ctx.require(&[Role::Student])?;
    input.validate()?;
    let mut tx = state.db_pool.begin_txn().await?;
    let request = Intake::new(&mut tx)
        .submit_request(ctx.user_id(), &input)
        .await?;
    tx.commit().await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "message": "internship request submitted", "request": request })),
    ))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Query(filter): Query<RequestFilter>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Admin])?;
    let mut tx = state.db_pool.begin_txn().await?;
    let (requests, total) = InternshipSelector::new(&mut tx).list(&filter).await?;
    Ok(Json(json!({
        "ok": true,
        "requests": requests,
        "pagination": filter.pages().paginate(total),
    })))
}

/// The caller's active request, or the most recent one once decided.
pub async fn mine(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Student])?;
    let mut tx = state.db_pool.begin_txn().await?;
    let mut selector = InternshipSelector::new(&mut tx);
    let request = match selector.active_for_student(ctx.user_id()).await? {
        Some(request) => Some(request),
        None => selector.latest_for_student(ctx.user_id()).await?,
    };
    Ok(Json(json!({ "ok": true, "request": request })))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let request = InternshipSelector::new(&mut tx)
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("internship request", id))?;
    if !ctx.is(Role::Admin) && !request.involves(ctx.user_id()) {
        return Err(AppError::Forbidden(
            "you are not part of this internship request".into(),
        ));
    }
    Ok(Json(json!({ "ok": true, "request": request })))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(id): Path<i64>,
    Json(input): Json<RequestStatusInput>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Admin])?;
    let mut tx = state.db_pool.begin_txn().await?;
    let decision = ApprovalEngine::new(&mut tx, state.capacity)
        .set_request_status(id, &input)
        .await?;
    tx.commit().await?;

    let mut notifications = Vec::new();
    if decision.status_changed() {
        notifications.extend(notify::request_decided(&decision.request));
    }
    if decision.supervisor_changed() {
        if let Some(supervisor) = &decision.supervisor {
            notifications.push(notify::supervisor_assigned(supervisor, &decision.request));
        }
    }
    notify::dispatch(&state.db_pool, notifications).await;

    Ok(Json(json!({
        "ok": true,
        "message": "internship request updated",
        "request": decision.request,
    })))
}

pub async fn cancel(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Student])?;
    let mut tx = state.db_pool.begin_txn().await?;
    if !InternshipMutator::new(&mut tx)
        .cancel(id, ctx.user_id())
        .await?
    {
        return Err(AppError::NotFound(format!(
            "no pending internship request {id} to cancel"
        )));
    }
    tx.commit().await?;
    tracing::info!("student {} cancelled internship request {}", ctx.user_id(), id);
    Ok(Json(json!({ "ok": true, "message": "internship request cancelled" })))
}

pub async fn supervisor_load(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Admin])?;
    let mut tx = state.db_pool.begin_txn().await?;
    let supervisors = InternshipSelector::new(&mut tx).all_loads().await?;
    Ok(Json(json!({
        "ok": true,
        "supervisors": supervisors,
        "capacity": state.capacity,
    })))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tracing_test::traced_test;

    use super::*;
    use crate::pkg::internal::{
        adaptors::{internships::spec::RequestStatus, offers::spec::OfferType},
        auth::context,
    };

    #[traced_test]
    #[tokio::test]
    async fn test_teachers_cannot_submit_requests() {
        let state = AppState::new().unwrap();
        let err = create(
            State(state),
            Extension(Arc::new(context(4, Role::Teacher))),
            Json(CreateRequestInput {
                partner_id: None,
                subject_title: Some("App IoT".into()),
                host_company: None,
                internship_type: OfferType::Pfe,
                start_date: None,
                end_date: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_inverted_dates_are_rejected() {
        let state = AppState::new().unwrap();
        let err = create(
            State(state),
            Extension(Arc::new(context(1, Role::Student))),
            Json(CreateRequestInput {
                partner_id: None,
                subject_title: None,
                host_company: None,
                internship_type: OfferType::Initiation,
                start_date: NaiveDate::from_ymd_opt(2025, 7, 1),
                end_date: NaiveDate::from_ymd_opt(2025, 6, 1),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("end_date"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_only_admins_decide_requests() {
        let state = AppState::new().unwrap();
        let err = update_status(
            State(state),
            Extension(Arc::new(context(3, Role::Teacher))),
            Path(1),
            Json(RequestStatusInput {
                status: RequestStatus::Approved,
                supervisor_id: Some(3),
                reason: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_students_cannot_see_supervisor_load() {
        let state = AppState::new().unwrap();
        let err = supervisor_load(State(state), Extension(Arc::new(context(1, Role::Student))))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
