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
            adaptors::offers::{
                mutators::OfferMutator,
                selectors::OfferSelector,
                spec::{CreateOfferInput, OfferFilter, UpdateOfferInput},
            },
            auth::{AuthContext, Role},
        },
        server::state::{AppState, GetTxn},
    },
    prelude::{AppError, Result},
};

pub async fn list(
    State(state): State<AppState>,
    Extension(_ctx): Extension<Arc<AuthContext>>,
    Query(filter): Query<OfferFilter>,
) -> Result<Json<Value>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let (offers, total) = OfferSelector::new(&mut tx).list(&filter).await?;
    Ok(Json(json!({
        "ok": true,
        "offers": offers,
        "pagination": filter.pages().paginate(total),
    })))
}

pub async fn retrieve(
    State(state): State<AppState>,
    Extension(_ctx): Extension<Arc<AuthContext>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let offer = OfferSelector::new(&mut tx)
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("offer", id))?;
    Ok(Json(json!({ "ok": true, "offer": offer })))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Json(input): Json<CreateOfferInput>,
) -> Result<(StatusCode, Json<Value>)> {
    ctx.require(&[Role::Admin])?;
    input.validate()?;
    let mut tx = state.db_pool.begin_txn().await?;
    let offer = OfferMutator::new(&mut tx)
        .create(&input, ctx.user_id())
        .await?;
    tx.commit().await?;
    tracing::info!("offer {} '{}' created by {}", offer.id, &offer.title, ctx.user_id());
    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "message": "offer created", "offer": offer })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateOfferInput>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Admin])?;
    input.validate()?;
    if input.is_empty() {
        return Err(AppError::Validation("nothing to update".into()));
    }
    let mut tx = state.db_pool.begin_txn().await?;
    let offer = OfferMutator::new(&mut tx)
        .update(id, input)
        .await?
        .ok_or_else(|| AppError::not_found("offer", id))?;
    tx.commit().await?;
    tracing::info!("offer {} updated, status {:?}", offer.id, offer.status);
    Ok(Json(json!({ "ok": true, "message": "offer updated", "offer": offer })))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Admin])?;
    let mut tx = state.db_pool.begin_txn().await?;
    if !OfferMutator::new(&mut tx).delete(id).await? {
        return Err(AppError::not_found("offer", id));
    }
    tx.commit().await?;
    tracing::info!("offer {} deleted by {}", id, ctx.user_id());
    Ok(Json(json!({ "ok": true, "message": "offer deleted" })))
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::pkg::internal::{adaptors::offers::spec::OfferType, auth::context};

    fn offer_input(title: &str) -> CreateOfferInput {
        CreateOfferInput {
            title: title.into(),
            company: "Acme".into(),
            description: String::new(),
            location: None,
            offer_type: OfferType::Pfe,
            status: None,
            deadline: None,
        }
    }

    #[traced_test]
    #[tokio::test]
    async fn test_only_admins_create_offers() {
        let state = AppState::new().unwrap();
        let err = create(
            State(state),
            Extension(Arc::new(context(3, Role::Student))),
            Json(offer_input("Backend intern")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_empty_title_is_rejected() {
        let state = AppState::new().unwrap();
        let err = create(
            State(state),
            Extension(Arc::new(context(1, Role::Admin))),
            Json(offer_input("")),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_empty_update_is_rejected() {
        let state = AppState::new().unwrap();
        let err = update(
            State(state),
            Extension(Arc::new(context(1, Role::Admin))),
            Path(5),
            Json(UpdateOfferInput::default()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "nothing to update");
    }
}
