use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};

use crate::{
    pkg::{
        internal::{
            adaptors::notifications::{
                mutators::NotificationMutator, selectors::NotificationSelector,
                spec::NotificationFilter,
            },
            auth::AuthContext,
        },
        server::state::{AppState, GetTxn},
    },
    prelude::{AppError, Result},
};

pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Query(filter): Query<NotificationFilter>,
) -> Result<Json<Value>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let mut selector = NotificationSelector::new(&mut tx);
    let (notifications, total) = selector.list(ctx.user_id(), &filter).await?;
    let unread = selector.unread_count(ctx.user_id()).await?;
    Ok(Json(json!({
        "ok": true,
        "notifications": notifications,
        "unread": unread,
        "pagination": filter.pages().paginate(total),
    })))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
) -> Result<Json<Value>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let count = NotificationSelector::new(&mut tx)
        .unread_count(ctx.user_id())
        .await?;
    Ok(Json(json!({ "ok": true, "count": count })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let mut tx = state.db_pool.begin_txn().await?;
    if !NotificationMutator::new(&mut tx)
        .mark_read(id, ctx.user_id())
        .await?
    {
        return Err(AppError::not_found("notification", id));
    }
    tx.commit().await?;
    Ok(Json(json!({ "ok": true, "message": "notification marked as read" })))
}

pub async fn read_all(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
) -> Result<Json<Value>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let updated = NotificationMutator::new(&mut tx)
        .mark_all_read(ctx.user_id())
        .await?;
    tx.commit().await?;
    tracing::debug!("user {} marked {} notifications read", ctx.user_id(), updated);
    Ok(Json(json!({ "ok": true, "message": "all notifications read", "updated": updated })))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let mut tx = state.db_pool.begin_txn().await?;
    if !NotificationMutator::new(&mut tx)
        .delete(id, ctx.user_id())
        .await?
    {
        return Err(AppError::not_found("notification", id));
    }
    tx.commit().await?;
    Ok(Json(json!({ "ok": true, "message": "notification deleted" })))
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::pkg::internal::auth::{Role, context};

    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a migrated postgres database"]
    async fn test_unknown_notification_is_not_found() {
        let state = AppState::new().unwrap();
        let ctx = Arc::new(context(i64::MAX, Role::Student));
        let err = mark_read(State(state.clone()), Extension(ctx.clone()), Path(i64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = delete(State(state.clone()), Extension(ctx.clone()), Path(i64::MAX))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let Json(body) = read_all(State(state), Extension(ctx)).await.unwrap();
        assert_eq!(body["updated"], 0);
    }
}
