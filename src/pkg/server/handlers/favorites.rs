use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};

use crate::{
    pkg::{
        internal::{
            adaptors::{
                favorites::{mutators::FavoriteMutator, selectors::FavoriteSelector},
                offers::selectors::OfferSelector,
            },
            auth::{AuthContext, Role},
            pagination::{PageParams, PageQuery},
        },
        server::state::{AppState, GetTxn},
    },
    prelude::{AppError, Result},
};

pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Student])?;
    let pages = PageQuery::from(params);
    let mut tx = state.db_pool.begin_txn().await?;
    let (favorites, total) = FavoriteSelector::new(&mut tx)
        .list(ctx.user_id(), pages)
        .await?;
    Ok(Json(json!({
        "ok": true,
        "favorites": favorites,
        "pagination": pages.paginate(total),
    })))
}

pub async fn check(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(offer_id): Path<i64>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Student])?;
    let mut tx = state.db_pool.begin_txn().await?;
    let favorited = FavoriteSelector::new(&mut tx)
        .exists(ctx.user_id(), offer_id)
        .await?;
    Ok(Json(json!({ "ok": true, "favorited": favorited })))
}

/// Adding twice is not an error.
pub async fn add(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(offer_id): Path<i64>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Student])?;
    let mut tx = state.db_pool.begin_txn().await?;
    if OfferSelector::new(&mut tx).get_by_id(offer_id).await?.is_none() {
        return Err(AppError::not_found("offer", offer_id));
    }
    let added = FavoriteMutator::new(&mut tx)
        .add(ctx.user_id(), offer_id)
        .await?;
    tx.commit().await?;
    let message = if added {
        "added to favorites"
    } else {
        "already in favorites"
    };
    Ok(Json(json!({ "ok": true, "message": message, "favorited": true })))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
    Path(offer_id): Path<i64>,
) -> Result<Json<Value>> {
    ctx.require(&[Role::Student])?;
    let mut tx = state.db_pool.begin_txn().await?;
    let removed = FavoriteMutator::new(&mut tx)
        .remove(ctx.user_id(), offer_id)
        .await?;
    tx.commit().await?;
    let message = if removed {
        "removed from favorites"
    } else {
        "not in favorites"
    };
    Ok(Json(json!({ "ok": true, "message": message, "favorited": false })))
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::pkg::internal::auth::context;

    #[traced_test]
    #[tokio::test]
    async fn test_favorites_are_for_students() {
        let state = AppState::new().unwrap();
        let err = add(
            State(state.clone()),
            Extension(Arc::new(context(2, Role::Teacher))),
            Path(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = list(
            State(state),
            Extension(Arc::new(context(1, Role::Admin))),
            Query(PageParams::default()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
