use std::sync::Arc;

use axum::{Extension, Json, extract::State};
use serde_json::{Value, json};

use crate::{
    pkg::{
        internal::{
            adaptors::{
                dashboard::{
                    selectors::DashboardSelector,
                    spec::{AdminStats, StudentStats, TeacherStats},
                },
                favorites::selectors::FavoriteSelector,
                internships::selectors::InternshipSelector,
                notifications::selectors::NotificationSelector,
                proposals::selectors::ProposalSelector,
            },
            auth::{AuthContext, Role},
        },
        server::state::{AppState, GetTxn},
    },
    prelude::Result,
};

/// Role-dependent summary for the landing page.
pub async fn stats(
    State(state): State<AppState>,
    Extension(ctx): Extension<Arc<AuthContext>>,
) -> Result<Json<Value>> {
    let mut tx = state.db_pool.begin_txn().await?;
    let user_id = ctx.user_id();
    let stats = match ctx.role() {
        Role::Admin => {
            let mut dashboard = DashboardSelector::new(&mut tx);
            serde_json::to_value(AdminStats {
                users: dashboard.users().await?,
                offers: dashboard.offers().await?,
                applications: dashboard.applications(None).await?,
                requests: dashboard.requests().await?,
                proposals: dashboard.proposals(None).await?,
            })?
        }
        Role::Teacher => {
            let mut dashboard = DashboardSelector::new(&mut tx);
            let proposals = dashboard.proposals(Some(user_id)).await?;
            let supervised = dashboard.supervised(user_id).await?;
            let active_proposal = ProposalSelector::new(&mut tx)
                .active_for_teacher(user_id)
                .await?;
            let unread_notifications = NotificationSelector::new(&mut tx)
                .unread_count(user_id)
                .await?;
            serde_json::to_value(TeacherStats {
                proposals,
                active_proposal,
                supervised,
                capacity: state.capacity,
                unread_notifications,
            })?
        }
        Role::Student => {
            let applications = DashboardSelector::new(&mut tx)
                .applications(Some(user_id))
                .await?;
            let favorites = FavoriteSelector::new(&mut tx).count(user_id).await?;
            let unread_notifications = NotificationSelector::new(&mut tx)
                .unread_count(user_id)
                .await?;
            let mut requests = InternshipSelector::new(&mut tx);
            let request = match requests.active_for_student(user_id).await? {
                Some(request) => Some(request),
                None => requests.latest_for_student(user_id).await?,
            };
            serde_json::to_value(StudentStats {
                applications,
                favorites,
                unread_notifications,
                request,
            })?
        }
    };
    Ok(Json(json!({ "ok": true, "role": ctx.role(), "stats": stats })))
}
