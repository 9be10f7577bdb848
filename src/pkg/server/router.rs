use std::time::Duration;

use axum::http::{
    Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use axum::middleware::from_fn_with_state;
use axum::routing::{delete, patch, post, put};
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::probes::{healthz, livez};
use super::handlers::{
    applications, auth, dashboard, favorites, internships, notifications, offers, proposals,
};
use super::middlewares::authn;
use super::state::AppState;
use crate::prelude::Result;

pub fn build_routes() -> Result<Router> {
    let state = AppState::new()?;
    Ok(routes(state))
}

fn api(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        .route("/offers", get(offers::list).post(offers::create))
        .route(
            "/offers/{id}",
            get(offers::retrieve)
                .put(offers::update)
                .delete(offers::delete),
        )
        .route("/offers/{id}/apply", post(applications::apply))
        .route("/offers/{id}/applications", get(applications::list_for_offer))
        .route(
            "/offers/{id}/applications/{application_id}",
            patch(applications::update_status),
        )
        .route(
            "/offers/admin/applications/bulk",
            patch(applications::bulk_update),
        )
        .route("/applications/mine", get(applications::mine))
        .route("/applications/{id}", delete(applications::withdraw))
        .route(
            "/internships",
            get(internships::list).post(internships::create),
        )
        .route("/internships/mine", get(internships::mine))
        .route(
            "/internships/{id}",
            get(internships::retrieve).delete(internships::cancel),
        )
        .route("/internships/{id}/status", put(internships::update_status))
        .route("/supervisors/load", get(internships::supervisor_load))
        .route("/proposals", get(proposals::list).post(proposals::create))
        .route("/proposals/mine", get(proposals::mine))
        .route("/proposals/{id}/approval", put(proposals::set_approval))
        .route("/proposals/{id}/archive", post(proposals::archive))
        .route("/proposals/{id}/assign", post(proposals::assign))
        .route("/favorites", get(favorites::list))
        .route(
            "/favorites/{offer_id}",
            get(favorites::check)
                .post(favorites::add)
                .delete(favorites::remove),
        )
        .route("/notifications", get(notifications::list))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/read-all", post(notifications::read_all))
        .route("/notifications/{id}", delete(notifications::delete))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/dashboard/stats", get(dashboard::stats))
        .layer(from_fn_with_state(state, authn::authenticate))
}

pub fn routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .nest("/api", api(state.clone()))
        .route("/healthz", get(healthz))
        .route("/livez", get(livez))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    use super::*;

    async fn call(request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let app = build_routes().unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    #[traced_test]
    #[tokio::test]
    async fn test_livez_is_public() {
        let (status, _) = call(Request::get("/livez").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_api_requires_token() {
        let (status, body) = call(Request::get("/api/me").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["code"], "ERR-AUTH-001");
        assert!(logs_contain("token missing"));
    }

    #[traced_test]
    #[tokio::test]
    async fn test_malformed_token_is_rejected() {
        let request = Request::get("/api/offers")
            .header("Authorization", "Bearer not-a-uuid")
            .body(Body::empty())
            .unwrap();
        let (status, _) = call(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (status, _) = call(Request::get("/nope").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
