use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    pkg::{
        internal::auth::{AuthContext, AuthToken},
        server::state::AppState,
    },
    prelude::{AppError, Result},
};

pub const TOKEN_COOKIE: &str = "_Host_token";

/// Bearer header first, then the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }
    CookieJar::from_headers(headers)
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
}

pub async fn authenticate(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let Some(token) = extract_token(&headers) else {
        tracing::warn!("token missing, authentication denied for {}", request.uri().path());
        return Err(AppError::Unauthorized);
    };
    let user = AuthToken::check_token_validity(&state, &token).await?;
    tracing::debug!("authenticated user {} as {:?}", user.id, user.role);
    request
        .extensions_mut()
        .insert(Arc::new(AuthContext::new(user)));
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, header::COOKIE};

    use super::*;

    #[test]
    fn test_bearer_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(COOKIE, HeaderValue::from_static("_Host_token=def"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; _Host_token=def"));
        assert_eq!(extract_token(&headers).as_deref(), Some("def"));
    }

    #[test]
    fn test_empty_values_are_missing() {
        let mut headers = HeaderMap::new();
        assert!(extract_token(&headers).is_none());
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        headers.insert(COOKIE, HeaderValue::from_static("_Host_token="));
        assert!(extract_token(&headers).is_none());
    }
}
