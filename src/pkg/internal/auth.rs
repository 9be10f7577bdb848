use crate::{
    conf::settings,
    pkg::server::state::AppState,
    prelude::{AppError, Result},
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{
    PgConnection,
    prelude::{FromRow, Type},
};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

#[derive(FromRow, Serialize, Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

#[derive(FromRow, Debug)]
pub struct AuthToken {
    pub token: Uuid,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    pub revoked: bool,
}

/// Authenticated caller, attached to every `/api` request by the authn
/// middleware and handed to handlers as an extension.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
}

impl AuthContext {
    pub fn new(user: User) -> Self {
        AuthContext { user }
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn is(&self, role: Role) -> bool {
        self.user.role == role
    }

    pub fn require(&self, roles: &[Role]) -> Result<()> {
        if roles.contains(&self.user.role) {
            Ok(())
        } else {
            tracing::warn!(
                "user {} with role {:?} denied, needs one of {:?}",
                self.user.id,
                self.user.role,
                roles
            );
            Err(AppError::Forbidden(
                "you are not allowed to perform this action".into(),
            ))
        }
    }
}

impl User {
    pub async fn retrieve(state: &AppState, email: &str) -> Result<Option<Self>> {
        Ok(sqlx::query_as::<_, User>(
            "select id, email, full_name, role from users where email = $1",
        )
        .bind(email)
        .fetch_optional(&*state.db_pool)
        .await?)
    }

    /// Locks the given user rows until the surrounding transaction ends.
    /// Rows are locked in id order so concurrent callers cannot deadlock.
    pub async fn lock_many(conn: &mut PgConnection, ids: &[i64]) -> Result<Vec<Self>> {
        Ok(sqlx::query_as::<_, User>(
            "select id, email, full_name, role from users where id = any($1) order by id for update",
        )
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?)
    }
}

impl AuthToken {
    pub async fn issue(state: &AppState, user: &User) -> Result<Self> {
        let expiry = Utc::now() + Duration::hours(settings.token_ttl_hours);
        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (token, user_id, expiry)
            VALUES ($1, $2, $3)
            RETURNING token, user_id, expiry, revoked
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user.id)
        .bind(expiry)
        .fetch_one(&*state.db_pool)
        .await?;
        tracing::debug!("issued token for user {}, expires {}", user.id, &token.expiry);
        Ok(token)
    }

    pub async fn check_token_validity(state: &AppState, token_str: &str) -> Result<User> {
        let token = token_str
            .parse::<Uuid>()
            .map_err(|_| AppError::Unauthorized)?;

        tracing::debug!("verifying token: {}", token);
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.email, u.full_name, u.role
            FROM auth_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token = $1
            AND NOT t.revoked
            AND t.expiry > now()
            "#,
        )
        .bind(token)
        .fetch_optional(&*state.db_pool)
        .await?
        .ok_or(AppError::Unauthorized)
    }

    pub async fn revoke_all(state: &AppState, user_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "update auth_tokens set revoked = true where user_id = $1 and not revoked",
        )
        .bind(user_id)
        .execute(&*state.db_pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
pub(crate) fn context(id: i64, role: Role) -> AuthContext {
    AuthContext::new(User {
        id,
        email: format!("user{id}@example.org"),
        full_name: format!("User {id}"),
        role,
    })
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    fn test_require_role() {
        let admin = context(1, Role::Admin);
        assert!(admin.require(&[Role::Admin]).is_ok());
        assert!(admin.is(Role::Admin));

        let student = context(2, Role::Student);
        let err = student.require(&[Role::Admin, Role::Teacher]).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert!(student.require(&[Role::Student]).is_ok());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Teacher).unwrap(), "\"teacher\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_malformed_token_is_rejected_before_lookup() {
        let state = AppState::new().unwrap();
        let err = AuthToken::check_token_validity(&state, "not-a-uuid")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }
}
