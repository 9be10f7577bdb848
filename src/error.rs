use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("authentication required")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Conflict {
        message: String,
        existing_id: Option<i64>,
    },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn conflict(message: impl Into<String>, existing_id: i64) -> Self {
        AppError::Conflict {
            message: message.into(),
            existing_id: Some(existing_id),
        }
    }

    pub fn not_found(entity: &str, id: i64) -> Self {
        AppError::NotFound(format!("{entity} {id} not found"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Database(e) if is_unique_violation(e) => StatusCode::CONFLICT,
            AppError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Database(_)
            | AppError::Migrate(_)
            | AppError::Config(_)
            | AppError::Io(_)
            | AppError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "ERR-VALIDATION",
            AppError::BadRequest(_) => "ERR-BAD-REQUEST",
            AppError::Unauthorized => "ERR-AUTH-001",
            AppError::Forbidden(_) => "ERR-AUTH-002",
            AppError::NotFound(_) => "ERR-NOT-FOUND",
            AppError::Conflict { .. } => "ERR-CONFLICT",
            AppError::Database(e) if is_unique_violation(e) => "ERR-CONFLICT",
            AppError::Database(sqlx::Error::RowNotFound) => "ERR-NOT-FOUND",
            AppError::Database(_) | AppError::Migrate(_) => "ERR-DB-000",
            AppError::Config(_) | AppError::Io(_) | AppError::Json(_) => "ERR-INTERNAL",
        }
    }

    /// Message shown to the caller. Internal failures are not leaked.
    pub fn public_message(&self) -> String {
        match self.status() {
            StatusCode::INTERNAL_SERVER_ERROR => "internal server error".into(),
            StatusCode::CONFLICT if matches!(self, AppError::Database(_)) => {
                "resource already exists".into()
            }
            StatusCode::NOT_FOUND if matches!(self, AppError::Database(_)) => {
                "resource not found".into()
            }
            _ => self.to_string(),
        }
    }

    pub fn body(&self) -> Value {
        let mut body = json!({
            "ok": false,
            "message": self.public_message(),
            "code": self.code(),
        });
        if let AppError::Conflict {
            existing_id: Some(id),
            ..
        } = self
        {
            body["existingId"] = json!(id);
        }
        body
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reason = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "is invalid".to_string());
                if field == "__all__" {
                    reason
                } else {
                    format!("{field}: {reason}")
                }
            })
            .collect();
        fields.sort();
        AppError::Validation(fields.join(", "))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", &self);
        } else {
            tracing::debug!("request rejected ({}): {}", status, &self);
        }
        (status, Json(self.body())).into_response()
    }
}
