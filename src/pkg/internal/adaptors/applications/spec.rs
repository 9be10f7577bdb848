use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use validator::Validate;

use crate::pkg::internal::adaptors::offers::spec::{OfferStatus, OfferType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationEntry {
    pub id: i64,
    pub offer_id: i64,
    pub student_id: i64,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Application row as seen by an administrator reviewing an offer.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicationWithStudent {
    pub id: i64,
    pub offer_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub student_email: String,
    pub status: ApplicationStatus,
    pub cover_letter: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Application row as seen by the student who submitted it.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicationWithOffer {
    pub id: i64,
    pub offer_id: i64,
    pub title: String,
    pub company: String,
    #[serde(rename = "type")]
    pub offer_type: OfferType,
    pub offer_status: OfferStatus,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

/// Row changed by a status update, with what notifications need.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicationDecision {
    pub id: i64,
    pub offer_id: i64,
    pub student_id: i64,
    pub status: ApplicationStatus,
    pub offer_title: String,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ApplyInput {
    #[validate(length(max = 5000, message = "Cover letter is too long"))]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationStatusInput {
    pub status: ApplicationStatus,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkStatusInput {
    #[validate(length(min = 1, max = 500, message = "Select between 1 and 500 applications"))]
    pub ids: Vec<i64>,
    pub status: ApplicationStatus,
}
