use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use validator::{Validate, ValidationError};

use crate::pkg::internal::{
    adaptors::offers::spec::OfferType, pagination::PageQuery, validation::trimmed_opt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InternshipRequestEntry {
    pub id: i64,
    pub student_id: i64,
    pub partner_id: Option<i64>,
    pub has_partner: bool,
    pub status: RequestStatus,
    pub supervisor_id: Option<i64>,
    pub subject_title: Option<String>,
    pub host_company: Option<String>,
    #[serde(rename = "type")]
    pub internship_type: OfferType,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InternshipRequestEntry {
    /// Owner, partner or supervisor of this request.
    pub fn involves(&self, user_id: i64) -> bool {
        self.student_id == user_id
            || self.partner_id == Some(user_id)
            || self.supervisor_id == Some(user_id)
    }

    /// Students attached to this request, owner first.
    pub fn students(&self) -> Vec<i64> {
        std::iter::once(self.student_id)
            .chain(self.partner_id)
            .collect()
    }
}

/// Admin listing row, with the people involved resolved to names.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InternshipRequestRow {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub partner_id: Option<i64>,
    pub partner_name: Option<String>,
    pub has_partner: bool,
    pub status: RequestStatus,
    pub supervisor_id: Option<i64>,
    pub supervisor_name: Option<String>,
    pub subject_title: Option<String>,
    pub host_company: Option<String>,
    #[serde(rename = "type")]
    pub internship_type: OfferType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SupervisorLoadEntry {
    pub supervisor_id: i64,
    pub full_name: String,
    pub email: String,
    pub solo_count: i64,
    pub paired_count: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_dates"))]
pub struct CreateRequestInput {
    pub partner_id: Option<i64>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 255, message = "Field cannot be empty"))]
    pub subject_title: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 255, message = "Field cannot be empty"))]
    pub host_company: Option<String>,
    #[serde(rename = "type")]
    pub internship_type: OfferType,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn validate_dates(input: &CreateRequestInput) -> Result<(), ValidationError> {
    match (input.start_date, input.end_date) {
        (Some(start), Some(end)) if end < start => Err(ValidationError::new("dates")
            .with_message("end_date must not be before start_date".into())),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
pub struct RequestStatusInput {
    pub status: RequestStatus,
    pub supervisor_id: Option<i64>,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestFilter {
    pub status: Option<RequestStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl RequestFilter {
    pub fn pages(&self) -> PageQuery {
        PageQuery::new(self.page, self.limit)
    }
}
