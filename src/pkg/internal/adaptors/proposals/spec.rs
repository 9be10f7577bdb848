use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use validator::Validate;

use crate::pkg::internal::{pagination::PageQuery, validation::trimmed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "proposal_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Available,
    Assigned,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProposalEntry {
    pub id: i64,
    pub teacher_id: i64,
    pub subject_title: String,
    pub description: String,
    pub approval_status: ApprovalStatus,
    pub status: ProposalStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProposalWithTeacher {
    pub id: i64,
    pub teacher_id: i64,
    pub teacher_name: String,
    pub subject_title: String,
    pub description: String,
    pub approval_status: ApprovalStatus,
    pub status: ProposalStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProposalInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 255, message = "Field cannot be empty"))]
    pub subject_title: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalInput {
    #[serde(alias = "status")]
    pub approval_status: ApprovalStatus,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProposalFilter {
    pub approval_status: Option<ApprovalStatus>,
    pub status: Option<ProposalStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ProposalFilter {
    pub fn pages(&self) -> PageQuery {
        PageQuery::new(self.page, self.limit)
    }
}
