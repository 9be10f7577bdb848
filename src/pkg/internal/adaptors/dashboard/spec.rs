use serde::Serialize;
use sqlx::FromRow;

use crate::pkg::internal::{
    adaptors::{internships::spec::InternshipRequestEntry, proposals::spec::ProposalEntry},
    workflow::{CapacityRule, SupervisorLoad},
};

#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct OfferCounts {
    pub total: i64,
    pub open: i64,
    pub closed: i64,
}

#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct ApplicationCounts {
    pub total: i64,
    pub pending: i64,
    pub accepted: i64,
    pub rejected: i64,
}

/// Counts for anything decided pending/approved/rejected.
#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct DecisionCounts {
    pub total: i64,
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Debug, Clone, Default, Serialize, FromRow)]
pub struct UserCounts {
    pub students: i64,
    pub teachers: i64,
    pub admins: i64,
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub users: UserCounts,
    pub offers: OfferCounts,
    pub applications: ApplicationCounts,
    pub requests: DecisionCounts,
    pub proposals: DecisionCounts,
}

#[derive(Debug, Serialize)]
pub struct TeacherStats {
    pub proposals: DecisionCounts,
    pub active_proposal: Option<ProposalEntry>,
    pub supervised: SupervisorLoad,
    pub capacity: CapacityRule,
    pub unread_notifications: i64,
}

#[derive(Debug, Serialize)]
pub struct StudentStats {
    pub applications: ApplicationCounts,
    pub favorites: i64,
    pub unread_notifications: i64,
    pub request: Option<InternshipRequestEntry>,
}
