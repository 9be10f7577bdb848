use sqlx::PgConnection;

use crate::pkg::internal::adaptors::dashboard::spec::{
    ApplicationCounts, DecisionCounts, OfferCounts, UserCounts,
};
use crate::pkg::internal::workflow::SupervisorLoad;
use crate::prelude::Result;

pub struct DashboardSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> DashboardSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        DashboardSelector { pool }
    }

    pub async fn users(&mut self) -> Result<UserCounts> {
        let row = sqlx::query_as::<_, UserCounts>(
            "SELECT COUNT(*) FILTER (WHERE role = 'student') AS students,
                    COUNT(*) FILTER (WHERE role = 'teacher') AS teachers,
                    COUNT(*) FILTER (WHERE role = 'admin') AS admins
             FROM users",
        )
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn offers(&mut self) -> Result<OfferCounts> {
        let row = sqlx::query_as::<_, OfferCounts>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'open') AS open,
                    COUNT(*) FILTER (WHERE status = 'closed') AS closed
             FROM internship_offers",
        )
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    /// Application counts, optionally restricted to one student.
    pub async fn applications(&mut self, student_id: Option<i64>) -> Result<ApplicationCounts> {
        let row = sqlx::query_as::<_, ApplicationCounts>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                    COUNT(*) FILTER (WHERE status = 'accepted') AS accepted,
                    COUNT(*) FILTER (WHERE status = 'rejected') AS rejected
             FROM applications
             WHERE $1::BIGINT IS NULL OR student_id = $1",
        )
        .bind(student_id)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn requests(&mut self) -> Result<DecisionCounts> {
        let row = sqlx::query_as::<_, DecisionCounts>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                    COUNT(*) FILTER (WHERE status = 'approved') AS approved,
                    COUNT(*) FILTER (WHERE status = 'rejected') AS rejected
             FROM internship_requests",
        )
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    /// Proposal approval counts, optionally restricted to one teacher.
    pub async fn proposals(&mut self, teacher_id: Option<i64>) -> Result<DecisionCounts> {
        let row = sqlx::query_as::<_, DecisionCounts>(
            "SELECT COUNT(*) AS total,
                    COUNT(*) FILTER (WHERE approval_status = 'pending') AS pending,
                    COUNT(*) FILTER (WHERE approval_status = 'approved') AS approved,
                    COUNT(*) FILTER (WHERE approval_status = 'rejected') AS rejected
             FROM subject_proposals
             WHERE $1::BIGINT IS NULL OR teacher_id = $1",
        )
        .bind(teacher_id)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn supervised(&mut self, teacher_id: i64) -> Result<SupervisorLoad> {
        let row = sqlx::query_as::<_, SupervisorLoad>(
            "SELECT solo_count, paired_count FROM supervisor_load WHERE supervisor_id = $1",
        )
        .bind(teacher_id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row.unwrap_or_default())
    }
}
