use sqlx::PgConnection;

use crate::pkg::internal::adaptors::internships::selectors::REQUEST_COLUMNS;
use crate::pkg::internal::adaptors::internships::spec::{
    CreateRequestInput, InternshipRequestEntry, RequestStatus,
};
use crate::prelude::Result;

pub struct InternshipMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> InternshipMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        InternshipMutator { pool }
    }

    pub async fn create(&mut self, student_id: i64, request: &CreateRequestInput) -> Result<InternshipRequestEntry> {
        let row = sqlx::query_as::<_, InternshipRequestEntry>(&format!(
            r#"
            INSERT INTO internship_requests (student_id, partner_id, has_partner, subject_title, host_company, internship_type, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(student_id)
        .bind(request.partner_id)
        .bind(request.partner_id.is_some())
        .bind(&request.subject_title)
        .bind(&request.host_company)
        .bind(request.internship_type)
        .bind(request.start_date)
        .bind(request.end_date)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_status(
        &mut self,
        id: i64,
        status: RequestStatus,
        supervisor_id: Option<i64>,
        rejection_reason: Option<&str>,
    ) -> Result<InternshipRequestEntry> {
        let row = sqlx::query_as::<_, InternshipRequestEntry>(&format!(
            r#"
            UPDATE internship_requests
            SET status = $2, supervisor_id = $3, rejection_reason = $4, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .bind(supervisor_id)
        .bind(rejection_reason)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn cancel(&mut self, id: i64, student_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM internship_requests WHERE id = $1 AND student_id = $2 AND status = 'pending'",
        )
        .bind(id)
        .bind(student_id)
        .execute(&mut *self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
