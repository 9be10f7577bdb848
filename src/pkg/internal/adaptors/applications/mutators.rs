use sqlx::PgConnection;

use crate::pkg::internal::adaptors::applications::spec::{
    ApplicationDecision, ApplicationEntry, ApplicationStatus,
};
use crate::prelude::Result;

pub struct ApplicationMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ApplicationMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ApplicationMutator { pool }
    }

    /// Returns `None` when the student already applied to this offer.
    pub async fn create(
        &mut self,
        offer_id: i64,
        student_id: i64,
        cover_letter: Option<&str>,
    ) -> Result<Option<ApplicationEntry>> {
        let row = sqlx::query_as::<_, ApplicationEntry>(
            r#"
            INSERT INTO applications (offer_id, student_id, cover_letter)
            VALUES ($1, $2, $3)
            ON CONFLICT (offer_id, student_id) DO NOTHING
            RETURNING id, offer_id, student_id, status, cover_letter, created_at, updated_at
            "#,
        )
        .bind(offer_id)
        .bind(student_id)
        .bind(cover_letter)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    /// Updates one application of an offer. Rows already in `status` are
    /// left untouched and reported as `None`.
    pub async fn update_status(
        &mut self,
        offer_id: i64,
        id: i64,
        status: ApplicationStatus,
    ) -> Result<Option<ApplicationDecision>> {
        let row = sqlx::query_as::<_, ApplicationDecision>(
            r#"
            WITH updated AS (
                UPDATE applications SET status = $3, updated_at = CURRENT_TIMESTAMP
                WHERE id = $1 AND offer_id = $2 AND status <> $3
                RETURNING id, offer_id, student_id, status
            )
            SELECT u.id, u.offer_id, u.student_id, u.status, o.title AS offer_title
            FROM updated u JOIN internship_offers o ON o.id = u.offer_id
            "#,
        )
        .bind(id)
        .bind(offer_id)
        .bind(status)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn bulk_update_status(
        &mut self,
        ids: &[i64],
        status: ApplicationStatus,
    ) -> Result<Vec<ApplicationDecision>> {
        let rows = sqlx::query_as::<_, ApplicationDecision>(
            r#"
            WITH updated AS (
                UPDATE applications SET status = $2, updated_at = CURRENT_TIMESTAMP
                WHERE id = ANY($1) AND status <> $2
                RETURNING id, offer_id, student_id, status
            )
            SELECT u.id, u.offer_id, u.student_id, u.status, o.title AS offer_title
            FROM updated u JOIN internship_offers o ON o.id = u.offer_id
            ORDER BY u.id
            "#,
        )
        .bind(ids)
        .bind(status)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn withdraw(&mut self, id: i64, student_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM applications WHERE id = $1 AND student_id = $2 AND status = 'pending'",
        )
        .bind(id)
        .bind(student_id)
        .execute(&mut *self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
