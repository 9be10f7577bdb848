use sqlx::PgConnection;

use crate::pkg::internal::adaptors::applications::spec::{
    ApplicationEntry, ApplicationWithOffer, ApplicationWithStudent,
};
use crate::prelude::Result;

pub struct ApplicationSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ApplicationSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ApplicationSelector { pool }
    }

    pub async fn find(&mut self, offer_id: i64, student_id: i64) -> Result<Option<ApplicationEntry>> {
        let row = sqlx::query_as::<_, ApplicationEntry>(
            "SELECT id, offer_id, student_id, status, cover_letter, created_at, updated_at
             FROM applications WHERE offer_id = $1 AND student_id = $2",
        )
        .bind(offer_id)
        .bind(student_id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn exists(&mut self, offer_id: i64, id: i64) -> Result<bool> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM applications WHERE id = $1 AND offer_id = $2)",
        )
        .bind(id)
        .bind(offer_id)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(found)
    }

    pub async fn list_for_offer(&mut self, offer_id: i64) -> Result<Vec<ApplicationWithStudent>> {
        let rows = sqlx::query_as::<_, ApplicationWithStudent>(
            "SELECT a.id, a.offer_id, a.student_id, u.full_name AS student_name, u.email AS student_email,
                    a.status, a.cover_letter, a.created_at
             FROM applications a
             JOIN users u ON u.id = a.student_id
             WHERE a.offer_id = $1
             ORDER BY a.created_at DESC",
        )
        .bind(offer_id)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_for_student(&mut self, student_id: i64) -> Result<Vec<ApplicationWithOffer>> {
        let rows = sqlx::query_as::<_, ApplicationWithOffer>(
            "SELECT a.id, a.offer_id, o.title, o.company, o.offer_type, o.status AS offer_status,
                    a.status, a.created_at
             FROM applications a
             JOIN internship_offers o ON o.id = a.offer_id
             WHERE a.student_id = $1
             ORDER BY a.created_at DESC",
        )
        .bind(student_id)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }
}
