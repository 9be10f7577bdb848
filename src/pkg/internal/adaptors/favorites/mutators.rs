use sqlx::PgConnection;

use crate::prelude::Result;

pub struct FavoriteMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> FavoriteMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        FavoriteMutator { pool }
    }

    /// Returns whether a new row was written.
    pub async fn add(&mut self, student_id: i64, offer_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO favorites (student_id, offer_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(student_id)
        .bind(offer_id)
        .execute(&mut *self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn remove(&mut self, student_id: i64, offer_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE student_id = $1 AND offer_id = $2")
            .bind(student_id)
            .bind(offer_id)
            .execute(&mut *self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
