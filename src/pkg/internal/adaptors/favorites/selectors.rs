use sqlx::PgConnection;

use crate::pkg::internal::adaptors::favorites::spec::FavoriteEntry;
use crate::pkg::internal::pagination::PageQuery;
use crate::prelude::Result;

pub struct FavoriteSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> FavoriteSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        FavoriteSelector { pool }
    }

    pub async fn list(&mut self, student_id: i64, pages: PageQuery) -> Result<(Vec<FavoriteEntry>, i64)> {
        let total = self.count(student_id).await?;
        let rows = sqlx::query_as::<_, FavoriteEntry>(
            "SELECT o.id AS offer_id, o.title, o.company, o.offer_type, o.status, o.deadline,
                    f.created_at AS favorited_at
             FROM favorites f
             JOIN internship_offers o ON o.id = f.offer_id
             WHERE f.student_id = $1
             ORDER BY f.created_at DESC, o.id DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(student_id)
        .bind(pages.limit)
        .bind(pages.offset())
        .fetch_all(&mut *self.pool)
        .await?;
        Ok((rows, total))
    }

    pub async fn count(&mut self, student_id: i64) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM favorites WHERE student_id = $1")
            .bind(student_id)
            .fetch_one(&mut *self.pool)
            .await?;
        Ok(total)
    }

    pub async fn exists(&mut self, student_id: i64, offer_id: i64) -> Result<bool> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM favorites WHERE student_id = $1 AND offer_id = $2)",
        )
        .bind(student_id)
        .bind(offer_id)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(found)
    }
}
