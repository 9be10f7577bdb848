use sqlx::PgConnection;

use crate::pkg::internal::adaptors::notifications::spec::{NotificationEntry, NotificationFilter};
use crate::prelude::Result;

pub struct NotificationSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> NotificationSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        NotificationSelector { pool }
    }

    pub async fn list(&mut self, user_id: i64, filter: &NotificationFilter) -> Result<(Vec<NotificationEntry>, i64)> {
        let pages = filter.pages();
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND (NOT $2 OR NOT is_read)",
        )
        .bind(user_id)
        .bind(filter.unread)
        .fetch_one(&mut *self.pool)
        .await?;
        let rows = sqlx::query_as::<_, NotificationEntry>(
            "SELECT id, user_id, title, body, is_read, link_url, created_at
             FROM notifications
             WHERE user_id = $1 AND (NOT $2 OR NOT is_read)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4",
        )
        .bind(user_id)
        .bind(filter.unread)
        .bind(pages.limit)
        .bind(pages.offset())
        .fetch_all(&mut *self.pool)
        .await?;
        Ok((rows, total))
    }

    pub async fn unread_count(&mut self, user_id: i64) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(count)
    }
}
