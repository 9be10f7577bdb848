use sqlx::PgConnection;

use crate::pkg::internal::adaptors::notifications::spec::{NewNotification, NotificationEntry};
use crate::prelude::Result;

pub struct NotificationMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> NotificationMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        NotificationMutator { pool }
    }

    pub async fn create(&mut self, notification: &NewNotification) -> Result<NotificationEntry> {
        let row = sqlx::query_as::<_, NotificationEntry>(
            r#"
            INSERT INTO notifications (user_id, title, body, link_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, body, is_read, link_url, created_at
            "#,
        )
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.link_url)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    /// Scoped to the owner: another user's notification id is reported as
    /// not updated.
    pub async fn mark_read(&mut self, id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_all_read(&mut self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
            .bind(user_id)
            .execute(&mut *self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&mut self, id: i64, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::pkg::{
        internal::{
            adaptors::notifications::{selectors::NotificationSelector, spec::NotificationFilter},
            auth::Role,
            fixtures,
        },
        server::state::{AppState, GetTxn},
    };

    fn note(user_id: i64, title: &str) -> NewNotification {
        NewNotification {
            user_id,
            title: title.into(),
            body: "body".into(),
            link_url: None,
        }
    }

    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a migrated postgres database"]
    async fn test_mark_all_read_only_touches_own_rows() -> Result<()> {
        let state = AppState::new()?;
        let mut tx = state.db_pool.begin_txn().await?;
        let me = fixtures::user(&mut tx, Role::Student).await?;
        let other = fixtures::user(&mut tx, Role::Teacher).await?;
        for title in ["one", "two"] {
            NotificationMutator::new(&mut tx).create(&note(me.id, title)).await?;
        }
        let theirs = NotificationMutator::new(&mut tx)
            .create(&note(other.id, "three"))
            .await?;

        assert_eq!(NotificationMutator::new(&mut tx).mark_all_read(me.id).await?, 2);
        assert_eq!(NotificationSelector::new(&mut tx).unread_count(me.id).await?, 0);
        assert_eq!(NotificationSelector::new(&mut tx).unread_count(other.id).await?, 1);

        let unread = NotificationFilter {
            unread: true,
            ..Default::default()
        };
        let (rows, total) = NotificationSelector::new(&mut tx).list(other.id, &unread).await?;
        assert_eq!(total, 1);
        assert_eq!(rows[0].id, theirs.id);
        assert!(!rows[0].is_read);
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a migrated postgres database"]
    async fn test_other_users_notifications_are_untouchable() -> Result<()> {
        let state = AppState::new()?;
        let mut tx = state.db_pool.begin_txn().await?;
        let me = fixtures::user(&mut tx, Role::Student).await?;
        let other = fixtures::user(&mut tx, Role::Student).await?;
        let theirs = NotificationMutator::new(&mut tx)
            .create(&note(other.id, "private"))
            .await?;

        assert!(!NotificationMutator::new(&mut tx).mark_read(theirs.id, me.id).await?);
        assert!(!NotificationMutator::new(&mut tx).delete(theirs.id, me.id).await?);
        assert!(NotificationMutator::new(&mut tx).mark_read(theirs.id, other.id).await?);
        assert!(NotificationMutator::new(&mut tx).delete(theirs.id, other.id).await?);
        Ok(())
    }
}
