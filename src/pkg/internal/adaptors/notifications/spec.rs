use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::pkg::internal::pagination::PageQuery;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationEntry {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub link_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub link_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationFilter {
    #[serde(default)]
    pub unread: bool,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl NotificationFilter {
    pub fn pages(&self) -> PageQuery {
        PageQuery::new(self.page, self.limit)
    }
}
