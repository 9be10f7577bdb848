use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::pkg::internal::adaptors::offers::spec::{OfferStatus, OfferType};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FavoriteEntry {
    pub offer_id: i64,
    pub title: String,
    pub company: String,
    #[serde(rename = "type")]
    pub offer_type: OfferType,
    pub status: OfferStatus,
    pub deadline: Option<NaiveDate>,
    pub favorited_at: DateTime<Utc>,
}
