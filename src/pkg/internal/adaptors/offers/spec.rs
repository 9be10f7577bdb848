use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use validator::Validate;

use crate::pkg::internal::{
    pagination::PageQuery,
    validation::{trimmed, trimmed_opt},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "offer_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    Initiation,
    Perfectionnement,
    Pfe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "offer_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OfferEntry {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub description: String,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub offer_type: OfferType,
    pub status: OfferStatus,
    pub deadline: Option<NaiveDate>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OfferEntry {
    /// Whether students can still apply on `today`.
    pub fn accepts_applications(&self, today: NaiveDate) -> bool {
        self.status == OfferStatus::Open && self.deadline.map_or(true, |d| d >= today)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOfferInput {
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 255, message = "Field cannot be empty"))]
    pub title: String,
    #[serde(deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 255, message = "Field cannot be empty"))]
    pub company: String,
    #[serde(default)]
    pub description: String,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub offer_type: OfferType,
    pub status: Option<OfferStatus>,
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateOfferInput {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 255, message = "Field cannot be empty"))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(length(min = 1, max = 255, message = "Field cannot be empty"))]
    pub company: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub offer_type: Option<OfferType>,
    pub status: Option<OfferStatus>,
    pub deadline: Option<NaiveDate>,
}

impl UpdateOfferInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.company.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.offer_type.is_none()
            && self.status.is_none()
            && self.deadline.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OfferFilter {
    #[serde(rename = "type")]
    pub offer_type: Option<OfferType>,
    pub status: Option<OfferStatus>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl OfferFilter {
    pub fn pages(&self) -> PageQuery {
        PageQuery::new(self.page, self.limit)
    }

    pub fn search_pattern(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)))
    }
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
