use sqlx::{PgConnection, QueryBuilder};

use crate::pkg::internal::adaptors::offers::selectors::OFFER_COLUMNS;
use crate::pkg::internal::adaptors::offers::spec::{
    CreateOfferInput, OfferEntry, OfferStatus, UpdateOfferInput,
};
use crate::prelude::Result;

pub struct OfferMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> OfferMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        OfferMutator { pool }
    }

    pub async fn create(&mut self, offer: &CreateOfferInput, created_by: i64) -> Result<OfferEntry> {
        let row = sqlx::query_as::<_, OfferEntry>(&format!(
            r#"
            INSERT INTO internship_offers (title, company, description, location, offer_type, status, deadline, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {OFFER_COLUMNS}
            "#
        ))
        .bind(offer.title.trim())
        .bind(offer.company.trim())
        .bind(&offer.description)
        .bind(&offer.location)
        .bind(offer.offer_type)
        .bind(offer.status.unwrap_or(OfferStatus::Open))
        .bind(offer.deadline)
        .bind(created_by)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&mut self, id: i64, offer: UpdateOfferInput) -> Result<Option<OfferEntry>> {
        let mut qb = QueryBuilder::new("UPDATE internship_offers SET updated_at = CURRENT_TIMESTAMP");
        if let Some(title) = offer.title {
            qb.push(", title = ").push_bind(title.trim().to_string());
        }
        if let Some(company) = offer.company {
            qb.push(", company = ").push_bind(company.trim().to_string());
        }
        if let Some(description) = offer.description {
            qb.push(", description = ").push_bind(description);
        }
        if let Some(location) = offer.location {
            qb.push(", location = ").push_bind(location);
        }
        if let Some(offer_type) = offer.offer_type {
            qb.push(", offer_type = ").push_bind(offer_type);
        }
        if let Some(status) = offer.status {
            qb.push(", status = ").push_bind(status);
        }
        if let Some(deadline) = offer.deadline {
            qb.push(", deadline = ").push_bind(deadline);
        }
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(OFFER_COLUMNS);

        let row = qb
            .build_query_as::<OfferEntry>()
            .fetch_optional(&mut *self.pool)
            .await?;
        Ok(row)
    }

    pub async fn delete(&mut self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM internship_offers WHERE id = $1")
            .bind(id)
            .execute(&mut *self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
