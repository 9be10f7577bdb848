use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::pkg::internal::adaptors::offers::spec::{OfferEntry, OfferFilter};
use crate::prelude::Result;

pub(crate) const OFFER_COLUMNS: &str = "id, title, company, description, location, offer_type, status, deadline, created_by, created_at, updated_at";

pub struct OfferSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> OfferSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        OfferSelector { pool }
    }

    pub async fn get_by_id(&mut self, id: i64) -> Result<Option<OfferEntry>> {
        let row = sqlx::query_as::<_, OfferEntry>(&format!(
            "SELECT {OFFER_COLUMNS} FROM internship_offers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list(&mut self, filter: &OfferFilter) -> Result<(Vec<OfferEntry>, i64)> {
        let pages = filter.pages();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM internship_offers");
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *self.pool)
            .await?;

        let mut qb = QueryBuilder::new(format!("SELECT {OFFER_COLUMNS} FROM internship_offers"));
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(pages.limit)
            .push(" OFFSET ")
            .push_bind(pages.offset());
        let rows = qb
            .build_query_as::<OfferEntry>()
            .fetch_all(&mut *self.pool)
            .await?;
        Ok((rows, total))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &OfferFilter) {
    let mut sep = " WHERE ";
    if let Some(offer_type) = filter.offer_type {
        qb.push(sep).push("offer_type = ").push_bind(offer_type);
        sep = " AND ";
    }
    if let Some(status) = filter.status {
        qb.push(sep).push("status = ").push_bind(status);
        sep = " AND ";
    }
    if let Some(pattern) = filter.search_pattern() {
        qb.push(sep)
            .push("(title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR company ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkg::internal::adaptors::offers::spec::{OfferStatus, OfferType};

    fn filter_sql(filter: &OfferFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM internship_offers");
        push_filters(&mut qb, filter);
        qb.sql().to_string()
    }

    #[test]
    fn test_no_filters() {
        assert_eq!(
            filter_sql(&OfferFilter::default()),
            "SELECT COUNT(*) FROM internship_offers"
        );
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = OfferFilter {
            search: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(filter_sql(&filter), "SELECT COUNT(*) FROM internship_offers");
    }

    #[test]
    fn test_all_filters_are_joined() {
        let filter = OfferFilter {
            offer_type: Some(OfferType::Pfe),
            status: Some(OfferStatus::Open),
            search: Some("iot".into()),
            ..Default::default()
        };
        assert_eq!(
            filter_sql(&filter),
            "SELECT COUNT(*) FROM internship_offers WHERE offer_type = $1 AND status = $2 AND (title ILIKE $3 OR company ILIKE $4)"
        );
    }

    #[test]
    fn test_search_wildcards_match_literally() {
        let filter = OfferFilter {
            search: Some(" 100%_sure ".into()),
            ..Default::default()
        };
        assert_eq!(filter.search_pattern().as_deref(), Some(r"%100\%\_sure%"));
        let filter = OfferFilter {
            search: Some(r"a\b".into()),
            ..Default::default()
        };
        assert_eq!(filter.search_pattern().as_deref(), Some(r"%a\\b%"));
    }
}
