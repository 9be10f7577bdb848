use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Page window resolved from optional `page`/`limit` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: i64,
    pub limit: i64,
}

impl PageQuery {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        PageQuery {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit
                .filter(|l| *l > 0)
                .unwrap_or(DEFAULT_LIMIT)
                .min(MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn paginate(&self, total: i64) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
            total,
            total_pages: (total + self.limit - 1) / self.limit,
        }
    }
}

/// Raw `?page=&limit=` query for listings with no other filter.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<PageParams> for PageQuery {
    fn from(params: PageParams) -> Self {
        PageQuery::new(params.page, params.limit)
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        PageQuery::new(None, None)
    }
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        assert_eq!(PageQuery::new(None, None), PageQuery { page: 1, limit: 10 });
        assert_eq!(
            PageQuery::new(Some(0), Some(-3)),
            PageQuery { page: 1, limit: 10 }
        );
        assert_eq!(PageQuery::new(Some(3), Some(500)).limit, MAX_LIMIT);
    }

    #[test]
    fn test_offset_and_total_pages() {
        let q = PageQuery::new(Some(3), Some(20));
        assert_eq!(q.offset(), 40);
        let p = q.paginate(41);
        assert_eq!(p.total_pages, 3);
        assert_eq!(PageQuery::default().paginate(0).total_pages, 0);
        assert_eq!(PageQuery::default().paginate(10).total_pages, 1);
    }

    #[test]
    fn test_huge_page_saturates() {
        let q = PageQuery::new(Some(i64::MAX), Some(10));
        assert_eq!(q.offset(), i64::MAX);
        assert_eq!(q.paginate(5).total_pages, 1);
    }

    #[test]
    fn test_pagination_serializes_camel_case() {
        let json = serde_json::to_value(PageQuery::default().paginate(25)).unwrap();
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["page"], 1);
    }
}
