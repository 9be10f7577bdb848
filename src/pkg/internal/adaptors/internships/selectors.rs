use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::pkg::internal::adaptors::internships::spec::{
    InternshipRequestEntry, InternshipRequestRow, RequestFilter, SupervisorLoadEntry,
};
use crate::pkg::internal::workflow::SupervisorLoad;
use crate::prelude::Result;

pub(crate) const REQUEST_COLUMNS: &str = "id, student_id, partner_id, has_partner, status, supervisor_id, subject_title, host_company, internship_type, start_date, end_date, rejection_reason, created_at, updated_at";

pub struct InternshipSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> InternshipSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        InternshipSelector { pool }
    }

    pub async fn get_by_id(&mut self, id: i64) -> Result<Option<InternshipRequestEntry>> {
        let row = sqlx::query_as::<_, InternshipRequestEntry>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM internship_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    /// Pending or approved request the student owns or is partner on.
    pub async fn active_for_student(&mut self, student_id: i64) -> Result<Option<InternshipRequestEntry>> {
        let row = sqlx::query_as::<_, InternshipRequestEntry>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM internship_requests
             WHERE (student_id = $1 OR partner_id = $1) AND status IN ('pending', 'approved')
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(student_id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    /// Like `active_for_student`, ignoring the request `exclude`.
    pub async fn other_active_for_student(
        &mut self,
        student_id: i64,
        exclude: i64,
    ) -> Result<Option<InternshipRequestEntry>> {
        let row = sqlx::query_as::<_, InternshipRequestEntry>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM internship_requests
             WHERE (student_id = $1 OR partner_id = $1) AND status IN ('pending', 'approved')
               AND id <> $2
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(student_id)
        .bind(exclude)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn latest_for_student(&mut self, student_id: i64) -> Result<Option<InternshipRequestEntry>> {
        let row = sqlx::query_as::<_, InternshipRequestEntry>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM internship_requests
             WHERE student_id = $1 OR partner_id = $1
             ORDER BY created_at DESC, id DESC LIMIT 1"
        ))
        .bind(student_id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list(&mut self, filter: &RequestFilter) -> Result<(Vec<InternshipRequestRow>, i64)> {
        let pages = filter.pages();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM internship_requests r");
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *self.pool)
            .await?;

        let mut qb = QueryBuilder::new(
            "SELECT r.id, r.student_id, s.full_name AS student_name, r.partner_id, p.full_name AS partner_name,
                    r.has_partner, r.status, r.supervisor_id, t.full_name AS supervisor_name,
                    r.subject_title, r.host_company, r.internship_type, r.created_at
             FROM internship_requests r
             JOIN users s ON s.id = r.student_id
             LEFT JOIN users p ON p.id = r.partner_id
             LEFT JOIN users t ON t.id = r.supervisor_id",
        );
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
            .push_bind(pages.limit)
            .push(" OFFSET ")
            .push_bind(pages.offset());
        let rows = qb
            .build_query_as::<InternshipRequestRow>()
            .fetch_all(&mut *self.pool)
            .await?;
        Ok((rows, total))
    }

    /// Approved assignments of a supervisor, leaving out `exclude_request`
    /// so that re-deciding a request does not count it against itself.
    pub async fn supervisor_load(&mut self, supervisor_id: i64, exclude_request: i64) -> Result<SupervisorLoad> {
        let load = sqlx::query_as::<_, SupervisorLoad>(
            "SELECT COUNT(*) FILTER (WHERE NOT has_partner) AS solo_count,
                    2 * COUNT(*) FILTER (WHERE has_partner) AS paired_count
             FROM internship_requests
             WHERE supervisor_id = $1 AND status = 'approved' AND id <> $2",
        )
        .bind(supervisor_id)
        .bind(exclude_request)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(load)
    }

    pub async fn all_loads(&mut self) -> Result<Vec<SupervisorLoadEntry>> {
        let rows = sqlx::query_as::<_, SupervisorLoadEntry>(
            "SELECT supervisor_id, full_name, email, solo_count, paired_count
             FROM supervisor_load ORDER BY full_name",
        )
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &RequestFilter) {
    if let Some(status) = filter.status {
        qb.push(" WHERE r.status = ").push_bind(status);
    }
}
