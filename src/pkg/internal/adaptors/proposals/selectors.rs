use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::pkg::internal::adaptors::proposals::spec::{
    ApprovalStatus, ProposalEntry, ProposalFilter, ProposalStatus, ProposalWithTeacher,
};
use crate::prelude::Result;

pub(crate) const PROPOSAL_COLUMNS: &str = "id, teacher_id, subject_title, description, approval_status, status, rejection_reason, created_at, updated_at";

pub struct ProposalSelector<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ProposalSelector<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ProposalSelector { pool }
    }

    pub async fn get_by_id(&mut self, id: i64) -> Result<Option<ProposalEntry>> {
        let row = sqlx::query_as::<_, ProposalEntry>(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM subject_proposals WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn active_for_teacher(&mut self, teacher_id: i64) -> Result<Option<ProposalEntry>> {
        let row = sqlx::query_as::<_, ProposalEntry>(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM subject_proposals
             WHERE teacher_id = $1 AND status <> 'archived'
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(teacher_id)
        .fetch_optional(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_for_teacher(&mut self, teacher_id: i64) -> Result<Vec<ProposalEntry>> {
        let rows = sqlx::query_as::<_, ProposalEntry>(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM subject_proposals
             WHERE teacher_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(teacher_id)
        .fetch_all(&mut *self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list(&mut self, filter: &ProposalFilter) -> Result<(Vec<ProposalWithTeacher>, i64)> {
        let pages = filter.pages();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM subject_proposals p");
        push_filters(&mut count, filter);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(&mut *self.pool)
            .await?;

        let mut qb = QueryBuilder::new(
            "SELECT p.id, p.teacher_id, u.full_name AS teacher_name, p.subject_title, p.description,
                    p.approval_status, p.status, p.rejection_reason, p.created_at
             FROM subject_proposals p
             JOIN users u ON u.id = p.teacher_id",
        );
        push_filters(&mut qb, filter);
        qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(pages.limit)
            .push(" OFFSET ")
            .push_bind(pages.offset());
        let rows = qb
            .build_query_as::<ProposalWithTeacher>()
            .fetch_all(&mut *self.pool)
            .await?;
        Ok((rows, total))
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProposalFilter) {
    let mut sep = " WHERE ";
    if let Some(approval) = filter.approval_status {
        qb.push(sep).push("p.approval_status = ").push_bind(approval);
        sep = " AND ";
    }
    if let Some(status) = filter.status {
        qb.push(sep).push("p.status = ").push_bind(status);
    }
}

/// Students only ever browse subjects they can still pick.
pub fn student_view(filter: ProposalFilter) -> ProposalFilter {
    ProposalFilter {
        approval_status: Some(ApprovalStatus::Approved),
        status: Some(ProposalStatus::Available),
        ..filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_view_overrides_filters() {
        let filter = student_view(ProposalFilter {
            approval_status: Some(ApprovalStatus::Rejected),
            status: None,
            page: Some(2),
            limit: None,
        });
        assert_eq!(filter.approval_status, Some(ApprovalStatus::Approved));
        assert_eq!(filter.status, Some(ProposalStatus::Available));
        assert_eq!(filter.page, Some(2));

        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM subject_proposals p");
        push_filters(&mut qb, &filter);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM subject_proposals p WHERE p.approval_status = $1 AND p.status = $2"
        );
    }
}
