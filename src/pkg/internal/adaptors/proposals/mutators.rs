use sqlx::PgConnection;

use crate::pkg::internal::adaptors::proposals::selectors::PROPOSAL_COLUMNS;
use crate::pkg::internal::adaptors::proposals::spec::{
    ApprovalStatus, CreateProposalInput, ProposalEntry, ProposalStatus,
};
use crate::prelude::Result;

pub struct ProposalMutator<'a> {
    pool: &'a mut PgConnection,
}

impl<'a> ProposalMutator<'a> {
    pub fn new(pool: &'a mut PgConnection) -> Self {
        ProposalMutator { pool }
    }

    pub async fn create(&mut self, teacher_id: i64, proposal: &CreateProposalInput) -> Result<ProposalEntry> {
        let row = sqlx::query_as::<_, ProposalEntry>(&format!(
            r#"
            INSERT INTO subject_proposals (teacher_id, subject_title, description)
            VALUES ($1, $2, $3)
            RETURNING {PROPOSAL_COLUMNS}
            "#
        ))
        .bind(teacher_id)
        .bind(proposal.subject_title.trim())
        .bind(&proposal.description)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn set_approval(
        &mut self,
        id: i64,
        approval: ApprovalStatus,
        reason: Option<&str>,
    ) -> Result<ProposalEntry> {
        let row = sqlx::query_as::<_, ProposalEntry>(&format!(
            r#"
            UPDATE subject_proposals
            SET approval_status = $2, rejection_reason = $3, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {PROPOSAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(approval)
        .bind(reason)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }

    pub async fn set_status(&mut self, id: i64, status: ProposalStatus) -> Result<ProposalEntry> {
        let row = sqlx::query_as::<_, ProposalEntry>(&format!(
            r#"
            UPDATE subject_proposals
            SET status = $2, updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING {PROPOSAL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_one(&mut *self.pool)
        .await?;
        Ok(row)
    }
}
