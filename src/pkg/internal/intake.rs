use chrono::NaiveDate;
use sqlx::PgConnection;

use crate::{
    pkg::internal::{
        adaptors::{
            applications::{
                mutators::ApplicationMutator, selectors::ApplicationSelector,
                spec::ApplicationEntry,
            },
            internships::{
                mutators::InternshipMutator,
                selectors::InternshipSelector,
                spec::{CreateRequestInput, InternshipRequestEntry},
            },
            offers::{selectors::OfferSelector, spec::OfferStatus},
            proposals::{
                mutators::ProposalMutator,
                selectors::ProposalSelector,
                spec::{CreateProposalInput, ProposalEntry},
            },
        },
        auth::{Role, User},
    },
    prelude::{AppError, Result},
};

/// Checks a partner candidate against the requesting student.
pub fn check_partner(student_id: i64, partner: &User) -> Result<()> {
    if partner.id == student_id {
        return Err(AppError::Validation(
            "you cannot be your own partner".into(),
        ));
    }
    if partner.role != Role::Student {
        return Err(AppError::Validation("partner must be a student".into()));
    }
    Ok(())
}

/// Creation of student requests, teacher proposals and offer applications.
/// Each uniqueness check and its insert share the caller's transaction; the
/// rows of the people involved are locked first so two racing submissions
/// cannot both pass the check.
pub struct Intake<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> Intake<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Intake { conn }
    }

    pub async fn submit_request(
        &mut self,
        student_id: i64,
        input: &CreateRequestInput,
    ) -> Result<InternshipRequestEntry> {
        let mut ids = vec![student_id];
        if let Some(partner_id) = input.partner_id {
            if partner_id == student_id {
                return Err(AppError::Validation(
                    "you cannot be your own partner".into(),
                ));
            }
            ids.push(partner_id);
        }
        let locked = User::lock_many(&mut *self.conn, &ids).await?;
        if let Some(partner_id) = input.partner_id {
            let partner = locked
                .iter()
                .find(|u| u.id == partner_id)
                .ok_or_else(|| AppError::not_found("partner", partner_id))?;
            check_partner(student_id, partner)?;
        }

        for id in &ids {
            if let Some(existing) = InternshipSelector::new(&mut *self.conn)
                .active_for_student(*id)
                .await?
            {
                let message = if *id == student_id {
                    "you already have an active internship request".to_string()
                } else {
                    format!("student {id} already has an active internship request")
                };
                return Err(AppError::conflict(message, existing.id));
            }
        }

        let request = InternshipMutator::new(&mut *self.conn)
            .create(student_id, input)
            .await?;
        tracing::info!(
            "internship request {} submitted by student {} (partner {:?})",
            request.id,
            student_id,
            request.partner_id
        );
        Ok(request)
    }

    pub async fn submit_proposal(
        &mut self,
        teacher_id: i64,
        input: &CreateProposalInput,
    ) -> Result<ProposalEntry> {
        User::lock_many(&mut *self.conn, &[teacher_id]).await?;
        if let Some(existing) = ProposalSelector::new(&mut *self.conn)
            .active_for_teacher(teacher_id)
            .await?
        {
            return Err(AppError::conflict(
                "you already have an active proposal; archive it first",
                existing.id,
            ));
        }
        let proposal = ProposalMutator::new(&mut *self.conn)
            .create(teacher_id, input)
            .await?;
        tracing::info!(
            "proposal {} '{}' submitted by teacher {}",
            proposal.id,
            &proposal.subject_title,
            teacher_id
        );
        Ok(proposal)
    }

    pub async fn apply(
        &mut self,
        offer_id: i64,
        student_id: i64,
        cover_letter: Option<&str>,
        today: NaiveDate,
    ) -> Result<ApplicationEntry> {
        let offer = OfferSelector::new(&mut *self.conn)
            .get_by_id(offer_id)
            .await?
            .ok_or_else(|| AppError::not_found("offer", offer_id))?;
        if !offer.accepts_applications(today) {
            let reason = match offer.status {
                OfferStatus::Closed => "this offer is closed",
                OfferStatus::Open => "the application deadline has passed",
            };
            return Err(AppError::Validation(reason.into()));
        }

        match ApplicationMutator::new(&mut *self.conn)
            .create(offer_id, student_id, cover_letter)
            .await?
        {
            Some(application) => {
                tracing::info!(
                    "student {} applied to offer {} (application {})",
                    student_id,
                    offer_id,
                    application.id
                );
                Ok(application)
            }
            None => {
                let existing = ApplicationSelector::new(&mut *self.conn)
                    .find(offer_id, student_id)
                    .await?
                    .ok_or_else(|| AppError::Validation("could not apply to this offer".into()))?;
                Err(AppError::conflict(
                    "you already applied to this offer",
                    existing.id,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tracing_test::traced_test;

    use super::*;
    use crate::pkg::{
        internal::fixtures,
        server::state::{AppState, GetTxn},
    };

    fn user(id: i64, role: Role) -> User {
        User {
            id,
            email: format!("u{id}@example.org"),
            full_name: format!("U {id}"),
            role,
        }
    }

    #[test]
    fn test_partner_rules() {
        assert!(check_partner(1, &user(2, Role::Student)).is_ok());
        assert!(check_partner(1, &user(1, Role::Student)).is_err());
        assert!(check_partner(1, &user(2, Role::Teacher)).is_err());
    }

    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a migrated postgres database"]
    async fn test_unknown_offer_is_not_found() -> Result<()> {
        let state = AppState::new()?;
        let mut tx = state.db_pool.begin_txn().await?;
        let err = Intake::new(&mut tx)
            .apply(i64::MAX, 1, None, Utc::now().date_naive())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a migrated postgres database"]
    async fn test_second_application_conflicts_with_first() -> Result<()> {
        let state = AppState::new()?;
        let mut tx = state.db_pool.begin_txn().await?;
        let admin = fixtures::user(&mut tx, Role::Admin).await?;
        let student = fixtures::user(&mut tx, Role::Student).await?;
        let offer = fixtures::offer(&mut tx, admin.id).await?;
        let today = Utc::now().date_naive();

        let first = Intake::new(&mut tx)
            .apply(offer.id, student.id, Some("hello"), today)
            .await?;
        let err = Intake::new(&mut tx)
            .apply(offer.id, student.id, None, today)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Conflict { existing_id: Some(id), .. } if id == first.id
        ));
        assert_eq!(err.body()["existingId"], first.id);
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a migrated postgres database"]
    async fn test_second_active_proposal_conflicts_with_first() -> Result<()> {
        let state = AppState::new()?;
        let mut tx = state.db_pool.begin_txn().await?;
        let teacher = fixtures::user(&mut tx, Role::Teacher).await?;
        let input = CreateProposalInput {
            subject_title: "App IoT".into(),
            description: String::new(),
        };

        let first = Intake::new(&mut tx).submit_proposal(teacher.id, &input).await?;
        let err = Intake::new(&mut tx)
            .submit_proposal(teacher.id, &input)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Conflict { existing_id: Some(id), .. } if id == first.id
        ));
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a migrated postgres database"]
    async fn test_partner_with_active_request_blocks_submission() -> Result<()> {
        let state = AppState::new()?;
        let mut tx = state.db_pool.begin_txn().await?;
        let first = fixtures::user(&mut tx, Role::Student).await?;
        let second = fixtures::user(&mut tx, Role::Student).await?;

        let existing = Intake::new(&mut tx)
            .submit_request(second.id, &fixtures::request_input(None))
            .await?;
        let err = Intake::new(&mut tx)
            .submit_request(first.id, &fixtures::request_input(Some(second.id)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Conflict { existing_id: Some(id), .. } if id == existing.id
        ));
        Ok(())
    }
}
