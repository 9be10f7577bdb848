use serde::Serialize;
use sqlx::{FromRow, PgConnection};

use crate::{
    pkg::internal::{
        adaptors::{
            internships::{
                mutators::InternshipMutator,
                selectors::InternshipSelector,
                spec::{InternshipRequestEntry, RequestStatus, RequestStatusInput},
            },
            proposals::{
                mutators::ProposalMutator,
                selectors::ProposalSelector,
                spec::{ApprovalStatus, ProposalEntry, ProposalStatus},
            },
        },
        auth::{Role, User},
    },
    prelude::{AppError, Result},
};

/// Maximum approved load a supervisor may hold. `max_paired` is counted in
/// students (a paired request brings two), `max_solo` in solo requests;
/// `max_solo = None` leaves solo assignments uncapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityRule {
    pub max_paired: i64,
    pub max_solo: Option<i64>,
}

/// `paired_count` is the number of students on approved paired requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct SupervisorLoad {
    pub solo_count: i64,
    pub paired_count: i64,
}

impl CapacityRule {
    pub fn check(&self, load: SupervisorLoad, paired: bool) -> Result<()> {
        if paired {
            // a paired request brings two students
            if load.paired_count + 2 > self.max_paired {
                return Err(AppError::Validation(format!(
                    "supervisor already has {} paired students (limit {})",
                    load.paired_count, self.max_paired
                )));
            }
        } else if let Some(max_solo) = self.max_solo {
            if load.solo_count >= max_solo {
                return Err(AppError::Validation(format!(
                    "supervisor already has {} solo assignments (limit {})",
                    load.solo_count, max_solo
                )));
            }
        }
        Ok(())
    }
}

/// Supervisor stored with a request after a status change. Only approved
/// requests keep a supervisor.
pub fn resolve_supervisor(
    status: RequestStatus,
    requested: Option<i64>,
    current: Option<i64>,
) -> Option<i64> {
    match status {
        RequestStatus::Approved => requested.or(current),
        RequestStatus::Pending | RequestStatus::Rejected => None,
    }
}

/// Whether a status change turns an inactive (rejected) request active again.
pub fn reopens(previous: RequestStatus, next: RequestStatus) -> bool {
    previous == RequestStatus::Rejected && next != RequestStatus::Rejected
}

fn normalized(reason: Option<&str>) -> Option<String> {
    reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}

pub fn request_reason(status: RequestStatus, reason: Option<&str>) -> Option<String> {
    match status {
        RequestStatus::Rejected => normalized(reason),
        RequestStatus::Pending | RequestStatus::Approved => None,
    }
}

pub fn proposal_reason(status: ApprovalStatus, reason: Option<&str>) -> Result<Option<String>> {
    match status {
        ApprovalStatus::Rejected => normalized(reason).map(Some).ok_or_else(|| {
            AppError::Validation("a reason is required to reject a proposal".into())
        }),
        ApprovalStatus::Pending | ApprovalStatus::Approved => Ok(None),
    }
}

pub fn ensure_reviewable(proposal: &ProposalEntry) -> Result<()> {
    match proposal.status {
        ProposalStatus::Archived => Err(AppError::Validation(
            "archived proposals cannot be reviewed".into(),
        )),
        ProposalStatus::Available | ProposalStatus::Assigned => Ok(()),
    }
}

pub fn ensure_assignable(proposal: &ProposalEntry) -> Result<()> {
    if proposal.approval_status != ApprovalStatus::Approved {
        return Err(AppError::Validation(
            "only approved proposals can be assigned".into(),
        ));
    }
    match proposal.status {
        ProposalStatus::Available => Ok(()),
        ProposalStatus::Assigned => Err(AppError::Validation(
            "proposal is already assigned".into(),
        )),
        ProposalStatus::Archived => Err(AppError::Validation(
            "archived proposals cannot be assigned".into(),
        )),
    }
}

/// Whether archiving needs a write. Archiving twice is a no-op.
pub fn needs_archiving(proposal: &ProposalEntry, teacher_id: i64) -> Result<bool> {
    if proposal.teacher_id != teacher_id {
        return Err(AppError::Forbidden(
            "you can only archive your own proposals".into(),
        ));
    }
    Ok(proposal.status != ProposalStatus::Archived)
}

#[derive(Debug)]
pub struct RequestDecision {
    pub previous: InternshipRequestEntry,
    pub request: InternshipRequestEntry,
    pub supervisor: Option<User>,
}

impl RequestDecision {
    pub fn status_changed(&self) -> bool {
        self.previous.status != self.request.status
    }

    pub fn supervisor_changed(&self) -> bool {
        self.previous.supervisor_id != self.request.supervisor_id
    }
}

/// Administrator decisions on requests and proposals. Callers run it inside
/// a transaction: the capacity check locks the supervisor row so concurrent
/// approvals for the same supervisor are serialized.
pub struct ApprovalEngine<'a> {
    conn: &'a mut PgConnection,
    capacity: CapacityRule,
}

impl<'a> ApprovalEngine<'a> {
    pub fn new(conn: &'a mut PgConnection, capacity: CapacityRule) -> Self {
        ApprovalEngine { conn, capacity }
    }

    pub async fn set_request_status(
        &mut self,
        request_id: i64,
        input: &RequestStatusInput,
    ) -> Result<RequestDecision> {
        let previous = InternshipSelector::new(&mut *self.conn)
            .get_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::not_found("internship request", request_id))?;
        if reopens(previous.status, input.status) {
            self.ensure_no_other_active(&previous).await?;
        }

        let supervisor_id =
            resolve_supervisor(input.status, input.supervisor_id, previous.supervisor_id);
        let supervisor = match supervisor_id {
            Some(supervisor_id) => Some(
                self.reserve_supervisor(supervisor_id, &previous)
                    .await?,
            ),
            None => None,
        };

        let reason = request_reason(input.status, input.reason.as_deref());
        let request = InternshipMutator::new(&mut *self.conn)
            .update_status(request_id, input.status, supervisor_id, reason.as_deref())
            .await?;
        tracing::info!(
            "internship request {} moved {:?} -> {:?}, supervisor {:?}",
            request_id,
            previous.status,
            request.status,
            request.supervisor_id
        );
        Ok(RequestDecision {
            previous,
            request,
            supervisor,
        })
    }

    /// A student holds at most one active request; re-opening a rejected one
    /// must not create a second.
    async fn ensure_no_other_active(&mut self, request: &InternshipRequestEntry) -> Result<()> {
        let students = request.students();
        User::lock_many(&mut *self.conn, &students).await?;
        for student_id in students {
            if let Some(existing) = InternshipSelector::new(&mut *self.conn)
                .other_active_for_student(student_id, request.id)
                .await?
            {
                return Err(AppError::conflict(
                    format!("student {student_id} already has an active internship request"),
                    existing.id,
                ));
            }
        }
        Ok(())
    }

    async fn reserve_supervisor(
        &mut self,
        supervisor_id: i64,
        request: &InternshipRequestEntry,
    ) -> Result<User> {
        let supervisor = User::lock_many(&mut *self.conn, &[supervisor_id])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found("supervisor", supervisor_id))?;
        if supervisor.role != Role::Teacher {
            return Err(AppError::Validation("supervisor must be a teacher".into()));
        }
        let load = InternshipSelector::new(&mut *self.conn)
            .supervisor_load(supervisor_id, request.id)
            .await?;
        tracing::debug!(
            "supervisor {} load: {:?}, paired request: {}",
            supervisor_id,
            load,
            request.has_partner
        );
        self.capacity.check(load, request.has_partner)?;
        Ok(supervisor)
    }

    pub async fn set_approval_status(
        &mut self,
        proposal_id: i64,
        status: ApprovalStatus,
        reason: Option<&str>,
    ) -> Result<ProposalEntry> {
        let current = self.proposal(proposal_id).await?;
        ensure_reviewable(&current)?;
        let reason = proposal_reason(status, reason)?;
        let proposal = ProposalMutator::new(&mut *self.conn)
            .set_approval(proposal_id, status, reason.as_deref())
            .await?;
        tracing::info!(
            "proposal {} approval {:?} -> {:?}",
            proposal_id,
            current.approval_status,
            proposal.approval_status
        );
        Ok(proposal)
    }

    pub async fn assign_proposal(&mut self, proposal_id: i64) -> Result<ProposalEntry> {
        let current = self.proposal(proposal_id).await?;
        ensure_assignable(&current)?;
        let proposal = ProposalMutator::new(&mut *self.conn)
            .set_status(proposal_id, ProposalStatus::Assigned)
            .await?;
        tracing::info!("proposal {} assigned", proposal_id);
        Ok(proposal)
    }

    pub async fn archive_proposal(&mut self, proposal_id: i64, teacher_id: i64) -> Result<ProposalEntry> {
        let current = self.proposal(proposal_id).await?;
        if !needs_archiving(&current, teacher_id)? {
            return Ok(current);
        }
        let proposal = ProposalMutator::new(&mut *self.conn)
            .set_status(proposal_id, ProposalStatus::Archived)
            .await?;
        tracing::info!("proposal {} archived by teacher {}", proposal_id, teacher_id);
        Ok(proposal)
    }

    async fn proposal(&mut self, proposal_id: i64) -> Result<ProposalEntry> {
        ProposalSelector::new(&mut *self.conn)
            .get_by_id(proposal_id)
            .await?
            .ok_or_else(|| AppError::not_found("proposal", proposal_id))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tracing_test::traced_test;

    use super::*;
    use crate::pkg::{
        internal::{fixtures, intake::Intake},
        server::state::{AppState, GetTxn},
    };

    const RULE: CapacityRule = CapacityRule {
        max_paired: 2,
        max_solo: None,
    };

    fn proposal(teacher_id: i64, approval: ApprovalStatus, status: ProposalStatus) -> ProposalEntry {
        ProposalEntry {
            id: 1,
            teacher_id,
            subject_title: "App IoT".into(),
            description: String::new(),
            approval_status: approval,
            status,
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_paired_cap_blocks_second_pair() {
        let load = SupervisorLoad {
            solo_count: 3,
            paired_count: 0,
        };
        assert!(RULE.check(load, true).is_ok());

        let full = SupervisorLoad {
            solo_count: 0,
            paired_count: 2,
        };
        let err = RULE.check(full, true).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("limit 2"));
    }

    #[test]
    fn test_odd_paired_cap_is_not_exceeded() {
        let rule = CapacityRule {
            max_paired: 3,
            max_solo: None,
        };
        let empty = SupervisorLoad::default();
        assert!(rule.check(empty, true).is_ok());
        let one_pair = SupervisorLoad {
            solo_count: 0,
            paired_count: 2,
        };
        let err = rule.check(one_pair, true).unwrap_err();
        assert!(err.to_string().contains("limit 3"));
        // solo requests are not affected by the paired cap
        assert!(rule.check(one_pair, false).is_ok());
    }

    #[test]
    fn test_reopening_rejected_requests() {
        assert!(reopens(RequestStatus::Rejected, RequestStatus::Approved));
        assert!(reopens(RequestStatus::Rejected, RequestStatus::Pending));
        assert!(!reopens(RequestStatus::Rejected, RequestStatus::Rejected));
        assert!(!reopens(RequestStatus::Pending, RequestStatus::Approved));
        assert!(!reopens(RequestStatus::Approved, RequestStatus::Pending));
    }

    #[test]
    fn test_solo_and_paired_are_counted_apart() {
        let load = SupervisorLoad {
            solo_count: 9,
            paired_count: 2,
        };
        // paired cap reached, but solo is uncapped
        assert!(RULE.check(load, false).is_ok());

        let capped = CapacityRule {
            max_paired: 2,
            max_solo: Some(3),
        };
        let load = SupervisorLoad {
            solo_count: 3,
            paired_count: 0,
        };
        assert!(capped.check(load, false).is_err());
        assert!(capped.check(load, true).is_ok());
    }

    #[test]
    fn test_supervisor_only_kept_on_approval() {
        assert_eq!(
            resolve_supervisor(RequestStatus::Approved, Some(4), Some(3)),
            Some(4)
        );
        assert_eq!(
            resolve_supervisor(RequestStatus::Approved, None, Some(3)),
            Some(3)
        );
        assert_eq!(resolve_supervisor(RequestStatus::Rejected, Some(4), Some(3)), None);
        assert_eq!(resolve_supervisor(RequestStatus::Pending, None, Some(3)), None);
    }

    #[test]
    fn test_reasons() {
        assert!(proposal_reason(ApprovalStatus::Rejected, None).is_err());
        assert!(proposal_reason(ApprovalStatus::Rejected, Some("  ")).is_err());
        assert_eq!(
            proposal_reason(ApprovalStatus::Rejected, Some(" too vague ")).unwrap(),
            Some("too vague".to_string())
        );
        assert_eq!(
            proposal_reason(ApprovalStatus::Approved, Some("ignored")).unwrap(),
            None
        );
        assert_eq!(request_reason(RequestStatus::Approved, Some("x")), None);
        assert_eq!(
            request_reason(RequestStatus::Rejected, Some("no host company")),
            Some("no host company".to_string())
        );
    }

    #[test]
    fn test_proposal_lifecycle_guards() {
        let archived = proposal(1, ApprovalStatus::Approved, ProposalStatus::Archived);
        assert!(ensure_reviewable(&archived).is_err());
        assert!(ensure_assignable(&archived).is_err());
        assert!(!needs_archiving(&archived, 1).unwrap());

        let pending = proposal(1, ApprovalStatus::Pending, ProposalStatus::Available);
        assert!(ensure_reviewable(&pending).is_ok());
        assert!(ensure_assignable(&pending).is_err());
        assert!(needs_archiving(&pending, 1).unwrap());
        assert!(matches!(
            needs_archiving(&pending, 2),
            Err(AppError::Forbidden(_))
        ));

        let approved = proposal(1, ApprovalStatus::Approved, ProposalStatus::Available);
        assert!(ensure_assignable(&approved).is_ok());
        let assigned = proposal(1, ApprovalStatus::Approved, ProposalStatus::Assigned);
        assert!(ensure_assignable(&assigned).is_err());
    }

    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a migrated postgres database"]
    async fn test_unknown_request_is_not_found() -> Result<()> {
        let state = AppState::new()?;
        let mut tx = state.db_pool.begin_txn().await?;
        let input = RequestStatusInput {
            status: RequestStatus::Approved,
            supervisor_id: None,
            reason: None,
        };
        let err = ApprovalEngine::new(&mut tx, state.capacity)
            .set_request_status(i64::MAX, &input)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        Ok(())
    }

    fn decide(status: RequestStatus, supervisor_id: Option<i64>) -> RequestStatusInput {
        RequestStatusInput {
            status,
            supervisor_id,
            reason: None,
        }
    }

    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a migrated postgres database"]
    async fn test_reopening_rejected_request_keeps_one_active() -> Result<()> {
        let state = AppState::new()?;
        let mut tx = state.db_pool.begin_txn().await?;
        let student = fixtures::user(&mut tx, Role::Student).await?;
        let teacher = fixtures::user(&mut tx, Role::Teacher).await?;

        let rejected = Intake::new(&mut tx)
            .submit_request(student.id, &fixtures::request_input(None))
            .await?;
        ApprovalEngine::new(&mut tx, RULE)
            .set_request_status(rejected.id, &decide(RequestStatus::Rejected, None))
            .await?;
        let current = Intake::new(&mut tx)
            .submit_request(student.id, &fixtures::request_input(None))
            .await?;

        let err = ApprovalEngine::new(&mut tx, RULE)
            .set_request_status(rejected.id, &decide(RequestStatus::Approved, Some(teacher.id)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Conflict { existing_id: Some(id), .. } if id == current.id
        ));

        // once the newer request is rejected the old one may come back
        ApprovalEngine::new(&mut tx, RULE)
            .set_request_status(current.id, &decide(RequestStatus::Rejected, None))
            .await?;
        let reopened = ApprovalEngine::new(&mut tx, RULE)
            .set_request_status(rejected.id, &decide(RequestStatus::Pending, None))
            .await?;
        assert_eq!(reopened.request.status, RequestStatus::Pending);
        Ok(())
    }

    #[traced_test]
    #[tokio::test]
    #[ignore = "requires a migrated postgres database"]
    async fn test_paired_capacity_is_enforced() -> Result<()> {
        let state = AppState::new()?;
        let mut tx = state.db_pool.begin_txn().await?;
        let teacher = fixtures::user(&mut tx, Role::Teacher).await?;
        let mut pairs = Vec::new();
        for _ in 0..2 {
            let owner = fixtures::user(&mut tx, Role::Student).await?;
            let partner = fixtures::user(&mut tx, Role::Student).await?;
            let request = Intake::new(&mut tx)
                .submit_request(owner.id, &fixtures::request_input(Some(partner.id)))
                .await?;
            pairs.push(request);
        }
        let rule = CapacityRule {
            max_paired: 3,
            max_solo: None,
        };

        let decision = ApprovalEngine::new(&mut tx, rule)
            .set_request_status(pairs[0].id, &decide(RequestStatus::Approved, Some(teacher.id)))
            .await?;
        assert!(decision.status_changed());
        assert_eq!(decision.request.supervisor_id, Some(teacher.id));

        let err = ApprovalEngine::new(&mut tx, rule)
            .set_request_status(pairs[1].id, &decide(RequestStatus::Approved, Some(teacher.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(err.to_string().contains("limit 3"));

        // re-deciding the approved pair does not count it against itself
        ApprovalEngine::new(&mut tx, rule)
            .set_request_status(pairs[0].id, &decide(RequestStatus::Approved, None))
            .await?;
        Ok(())
    }
}
