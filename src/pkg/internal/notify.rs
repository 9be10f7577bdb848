use sqlx::PgPool;

use crate::pkg::internal::adaptors::{
    applications::spec::{ApplicationDecision, ApplicationStatus},
    internships::spec::{InternshipRequestEntry, RequestStatus},
    notifications::{mutators::NotificationMutator, spec::NewNotification},
    proposals::spec::{ApprovalStatus, ProposalEntry},
};
use crate::pkg::internal::auth::User;

pub fn application_decided(decision: &ApplicationDecision) -> Option<NewNotification> {
    let (title, verb) = match decision.status {
        ApplicationStatus::Accepted => ("Application accepted", "accepted"),
        ApplicationStatus::Rejected => ("Application rejected", "rejected"),
        ApplicationStatus::Pending => return None,
    };
    Some(NewNotification {
        user_id: decision.student_id,
        title: title.into(),
        body: format!(
            "Your application to \"{}\" was {verb}.",
            &decision.offer_title
        ),
        link_url: Some(format!("/offers/{}", decision.offer_id)),
    })
}

/// One notification per student on the request (owner and partner).
pub fn request_decided(request: &InternshipRequestEntry) -> Vec<NewNotification> {
    let (title, body) = match request.status {
        RequestStatus::Approved => (
            "Internship request approved",
            "Your internship request was approved.".to_string(),
        ),
        RequestStatus::Rejected => (
            "Internship request rejected",
            match &request.rejection_reason {
                Some(reason) => format!("Your internship request was rejected: {reason}"),
                None => "Your internship request was rejected.".to_string(),
            },
        ),
        RequestStatus::Pending => return vec![],
    };
    request
        .students()
        .into_iter()
        .map(|user_id| NewNotification {
            user_id,
            title: title.into(),
            body: body.clone(),
            link_url: Some("/internships/mine".into()),
        })
        .collect()
}

pub fn supervisor_assigned(supervisor: &User, request: &InternshipRequestEntry) -> NewNotification {
    let subject = request
        .subject_title
        .as_deref()
        .unwrap_or("an internship request");
    let who = if request.has_partner {
        "a pair of students"
    } else {
        "a student"
    };
    NewNotification {
        user_id: supervisor.id,
        title: "New supervision".into(),
        body: format!("You now supervise {who} on \"{subject}\"."),
        link_url: Some(format!("/internships/{}", request.id)),
    }
}

pub fn proposal_decided(proposal: &ProposalEntry) -> Option<NewNotification> {
    let body = match proposal.approval_status {
        ApprovalStatus::Approved => format!(
            "Your proposal \"{}\" was approved.",
            &proposal.subject_title
        ),
        ApprovalStatus::Rejected => format!(
            "Your proposal \"{}\" was rejected: {}",
            &proposal.subject_title,
            proposal.rejection_reason.as_deref().unwrap_or("no reason given")
        ),
        ApprovalStatus::Pending => return None,
    };
    Some(NewNotification {
        user_id: proposal.teacher_id,
        title: "Proposal reviewed".into(),
        body,
        link_url: Some("/proposals/mine".into()),
    })
}

/// Inserts notifications one by one. Failures are logged and swallowed:
/// the operation that triggered them has already been committed.
pub async fn dispatch(pool: &PgPool, notifications: Vec<NewNotification>) -> usize {
    if notifications.is_empty() {
        return 0;
    }
    let mut conn = match pool.acquire().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!(
                "dropping {} notifications, no connection: {}",
                notifications.len(),
                e
            );
            return 0;
        }
    };
    let mut sent = 0;
    for notification in &notifications {
        match NotificationMutator::new(&mut conn).create(notification).await {
            Ok(_) => sent += 1,
            Err(e) => tracing::warn!(
                "could not notify user {}: {}",
                notification.user_id,
                e
            ),
        }
    }
    tracing::debug!("{} of {} notifications stored", sent, notifications.len());
    sent
}
