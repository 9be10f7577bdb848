//! Rows for the database-backed tests. Callers work inside a transaction
//! they never commit, so nothing outlives the test.

use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    pkg::internal::{
        adaptors::{
            internships::spec::CreateRequestInput,
            offers::{
                mutators::OfferMutator,
                spec::{CreateOfferInput, OfferEntry, OfferType},
            },
        },
        auth::{Role, User},
    },
    prelude::Result,
};

pub async fn user(conn: &mut PgConnection, role: Role) -> Result<User> {
    let tag = Uuid::new_v4().simple().to_string();
    let user = sqlx::query_as::<_, User>(
        "insert into users (email, full_name, role) values ($1, $2, $3)
         returning id, email, full_name, role",
    )
    .bind(format!("{tag}@example.org"))
    .bind(format!("Test {tag}"))
    .bind(role)
    .fetch_one(&mut *conn)
    .await?;
    Ok(user)
}

pub async fn offer(conn: &mut PgConnection, created_by: i64) -> Result<OfferEntry> {
    OfferMutator::new(conn)
        .create(
            &CreateOfferInput {
                title: "Backend intern".into(),
                company: "Acme".into(),
                description: String::new(),
                location: None,
                offer_type: OfferType::Pfe,
                status: None,
                deadline: None,
            },
            created_by,
        )
        .await
}

pub fn request_input(partner_id: Option<i64>) -> CreateRequestInput {
    CreateRequestInput {
        partner_id,
        subject_title: Some("App IoT".into()),
        host_company: None,
        internship_type: OfferType::Pfe,
        start_date: None,
        end_date: None,
    }
}
