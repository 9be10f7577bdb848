use crate::{
    pkg::{
        internal::auth::{AuthToken, User},
        server::state::AppState,
    },
    prelude::{AppError, Result},
};

pub async fn issue(email: &str) -> Result<()> {
    let state = AppState::new()?;
    let user = User::retrieve(&state, email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no user registered with {email}")))?;
    let token = AuthToken::issue(&state, &user).await?;
    tracing::info!("issued token for {} ({:?})", &user.email, user.role);
    println!("{}", token.token);
    Ok(())
}
