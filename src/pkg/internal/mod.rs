pub mod adaptors;
pub mod auth;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod intake;
pub mod notify;
pub mod pagination;
pub mod validation;
pub mod workflow;
