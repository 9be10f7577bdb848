pub mod applications;
pub mod dashboard;
pub mod favorites;
pub mod internships;
pub mod notifications;
pub mod offers;
pub mod proposals;
