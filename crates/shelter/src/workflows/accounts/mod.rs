//! Visitor accounts. Sign-in itself happens at the identity provider; this
//! module keeps the profile data the shelter needs.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{ProfileUpdate, RegistrationForm, User};
pub use repository::{InMemoryUserRepository, UserRepository};
pub use router::account_router;
pub use service::{
    AccountError, AccountService, ActivitySource, EnrollmentError, IdentityProvider, ProfileView,
    ShelterActivity, MIN_PASSWORD_LENGTH,
};
