use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use super::domain::{ProfileUpdate, RegistrationForm, User};
use super::repository::UserRepository;
use crate::workflows::clock::{Clock, SystemClock};
use crate::workflows::donations::domain::Donation;
use crate::workflows::donations::repository::DonationRepository;
use crate::workflows::identity::UserId;
use crate::workflows::lifecycle::domain::{Adoption, Reservation};
use crate::workflows::lifecycle::store::LifecycleStore;
use crate::workflows::repository::RepositoryError;
use crate::workflows::validation::{self, FieldError};

pub const MIN_PASSWORD_LENGTH: usize = 8;

static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_user_id() -> UserId {
    UserId(USER_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Hands a new visitor's password to the external identity provider.
pub trait IdentityProvider: Send + Sync {
    fn enroll(&self, user: &User, password: &str) -> Result<(), EnrollmentError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Records a visitor created elsewhere in the shelter, shown on their profile.
pub trait ActivitySource: Send + Sync {
    fn reservations(&self, user_id: UserId) -> Result<Vec<Reservation>, RepositoryError>;
    fn adoptions(&self, user_id: UserId) -> Result<Vec<Adoption>, RepositoryError>;
    fn donations(&self, user_id: UserId) -> Result<Vec<Donation>, RepositoryError>;
}

/// Activity read straight from the lifecycle store and the donation ledger.
pub struct ShelterActivity<S, D> {
    lifecycle: Arc<S>,
    donations: Arc<D>,
}

impl<S, D> ShelterActivity<S, D> {
    pub fn new(lifecycle: Arc<S>, donations: Arc<D>) -> Self {
        Self {
            lifecycle,
            donations,
        }
    }
}

impl<S, D> ActivitySource for ShelterActivity<S, D>
where
    S: LifecycleStore,
    D: DonationRepository,
{
    fn reservations(&self, user_id: UserId) -> Result<Vec<Reservation>, RepositoryError> {
        self.lifecycle.read(|tx| tx.reservations_for_user(user_id))
    }

    fn adoptions(&self, user_id: UserId) -> Result<Vec<Adoption>, RepositoryError> {
        self.lifecycle.read(|tx| tx.adoptions_for_user(user_id))
    }

    fn donations(&self, user_id: UserId) -> Result<Vec<Donation>, RepositoryError> {
        self.donations.for_user(user_id)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub user: User,
    pub display_name: String,
    pub reservations: Vec<Reservation>,
    pub adoptions: Vec<Adoption>,
    pub donations: Vec<Donation>,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("validation failed: {0}")]
    Validation(#[from] FieldError),
    #[error("user {0} not found")]
    NotFound(UserId),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Enrollment(#[from] EnrollmentError),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AccountError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Conflict => {
                Self::Conflict("username or e-mail already registered".to_string())
            }
            other => Self::Repository(other),
        }
    }
}

fn optional_phone(value: &str) -> Result<String, FieldError> {
    if value.trim().is_empty() {
        Ok(String::new())
    } else {
        validation::phone("phone", value)
    }
}

/// Visitor registration and profile maintenance.
pub struct AccountService<R, P> {
    users: Arc<R>,
    identity: Arc<P>,
    activity: Arc<dyn ActivitySource>,
    clock: Arc<dyn Clock>,
}

impl<R, P> AccountService<R, P>
where
    R: UserRepository + 'static,
    P: IdentityProvider + 'static,
{
    pub fn new(users: Arc<R>, identity: Arc<P>, activity: Arc<dyn ActivitySource>) -> Self {
        Self::with_clock(users, identity, activity, Arc::new(SystemClock))
    }

    pub fn with_clock(
        users: Arc<R>,
        identity: Arc<P>,
        activity: Arc<dyn ActivitySource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            identity,
            activity,
            clock,
        }
    }

    pub fn register(&self, form: RegistrationForm) -> Result<User, AccountError> {
        let username = validation::required_text("username", &form.username, 150)?;
        if username.chars().any(char::is_whitespace) {
            return Err(FieldError::new("username", "must not contain spaces").into());
        }
        let email = validation::email("email", &form.email)?;
        let first_name = validation::optional_text("first_name", &form.first_name, 150)?;
        let last_name = validation::optional_text("last_name", &form.last_name, 150)?;
        let phone = optional_phone(&form.phone)?;
        if form.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(FieldError::new(
                "password",
                format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
            )
            .into());
        }
        if form.password != form.password_confirm {
            return Err(FieldError::new("password_confirm", "passwords do not match").into());
        }
        if self.users.find_by_username(&username)?.is_some() {
            return Err(FieldError::new("username", "this username is already taken").into());
        }
        if self.users.find_by_email(&email)?.is_some() {
            return Err(FieldError::new("email", "a user with this e-mail already exists").into());
        }

        let now = self.clock.now();
        let user = self.users.insert(User {
            id: next_user_id(),
            username,
            email,
            first_name,
            last_name,
            phone,
            date_of_birth: None,
            address: String::new(),
            is_verified: false,
            created_at: now,
            updated_at: now,
        })?;
        if let Err(error) = self.identity.enroll(&user, &form.password) {
            self.users.remove(user.id)?;
            tracing::warn!(
                user_id = user.id.0,
                error = %error,
                "enrollment failed, registration rolled back"
            );
            return Err(error.into());
        }

        tracing::info!(user_id = user.id.0, username = %user.username, "visitor registered");
        Ok(user)
    }

    pub fn user(&self, user_id: UserId) -> Result<User, AccountError> {
        self.users
            .fetch(user_id)?
            .ok_or(AccountError::NotFound(user_id))
    }

    /// The visitor with their reservations, adoptions and donations, newest first.
    pub fn profile(&self, user_id: UserId) -> Result<ProfileView, AccountError> {
        let user = self.user(user_id)?;
        Ok(ProfileView {
            display_name: user.display_name(),
            reservations: self.activity.reservations(user_id)?,
            adoptions: self.activity.adoptions(user_id)?,
            donations: self.activity.donations(user_id)?,
            user,
        })
    }

    pub fn update_profile(
        &self,
        user_id: UserId,
        changes: ProfileUpdate,
    ) -> Result<User, AccountError> {
        let mut user = self.user(user_id)?;

        if let Some(first_name) = changes.first_name {
            user.first_name = validation::optional_text("first_name", &first_name, 150)?;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = validation::optional_text("last_name", &last_name, 150)?;
        }
        if let Some(email) = changes.email {
            let email = validation::email("email", &email)?;
            let taken = self
                .users
                .find_by_email(&email)?
                .is_some_and(|other| other.id != user_id);
            if taken {
                return Err(
                    FieldError::new("email", "a user with this e-mail already exists").into(),
                );
            }
            user.email = email;
        }
        if let Some(phone) = changes.phone {
            user.phone = optional_phone(&phone)?;
        }
        if let Some(address) = changes.address {
            user.address = validation::optional_text("address", &address, 1000)?;
        }
        if let Some(date_of_birth) = changes.date_of_birth {
            if date_of_birth > self.clock.today() {
                return Err(FieldError::new("date_of_birth", "cannot be in the future").into());
            }
            user.date_of_birth = Some(date_of_birth);
        }

        user.updated_at = self.clock.now();
        self.users.update(user.clone())?;
        tracing::info!(user_id = user.id.0, "profile updated");
        Ok(user)
    }
}
