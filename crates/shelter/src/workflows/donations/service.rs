use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;

use super::domain::{Donation, DonationForm, DonationId, PaymentStatus};
use super::repository::DonationRepository;
use crate::workflows::accounts::repository::UserRepository;
use crate::workflows::clock::{Clock, SystemClock};
use crate::workflows::identity::{Actor, UserId};
use crate::workflows::repository::RepositoryError;
use crate::workflows::validation::{self, FieldError};

pub const TOP_DONOR_LIMIT: usize = 10;
pub const ANONYMOUS_DONOR: &str = "Anonymous";

/// Exclusive upper bound on a donation, from the ten-digit, two-place amount column.
const AMOUNT_CEILING: i64 = 100_000_000;

static DONATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_donation_id() -> DonationId {
    DonationId(DONATION_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, thiserror::Error)]
pub enum DonationError {
    #[error("validation failed: {0}")]
    Validation(#[from] FieldError),
    #[error("donation {0} not found")]
    NotFound(DonationId),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn validate_amount(amount: Decimal) -> Result<Decimal, FieldError> {
    if amount <= Decimal::ZERO {
        return Err(FieldError::new("amount", "must be greater than zero"));
    }
    let amount = amount.normalize();
    if amount.scale() > 2 {
        return Err(FieldError::new("amount", "at most two decimal places"));
    }
    if amount >= Decimal::from(AMOUNT_CEILING) {
        return Err(FieldError::new("amount", "is too large"));
    }
    let mut rounded = amount;
    rounded.rescale(2);
    Ok(rounded)
}

pub struct DonationService<D, U> {
    donations: Arc<D>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<D, U> DonationService<D, U>
where
    D: DonationRepository + 'static,
    U: UserRepository + 'static,
{
    pub fn new(donations: Arc<D>, users: Arc<U>) -> Self {
        Self::with_clock(donations, users, Arc::new(SystemClock))
    }

    pub fn with_clock(donations: Arc<D>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            donations,
            users,
            clock,
        }
    }

    /// Record a pledged donation. Payment settles later through
    /// [`Self::update_payment_status`].
    pub fn donate(&self, form: DonationForm, actor: &Actor) -> Result<Donation, DonationError> {
        let amount = validate_amount(form.amount)?;
        let message = validation::optional_text("message", &form.message, 2000)?;
        let (user_id, name, email) = if form.is_anonymous {
            (None, String::new(), String::new())
        } else {
            let name = validation::optional_text("name", &form.name, 100)?;
            let email = if form.email.trim().is_empty() {
                String::new()
            } else {
                validation::email("email", &form.email)?
            };
            (actor.user_id, name, email)
        };

        let now = self.clock.now();
        let donation = self.donations.insert(Donation {
            id: next_donation_id(),
            user_id,
            name,
            email,
            amount,
            message,
            is_anonymous: form.is_anonymous,
            payment_status: PaymentStatus::Pending,
            transaction_id: String::new(),
            created_at: now,
            updated_at: now,
        })?;

        tracing::info!(
            donation_id = donation.id.0,
            amount = %donation.amount,
            anonymous = donation.is_anonymous,
            "donation pledged"
        );
        Ok(donation)
    }

    /// Staff settlement of a batch of payments. The batch is checked and written
    /// under one repository lock, so an illegal transition changes nothing.
    pub fn update_payment_status(
        &self,
        donation_ids: &[DonationId],
        target: PaymentStatus,
        transaction_id: Option<&str>,
    ) -> Result<Vec<Donation>, DonationError> {
        if donation_ids.is_empty() {
            return Err(FieldError::new("donation_ids", "select at least one donation").into());
        }
        let transaction_id = match transaction_id {
            Some(raw) => Some(validation::required_text("transaction_id", raw, 100)?),
            None => None,
        };

        let now = self.clock.now();
        let updated = self.donations.update_batch(donation_ids, |id, stored| {
            let mut donation = stored.cloned().ok_or(DonationError::NotFound(id))?;
            if !donation.payment_status.can_become(target) {
                return Err(DonationError::Conflict(format!(
                    "donation {id} is {} and cannot become {}",
                    donation.payment_status.label(),
                    target.label()
                )));
            }
            donation.payment_status = target;
            if let Some(reference) = &transaction_id {
                donation.transaction_id = reference.clone();
            }
            donation.updated_at = now;
            Ok(donation)
        })?;

        tracing::info!(
            count = updated.len(),
            status = target.label(),
            "donation payments updated"
        );
        Ok(updated)
    }

    /// Distinct names of registered donors with a completed, public donation.
    pub fn top_donors(&self) -> Result<Vec<String>, DonationError> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for donation in self.donations.list()? {
            if donation.payment_status != PaymentStatus::Completed || donation.is_anonymous {
                continue;
            }
            let Some(user_id) = donation.user_id else {
                continue;
            };
            if !seen.insert(user_id) {
                continue;
            }
            if let Some(user) = self.users.fetch(user_id)? {
                let name = user.display_name();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            if names.len() == TOP_DONOR_LIMIT {
                break;
            }
        }
        Ok(names)
    }

    pub fn donor_name(&self, donation: &Donation) -> Result<String, DonationError> {
        if donation.is_anonymous {
            return Ok(ANONYMOUS_DONOR.to_string());
        }
        if let Some(user_id) = donation.user_id {
            if let Some(user) = self.users.fetch(user_id)? {
                let full_name = user.full_name();
                if !full_name.is_empty() {
                    return Ok(full_name);
                }
            }
        }
        if donation.name.is_empty() {
            Ok(ANONYMOUS_DONOR.to_string())
        } else {
            Ok(donation.name.clone())
        }
    }

    /// Staff listing, optionally narrowed to one payment status.
    pub fn donations(&self, status: Option<PaymentStatus>) -> Result<Vec<Donation>, DonationError> {
        Ok(self
            .donations
            .list()?
            .into_iter()
            .filter(|donation| status.map_or(true, |wanted| donation.payment_status == wanted))
            .collect())
    }

    pub fn donations_for_user(&self, user_id: UserId) -> Result<Vec<Donation>, DonationError> {
        Ok(self.donations.for_user(user_id)?)
    }
}
