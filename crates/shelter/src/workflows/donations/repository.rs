use std::collections::BTreeMap;
use std::sync::Mutex;

use super::domain::{Donation, DonationId};
use crate::workflows::identity::UserId;
use crate::workflows::repository::RepositoryError;

pub trait DonationRepository: Send + Sync {
    fn insert(&self, donation: Donation) -> Result<Donation, RepositoryError>;
    fn update(&self, donation: Donation) -> Result<(), RepositoryError>;
    fn fetch(&self, id: DonationId) -> Result<Option<Donation>, RepositoryError>;
    /// Every donation, newest first.
    fn list(&self) -> Result<Vec<Donation>, RepositoryError>;
    fn for_user(&self, user_id: UserId) -> Result<Vec<Donation>, RepositoryError>;
    /// Rewrites every listed donation under one lock. `apply` sees the stored
    /// record (or `None`); nothing is written unless every call succeeds.
    fn update_batch<E, F>(&self, ids: &[DonationId], apply: F) -> Result<Vec<Donation>, E>
    where
        F: FnMut(DonationId, Option<&Donation>) -> Result<Donation, E>,
        E: From<RepositoryError>;
}

#[derive(Debug, Default)]
pub struct InMemoryDonationRepository {
    donations: Mutex<BTreeMap<DonationId, Donation>>,
}

impl InMemoryDonationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_donations<T>(
        &self,
        work: impl FnOnce(&mut BTreeMap<DonationId, Donation>) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut guard = self.donations.lock().map_err(|_| {
            RepositoryError::Unavailable("donation table lock poisoned".to_string())
        })?;
        work(&mut guard)
    }
}

fn newest_first(mut donations: Vec<Donation>) -> Vec<Donation> {
    donations.sort_by(|left, right| {
        (right.created_at, right.id).cmp(&(left.created_at, left.id))
    });
    donations
}

impl DonationRepository for InMemoryDonationRepository {
    fn insert(&self, donation: Donation) -> Result<Donation, RepositoryError> {
        self.with_donations(|donations| {
            if donations.contains_key(&donation.id) {
                return Err(RepositoryError::Conflict);
            }
            donations.insert(donation.id, donation.clone());
            Ok(donation)
        })
    }

    fn update(&self, donation: Donation) -> Result<(), RepositoryError> {
        self.with_donations(|donations| match donations.get_mut(&donation.id) {
            Some(slot) => {
                *slot = donation;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        })
    }

    fn fetch(&self, id: DonationId) -> Result<Option<Donation>, RepositoryError> {
        self.with_donations(|donations| Ok(donations.get(&id).cloned()))
    }

    fn list(&self) -> Result<Vec<Donation>, RepositoryError> {
        self.with_donations(|donations| Ok(newest_first(donations.values().cloned().collect())))
    }

    fn for_user(&self, user_id: UserId) -> Result<Vec<Donation>, RepositoryError> {
        self.with_donations(|donations| {
            Ok(newest_first(
                donations
                    .values()
                    .filter(|donation| donation.user_id == Some(user_id))
                    .cloned()
                    .collect(),
            ))
        })
    }

    fn update_batch<E, F>(&self, ids: &[DonationId], mut apply: F) -> Result<Vec<Donation>, E>
    where
        F: FnMut(DonationId, Option<&Donation>) -> Result<Donation, E>,
        E: From<RepositoryError>,
    {
        let mut donations = self.donations.lock().map_err(|_| {
            RepositoryError::Unavailable("donation table lock poisoned".to_string())
        })?;
        let mut updated = Vec::with_capacity(ids.len());
        for &id in ids {
            updated.push(apply(id, donations.get(&id))?);
        }
        for donation in &updated {
            donations.insert(donation.id, donation.clone());
        }
        Ok(updated)
    }
}
