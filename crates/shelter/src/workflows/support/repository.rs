use std::collections::BTreeMap;
use std::sync::Mutex;

use super::domain::{SupportRequest, SupportRequestId};
use crate::workflows::repository::RepositoryError;

pub trait SupportRepository: Send + Sync {
    fn insert(&self, request: SupportRequest) -> Result<SupportRequest, RepositoryError>;
    fn update(&self, request: SupportRequest) -> Result<(), RepositoryError>;
    fn fetch(&self, id: SupportRequestId) -> Result<Option<SupportRequest>, RepositoryError>;
    /// Every request, newest first.
    fn list(&self) -> Result<Vec<SupportRequest>, RepositoryError>;
    /// Rewrites every listed request under one lock; any `apply` error leaves
    /// the table untouched.
    fn update_batch<E, F>(
        &self,
        ids: &[SupportRequestId],
        apply: F,
    ) -> Result<Vec<SupportRequest>, E>
    where
        F: FnMut(SupportRequestId, Option<&SupportRequest>) -> Result<SupportRequest, E>,
        E: From<RepositoryError>;
}

#[derive(Debug, Default)]
pub struct InMemorySupportRepository {
    requests: Mutex<BTreeMap<SupportRequestId, SupportRequest>>,
}

impl InMemorySupportRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_requests<T>(
        &self,
        work: impl FnOnce(&mut BTreeMap<SupportRequestId, SupportRequest>) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut guard = self.requests.lock().map_err(|_| {
            RepositoryError::Unavailable("support table lock poisoned".to_string())
        })?;
        work(&mut guard)
    }
}

impl SupportRepository for InMemorySupportRepository {
    fn insert(&self, request: SupportRequest) -> Result<SupportRequest, RepositoryError> {
        self.with_requests(|requests| {
            if requests.contains_key(&request.id) {
                return Err(RepositoryError::Conflict);
            }
            requests.insert(request.id, request.clone());
            Ok(request)
        })
    }

    fn update(&self, request: SupportRequest) -> Result<(), RepositoryError> {
        self.with_requests(|requests| match requests.get_mut(&request.id) {
            Some(slot) => {
                *slot = request;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        })
    }

    fn fetch(&self, id: SupportRequestId) -> Result<Option<SupportRequest>, RepositoryError> {
        self.with_requests(|requests| Ok(requests.get(&id).cloned()))
    }

    fn list(&self) -> Result<Vec<SupportRequest>, RepositoryError> {
        self.with_requests(|requests| {
            let mut listed: Vec<SupportRequest> = requests.values().cloned().collect();
            listed.sort_by(|left, right| {
                (right.created_at, right.id).cmp(&(left.created_at, left.id))
            });
            Ok(listed)
        })
    }

    fn update_batch<E, F>(
        &self,
        ids: &[SupportRequestId],
        mut apply: F,
    ) -> Result<Vec<SupportRequest>, E>
    where
        F: FnMut(SupportRequestId, Option<&SupportRequest>) -> Result<SupportRequest, E>,
        E: From<RepositoryError>,
    {
        let mut requests = self.requests.lock().map_err(|_| {
            RepositoryError::Unavailable("support table lock poisoned".to_string())
        })?;
        let mut batch = Vec::with_capacity(ids.len());
        for &id in ids {
            batch.push(apply(id, requests.get(&id))?);
        }
        for request in &batch {
            requests.insert(request.id, request.clone());
        }
        Ok(batch)
    }
}
