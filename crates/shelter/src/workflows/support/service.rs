use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::domain::{SupportForm, SupportRequest, SupportRequestId, SupportStatus};
use super::repository::SupportRepository;
use crate::workflows::clock::{Clock, SystemClock};
use crate::workflows::identity::Actor;
use crate::workflows::repository::RepositoryError;
use crate::workflows::validation::{self, FieldError};

static SUPPORT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_request_id() -> SupportRequestId {
    SupportRequestId(SUPPORT_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, thiserror::Error)]
pub enum SupportError {
    #[error("validation failed: {0}")]
    Validation(#[from] FieldError),
    #[error("support request {0} not found")]
    NotFound(SupportRequestId),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct SupportService<R> {
    repository: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> SupportService<R>
where
    R: SupportRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_clock(repository, Arc::new(SystemClock))
    }

    pub fn with_clock(repository: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    fn load(&self, id: SupportRequestId) -> Result<SupportRequest, SupportError> {
        self.repository
            .fetch(id)?
            .ok_or(SupportError::NotFound(id))
    }

    pub fn submit(&self, form: SupportForm, actor: &Actor) -> Result<SupportRequest, SupportError> {
        let name = validation::required_text("name", &form.name, 100)?;
        let email = validation::email("email", &form.email)?;
        let message = validation::required_text("message", &form.message, 5000)?;
        let now = self.clock.now();

        let request = self.repository.insert(SupportRequest {
            id: next_request_id(),
            user_id: actor.user_id,
            name,
            email,
            subject: form.subject,
            message,
            status: SupportStatus::New,
            response: String::new(),
            created_at: now,
            updated_at: now,
        })?;

        tracing::info!(
            request_id = request.id.0,
            subject = request.subject.label(),
            "support request received"
        );
        Ok(request)
    }

    /// Staff bulk status change. Requests already in `target` are left as they
    /// are; any illegal move aborts the batch before anything is written.
    pub fn update_status(
        &self,
        ids: &[SupportRequestId],
        target: SupportStatus,
    ) -> Result<Vec<SupportRequest>, SupportError> {
        if ids.is_empty() {
            return Err(FieldError::new("request_ids", "select at least one request").into());
        }

        let now = self.clock.now();
        let mut changed = 0;
        let batch = self.repository.update_batch(ids, |id, stored| {
            let mut request = stored.cloned().ok_or(SupportError::NotFound(id))?;
            if request.status == target {
                return Ok(request);
            }
            if !request.status.can_become(target) {
                return Err(SupportError::Conflict(format!(
                    "request {id} is {} and cannot become {}",
                    request.status.label(),
                    target.label()
                )));
            }
            request.status = target;
            request.updated_at = now;
            changed += 1;
            Ok(request)
        })?;

        tracing::info!(changed, status = target.label(), "support requests updated");
        Ok(batch)
    }

    /// Record the staff answer. A new request moves to in progress.
    pub fn respond(
        &self,
        id: SupportRequestId,
        response: &str,
    ) -> Result<SupportRequest, SupportError> {
        let response = validation::required_text("response", response, 5000)?;
        let mut request = self.load(id)?;
        if request.status == SupportStatus::Closed {
            return Err(SupportError::Conflict(format!("request {id} is closed")));
        }

        request.response = response;
        if request.status == SupportStatus::New {
            request.status = SupportStatus::InProgress;
        }
        request.updated_at = self.clock.now();
        self.repository.update(request.clone())?;

        tracing::info!(request_id = id.0, "support request answered");
        Ok(request)
    }

    pub fn requests(
        &self,
        status: Option<SupportStatus>,
    ) -> Result<Vec<SupportRequest>, SupportError> {
        Ok(self
            .repository
            .list()?
            .into_iter()
            .filter(|request| status.map_or(true, |wanted| request.status == wanted))
            .collect())
    }
}
