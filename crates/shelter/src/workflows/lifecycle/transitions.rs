//! Animal status state machine.
//!
//! ```text
//! Available ──ReservationRequested──> Reserved ──AdoptionApproved──> Adopted
//!     ^                                  │                              │
//!     └──ReservationCancelled────────────┘                              │
//!     └──AdoptionRejected───────────────────────────────────────────────┘
//! ```
//!
//! `AdoptionApproved` is also accepted from `Available` (walk-in adoptions
//! without a prior visit) and `AdministrativeOverride` may land anywhere.
//! All writes to `Animal::status` go through [`apply_event`].

use chrono::{DateTime, Utc};
use std::fmt;

use super::domain::{Animal, AnimalStatus};
use super::store::LifecycleTx;
use crate::workflows::repository::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    ReservationRequested,
    ReservationCancelled,
    AdoptionApproved,
    AdoptionRejected,
    AdministrativeOverride(AnimalStatus),
}

impl LifecycleEvent {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ReservationRequested => "reservation_requested",
            Self::ReservationCancelled => "reservation_cancelled",
            Self::AdoptionApproved => "adoption_approved",
            Self::AdoptionRejected => "adoption_rejected",
            Self::AdministrativeOverride(_) => "administrative_override",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The event is not valid from the animal's current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRejected {
    pub from: AnimalStatus,
    pub event: LifecycleEvent,
}

impl fmt::Display for TransitionRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "animal is {} and cannot accept {}",
            self.from.label(),
            self.event
        )
    }
}

pub fn next_status(
    current: AnimalStatus,
    event: LifecycleEvent,
) -> Result<AnimalStatus, TransitionRejected> {
    use AnimalStatus::{Adopted, Available, Reserved};
    use LifecycleEvent::*;

    match (current, event) {
        (Available, ReservationRequested) => Ok(Reserved),
        (Reserved, ReservationCancelled) => Ok(Available),
        (Available | Reserved, AdoptionApproved) => Ok(Adopted),
        (_, AdoptionRejected) => Ok(Available),
        (_, AdministrativeOverride(target)) => Ok(target),
        (from, event) => Err(TransitionRejected { from, event }),
    }
}

/// Failure while applying an event inside a transaction.
#[derive(Debug)]
pub enum ApplyError {
    Rejected(TransitionRejected),
    Repository(RepositoryError),
}

impl From<RepositoryError> for ApplyError {
    fn from(value: RepositoryError) -> Self {
        Self::Repository(value)
    }
}

/// Moves `animal` to the status `event` leads to and persists it in `tx`.
pub fn apply_event(
    tx: &mut dyn LifecycleTx,
    animal: &mut Animal,
    event: LifecycleEvent,
    at: DateTime<Utc>,
) -> Result<AnimalStatus, ApplyError> {
    let previous = animal.status;
    let next = next_status(previous, event).map_err(ApplyError::Rejected)?;
    animal.status = next;
    animal.updated_at = at;
    tx.put_animal(animal.clone())?;
    tracing::debug!(
        animal_id = animal.id.0,
        from = previous.label(),
        to = next.label(),
        %event,
        "animal status transition"
    );
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use AnimalStatus::{Adopted, Available, Reserved};

    #[test]
    fn reservation_requires_available_animal() {
        assert_eq!(
            next_status(Available, LifecycleEvent::ReservationRequested),
            Ok(Reserved)
        );
        for from in [Reserved, Adopted] {
            let rejected = next_status(from, LifecycleEvent::ReservationRequested)
                .expect_err("only available animals can be reserved");
            assert_eq!(rejected.from, from);
        }
    }

    #[test]
    fn cancellation_only_releases_reserved_animals() {
        assert_eq!(
            next_status(Reserved, LifecycleEvent::ReservationCancelled),
            Ok(Available)
        );
        assert!(next_status(Adopted, LifecycleEvent::ReservationCancelled).is_err());
        assert!(next_status(Available, LifecycleEvent::ReservationCancelled).is_err());
    }

    #[test]
    fn approval_never_adopts_twice() {
        assert_eq!(
            next_status(Reserved, LifecycleEvent::AdoptionApproved),
            Ok(Adopted)
        );
        assert_eq!(
            next_status(Available, LifecycleEvent::AdoptionApproved),
            Ok(Adopted)
        );
        let rejected = next_status(Adopted, LifecycleEvent::AdoptionApproved)
            .expect_err("double adoption rejected");
        assert!(rejected.to_string().contains("adopted"));
    }

    #[test]
    fn rejection_and_override_always_land() {
        for from in AnimalStatus::ordered() {
            assert_eq!(
                next_status(from, LifecycleEvent::AdoptionRejected),
                Ok(Available)
            );
            for target in AnimalStatus::ordered() {
                assert_eq!(
                    next_status(from, LifecycleEvent::AdministrativeOverride(target)),
                    Ok(target)
                );
            }
        }
    }
}
