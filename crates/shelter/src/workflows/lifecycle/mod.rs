//! Animal lifecycle: visit reservations and adoptions, and the status
//! transitions they drive on the animal record.

pub mod domain;
pub mod router;
pub mod service;
pub mod store;
pub mod transitions;

#[cfg(test)]
mod tests;

pub use domain::{
    Adoption, AdoptionId, AdoptionStatus, AgeGroup, Animal, AnimalId, AnimalIntake, AnimalKind,
    AnimalSize, AnimalStatus, AvailabilityView, Gender, Reservation, ReservationId,
    ReservationStatus, VisitorInfo,
};
pub use router::lifecycle_router;
pub use service::{AnimalLifecycleService, LifecycleError};
pub use store::{InMemoryLifecycleStore, LifecycleStore, LifecycleTables, LifecycleTx};
pub use transitions::{LifecycleEvent, TransitionRejected};
