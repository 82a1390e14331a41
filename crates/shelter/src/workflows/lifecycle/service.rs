use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{
    Adoption, AdoptionId, AdoptionStatus, Animal, AnimalId, AnimalIntake, AnimalStatus,
    AvailabilityView, Reservation, ReservationId, ReservationStatus, VisitorInfo,
};
use super::store::{LifecycleStore, LifecycleTx};
use super::transitions::{apply_event, ApplyError, LifecycleEvent};
use crate::workflows::clock::{Clock, SystemClock};
use crate::workflows::identity::{Actor, UserId};
use crate::workflows::repository::RepositoryError;
use crate::workflows::validation::{self, FieldError};

/// Error raised by the lifecycle engine. Every variant except `Repository` is
/// recoverable by the caller.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("validation failed: {0}")]
    Validation(#[from] FieldError),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },
    #[error("not allowed to {0}")]
    Authorization(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<ApplyError> for LifecycleError {
    fn from(value: ApplyError) -> Self {
        match value {
            ApplyError::Rejected(rejected) => Self::Conflict(rejected.to_string()),
            ApplyError::Repository(err) => Self::Repository(err),
        }
    }
}

fn animal_not_found(id: AnimalId) -> LifecycleError {
    LifecycleError::NotFound {
        entity: "animal",
        id: id.0,
    }
}

fn reservation_not_found(id: ReservationId) -> LifecycleError {
    LifecycleError::NotFound {
        entity: "reservation",
        id: id.0,
    }
}

fn adoption_not_found(id: AdoptionId) -> LifecycleError {
    LifecycleError::NotFound {
        entity: "adoption",
        id: id.0,
    }
}

fn load_animal(tx: &dyn LifecycleTx, id: AnimalId) -> Result<Animal, LifecycleError> {
    tx.animal(id)?.ok_or_else(|| animal_not_found(id))
}

/// Moves every active reservation on `animal_id` to `outcome`.
fn close_active_reservations(
    tx: &mut dyn LifecycleTx,
    animal_id: AnimalId,
    outcome: ReservationStatus,
    at: DateTime<Utc>,
) -> Result<usize, LifecycleError> {
    let mut closed = 0;
    for mut reservation in tx.reservations_for_animal(animal_id)? {
        if reservation.status.is_active() {
            reservation.status = outcome;
            reservation.updated_at = at;
            tx.put_reservation(reservation)?;
            closed += 1;
        }
    }
    Ok(closed)
}

/// Status workflow engine. Keeps `Animal::status` in step with reservation and
/// adoption outcomes; each operation is one store transaction.
pub struct AnimalLifecycleService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> AnimalLifecycleService<S>
where
    S: LifecycleStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Record a newly arrived animal. It starts out available.
    pub fn register_animal(&self, intake: AnimalIntake) -> Result<Animal, LifecycleError> {
        let name = validation::required_text("name", &intake.name, 100)?;
        let description = validation::required_text("description", &intake.description, 5000)?;
        let breed = validation::optional_text("breed", &intake.breed, 100)?;
        let color = validation::optional_text("color", &intake.color, 50)?;
        let now = self.clock.now();
        let today = self.clock.today();

        let animal = self.store.transaction(|tx| {
            let id = tx.next_animal_id()?;
            let animal = Animal {
                id,
                name,
                animal_type: intake.animal_type,
                breed,
                age: intake.age,
                gender: intake.gender,
                size: intake.size,
                color,
                description,
                health_status: intake.health_status.trim().to_string(),
                photo: intake.photo.filter(|key| !key.trim().is_empty()),
                status: AnimalStatus::Available,
                vaccinated: intake.vaccinated,
                sterilized: intake.sterilized,
                arrival_date: today,
                created_at: now,
                updated_at: now,
            };
            tx.put_animal(animal.clone())?;
            Ok::<_, LifecycleError>(animal)
        })?;

        tracing::info!(animal_id = animal.id.0, name = %animal.name, "animal registered");
        Ok(animal)
    }

    /// Hold an available animal for a visit. The reservation starts pending and
    /// the animal becomes reserved in the same transaction.
    pub fn request_reservation(
        &self,
        animal_id: AnimalId,
        visitor: VisitorInfo,
        visit_date: NaiveDate,
    ) -> Result<Reservation, LifecycleError> {
        let now = self.clock.now();
        let today = self.clock.today();

        let reservation = self.store.transaction(|tx| {
            let mut animal = load_animal(tx, animal_id)?;
            if animal.status != AnimalStatus::Available {
                return Err(LifecycleError::Conflict(format!(
                    "{} is {} and cannot be reserved",
                    animal.name,
                    animal.status.label()
                )));
            }
            if visit_date < today {
                return Err(FieldError::new("visit_date", "cannot be in the past").into());
            }
            let name = validation::required_text("name", &visitor.name, 100)?;
            let phone = validation::required_text("phone", &visitor.phone, 17)?;
            let email = validation::email("email", &visitor.email)?;
            let comment = validation::optional_text("comment", &visitor.comment, 2000)?;

            let reservation = Reservation {
                id: tx.next_reservation_id()?,
                animal_id,
                user_id: visitor.user_id,
                name,
                phone,
                email,
                visit_date,
                comment,
                status: ReservationStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            tx.put_reservation(reservation.clone())?;
            apply_event(tx, &mut animal, LifecycleEvent::ReservationRequested, now)?;
            Ok(reservation)
        })?;

        tracing::info!(
            reservation_id = reservation.id.0,
            animal_id = animal_id.0,
            %visit_date,
            "visit reservation requested"
        );
        Ok(reservation)
    }

    /// Cancel an active reservation and release the animal.
    pub fn cancel_reservation(
        &self,
        reservation_id: ReservationId,
        actor: &Actor,
    ) -> Result<Reservation, LifecycleError> {
        let now = self.clock.now();

        let reservation = self.store.transaction(|tx| {
            let mut reservation = tx
                .reservation(reservation_id)?
                .ok_or_else(|| reservation_not_found(reservation_id))?;
            if !actor.can_act_for(reservation.user_id) {
                return Err(LifecycleError::Authorization("cancel this reservation"));
            }
            if !reservation.status.is_active() {
                return Err(LifecycleError::Conflict(format!(
                    "reservation {} is already {}",
                    reservation_id,
                    reservation.status.label()
                )));
            }

            let mut animal = load_animal(tx, reservation.animal_id)?;
            reservation.status = ReservationStatus::Cancelled;
            reservation.updated_at = now;
            tx.put_reservation(reservation.clone())?;
            apply_event(tx, &mut animal, LifecycleEvent::ReservationCancelled, now)?;
            Ok(reservation)
        })?;

        tracing::info!(
            reservation_id = reservation.id.0,
            animal_id = reservation.animal_id.0,
            "visit reservation cancelled"
        );
        Ok(reservation)
    }

    /// Staff confirmation of a pending visit. The animal stays reserved.
    pub fn confirm_reservation(
        &self,
        reservation_id: ReservationId,
    ) -> Result<Reservation, LifecycleError> {
        let now = self.clock.now();

        let reservation = self.store.transaction(|tx| {
            let mut reservation = tx
                .reservation(reservation_id)?
                .ok_or_else(|| reservation_not_found(reservation_id))?;
            if reservation.status != ReservationStatus::Pending {
                return Err(LifecycleError::Conflict(format!(
                    "reservation {} is {} and cannot be confirmed",
                    reservation_id,
                    reservation.status.label()
                )));
            }
            reservation.status = ReservationStatus::Confirmed;
            reservation.updated_at = now;
            tx.put_reservation(reservation.clone())?;
            Ok::<_, LifecycleError>(reservation)
        })?;

        tracing::info!(reservation_id = reservation.id.0, "visit reservation confirmed");
        Ok(reservation)
    }

    /// Open an adoption for `actor`. The animal keeps its status until a
    /// decision is made.
    pub fn submit_adoption(
        &self,
        animal_id: AnimalId,
        actor: &Actor,
        notes: &str,
    ) -> Result<Adoption, LifecycleError> {
        let adopter = actor
            .user_id
            .ok_or(LifecycleError::Authorization("apply for an adoption anonymously"))?;
        let notes = validation::optional_text("notes", notes, 2000)?;
        let now = self.clock.now();

        let adoption = self.store.transaction(|tx| {
            let animal = load_animal(tx, animal_id)?;
            if animal.status == AnimalStatus::Adopted {
                return Err(LifecycleError::Conflict(format!(
                    "{} has already been adopted",
                    animal.name
                )));
            }
            if let Some(existing) = tx.adoption_for_animal(animal_id)? {
                if existing.status != AdoptionStatus::Rejected {
                    return Err(LifecycleError::Conflict(format!(
                        "{} already has a {} adoption",
                        animal.name,
                        existing.status.label()
                    )));
                }
                tx.remove_adoption(existing.id)?;
            }

            let adoption = Adoption {
                id: tx.next_adoption_id()?,
                animal_id,
                user_id: adopter,
                status: AdoptionStatus::Pending,
                adoption_date: None,
                notes,
                created_at: now,
                updated_at: now,
            };
            tx.put_adoption(adoption.clone())?;
            Ok(adoption)
        })?;

        tracing::info!(
            adoption_id = adoption.id.0,
            animal_id = animal_id.0,
            adopter = adopter.0,
            "adoption submitted"
        );
        Ok(adoption)
    }

    /// Approve a pending adoption. The animal becomes adopted and any visit
    /// still holding it is completed.
    pub fn approve_adoption(&self, adoption_id: AdoptionId) -> Result<Adoption, LifecycleError> {
        let now = self.clock.now();
        let today = self.clock.today();

        let adoption = self.store.transaction(|tx| {
            let mut adoption = tx
                .adoption(adoption_id)?
                .ok_or_else(|| adoption_not_found(adoption_id))?;
            if adoption.status != AdoptionStatus::Pending {
                return Err(LifecycleError::Conflict(format!(
                    "adoption {} is already {}",
                    adoption_id,
                    adoption.status.label()
                )));
            }

            let mut animal = load_animal(tx, adoption.animal_id)?;
            apply_event(tx, &mut animal, LifecycleEvent::AdoptionApproved, now)?;
            close_active_reservations(tx, animal.id, ReservationStatus::Completed, now)?;

            adoption.status = AdoptionStatus::Approved;
            adoption.adoption_date = Some(today);
            adoption.updated_at = now;
            tx.put_adoption(adoption.clone())?;
            Ok(adoption)
        })?;

        tracing::info!(
            adoption_id = adoption.id.0,
            animal_id = adoption.animal_id.0,
            "adoption approved"
        );
        Ok(adoption)
    }

    /// Reject a pending or approved adoption and return the animal to the
    /// shelter. A visit still holding the animal is cancelled with it.
    pub fn reject_adoption(&self, adoption_id: AdoptionId) -> Result<Adoption, LifecycleError> {
        let now = self.clock.now();

        let adoption = self.store.transaction(|tx| {
            let mut adoption = tx
                .adoption(adoption_id)?
                .ok_or_else(|| adoption_not_found(adoption_id))?;
            if !matches!(
                adoption.status,
                AdoptionStatus::Pending | AdoptionStatus::Approved
            ) {
                return Err(LifecycleError::Conflict(format!(
                    "adoption {} is {} and cannot be rejected",
                    adoption_id,
                    adoption.status.label()
                )));
            }

            let mut animal = load_animal(tx, adoption.animal_id)?;
            close_active_reservations(tx, animal.id, ReservationStatus::Cancelled, now)?;
            apply_event(tx, &mut animal, LifecycleEvent::AdoptionRejected, now)?;

            adoption.status = AdoptionStatus::Rejected;
            adoption.adoption_date = None;
            adoption.updated_at = now;
            tx.put_adoption(adoption.clone())?;
            Ok(adoption)
        })?;

        tracing::info!(
            adoption_id = adoption.id.0,
            animal_id = adoption.animal_id.0,
            "adoption rejected"
        );
        Ok(adoption)
    }

    /// Mark an approved adoption as handed over.
    pub fn complete_adoption(&self, adoption_id: AdoptionId) -> Result<Adoption, LifecycleError> {
        let now = self.clock.now();

        let adoption = self.store.transaction(|tx| {
            let mut adoption = tx
                .adoption(adoption_id)?
                .ok_or_else(|| adoption_not_found(adoption_id))?;
            if adoption.status != AdoptionStatus::Approved {
                return Err(LifecycleError::Conflict(format!(
                    "adoption {} is {} and cannot be completed",
                    adoption_id,
                    adoption.status.label()
                )));
            }
            adoption.status = AdoptionStatus::Completed;
            adoption.updated_at = now;
            tx.put_adoption(adoption.clone())?;
            Ok::<_, LifecycleError>(adoption)
        })?;

        tracing::info!(adoption_id = adoption.id.0, "adoption completed");
        Ok(adoption)
    }

    /// Read-only view of whether the animal can still be reserved.
    pub fn check_availability(&self, animal_id: AnimalId) -> Result<AvailabilityView, LifecycleError> {
        self.store
            .read(|tx| load_animal(tx, animal_id).map(|animal| AvailabilityView::of(&animal)))
    }

    /// Administrative bulk status change. Dependent records are reconciled so
    /// the reservation and adoption invariants keep holding; the whole batch
    /// is rolled back if any animal cannot be moved.
    pub fn override_status(
        &self,
        animal_ids: &[AnimalId],
        target: AnimalStatus,
    ) -> Result<Vec<Animal>, LifecycleError> {
        if animal_ids.is_empty() {
            return Err(FieldError::new("animal_ids", "select at least one animal").into());
        }
        if target == AnimalStatus::Reserved {
            return Err(FieldError::new(
                "status",
                "animals are reserved only through a visit reservation",
            )
            .into());
        }
        let now = self.clock.now();

        let updated = self.store.transaction(|tx| {
            let mut updated = Vec::with_capacity(animal_ids.len());
            for &animal_id in animal_ids {
                let mut animal = load_animal(tx, animal_id)?;
                match target {
                    AnimalStatus::Available => {
                        close_active_reservations(
                            tx,
                            animal_id,
                            ReservationStatus::Cancelled,
                            now,
                        )?;
                        if let Some(mut adoption) = tx.adoption_for_animal(animal_id)? {
                            match adoption.status {
                                AdoptionStatus::Completed => {
                                    return Err(LifecycleError::Conflict(format!(
                                        "{} was handed over to an adopter and cannot return to the shelter",
                                        animal.name
                                    )));
                                }
                                AdoptionStatus::Approved => {
                                    adoption.status = AdoptionStatus::Rejected;
                                    adoption.adoption_date = None;
                                    adoption.updated_at = now;
                                    tx.put_adoption(adoption)?;
                                }
                                AdoptionStatus::Pending | AdoptionStatus::Rejected => {}
                            }
                        }
                    }
                    AnimalStatus::Adopted => {
                        close_active_reservations(
                            tx,
                            animal_id,
                            ReservationStatus::Completed,
                            now,
                        )?;
                    }
                    AnimalStatus::Reserved => {}
                }
                apply_event(
                    tx,
                    &mut animal,
                    LifecycleEvent::AdministrativeOverride(target),
                    now,
                )?;
                updated.push(animal);
            }
            Ok::<_, LifecycleError>(updated)
        })?;

        tracing::warn!(
            count = updated.len(),
            status = target.label(),
            "administrative status override applied"
        );
        Ok(updated)
    }

    /// The stored animal record.
    pub fn animal(&self, animal_id: AnimalId) -> Result<Animal, LifecycleError> {
        self.store.read(|tx| load_animal(tx, animal_id))
    }

    /// A single reservation by id.
    pub fn reservation(&self, reservation_id: ReservationId) -> Result<Reservation, LifecycleError> {
        self.store.read(|tx| {
            tx.reservation(reservation_id)?
                .ok_or_else(|| reservation_not_found(reservation_id))
        })
    }

    /// A single adoption by id.
    pub fn adoption(&self, adoption_id: AdoptionId) -> Result<Adoption, LifecycleError> {
        self.store.read(|tx| {
            tx.adoption(adoption_id)?
                .ok_or_else(|| adoption_not_found(adoption_id))
        })
    }

    /// Every reservation made by `user_id`, newest first.
    pub fn reservations_for_user(&self, user_id: UserId) -> Result<Vec<Reservation>, LifecycleError> {
        self.store
            .read(|tx| tx.reservations_for_user(user_id).map_err(LifecycleError::from))
    }

    /// Every adoption filed by `user_id`, newest first.
    pub fn adoptions_for_user(&self, user_id: UserId) -> Result<Vec<Adoption>, LifecycleError> {
        self.store
            .read(|tx| tx.adoptions_for_user(user_id).map_err(LifecycleError::from))
    }
}
