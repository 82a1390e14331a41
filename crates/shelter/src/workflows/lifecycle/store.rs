use std::collections::BTreeMap;
use std::sync::Mutex;

use super::domain::{
    Adoption, AdoptionId, Animal, AnimalId, Reservation, ReservationId,
};
use crate::workflows::identity::UserId;
use crate::workflows::repository::RepositoryError;

/// Record access available inside a single store transaction.
///
/// Every lifecycle operation reads and writes through one of these so the
/// animal, its reservations and its adoption change together or not at all.
pub trait LifecycleTx {
    fn animal(&self, id: AnimalId) -> Result<Option<Animal>, RepositoryError>;
    fn animals(&self) -> Result<Vec<Animal>, RepositoryError>;
    fn next_animal_id(&mut self) -> Result<AnimalId, RepositoryError>;
    fn put_animal(&mut self, animal: Animal) -> Result<(), RepositoryError>;

    fn reservation(&self, id: ReservationId) -> Result<Option<Reservation>, RepositoryError>;
    fn reservations_for_animal(&self, id: AnimalId) -> Result<Vec<Reservation>, RepositoryError>;
    fn reservations_for_user(&self, id: UserId) -> Result<Vec<Reservation>, RepositoryError>;
    fn next_reservation_id(&mut self) -> Result<ReservationId, RepositoryError>;
    fn put_reservation(&mut self, reservation: Reservation) -> Result<(), RepositoryError>;

    fn adoption(&self, id: AdoptionId) -> Result<Option<Adoption>, RepositoryError>;
    fn adoption_for_animal(&self, id: AnimalId) -> Result<Option<Adoption>, RepositoryError>;
    fn adoptions_for_user(&self, id: UserId) -> Result<Vec<Adoption>, RepositoryError>;
    fn next_adoption_id(&mut self) -> Result<AdoptionId, RepositoryError>;
    fn put_adoption(&mut self, adoption: Adoption) -> Result<(), RepositoryError>;
    fn remove_adoption(&mut self, id: AdoptionId) -> Result<(), RepositoryError>;
}

/// Transactional record store behind the lifecycle engine.
///
/// `transaction` must be serializable with respect to other transactions and
/// must discard every write when `work` returns an error.
pub trait LifecycleStore: Send + Sync {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LifecycleTx) -> Result<T, E>,
        E: From<RepositoryError>;

    fn read<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn LifecycleTx) -> Result<T, E>,
        E: From<RepositoryError>;
}

/// Plain tables backing [`InMemoryLifecycleStore`].
#[derive(Debug, Clone, Default)]
pub struct LifecycleTables {
    animals: BTreeMap<AnimalId, Animal>,
    reservations: BTreeMap<ReservationId, Reservation>,
    adoptions: BTreeMap<AdoptionId, Adoption>,
    animal_sequence: u64,
    reservation_sequence: u64,
    adoption_sequence: u64,
}

fn newest_first<T, K>(records: &mut [T], key: impl Fn(&T) -> K)
where
    K: Ord,
{
    records.sort_by(|left, right| key(right).cmp(&key(left)));
}

impl LifecycleTx for LifecycleTables {
    fn animal(&self, id: AnimalId) -> Result<Option<Animal>, RepositoryError> {
        Ok(self.animals.get(&id).cloned())
    }

    fn animals(&self) -> Result<Vec<Animal>, RepositoryError> {
        let mut animals: Vec<Animal> = self.animals.values().cloned().collect();
        newest_first(&mut animals, |animal| (animal.created_at, animal.id));
        Ok(animals)
    }

    fn next_animal_id(&mut self) -> Result<AnimalId, RepositoryError> {
        self.animal_sequence += 1;
        Ok(AnimalId(self.animal_sequence))
    }

    fn put_animal(&mut self, animal: Animal) -> Result<(), RepositoryError> {
        self.animals.insert(animal.id, animal);
        Ok(())
    }

    fn reservation(&self, id: ReservationId) -> Result<Option<Reservation>, RepositoryError> {
        Ok(self.reservations.get(&id).cloned())
    }

    fn reservations_for_animal(&self, id: AnimalId) -> Result<Vec<Reservation>, RepositoryError> {
        let mut matches: Vec<Reservation> = self
            .reservations
            .values()
            .filter(|reservation| reservation.animal_id == id)
            .cloned()
            .collect();
        newest_first(&mut matches, |reservation| {
            (reservation.created_at, reservation.id)
        });
        Ok(matches)
    }

    fn reservations_for_user(&self, id: UserId) -> Result<Vec<Reservation>, RepositoryError> {
        let mut matches: Vec<Reservation> = self
            .reservations
            .values()
            .filter(|reservation| reservation.user_id == Some(id))
            .cloned()
            .collect();
        newest_first(&mut matches, |reservation| {
            (reservation.created_at, reservation.id)
        });
        Ok(matches)
    }

    fn next_reservation_id(&mut self) -> Result<ReservationId, RepositoryError> {
        self.reservation_sequence += 1;
        Ok(ReservationId(self.reservation_sequence))
    }

    fn put_reservation(&mut self, reservation: Reservation) -> Result<(), RepositoryError> {
        if !self.animals.contains_key(&reservation.animal_id) {
            return Err(RepositoryError::NotFound);
        }
        self.reservations.insert(reservation.id, reservation);
        Ok(())
    }

    fn adoption(&self, id: AdoptionId) -> Result<Option<Adoption>, RepositoryError> {
        Ok(self.adoptions.get(&id).cloned())
    }

    fn adoption_for_animal(&self, id: AnimalId) -> Result<Option<Adoption>, RepositoryError> {
        Ok(self
            .adoptions
            .values()
            .find(|adoption| adoption.animal_id == id)
            .cloned())
    }

    fn adoptions_for_user(&self, id: UserId) -> Result<Vec<Adoption>, RepositoryError> {
        let mut matches: Vec<Adoption> = self
            .adoptions
            .values()
            .filter(|adoption| adoption.user_id == id)
            .cloned()
            .collect();
        newest_first(&mut matches, |adoption| (adoption.created_at, adoption.id));
        Ok(matches)
    }

    fn next_adoption_id(&mut self) -> Result<AdoptionId, RepositoryError> {
        self.adoption_sequence += 1;
        Ok(AdoptionId(self.adoption_sequence))
    }

    fn put_adoption(&mut self, adoption: Adoption) -> Result<(), RepositoryError> {
        if !self.animals.contains_key(&adoption.animal_id) {
            return Err(RepositoryError::NotFound);
        }
        // One adoption row per animal.
        let taken = self
            .adoptions
            .values()
            .any(|existing| existing.animal_id == adoption.animal_id && existing.id != adoption.id);
        if taken {
            return Err(RepositoryError::Conflict);
        }
        self.adoptions.insert(adoption.id, adoption);
        Ok(())
    }

    fn remove_adoption(&mut self, id: AdoptionId) -> Result<(), RepositoryError> {
        self.adoptions
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

/// Process-local store. Each transaction works on a copy of the tables under
/// one lock and swaps it in only on success.
#[derive(Debug, Default)]
pub struct InMemoryLifecycleStore {
    tables: Mutex<LifecycleTables>,
}

impl InMemoryLifecycleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> RepositoryError {
    RepositoryError::Unavailable("lifecycle store lock poisoned".to_string())
}

impl LifecycleStore for InMemoryLifecycleStore {
    fn transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LifecycleTx) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut guard = self.tables.lock().map_err(|_| poisoned())?;
        let mut working = guard.clone();
        let value = work(&mut working)?;
        *guard = working;
        Ok(value)
    }

    fn read<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn LifecycleTx) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let guard = self.tables.lock().map_err(|_| poisoned())?;
        work(&*guard)
    }
}
