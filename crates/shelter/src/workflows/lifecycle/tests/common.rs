use std::sync::Arc;

use axum::response::Response;
use chrono::{Duration, NaiveDate};
use serde_json::Value;

use crate::workflows::clock::FixedClock;
use crate::workflows::identity::UserId;
use crate::workflows::lifecycle::domain::{
    AgeGroup, Animal, AnimalIntake, AnimalKind, AnimalSize, Gender, VisitorInfo,
};
use crate::workflows::lifecycle::store::{InMemoryLifecycleStore, LifecycleStore, LifecycleTx};
use crate::workflows::lifecycle::AnimalLifecycleService;
use crate::workflows::repository::RepositoryError;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 1).expect("valid date")
}

pub(super) fn tomorrow() -> NaiveDate {
    today() + Duration::days(1)
}

pub(super) fn build_service() -> (
    AnimalLifecycleService<InMemoryLifecycleStore>,
    Arc<InMemoryLifecycleStore>,
) {
    let store = Arc::new(InMemoryLifecycleStore::new());
    let service =
        AnimalLifecycleService::with_clock(store.clone(), Arc::new(FixedClock::on(today())));
    (service, store)
}

pub(super) fn intake(name: &str, animal_type: AnimalKind) -> AnimalIntake {
    AnimalIntake {
        name: name.to_string(),
        animal_type,
        breed: "Mixed".to_string(),
        age: AgeGroup::Adult,
        gender: Gender::Female,
        size: AnimalSize::Medium,
        color: "Brown".to_string(),
        description: format!("{name} is calm and loves long walks."),
        health_status: "Healthy".to_string(),
        photo: None,
        vaccinated: true,
        sterilized: false,
    }
}

pub(super) fn visitor(name: &str, user_id: Option<UserId>) -> VisitorInfo {
    VisitorInfo {
        user_id,
        name: name.to_string(),
        phone: "+79161234567".to_string(),
        email: format!("{}@example.org", name.to_ascii_lowercase()),
        comment: String::new(),
    }
}

pub(super) fn register(
    service: &AnimalLifecycleService<InMemoryLifecycleStore>,
    name: &str,
) -> Animal {
    service
        .register_animal(intake(name, AnimalKind::Dog))
        .expect("animal registers")
}

/// Store whose every call fails, for error-path coverage.
pub(super) struct OfflineStore;

impl LifecycleStore for OfflineStore {
    fn transaction<T, E, F>(&self, _work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn LifecycleTx) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }

    fn read<T, E, F>(&self, _work: F) -> Result<T, E>
    where
        F: FnOnce(&dyn LifecycleTx) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        Err(RepositoryError::Unavailable("database offline".to_string()).into())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
