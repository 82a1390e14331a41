use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use shelter::config::ShelterConfig;
use shelter::workflows::accounts::{
    AccountService, EnrollmentError, IdentityProvider, InMemoryUserRepository, ShelterActivity,
    User,
};
use shelter::workflows::catalog::CatalogService;
use shelter::workflows::clock::Clock;
use shelter::workflows::donations::{DonationService, InMemoryDonationRepository};
use shelter::workflows::lifecycle::{
    AgeGroup, AnimalIntake, AnimalKind, AnimalLifecycleService, AnimalSize, Gender,
    InMemoryLifecycleStore, LifecycleError,
};
use shelter::workflows::support::{InMemorySupportRepository, SupportService};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Lifecycle = AnimalLifecycleService<InMemoryLifecycleStore>;
pub(crate) type Catalog = CatalogService<InMemoryLifecycleStore>;
pub(crate) type Accounts = AccountService<InMemoryUserRepository, GatewayIdentityProvider>;
pub(crate) type Support = SupportService<InMemorySupportRepository>;
pub(crate) type Donations = DonationService<InMemoryDonationRepository, InMemoryUserRepository>;

/// Credentials live with the upstream gateway; enrollment only records that a
/// hand-off happened.
#[derive(Debug, Default)]
pub(crate) struct GatewayIdentityProvider {
    enrolled: AtomicUsize,
}

impl GatewayIdentityProvider {
    pub(crate) fn enrolled(&self) -> usize {
        self.enrolled.load(Ordering::Relaxed)
    }
}

impl IdentityProvider for GatewayIdentityProvider {
    fn enroll(&self, user: &User, password: &str) -> Result<(), EnrollmentError> {
        if password.is_empty() {
            return Err(EnrollmentError::Unavailable(
                "empty credential hand-off".to_string(),
            ));
        }
        self.enrolled.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(user_id = user.id.0, "credentials handed to identity provider");
        Ok(())
    }
}

/// Every workflow service wired to the in-memory stores.
#[derive(Clone)]
pub(crate) struct ShelterServices {
    pub(crate) lifecycle: Arc<Lifecycle>,
    pub(crate) catalog: Arc<Catalog>,
    pub(crate) accounts: Arc<Accounts>,
    pub(crate) support: Arc<Support>,
    pub(crate) donations: Arc<Donations>,
    pub(crate) identity: Arc<GatewayIdentityProvider>,
}

impl ShelterServices {
    pub(crate) fn in_memory(config: &ShelterConfig, clock: Arc<dyn Clock>) -> Self {
        let store = Arc::new(InMemoryLifecycleStore::new());
        let users = Arc::new(InMemoryUserRepository::new());
        let ledger = Arc::new(InMemoryDonationRepository::new());
        let identity = Arc::new(GatewayIdentityProvider::default());
        let activity = Arc::new(ShelterActivity::new(store.clone(), ledger.clone()));

        Self {
            lifecycle: Arc::new(AnimalLifecycleService::with_clock(
                store.clone(),
                clock.clone(),
            )),
            catalog: Arc::new(CatalogService::with_page_size(store, config.page_size)),
            accounts: Arc::new(AccountService::with_clock(
                users.clone(),
                identity.clone(),
                activity,
                clock.clone(),
            )),
            support: Arc::new(SupportService::with_clock(
                Arc::new(InMemorySupportRepository::new()),
                clock.clone(),
            )),
            donations: Arc::new(DonationService::with_clock(ledger, users, clock)),
            identity,
        }
    }

    /// Registers the sample animals used by `demo` and `SHELTER_SEED_DEMO`.
    pub(crate) fn seed_demo_animals(&self) -> Result<usize, LifecycleError> {
        let intakes = demo_intakes();
        let count = intakes.len();
        for intake in intakes {
            self.lifecycle.register_animal(intake)?;
        }
        Ok(count)
    }
}

fn intake(
    name: &str,
    animal_type: AnimalKind,
    breed: &str,
    age: AgeGroup,
    gender: Gender,
    size: AnimalSize,
    description: &str,
) -> AnimalIntake {
    AnimalIntake {
        name: name.to_string(),
        animal_type,
        breed: breed.to_string(),
        age,
        gender,
        size,
        color: String::new(),
        description: description.to_string(),
        health_status: "Healthy".to_string(),
        photo: None,
        vaccinated: true,
        sterilized: age != AgeGroup::Young,
    }
}

pub(crate) fn demo_intakes() -> Vec<AnimalIntake> {
    vec![
        intake(
            "Bella",
            AnimalKind::Dog,
            "Labrador mix",
            AgeGroup::Adult,
            Gender::Female,
            AnimalSize::Large,
            "Gentle with children and loves fetch.",
        ),
        intake(
            "Murka",
            AnimalKind::Cat,
            "Siberian",
            AgeGroup::Young,
            Gender::Female,
            AnimalSize::Small,
            "Curious kitten who purrs on every lap.",
        ),
        intake(
            "Baron",
            AnimalKind::Dog,
            "Shepherd",
            AgeGroup::Senior,
            Gender::Male,
            AnimalSize::Large,
            "Calm senior looking for a quiet home.",
        ),
        intake(
            "Kesha",
            AnimalKind::Other,
            "Budgerigar",
            AgeGroup::Adult,
            Gender::Male,
            AnimalSize::Small,
            "Chatty parrot that knows a few words.",
        ),
        intake(
            "Tuzik",
            AnimalKind::Dog,
            "Mixed",
            AgeGroup::Young,
            Gender::Male,
            AnimalSize::Medium,
            "Playful puppy, already house-trained.",
        ),
    ]
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
