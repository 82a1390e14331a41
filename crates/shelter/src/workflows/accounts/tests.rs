use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;
use crate::workflows::clock::FixedClock;
use crate::workflows::donations::{DonationForm, DonationService, InMemoryDonationRepository};
use crate::workflows::identity::{Actor, UserId, USER_HEADER};
use crate::workflows::lifecycle::{
    AgeGroup, AnimalIntake, AnimalKind, AnimalLifecycleService, AnimalSize, Gender,
    InMemoryLifecycleStore, VisitorInfo,
};

#[derive(Default)]
struct RecordingProvider {
    enrolled: Mutex<Vec<(UserId, usize)>>,
}

impl IdentityProvider for RecordingProvider {
    fn enroll(&self, user: &User, password: &str) -> Result<(), EnrollmentError> {
        self.enrolled
            .lock()
            .unwrap()
            .push((user.id, password.len()));
        Ok(())
    }
}

struct OfflineProvider;

impl IdentityProvider for OfflineProvider {
    fn enroll(&self, _user: &User, _password: &str) -> Result<(), EnrollmentError> {
        Err(EnrollmentError::Unavailable("timeout".to_string()))
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
}

struct Harness {
    accounts: AccountService<InMemoryUserRepository, RecordingProvider>,
    provider: Arc<RecordingProvider>,
    lifecycle: AnimalLifecycleService<InMemoryLifecycleStore>,
    donations: DonationService<InMemoryDonationRepository, InMemoryUserRepository>,
}

fn harness() -> Harness {
    let clock = Arc::new(FixedClock::on(today()));
    let users = Arc::new(InMemoryUserRepository::new());
    let store = Arc::new(InMemoryLifecycleStore::new());
    let ledger = Arc::new(InMemoryDonationRepository::new());
    let provider = Arc::new(RecordingProvider::default());
    let activity = Arc::new(ShelterActivity::new(store.clone(), ledger.clone()));

    Harness {
        accounts: AccountService::with_clock(
            users.clone(),
            provider.clone(),
            activity,
            clock.clone(),
        ),
        provider,
        lifecycle: AnimalLifecycleService::with_clock(store, clock.clone()),
        donations: DonationService::with_clock(ledger, users, clock),
    }
}

fn form(username: &str, email: &str) -> RegistrationForm {
    RegistrationForm {
        username: username.to_string(),
        email: email.to_string(),
        first_name: "Ivan".to_string(),
        last_name: "Petrov".to_string(),
        phone: "+79161234567".to_string(),
        password: "correct-horse".to_string(),
        password_confirm: "correct-horse".to_string(),
    }
}

fn field_of(result: Result<User, AccountError>) -> &'static str {
    match result {
        Err(AccountError::Validation(error)) => error.field,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn registration_creates_user_and_enrolls_credentials() {
    let harness = harness();
    let user = harness
        .accounts
        .register(form("ivan", "ivan@example.org"))
        .expect("registration succeeds");

    assert_eq!(user.display_name(), "Ivan Petrov");
    assert!(!user.is_verified);
    assert_eq!(
        harness.provider.enrolled.lock().unwrap().as_slice(),
        &[(user.id, "correct-horse".len())]
    );
}

#[test]
fn registration_validates_fields() {
    let harness = harness();

    let mut short = form("ivan", "ivan@example.org");
    short.password = "short".to_string();
    short.password_confirm = "short".to_string();
    assert_eq!(field_of(harness.accounts.register(short)), "password");

    let mut mismatch = form("ivan", "ivan@example.org");
    mismatch.password_confirm = "different-horse".to_string();
    assert_eq!(field_of(harness.accounts.register(mismatch)), "password_confirm");

    let mut phone = form("ivan", "ivan@example.org");
    phone.phone = "8 (916) 123".to_string();
    assert_eq!(field_of(harness.accounts.register(phone)), "phone");

    let mut no_phone = form("ivan", "ivan@example.org");
    no_phone.phone = String::new();
    assert!(harness.accounts.register(no_phone).is_ok());
}

#[test]
fn registration_rejects_duplicates() {
    let harness = harness();
    harness
        .accounts
        .register(form("ivan", "ivan@example.org"))
        .unwrap();

    assert_eq!(
        field_of(harness.accounts.register(form("ivan", "other@example.org"))),
        "username"
    );
    assert_eq!(
        field_of(harness.accounts.register(form("maria", "IVAN@example.org"))),
        "email"
    );
}

#[test]
fn enrollment_failure_rolls_back_registration() {
    let users = Arc::new(InMemoryUserRepository::new());
    let activity = Arc::new(ShelterActivity::new(
        Arc::new(InMemoryLifecycleStore::new()),
        Arc::new(InMemoryDonationRepository::new()),
    ));
    let accounts =
        AccountService::new(users.clone(), Arc::new(OfflineProvider), activity.clone());

    assert!(matches!(
        accounts.register(form("ivan", "ivan@example.org")),
        Err(AccountError::Enrollment(_))
    ));
    assert!(users.find_by_username("ivan").unwrap().is_none());
    assert!(users.find_by_email("ivan@example.org").unwrap().is_none());

    let provider = Arc::new(RecordingProvider::default());
    let retry = AccountService::new(users.clone(), provider.clone(), activity);
    let user = retry
        .register(form("ivan", "ivan@example.org"))
        .expect("retry registers once the provider is back");
    assert_eq!(
        users.fetch(user.id).unwrap().map(|stored| stored.username),
        Some("ivan".to_string())
    );
    assert_eq!(provider.enrolled.lock().unwrap().len(), 1);
}

#[test]
fn profile_collects_activity_newest_first() {
    let harness = harness();
    let user = harness
        .accounts
        .register(form("ivan", "ivan@example.org"))
        .unwrap();
    let animal = harness
        .lifecycle
        .register_animal(AnimalIntake {
            name: "Rex".to_string(),
            animal_type: AnimalKind::Dog,
            breed: String::new(),
            age: AgeGroup::Young,
            gender: Gender::Male,
            size: AnimalSize::Large,
            color: String::new(),
            description: "Energetic".to_string(),
            health_status: String::new(),
            photo: None,
            vaccinated: false,
            sterilized: false,
        })
        .unwrap();
    harness
        .lifecycle
        .request_reservation(
            animal.id,
            VisitorInfo {
                user_id: Some(user.id),
                name: "Ivan".to_string(),
                phone: "+79161234567".to_string(),
                email: "ivan@example.org".to_string(),
                comment: String::new(),
            },
            today(),
        )
        .unwrap();
    harness
        .lifecycle
        .submit_adoption(animal.id, &Actor::visitor(user.id), "")
        .unwrap();
    harness
        .donations
        .donate(
            DonationForm {
                name: String::new(),
                email: String::new(),
                amount: Decimal::new(50000, 2),
                message: String::new(),
                is_anonymous: false,
            },
            &Actor::visitor(user.id),
        )
        .unwrap();

    let profile = harness.accounts.profile(user.id).unwrap();
    assert_eq!(profile.display_name, "Ivan Petrov");
    assert_eq!(profile.reservations.len(), 1);
    assert_eq!(profile.adoptions.len(), 1);
    assert_eq!(profile.donations.len(), 1);

    assert!(matches!(
        harness.accounts.profile(UserId(u64::MAX)),
        Err(AccountError::NotFound(_))
    ));
}

#[test]
fn profile_update_applies_partial_changes() {
    let harness = harness();
    let ivan = harness
        .accounts
        .register(form("ivan", "ivan@example.org"))
        .unwrap();
    harness
        .accounts
        .register(form("maria", "maria@example.org"))
        .unwrap();

    let updated = harness
        .accounts
        .update_profile(
            ivan.id,
            ProfileUpdate {
                address: Some("Lenina 1".to_string()),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17),
                ..ProfileUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.address, "Lenina 1");
    assert_eq!(updated.first_name, "Ivan");

    let taken = harness.accounts.update_profile(
        ivan.id,
        ProfileUpdate {
            email: Some("Maria@example.org".to_string()),
            ..ProfileUpdate::default()
        },
    );
    assert_eq!(field_of(taken), "email");

    let future = harness.accounts.update_profile(
        ivan.id,
        ProfileUpdate {
            date_of_birth: NaiveDate::from_ymd_opt(2030, 1, 1),
            ..ProfileUpdate::default()
        },
    );
    assert_eq!(field_of(future), "date_of_birth");
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn router_registers_and_reads_profile() {
    let harness = harness();
    let app = account_router(Arc::new(harness.accounts));

    let (status, created) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/v1/accounts")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&json!({
                    "username": "olga",
                    "email": "olga@example.org",
                    "password": "long-enough",
                    "password_confirm": "long-enough",
                }))
                .unwrap(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created.get("password").is_none());
    let user_id = created["id"].as_u64().unwrap();

    let (status, _) = send(
        &app,
        Request::builder()
            .uri("/api/v1/accounts/me")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, profile) = send(
        &app,
        Request::builder()
            .uri("/api/v1/accounts/me")
            .header(USER_HEADER, user_id.to_string())
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["display_name"], "olga");
    assert_eq!(profile["reservations"], json!([]));
}
