use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::workflows::identity::UserId;

/// Identifier of an animal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnimalId(pub u64);

/// Identifier of a visit reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReservationId(pub u64);

/// Identifier of an adoption record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AdoptionId(pub u64);

impl fmt::Display for AnimalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AdoptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimalKind {
    Dog,
    Cat,
    Other,
}

impl AnimalKind {
    pub const fn ordered() -> [Self; 3] {
        [Self::Dog, Self::Cat, Self::Other]
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Self::Dog => "dog",
            Self::Cat => "cat",
            Self::Other => "other",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dog => "Dog",
            Self::Cat => "Cat",
            Self::Other => "Other",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Dog => "🐕",
            Self::Cat => "🐱",
            Self::Other => "🐾",
        }
    }

    pub fn from_slug(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|kind| kind.slug().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgeGroup {
    Young,
    Adult,
    Senior,
}

impl AgeGroup {
    pub const fn ordered() -> [Self; 3] {
        [Self::Young, Self::Adult, Self::Senior]
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Self::Young => "young",
            Self::Adult => "adult",
            Self::Senior => "senior",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Young => "Under 1 year",
            Self::Adult => "1-7 years",
            Self::Senior => "Over 7 years",
        }
    }

    pub fn from_slug(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|age| age.slug().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const fn ordered() -> [Self; 2] {
        [Self::Male, Self::Female]
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    pub fn from_slug(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|gender| gender.slug().eq_ignore_ascii_case(value.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimalSize {
    Small,
    Medium,
    Large,
}

impl AnimalSize {
    pub const fn ordered() -> [Self; 3] {
        [Self::Small, Self::Medium, Self::Large]
    }

    pub const fn slug(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    pub fn from_slug(value: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|size| size.slug().eq_ignore_ascii_case(value.trim()))
    }
}

/// Where an animal is in its lifecycle. Exactly one variant holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimalStatus {
    Available,
    Reserved,
    Adopted,
}

impl AnimalStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::Available, Self::Reserved, Self::Adopted]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Adopted => "adopted",
        }
    }

    /// Human-facing wording used on availability checks.
    pub const fn display_label(self) -> &'static str {
        match self {
            Self::Available => "In the shelter",
            Self::Reserved => "Reserved",
            Self::Adopted => "Adopted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Pending and confirmed reservations hold the animal.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdoptionStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl AdoptionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }

    /// Approved and completed adoptions pin the animal as adopted.
    pub const fn binds_animal(self) -> bool {
        matches!(self, Self::Approved | Self::Completed)
    }
}

/// Intake payload for a new shelter animal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimalIntake {
    pub name: String,
    pub animal_type: AnimalKind,
    #[serde(default)]
    pub breed: String,
    pub age: AgeGroup,
    pub gender: Gender,
    pub size: AnimalSize,
    #[serde(default)]
    pub color: String,
    pub description: String,
    #[serde(default)]
    pub health_status: String,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub vaccinated: bool,
    #[serde(default)]
    pub sterilized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animal {
    pub id: AnimalId,
    pub name: String,
    pub animal_type: AnimalKind,
    pub breed: String,
    pub age: AgeGroup,
    pub gender: Gender,
    pub size: AnimalSize,
    pub color: String,
    pub description: String,
    pub health_status: String,
    pub photo: Option<String>,
    pub status: AnimalStatus,
    pub vaccinated: bool,
    pub sterilized: bool,
    pub arrival_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Animal {
    /// Catalog heading, e.g. `Rex (Dog)`.
    pub fn title(&self) -> String {
        format!("{} ({})", self.name, self.animal_type.label())
    }
}

/// Contact details left by the visitor who asks to meet an animal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorInfo {
    /// Filled from the authenticated actor, never from the request body.
    #[serde(skip)]
    pub user_id: Option<UserId>,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub animal_id: AnimalId,
    pub user_id: Option<UserId>,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub visit_date: NaiveDate,
    pub comment: String,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adoption {
    pub id: AdoptionId,
    pub animal_id: AnimalId,
    pub user_id: UserId,
    pub status: AdoptionStatus,
    pub adoption_date: Option<NaiveDate>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Read-only answer to "can this animal still be reserved?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityView {
    pub animal_id: AnimalId,
    pub available: bool,
    pub status: AnimalStatus,
    pub status_label: &'static str,
}

impl AvailabilityView {
    pub fn of(animal: &Animal) -> Self {
        Self {
            animal_id: animal.id,
            available: animal.status == AnimalStatus::Available,
            status: animal.status,
            status_label: animal.status.display_label(),
        }
    }
}
