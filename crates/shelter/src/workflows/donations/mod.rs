//! Donations: pledges, staff payment settlement and the public donor wall.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{Donation, DonationForm, DonationId, PaymentStatus};
pub use repository::{DonationRepository, InMemoryDonationRepository};
pub use router::donation_router;
pub use service::{DonationError, DonationService, ANONYMOUS_DONOR, TOP_DONOR_LIMIT};
