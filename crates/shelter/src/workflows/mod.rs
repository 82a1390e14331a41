pub mod accounts;
pub mod catalog;
pub mod clock;
pub mod donations;
pub mod identity;
pub mod lifecycle;
pub mod repository;
pub mod support;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use identity::{Actor, ActorRole, UserId};
pub use repository::RepositoryError;
pub use validation::FieldError;
