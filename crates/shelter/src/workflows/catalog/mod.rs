//! Public browsing of the animal catalog: filtered listings, detail pages and
//! the landing-page aggregates.

pub mod filter;
pub mod router;
pub mod service;


pub use filter::{AnimalFilter, CatalogQuery, Page};
pub use router::catalog_router;
pub use service::{
    AnimalDetail, CatalogError, CatalogService, ShelterStats, FEATURED_LIMIT, SIMILAR_LIMIT,
};
