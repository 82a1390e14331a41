use std::sync::Arc;

use serde::Serialize;

use super::filter::{AnimalFilter, CatalogQuery, Page};
use crate::config::ShelterConfig;
use crate::workflows::lifecycle::domain::{Animal, AnimalId, AnimalStatus, AvailabilityView};
use crate::workflows::lifecycle::store::LifecycleStore;
use crate::workflows::repository::RepositoryError;

pub const SIMILAR_LIMIT: usize = 4;
pub const FEATURED_LIMIT: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("animal {0} not found")]
    NotFound(AnimalId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Clone, Serialize)]
pub struct AnimalDetail {
    pub animal: Animal,
    pub availability: AvailabilityView,
    pub similar: Vec<Animal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ShelterStats {
    pub total: usize,
    pub adopted: usize,
    pub available: usize,
}

/// Read-only browsing over the animal records.
pub struct CatalogService<S> {
    store: Arc<S>,
    page_size: usize,
}

impl<S> CatalogService<S>
where
    S: LifecycleStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_page_size(store, ShelterConfig::DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(store: Arc<S>, page_size: usize) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
        }
    }

    fn all_animals(&self) -> Result<Vec<Animal>, CatalogError> {
        self.store.read(|tx| tx.animals().map_err(CatalogError::from))
    }

    /// Available animals matching `query`, newest first.
    pub fn list_animals(&self, query: &CatalogQuery) -> Result<Page<Animal>, CatalogError> {
        let filter = AnimalFilter::from_query(query);
        let matching: Vec<Animal> = self
            .all_animals()?
            .into_iter()
            .filter(|animal| animal.status == AnimalStatus::Available && filter.matches(animal))
            .collect();

        let page = Page::select(matching, self.page_size, query.page.as_deref());
        tracing::debug!(
            total = page.total,
            page = page.page,
            num_pages = page.num_pages,
            "catalog listing served"
        );
        Ok(page)
    }

    pub fn animal_detail(&self, animal_id: AnimalId) -> Result<AnimalDetail, CatalogError> {
        let animals = self.all_animals()?;
        let animal = animals
            .iter()
            .find(|animal| animal.id == animal_id)
            .cloned()
            .ok_or(CatalogError::NotFound(animal_id))?;

        let similar = animals
            .into_iter()
            .filter(|other| {
                other.id != animal.id
                    && other.animal_type == animal.animal_type
                    && other.status == AnimalStatus::Available
            })
            .take(SIMILAR_LIMIT)
            .collect();

        Ok(AnimalDetail {
            availability: AvailabilityView::of(&animal),
            animal,
            similar,
        })
    }

    /// Newest available animals for the landing page.
    pub fn featured(&self) -> Result<Vec<Animal>, CatalogError> {
        Ok(self
            .all_animals()?
            .into_iter()
            .filter(|animal| animal.status == AnimalStatus::Available)
            .take(FEATURED_LIMIT)
            .collect())
    }

    pub fn stats(&self) -> Result<ShelterStats, CatalogError> {
        let animals = self.all_animals()?;
        let count = |status: AnimalStatus| {
            animals
                .iter()
                .filter(|animal| animal.status == status)
                .count()
        };
        Ok(ShelterStats {
            total: animals.len(),
            adopted: count(AnimalStatus::Adopted),
            available: count(AnimalStatus::Available),
        })
    }
}
