use serde::{Deserialize, Serialize};

use crate::workflows::lifecycle::domain::{AgeGroup, Animal, AnimalKind, AnimalSize, Gender};

/// Raw catalog query string. Every field is optional and unknown values are
/// ignored rather than rejected, so stale bookmarks keep working.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
    pub animal_type: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub size: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
}

/// Parsed catalog filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimalFilter {
    pub animal_type: Option<AnimalKind>,
    pub age: Option<AgeGroup>,
    pub gender: Option<Gender>,
    pub size: Option<AnimalSize>,
    pub search: Option<String>,
}

impl AnimalFilter {
    pub fn from_query(query: &CatalogQuery) -> Self {
        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);

        Self {
            animal_type: query.animal_type.as_deref().and_then(AnimalKind::from_slug),
            age: query.age.as_deref().and_then(AgeGroup::from_slug),
            gender: query.gender.as_deref().and_then(Gender::from_slug),
            size: query.size.as_deref().and_then(AnimalSize::from_slug),
            search,
        }
    }

    pub fn matches(&self, animal: &Animal) -> bool {
        if self.animal_type.is_some_and(|kind| kind != animal.animal_type) {
            return false;
        }
        if self.age.is_some_and(|age| age != animal.age) {
            return false;
        }
        if self.gender.is_some_and(|gender| gender != animal.gender) {
            return false;
        }
        if self.size.is_some_and(|size| size != animal.size) {
            return false;
        }
        match &self.search {
            Some(term) => [&animal.name, &animal.description, &animal.breed]
                .iter()
                .any(|field| field.to_lowercase().contains(term.as_str())),
            None => true,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub num_pages: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    /// Cuts `items` into pages of `per_page` and returns the requested one.
    ///
    /// A missing or non-numeric page number yields the first page, a number
    /// out of range (past the end, zero or negative) yields the last page, and
    /// an empty listing is page 1 of 1.
    pub fn select(items: Vec<T>, per_page: usize, requested: Option<&str>) -> Self {
        let per_page = per_page.max(1);
        let total = items.len();
        let num_pages = total.div_ceil(per_page).max(1);
        let page = match requested.and_then(|raw| raw.trim().parse::<i64>().ok()) {
            None => 1,
            Some(number) => usize::try_from(number)
                .ok()
                .filter(|&number| (1..=num_pages).contains(&number))
                .unwrap_or(num_pages),
        };

        let items = items
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        Self {
            items,
            page,
            num_pages,
            total,
            has_next: page < num_pages,
            has_previous: page > 1,
        }
    }
}
