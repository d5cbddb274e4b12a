//! Read-only car catalog.
//!
//! The catalog is a JSON array of cars loaded once at startup. Cart and
//! checkout validate car IDs against it; the browse endpoints filter and
//! paginate it in memory.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use autoelite_core::CarId;

/// Default page size for catalog listings.
pub const DEFAULT_PER_PAGE: usize = 6;

/// Largest page size a client may request.
pub const MAX_PER_PAGE: usize = 50;

/// Errors raised while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("car id {0} must be positive")]
    InvalidId(CarId),
    #[error("duplicate car id {0}")]
    DuplicateId(CarId),
}

/// A car for sale.
///
/// Field names follow the catalog file's camelCase keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: CarId,
    pub name: String,
    pub make: String,
    #[serde(default)]
    pub model: Option<String>,
    pub year: i32,
    pub category: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_formatted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transmission: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drivetrain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horsepower: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mpg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exterior_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interior_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dealer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Price bands offered by the browse filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PriceBand {
    /// Below RM 30,000.
    #[serde(rename = "under30")]
    Under30,
    /// RM 30,000 to RM 50,000 inclusive.
    #[serde(rename = "30to50")]
    From30To50,
    /// Above RM 50,000.
    #[serde(rename = "above50")]
    Above50,
}

impl PriceBand {
    fn contains(self, price: Decimal) -> bool {
        let thirty = Decimal::new(30_000, 0);
        let fifty = Decimal::new(50_000, 0);
        match self {
            Self::Under30 => price < thirty,
            Self::From30To50 => price >= thirty && price <= fifty,
            Self::Above50 => price > fifty,
        }
    }
}

/// Browse filter. All criteria are optional and combine with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CarFilter {
    pub make: Option<String>,
    pub year: Option<i32>,
    pub category: Option<String>,
    pub price: Option<PriceBand>,
    /// Case-insensitive substring of the car name.
    pub q: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl CarFilter {
    fn matches(&self, car: &Car) -> bool {
        if let Some(make) = non_blank(self.make.as_deref())
            && car.make != make
        {
            return false;
        }
        if let Some(year) = self.year
            && car.year != year
        {
            return false;
        }
        if let Some(category) = non_blank(self.category.as_deref())
            && car.category != category
        {
            return false;
        }
        if let Some(band) = self.price
            && !band.contains(car.price)
        {
            return false;
        }
        if let Some(q) = non_blank(self.q.as_deref())
            && !car.name.to_lowercase().contains(&q.to_lowercase())
        {
            return false;
        }
        true
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub page_count: usize,
}

/// Distinct values for the browse filter dropdowns.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Facets {
    /// Makes in catalog order.
    pub makes: Vec<String>,
    /// Years, ascending.
    pub years: Vec<i32>,
    /// Categories in catalog order.
    pub categories: Vec<String>,
}

/// In-memory catalog indexed by car ID.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cars: Vec<Car>,
    index: HashMap<CarId, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting non-positive or duplicate IDs.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::InvalidId` or `CatalogError::DuplicateId`.
    pub fn new(cars: Vec<Car>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(cars.len());
        for (position, car) in cars.iter().enumerate() {
            if !car.id.is_valid() {
                return Err(CatalogError::InvalidId(car.id));
            }
            if index.insert(car.id, position).is_some() {
                return Err(CatalogError::DuplicateId(car.id));
            }
        }
        Ok(Self { cars, index })
    }

    /// Parse a catalog from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Parse` for malformed JSON, or the errors of [`Catalog::new`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::new(serde_json::from_str(json)?)
    }

    /// Load the catalog file.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the file cannot be read, or any parse error.
    pub async fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CatalogError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let catalog = Self::from_json(&json)?;
        info!(path = %path.display(), cars = catalog.len(), "Loaded car catalog");
        Ok(catalog)
    }

    /// Number of cars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cars.len()
    }

    /// Whether the catalog has no cars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    /// Look up a car by ID.
    #[must_use]
    pub fn get(&self, id: CarId) -> Option<&Car> {
        self.index.get(&id).and_then(|&i| self.cars.get(i))
    }

    /// Filter and paginate. Page numbers start at 1; out-of-range values are clamped.
    #[must_use]
    pub fn list(&self, filter: &CarFilter) -> Page<Car> {
        let per_page = filter
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        let page = filter.page.unwrap_or(1).max(1);

        let matching: Vec<&Car> = self.cars.iter().filter(|car| filter.matches(car)).collect();
        let total = matching.len();

        let items = matching
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .cloned()
            .collect();

        Page {
            items,
            page,
            per_page,
            total,
            page_count: total.div_ceil(per_page),
        }
    }

    /// Distinct makes, years and categories.
    #[must_use]
    pub fn facets(&self) -> Facets {
        let mut seen_makes = HashSet::new();
        let mut seen_categories = HashSet::new();
        let mut makes = Vec::new();
        let mut categories = Vec::new();
        let mut years = BTreeSet::new();

        for car in &self.cars {
            if seen_makes.insert(car.make.as_str()) {
                makes.push(car.make.clone());
            }
            if seen_categories.insert(car.category.as_str()) {
                categories.push(car.category.clone());
            }
            years.insert(car.year);
        }

        Facets {
            makes,
            years: years.into_iter().collect(),
            categories,
        }
    }
}
