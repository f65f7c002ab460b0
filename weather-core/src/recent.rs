use serde::{Deserialize, Serialize};

pub const MAX_RECENT_CITIES: usize = 5;

/// Most-recent-first list of searched cities, capped at five and free of
/// case-insensitive duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentCities {
    cities: Vec<String>,
}

impl RecentCities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `city` to the front, dropping any earlier spelling of it.
    pub fn record(&mut self, city: &str) {
        let city = city.trim();
        if city.is_empty() {
            return;
        }

        let lower = city.to_lowercase();
        self.cities.retain(|c| c.to_lowercase() != lower);
        self.cities.insert(0, city.to_string());
        self.cities.truncate(MAX_RECENT_CITIES);
    }

    pub fn as_slice(&self) -> &[String] {
        &self.cities
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(String::as_str)
    }
}
