//! Wine entity and identifier

use serde::{Deserialize, Serialize};

/// Wine identifier, assigned by the repository on first save
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WineId(i32);

impl WineId {
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl From<i32> for WineId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<WineId> for i32 {
    fn from(id: WineId) -> Self {
        id.0
    }
}

impl std::fmt::Display for WineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wine entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wine {
    /// Absent until the wine has been saved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<WineId>,
    /// Producing estate
    chateau: String,
    /// Region or classification, used as a filter key
    appellation: String,
    /// Price per bottle
    price: f64,
}

impl Wine {
    /// Create a wine that has not been persisted yet
    pub fn new(chateau: impl Into<String>, appellation: impl Into<String>, price: f64) -> Self {
        Self {
            id: None,
            chateau: chateau.into(),
            appellation: appellation.into(),
            price,
        }
    }

    /// Set the identifier (builder pattern)
    pub fn with_id(mut self, id: impl Into<WineId>) -> Self {
        self.id = Some(id.into());
        self
    }

    // Getters

    pub fn id(&self) -> Option<WineId> {
        self.id
    }

    pub fn chateau(&self) -> &str {
        &self.chateau
    }

    pub fn appellation(&self) -> &str {
        &self.appellation
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    // Setters

    pub fn set_id(&mut self, id: WineId) {
        self.id = Some(id);
    }

    pub fn set_chateau(&mut self, chateau: impl Into<String>) {
        self.chateau = chateau.into();
    }

    pub fn set_appellation(&mut self, appellation: impl Into<String>) {
        self.appellation = appellation.into();
    }

    pub fn set_price(&mut self, price: f64) {
        self.price = price;
    }
}
