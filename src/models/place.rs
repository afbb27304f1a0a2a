use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Place {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub owner_id: ObjectId,
    pub name: String,
    pub description: Option<String>,
    pub region: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub genre_name: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub price: Option<f64>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Place {
    /// A place carries a tag when it is listed in `tags` or equals `genre_name`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag) || self.genre_name.as_deref() == Some(tag)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Category-specific views over the generic place table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceCategory {
    Hotel,
    Restaurant,
    Attraction,
}

impl PlaceCategory {
    pub fn tag(&self) -> &'static str {
        match self {
            PlaceCategory::Hotel => "accommodation",
            PlaceCategory::Restaurant => "restaurant",
            PlaceCategory::Attraction => "attraction",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceFilter {
    pub tag: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub q: Option<String>,
}

impl PlaceFilter {
    pub fn for_category(category: PlaceCategory, mut base: PlaceFilter) -> Self {
        base.tag = Some(category.tag().to_string());
        base
    }

    pub fn matches(&self, place: &Place) -> bool {
        if place.is_deleted() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !place.has_tag(tag) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !place.categories.iter().any(|c| c == category) {
                return false;
            }
        }
        if let Some(region) = &self.region {
            let same_region = place
                .region
                .as_deref()
                .map(|r| r.to_lowercase() == region.to_lowercase())
                .unwrap_or(false);
            if !same_region {
                return false;
            }
        }
        if let Some(q) = &self.q {
            let needle = q.to_lowercase();
            let in_name = place.name.to_lowercase().contains(&needle);
            let in_description = place
                .description
                .as_deref()
                .map(|d| d.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_name && !in_description {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PlaceInput {
    #[validate(length(min = 1, max = 255, message = "The name field is required."))]
    pub name: String,
    pub description: Option<String>,
    pub region: Option<String>,
    pub address: Option<String>,
    #[validate(range(min = -90.0, max = 90.0, message = "The latitude must be between -90 and 90."))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0, message = "The longitude must be between -180 and 180."))]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub genre_name: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[validate(range(min = 0.0, message = "The price must be at least 0."))]
    pub price: Option<f64>,
}

impl PlaceInput {
    pub fn apply_to(self, place: &mut Place) {
        place.name = self.name;
        place.description = self.description;
        place.region = self.region;
        place.address = self.address;
        place.latitude = self.latitude;
        place.longitude = self.longitude;
        place.tags = self.tags;
        place.genre_name = self.genre_name;
        place.categories = self.categories;
        place.price = self.price;
    }
}

#[derive(Debug, Serialize)]
pub struct PlaceView {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub region: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub tags: Vec<String>,
    pub genre_name: Option<String>,
    pub categories: Vec<String>,
    pub price: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Place> for PlaceView {
    fn from(place: &Place) -> Self {
        Self {
            id: place.id.map(|id| id.to_hex()).unwrap_or_default(),
            owner_id: place.owner_id.to_hex(),
            name: place.name.clone(),
            description: place.description.clone(),
            region: place.region.clone(),
            address: place.address.clone(),
            latitude: place.latitude,
            longitude: place.longitude,
            tags: place.tags.clone(),
            genre_name: place.genre_name.clone(),
            categories: place.categories.clone(),
            price: place.price,
            created_at: place.created_at,
            updated_at: place.updated_at,
        }
    }
}
