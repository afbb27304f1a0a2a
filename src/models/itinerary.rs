use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::timeline::{Timeline, TripPreferences};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Itinerary {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub preferences: Option<TripPreferences>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One visit inside an itinerary. `order` sequences visits within a day;
/// gaps and repeated values are allowed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItineraryPlace {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub itinerary_id: ObjectId,
    pub place_id: ObjectId,
    pub day: u32,
    pub visit_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub order: i32,
    pub cost: f64,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SaveItineraryInput {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub preferences: Option<TripPreferences>,
    pub timeline: Timeline,
}

#[derive(Debug, Serialize)]
pub struct ItinerarySummary {
    pub id: String,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Itinerary> for ItinerarySummary {
    fn from(itinerary: &Itinerary) -> Self {
        Self {
            id: itinerary.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: itinerary.title.clone(),
            start_date: itinerary.start_date,
            end_date: itinerary.end_date,
            created_at: itinerary.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ItineraryStop {
    pub id: String,
    pub place_id: String,
    pub place_name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub order: i32,
    pub cost: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItineraryDay {
    pub day: u32,
    pub visit_date: Option<NaiveDate>,
    pub stops: Vec<ItineraryStop>,
}

#[derive(Debug, Serialize)]
pub struct ItineraryDetail {
    #[serde(flatten)]
    pub summary: ItinerarySummary,
    pub preferences: Option<TripPreferences>,
    pub days: Vec<ItineraryDay>,
    pub total_cost: f64,
}
