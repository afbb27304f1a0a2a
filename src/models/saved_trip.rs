use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::models::timeline::parse_cost_value;

/// Snapshot of a planning session: the form input and the generated
/// timeline are kept as opaque JSON.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SavedTrip {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub title: String,
    pub total_duration: u32,
    pub form_data: Value,
    pub timeline_data: Value,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SavedTripInput {
    #[validate(length(min = 1, max = 255, message = "The title field is required."))]
    pub title: String,
    #[validate(range(min = 1, max = 60, message = "The total duration must be between 1 and 60 days."))]
    pub total_duration: u32,
    #[serde(default)]
    pub form_data: Value,
    pub timeline_data: Value,
}

impl SavedTripInput {
    /// Checks that `timeline_data.days` is an array with one entry per day.
    pub fn timeline_error(&self) -> Option<String> {
        match self.timeline_data.get("days").and_then(Value::as_array) {
            None => Some("The timeline must contain a days array.".to_string()),
            Some(days) if days.len() != self.total_duration as usize => Some(format!(
                "The timeline has {} days but the trip lasts {} days.",
                days.len(),
                self.total_duration
            )),
            Some(_) => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SavedTripView {
    pub id: String,
    pub title: String,
    pub total_duration: u32,
    pub form_data: Value,
    pub timeline_data: Value,
    pub regions: Vec<String>,
    pub travel_styles: Vec<String>,
    pub total_cost: f64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&SavedTrip> for SavedTripView {
    fn from(trip: &SavedTrip) -> Self {
        Self {
            id: trip.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: trip.title.clone(),
            total_duration: trip.total_duration,
            form_data: trip.form_data.clone(),
            timeline_data: trip.timeline_data.clone(),
            regions: regions_of(&trip.form_data),
            travel_styles: travel_styles_of(&trip.form_data),
            total_cost: total_cost_of(&trip.timeline_data),
            created_at: trip.created_at,
            updated_at: trip.updated_at,
        }
    }
}

/// Regions may be stored as plain names or as `{ region | name, days }` objects.
pub fn regions_of(form_data: &Value) -> Vec<String> {
    let Some(regions) = form_data.get("regions").and_then(Value::as_array) else {
        return Vec::new();
    };
    regions
        .iter()
        .filter_map(|entry| match entry {
            Value::String(name) => Some(name.clone()),
            Value::Object(map) => map
                .get("region")
                .or_else(|| map.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect()
}

pub fn travel_styles_of(form_data: &Value) -> Vec<String> {
    form_data
        .get("travel_styles")
        .or_else(|| form_data.get("travelStyles"))
        .and_then(Value::as_array)
        .map(|styles| {
            styles
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn total_cost_of(timeline_data: &Value) -> f64 {
    let Some(days) = timeline_data.get("days").and_then(Value::as_array) else {
        return 0.0;
    };
    days.iter()
        .filter_map(|day| day.get("activities").and_then(Value::as_array))
        .flatten()
        .map(|activity| activity.get("cost").map(parse_cost_value).unwrap_or(0.0))
        .sum()
}
