use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RegionAllocation {
    #[validate(length(min = 1, message = "The region field is required."))]
    pub region: String,
    #[validate(range(min = 1, max = 30, message = "Each region needs between 1 and 30 days."))]
    pub days: u32,
}

/// Travel preferences collected by the planning form.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct TripPreferences {
    #[validate(length(min = 1, message = "Select at least one region."), nested)]
    pub regions: Vec<RegionAllocation>,
    #[serde(default, alias = "travelStyles")]
    pub travel_styles: Vec<String>,
    pub season: Option<String>,
    #[serde(default, alias = "overrideRequest", skip_serializing_if = "Option::is_none")]
    pub override_instruction: Option<String>,
}

impl TripPreferences {
    pub fn total_days(&self) -> u32 {
        self.regions.iter().map(|r| r.days).sum()
    }

    pub fn region_names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.region.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Attraction,
    Meal,
    Accommodation,
    Experience,
}

impl ActivityKind {
    /// Maps the loose labels the model produces onto the four activity kinds.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "attraction" | "sightseeing" | "spot" | "観光" => ActivityKind::Attraction,
            "meal" | "food" | "restaurant" | "breakfast" | "lunch" | "dinner" | "食事" => {
                ActivityKind::Meal
            }
            "accommodation" | "hotel" | "lodging" | "ryokan" | "宿泊" => ActivityKind::Accommodation,
            _ => ActivityKind::Experience,
        }
    }

    /// Tag used when the activity is stored as a place.
    pub fn place_tag(&self) -> &'static str {
        match self {
            ActivityKind::Attraction => "attraction",
            ActivityKind::Meal => "restaurant",
            ActivityKind::Accommodation => "accommodation",
            ActivityKind::Experience => "experience",
        }
    }
}

impl Default for ActivityKind {
    fn default() -> Self {
        ActivityKind::Experience
    }
}

impl<'de> Deserialize<'de> for ActivityKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label: Option<String> = Option::deserialize(deserializer)?;
        Ok(label
            .as_deref()
            .map(ActivityKind::from_label)
            .unwrap_or_default())
    }
}

fn amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("amount pattern is valid")
    })
}

/// Reads a cost that may arrive as a number or as text such as "¥1,500".
/// Text with several amounts ("1000-2000") counts its first one.
pub fn parse_cost_value(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => amount_pattern()
            .find(s)
            .and_then(|m| m.as_str().replace(',', "").parse().ok())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

fn deserialize_cost<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(value.as_ref().map(parse_cost_value).unwrap_or(0.0))
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimelineActivity {
    #[serde(default)]
    pub time: String,
    #[serde(rename = "type", default)]
    pub kind: ActivityKind,
    #[serde(default, alias = "title")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "deserialize_cost")]
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimelineDay {
    pub day: u32,
    #[serde(default)]
    pub region: String,
    #[serde(default, alias = "theme")]
    pub title: String,
    #[serde(default)]
    pub activities: Vec<TimelineActivity>,
    #[serde(default)]
    pub total_cost: f64,
}

impl TimelineDay {
    pub fn computed_cost(&self) -> f64 {
        self.activities.iter().map(|a| a.cost).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Timeline {
    pub days: Vec<TimelineDay>,
    #[serde(default)]
    pub total_cost: f64,
}

impl Timeline {
    /// Builds a timeline and fills in the per-day and overall cost totals.
    pub fn new(mut days: Vec<TimelineDay>) -> Self {
        for day in &mut days {
            day.total_cost = day.computed_cost();
        }
        let total_cost = days.iter().map(|d| d.total_cost).sum();
        Self { days, total_cost }
    }

    /// Recomputes totals on a timeline that came from a client.
    pub fn recalculated(self) -> Self {
        Timeline::new(self.days)
    }
}
