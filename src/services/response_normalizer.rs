use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::models::timeline::{
    RegionAllocation, Timeline, TimelineActivity, TimelineDay, TripPreferences,
};

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("model response is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("model response has no \"days\" array")]
    MissingDays,
    #[error("model response has an invalid entry for day {day}: {source}")]
    InvalidDay {
        day: usize,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct RawDay {
    #[serde(default, alias = "theme")]
    title: Option<String>,
    #[serde(default)]
    activities: Vec<TimelineActivity>,
}

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z]*\s*\n?(.*?)\s*```").expect("fence pattern is valid")
    })
}

/// Returns the contents of the first fenced block, or the trimmed input when
/// there is no fence.
pub fn strip_code_fences(raw: &str) -> &str {
    match fence_pattern().captures(raw).and_then(|c| c.get(1)) {
        Some(body) => body.as_str().trim(),
        None => raw.trim(),
    }
}

/// Finds the region owning a 1-based day by walking the cumulative day counts.
/// Days past the allocation belong to the last region.
pub fn region_for_day(regions: &[RegionAllocation], day: u32) -> String {
    let mut cumulative = 0;
    for allocation in regions {
        cumulative += allocation.days;
        if day <= cumulative {
            return allocation.region.clone();
        }
    }
    regions
        .last()
        .map(|allocation| allocation.region.clone())
        .unwrap_or_default()
}

/// Parses raw model output into a timeline. Malformed output is rejected
/// as-is; nothing is repaired.
pub fn normalize_response(raw: &str, prefs: &TripPreferences) -> Result<Timeline, NormalizeError> {
    let body = strip_code_fences(raw);
    let value: Value = serde_json::from_str(body).map_err(NormalizeError::InvalidJson)?;
    let days = value
        .get("days")
        .and_then(Value::as_array)
        .ok_or(NormalizeError::MissingDays)?;

    let mut timeline_days = Vec::with_capacity(days.len());
    for (index, entry) in days.iter().enumerate() {
        let day_number = index as u32 + 1;
        let raw_day: RawDay =
            serde_json::from_value(entry.clone()).map_err(|source| NormalizeError::InvalidDay {
                day: index + 1,
                source,
            })?;

        timeline_days.push(TimelineDay {
            day: day_number,
            region: region_for_day(&prefs.regions, day_number),
            title: raw_day
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| format!("Day {}", day_number)),
            activities: raw_day
                .activities
                .into_iter()
                .filter(|a| !a.name.trim().is_empty())
                .collect(),
            total_cost: 0.0,
        });
    }

    Ok(Timeline::new(timeline_days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::timeline::ActivityKind;

    const BODY: &str = r#"{
        "days": [
            {
                "day": 1,
                "title": "Asakusa",
                "activities": [
                    { "time": "09:00", "type": "attraction", "name": "Senso-ji", "description": "Temple", "cost": 0 },
                    { "time": "12:00", "type": "meal", "name": "Tempura", "description": "Lunch", "cost": 2000 },
                    { "time": "20:00", "type": "accommodation", "name": "Hotel", "description": "Stay", "cost": 12000 }
                ]
            },
            { "day": 2, "title": "Arashiyama", "activities": [] },
            { "day": 3, "activities": [] }
        ]
    }"#;

    fn prefs() -> TripPreferences {
        TripPreferences {
            regions: vec![
                RegionAllocation {
                    region: "Tokyo".to_string(),
                    days: 1,
                },
                RegionAllocation {
                    region: "Kyoto".to_string(),
                    days: 1,
                },
            ],
            travel_styles: vec![],
            season: None,
            override_instruction: None,
        }
    }

    #[test]
    fn fenced_and_bare_json_normalize_identically() {
        let fenced = format!("```json\n{}\n```", BODY);
        let bare_fence = format!("```\n{}\n```", BODY);
        let with_prose = format!("Here is your plan:\n```json\n{}\n```\nEnjoy!", BODY);

        let expected = normalize_response(BODY, &prefs()).unwrap();
        assert_eq!(normalize_response(&fenced, &prefs()).unwrap(), expected);
        assert_eq!(normalize_response(&bare_fence, &prefs()).unwrap(), expected);
        assert_eq!(normalize_response(&with_prose, &prefs()).unwrap(), expected);
    }

    #[test]
    fn regions_are_bucketed_by_cumulative_days() {
        let timeline = normalize_response(BODY, &prefs()).unwrap();
        let regions: Vec<&str> = timeline.days.iter().map(|d| d.region.as_str()).collect();
        assert_eq!(regions, vec!["Tokyo", "Kyoto", "Kyoto"]);
        assert_eq!(timeline.days[2].title, "Day 3");
    }

    #[test]
    fn costs_are_totalled_per_day() {
        let timeline = normalize_response(BODY, &prefs()).unwrap();
        assert_eq!(timeline.days[0].total_cost, 14000.0);
        assert_eq!(timeline.total_cost, 14000.0);
        assert_eq!(timeline.days[0].activities[1].kind, ActivityKind::Meal);
    }

    #[test]
    fn malformed_output_is_terminal() {
        let err = normalize_response("```json\n{\"days\": [\n```", &prefs()).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidJson(_)));

        let err = normalize_response(r#"{"itinerary": []}"#, &prefs()).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingDays));

        let err = normalize_response(r#"{"days": [{"activities": "see above"}]}"#, &prefs())
            .unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidDay { day: 1, .. }));
    }

    #[test]
    fn loose_activities_are_kept_and_unnamed_ones_dropped() {
        let raw = r#"{"days": [{"activities": [
            {"time": "09:00", "type": null, "name": "Tsukiji Outer Market", "cost": "¥1,000〜¥2,000"},
            {"time": "12:00", "cost": 900}
        ]}]}"#;
        let timeline = normalize_response(raw, &prefs()).unwrap();
        assert_eq!(timeline.days[0].activities.len(), 1);
        assert_eq!(timeline.days[0].activities[0].kind, ActivityKind::Experience);
        assert_eq!(timeline.days[0].total_cost, 1000.0);
    }

    #[test]
    fn region_lookup_with_no_regions_is_empty() {
        assert_eq!(region_for_day(&[], 1), "");
    }
}
