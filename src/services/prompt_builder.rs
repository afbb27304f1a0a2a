use std::fmt::Write;

use crate::models::timeline::TripPreferences;

/// Fixed daily slots the model has to fill, in order.
pub const TIME_SLOTS: [(&str, &str); 6] = [
    ("09:00", "attraction"),
    ("12:00", "meal (lunch)"),
    ("14:00", "attraction or experience"),
    ("16:00", "attraction or experience"),
    ("18:30", "meal (dinner)"),
    ("20:00", "accommodation"),
];

const RESPONSE_SCHEMA: &str = r#"{
  "days": [
    {
      "day": 1,
      "title": "short theme of the day",
      "activities": [
        {
          "time": "09:00",
          "type": "attraction | meal | accommodation | experience",
          "name": "place or activity name",
          "description": "one or two sentences",
          "cost": 1500,
          "location": "area or address"
        }
      ]
    }
  ]
}"#;

/// Renders travel preferences into the generation prompt.
///
/// The override instruction, when present, is always the last paragraph.
pub fn build_prompt(prefs: &TripPreferences) -> String {
    let total_days = prefs.total_days();
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are a travel planner specialising in Japan. Create a {}-day itinerary.",
        total_days
    );
    prompt.push('\n');

    prompt.push_str("Regions, visited in this order:\n");
    let mut first_day = 1;
    for allocation in &prefs.regions {
        let last_day = first_day + allocation.days.saturating_sub(1);
        let _ = writeln!(
            prompt,
            "- {}: {} day(s) (day {} to day {})",
            allocation.region, allocation.days, first_day, last_day
        );
        first_day = last_day + 1;
    }

    if !prefs.travel_styles.is_empty() {
        let _ = writeln!(prompt, "Travel styles: {}", prefs.travel_styles.join(", "));
    }
    if let Some(season) = prefs.season.as_deref().filter(|s| !s.trim().is_empty()) {
        let _ = writeln!(prompt, "Season: {}", season);
    }

    prompt.push_str("\nFormatting rules:\n");
    prompt.push_str("1. Every day uses exactly these time slots:\n");
    for (time, kind) in TIME_SLOTS {
        let _ = writeln!(prompt, "   - {} {}", time, kind);
    }
    prompt.push_str("2. Every day must include lunch, dinner and an accommodation entry.\n");
    prompt.push_str(
        "3. \"cost\" is a plain number in Japanese yen per person. No currency symbols, commas or text.\n",
    );
    let _ = writeln!(
        prompt,
        "4. Return exactly {} day objects, numbered from 1.",
        total_days
    );
    prompt.push_str("5. Respond with JSON only, no commentary, using this structure:\n");
    prompt.push_str(RESPONSE_SCHEMA);
    prompt.push('\n');

    if let Some(instruction) = prefs
        .override_instruction
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        let _ = write!(
            prompt,
            "\nAdditional request (takes priority over the preferences above): {}\n",
            instruction.trim()
        );
    }

    prompt
}
