use crate::models::timeline::TripPreferences;

pub const FALLBACK_REPLY: &str = "すみません、その内容ではプランを調整できませんでした。「のんびり」「予算を下げて」「グルメ」「雨」などと話しかけてみてください。";

#[derive(Debug, PartialEq, Eq)]
pub struct AdjustmentRule {
    pub id: &'static str,
    pub keywords: &'static [&'static str],
    pub instruction: &'static str,
    pub reply: &'static str,
}

/// Checked in order; the first rule with a matching keyword wins.
pub const RULES: &[AdjustmentRule] = &[
    AdjustmentRule {
        id: "relaxed_pace",
        keywords: &["のんびり", "ゆっくり", "relax"],
        instruction: "Make the pace relaxed: at most two sightseeing activities per day, longer breaks, and no early starts.",
        reply: "のんびり過ごせるプランに調整しました。",
    },
    AdjustmentRule {
        id: "lower_budget",
        keywords: &["予算を下げて", "安く", "節約", "cheaper"],
        instruction: "Lower the budget: prefer free attractions, casual restaurants and business hotels or hostels, and keep each day's total as low as possible.",
        reply: "予算を抑えたプランに調整しました。",
    },
    AdjustmentRule {
        id: "food_focus",
        keywords: &["グルメ", "食べ", "food"],
        instruction: "Focus on food: include local specialities, food markets and well-known restaurants for every meal.",
        reply: "グルメを楽しめるプランに調整しました。",
    },
    AdjustmentRule {
        id: "more_activities",
        keywords: &["アクティブ", "もっと観光", "active"],
        instruction: "Make the plan more active: fill every sightseeing slot and add walking tours or outdoor experiences.",
        reply: "アクティブに動けるプランに調整しました。",
    },
    AdjustmentRule {
        id: "rainy_day",
        keywords: &["雨", "rain"],
        instruction: "Assume rainy weather: replace outdoor activities with indoor sights such as museums, aquariums and shopping arcades.",
        reply: "雨の日でも楽しめるプランに調整しました。",
    },
];

pub fn match_rule(message: &str) -> Option<&'static AdjustmentRule> {
    let lowered = message.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|keyword| lowered.contains(keyword)))
}

/// Copies the preferences with the rule's instruction appended to any
/// existing override.
pub fn with_override(prefs: &TripPreferences, instruction: &str) -> TripPreferences {
    let mut adjusted = prefs.clone();
    adjusted.override_instruction = match prefs
        .override_instruction
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(existing) => Some(format!("{} {}", existing, instruction)),
        None => Some(instruction.to_string()),
    };
    adjusted
}
