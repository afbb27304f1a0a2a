use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Generate,
    Adjust,
}

/// Append-only record of one prompt sent to the model.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiInteractionLog {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: Option<ObjectId>,
    pub kind: InteractionKind,
    pub prompt: String,
    pub response: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A chat message that matched an adjustment rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiSuggestion {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub message: String,
    pub rule: String,
    pub override_instruction: String,
    pub reply: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct InteractionView {
    pub id: String,
    pub kind: InteractionKind,
    pub prompt: String,
    pub response: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&AiInteractionLog> for InteractionView {
    fn from(log: &AiInteractionLog) -> Self {
        Self {
            id: log.id.map(|id| id.to_hex()).unwrap_or_default(),
            kind: log.kind,
            prompt: log.prompt.clone(),
            response: log.response.clone(),
            success: log.success,
            error: log.error.clone(),
            created_at: log.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SuggestionView {
    pub id: String,
    pub message: String,
    pub rule: String,
    pub reply: String,
    pub created_at: DateTime<Utc>,
}

impl From<&AiSuggestion> for SuggestionView {
    fn from(suggestion: &AiSuggestion) -> Self {
        Self {
            id: suggestion.id.map(|id| id.to_hex()).unwrap_or_default(),
            message: suggestion.message.clone(),
            rule: suggestion.rule.clone(),
            reply: suggestion.reply.clone(),
            created_at: suggestion.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatLog {
    pub user_id: String,
    pub interactions: Vec<InteractionView>,
    pub suggestions: Vec<SuggestionView>,
}
