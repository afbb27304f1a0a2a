use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::repository::{AiLogRepository, ItineraryRepository};
use crate::error::ApiError;
use crate::middleware::auth_context::{AuthenticatedUser, MaybeUser};
use crate::models::ai_log::{
    AiSuggestion, ChatLog, InteractionKind, InteractionView, SuggestionView,
};
use crate::models::itinerary::SaveItineraryInput;
use crate::models::timeline::{Timeline, TripPreferences};
use crate::routes::parse_id;
use crate::services::chat_adjustment_service::{match_rule, with_override, FALLBACK_REPLY};
use crate::services::itinerary_generation_service::ItineraryGenerator;
use crate::services::itinerary_service::{itinerary_detail, persist_itinerary};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub message: String,
    #[serde(alias = "formData")]
    pub preferences: TripPreferences,
}

#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    reply: String,
    rule: Option<&'static str>,
    timeline: Option<Timeline>,
}

fn generator(state: &AppState) -> ItineraryGenerator {
    ItineraryGenerator::new(state.store.clone(), state.model.clone())
}

pub async fn generate_itinerary(
    state: web::Data<AppState>,
    user: MaybeUser,
    input: web::Json<TripPreferences>,
) -> Result<HttpResponse, ApiError> {
    let prefs = input.into_inner();
    prefs.validate()?;

    let timeline = generator(&state)
        .generate(&prefs, user.user_id(), InteractionKind::Generate)
        .await?;
    Ok(HttpResponse::Ok().json(timeline))
}

/// Rewrites the current plan from a chat message. Messages that match no
/// rule get the fallback reply and never reach the model.
pub async fn adjust_itinerary(
    state: web::Data<AppState>,
    user: MaybeUser,
    input: web::Json<AdjustRequest>,
) -> Result<HttpResponse, ApiError> {
    let AdjustRequest {
        message,
        preferences,
    } = input.into_inner();
    preferences.validate()?;

    let Some(rule) = match_rule(&message) else {
        return Ok(HttpResponse::Ok().json(AdjustResponse {
            reply: FALLBACK_REPLY.to_string(),
            rule: None,
            timeline: None,
        }));
    };

    let adjusted = with_override(&preferences, rule.instruction);
    let timeline = generator(&state)
        .generate(&adjusted, user.user_id(), InteractionKind::Adjust)
        .await?;

    if let Some(user_id) = user.user_id() {
        let suggestion = AiSuggestion {
            id: None,
            user_id,
            message,
            rule: rule.id.to_string(),
            override_instruction: rule.instruction.to_string(),
            reply: rule.reply.to_string(),
            created_at: Utc::now(),
        };
        if let Err(err) = state.store.append_suggestion(&suggestion).await {
            log::warn!("Failed to record chat suggestion: {}", err);
        }
    }

    Ok(HttpResponse::Ok().json(AdjustResponse {
        reply: rule.reply.to_string(),
        rule: Some(rule.id),
        timeline: Some(timeline),
    }))
}

pub async fn save_itinerary(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    input: web::Json<SaveItineraryInput>,
) -> Result<HttpResponse, ApiError> {
    let input = input.into_inner();
    if let Some(prefs) = &input.preferences {
        prefs.validate()?;
    }
    if input.timeline.days.is_empty() {
        return Err(ApiError::field(
            "timeline.days",
            "The timeline must contain at least one day.",
        ));
    }

    let id = persist_itinerary(state.store.as_ref(), user.user_id, input).await?;
    let itinerary = state
        .store
        .find_itinerary(id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("itinerary {} vanished after insert", id)))?;
    let detail = itinerary_detail(state.store.as_ref(), &itinerary).await?;
    Ok(HttpResponse::Created().json(detail))
}

pub async fn chat_log(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user_id = parse_id(&path, "User")?;
    if user_id != user.user_id && !user.is_admin() {
        return Err(ApiError::Forbidden(
            "You may only read your own chat log".to_string(),
        ));
    }

    let interactions = state.store.list_interactions(user_id).await?;
    let suggestions = state.store.list_suggestions(user_id).await?;
    Ok(HttpResponse::Ok().json(ChatLog {
        user_id: user_id.to_hex(),
        interactions: interactions.iter().map(InteractionView::from).collect(),
        suggestions: suggestions.iter().map(SuggestionView::from).collect(),
    }))
}
