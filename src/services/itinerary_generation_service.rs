use std::sync::Arc;

use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::db::repository::{AiLogRepository, Store};
use crate::models::{
    ai_log::{AiInteractionLog, InteractionKind},
    itinerary::SaveItineraryInput,
    timeline::{Timeline, TripPreferences},
};
use crate::services::{
    gemini_client::{GenerationError, ItineraryModel},
    itinerary_service::persist_itinerary,
    prompt_builder::build_prompt,
    response_normalizer::{normalize_response, NormalizeError},
};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("itinerary generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("could not read the generated itinerary: {0}")]
    Normalize(#[from] NormalizeError),
}

pub struct ItineraryGenerator {
    store: Arc<dyn Store>,
    model: Arc<dyn ItineraryModel>,
}

impl ItineraryGenerator {
    pub fn new(store: Arc<dyn Store>, model: Arc<dyn ItineraryModel>) -> Self {
        Self { store, model }
    }

    /// Prompt, model call, normalisation. Every attempt is logged; when the
    /// caller is known the timeline is also stored in the background.
    pub async fn generate(
        &self,
        prefs: &TripPreferences,
        user_id: Option<ObjectId>,
        kind: InteractionKind,
    ) -> Result<Timeline, PipelineError> {
        let prompt = build_prompt(prefs);

        let (response, result) = match self.model.generate(&prompt).await {
            Ok(raw) => {
                let result = normalize_response(&raw, prefs).map_err(PipelineError::from);
                (Some(raw), result)
            }
            Err(err) => (None, Err(PipelineError::from(err))),
        };

        if let Err(err) = &result {
            log::warn!("Generation with {} failed: {}", self.model.name(), err);
        }
        self.record_interaction(user_id, kind, prompt, response, &result)
            .await;

        let timeline = result?;
        if let Some(user_id) = user_id {
            self.spawn_persist(user_id, prefs.clone(), timeline.clone());
        }
        Ok(timeline)
    }

    async fn record_interaction(
        &self,
        user_id: Option<ObjectId>,
        kind: InteractionKind,
        prompt: String,
        response: Option<String>,
        result: &Result<Timeline, PipelineError>,
    ) {
        let entry = AiInteractionLog {
            id: None,
            user_id,
            kind,
            prompt,
            response,
            success: result.is_ok(),
            error: result.as_ref().err().map(|e| e.to_string()),
            created_at: Utc::now(),
        };
        if let Err(err) = self.store.append_interaction(&entry).await {
            log::warn!("Failed to record AI interaction: {}", err);
        }
    }

    /// Not awaited: the response goes out whether or not this succeeds.
    fn spawn_persist(&self, user_id: ObjectId, prefs: TripPreferences, timeline: Timeline) {
        let store = Arc::clone(&self.store);
        actix_web::rt::spawn(async move {
            let input = SaveItineraryInput {
                title: None,
                start_date: None,
                preferences: Some(prefs),
                timeline,
            };
            if let Err(err) = persist_itinerary(store.as_ref(), user_id, input).await {
                log::warn!(
                    "Failed to store generated itinerary for user {}: {}",
                    user_id,
                    err
                );
            }
        });
    }
}
