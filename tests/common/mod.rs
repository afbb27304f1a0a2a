#![allow(dead_code)]

use std::sync::Arc;

use actix_web::{http::header, web, App};
use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use parking_lot::Mutex;

use japan_itinerary_api::config::AppConfig;
use japan_itinerary_api::db::{
    memory::MemoryStore,
    repository::{PlaceRepository, UserRepository},
};
use japan_itinerary_api::models::place::Place;
use japan_itinerary_api::models::user::{User, UserRole};
use japan_itinerary_api::routes;
use japan_itinerary_api::services::gemini_client::{GenerationError, ItineraryModel};
use japan_itinerary_api::services::token_service::generate_token;
use japan_itinerary_api::state::AppState;

pub const JWT_SECRET: &str = "test-secret";
pub const PASSWORD: &str = "password123";

/// Two days in Kyoto, wrapped in a fence the way Gemini tends to answer.
pub const KYOTO_RESPONSE: &str = r#"```json
{
  "days": [
    {
      "day": 1,
      "title": "Higashiyama",
      "activities": [
        { "time": "09:00", "type": "attraction", "name": "Kiyomizu-dera", "cost": 500 },
        { "time": "12:00", "type": "meal", "name": "Okutan Yudofu", "cost": "¥3,300" },
        { "time": "18:30", "type": "meal", "name": "Pontocho Kaiseki", "cost": 8000 },
        { "time": "20:00", "type": "accommodation", "name": "Gion Machiya", "cost": 18000 }
      ]
    },
    {
      "day": 2,
      "title": "Arashiyama",
      "activities": [
        { "time": "09:00", "type": "attraction", "name": "Bamboo Grove", "cost": 0 },
        { "time": "12:00", "type": "meal", "name": "Shigetsu", "cost": 3500 },
        { "time": "18:30", "type": "meal", "name": "Saga Tofu", "cost": 2000 },
        { "time": "20:00", "type": "accommodation", "name": "Gion Machiya", "cost": 18000 }
      ]
    }
  ]
}
```"#;

/// Model double that answers every prompt with the same text, or fails.
pub struct ScriptedModel {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ItineraryModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().push(prompt.to_string());
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(GenerationError::Api {
                status: 503,
                body: "overloaded".to_string(),
            }),
        }
    }
}

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub model: Arc<ScriptedModel>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_model(ScriptedModel::replying(KYOTO_RESPONSE))
    }

    pub fn with_model(model: ScriptedModel) -> Self {
        let store = Arc::new(MemoryStore::new());
        let model = Arc::new(model);
        let state = AppState::new(
            AppConfig::for_memory(JWT_SECRET),
            store.clone(),
            model.clone(),
        );
        Self {
            store,
            model,
            state,
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.state.clone()))
            .configure(routes::configure)
    }

    /// Inserts a user directly and returns its id with a valid bearer token.
    pub async fn create_user(&self, email: &str, role: UserRole) -> (ObjectId, String) {
        let now = Utc::now();
        let user = User {
            id: None,
            name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            password: bcrypt::hash(PASSWORD, self.state.config.bcrypt_cost).unwrap(),
            role,
            last_signin: None,
            failed_signins: Some(0),
            created_at: Some(now),
            updated_at: Some(now),
        };
        let id = self.store.create_user(&user).await.unwrap();
        let token = generate_token(email, id, role, JWT_SECRET, 1).unwrap();
        (id, token)
    }

    pub async fn create_place(
        &self,
        owner_id: ObjectId,
        name: &str,
        tags: &[&str],
        genre_name: Option<&str>,
    ) -> ObjectId {
        let place = Place {
            id: None,
            owner_id,
            name: name.to_string(),
            description: None,
            region: Some("Kyoto".to_string()),
            address: None,
            latitude: None,
            longitude: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            genre_name: genre_name.map(str::to_string),
            categories: Vec::new(),
            price: None,
            deleted_at: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        };
        self.store.create_place(&place).await.unwrap()
    }
}

pub fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub fn kyoto_preferences() -> serde_json::Value {
    serde_json::json!({
        "regions": [{ "region": "Kyoto", "days": 2 }],
        "travelStyles": ["culture", "food"],
        "season": "autumn"
    })
}

/// Timeline data with one entry per day, as the planner saves it.
pub fn timeline_data(days: usize) -> serde_json::Value {
    let days: Vec<serde_json::Value> = (1..=days)
        .map(|day| {
            serde_json::json!({
                "day": day,
                "title": format!("Day {}", day),
                "activities": [
                    { "time": "09:00", "type": "attraction", "name": "Fushimi Inari", "cost": 0 },
                    { "time": "12:00", "type": "meal", "name": "Nishiki Market", "cost": 2500 }
                ]
            })
        })
        .collect();
    serde_json::json!({ "days": days })
}
