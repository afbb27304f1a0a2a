use std::collections::BTreeMap;

use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use crate::db::repository::Store;
use crate::state::AppState;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: BTreeMap<String, ServiceStatus>,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

pub async fn liveness() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "OK" }))
}

pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let storage = check_storage(&state).await;
    let model = check_model(&state);

    let status = if storage.status == "ok" && model.status == "ok" {
        "ok"
    } else {
        "degraded"
    };

    let mut services = BTreeMap::new();
    services.insert("storage".to_string(), storage);
    services.insert("model".to_string(), model);

    HttpResponse::Ok().json(HealthStatus {
        status: status.to_string(),
        services,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn check_storage(state: &AppState) -> ServiceStatus {
    match state.store.ping().await {
        Ok(()) => ServiceStatus {
            status: "ok".to_string(),
            details: Some(format!("{} store reachable", state.store.backend())),
        },
        Err(err) => {
            log::error!("Storage health check failed: {}", err);
            ServiceStatus {
                status: "error".to_string(),
                details: Some(format!("{} store unreachable", state.store.backend())),
            }
        }
    }
}

fn check_model(state: &AppState) -> ServiceStatus {
    let gemini = &state.config.gemini;
    if gemini.api_key.is_some() {
        ServiceStatus {
            status: "ok".to_string(),
            details: Some(format!("{} configured", gemini.model)),
        }
    } else {
        ServiceStatus {
            status: "error".to_string(),
            details: Some("GEMINI_API_KEY not configured".to_string()),
        }
    }
}
