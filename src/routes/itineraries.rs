use actix_web::{web, HttpResponse};

use crate::db::repository::ItineraryRepository;
use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::itinerary::{Itinerary, ItinerarySummary};
use crate::routes::parse_id;
use crate::services::itinerary_service::itinerary_detail;
use crate::state::AppState;

async fn own_itinerary(
    state: &AppState,
    user: &AuthenticatedUser,
    raw_id: &str,
) -> Result<Itinerary, ApiError> {
    let id = parse_id(raw_id, "Itinerary")?;
    match state.store.find_itinerary(id).await? {
        Some(itinerary) if itinerary.user_id == user.user_id => Ok(itinerary),
        _ => Err(ApiError::not_found("Itinerary")),
    }
}

pub async fn list_itineraries(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let itineraries = state.store.list_itineraries(user.user_id).await?;
    let views: Vec<ItinerarySummary> = itineraries.iter().map(ItinerarySummary::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

pub async fn get_itinerary(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let itinerary = own_itinerary(&state, &user, &path).await?;
    let detail = itinerary_detail(state.store.as_ref(), &itinerary).await?;
    Ok(HttpResponse::Ok().json(detail))
}

pub async fn delete_itinerary(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let itinerary = own_itinerary(&state, &user, &path).await?;
    if let Some(id) = itinerary.id {
        state.store.delete_itinerary(id).await?;
    }
    Ok(HttpResponse::NoContent().finish())
}
