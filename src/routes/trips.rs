use actix_web::{web, HttpResponse};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use validator::Validate;

use crate::db::repository::TripRepository;
use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::saved_trip::{SavedTrip, SavedTripInput, SavedTripView};
use crate::routes::parse_id;
use crate::state::AppState;

fn validated(input: web::Json<SavedTripInput>) -> Result<SavedTripInput, ApiError> {
    let input = input.into_inner();
    input.validate()?;
    if let Some(message) = input.timeline_error() {
        return Err(ApiError::field("timeline_data", message));
    }
    Ok(input)
}

/// Someone else's trip is reported as missing.
async fn own_trip(state: &AppState, user_id: ObjectId, id: ObjectId) -> Result<SavedTrip, ApiError> {
    match state.store.find_trip(id).await? {
        Some(trip) if trip.user_id == user_id => Ok(trip),
        _ => Err(ApiError::not_found("Trip")),
    }
}

pub async fn list_trips(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let trips = state.store.list_trips(user.user_id).await?;
    let views: Vec<SavedTripView> = trips.iter().map(SavedTripView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

pub async fn create_trip(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    input: web::Json<SavedTripInput>,
) -> Result<HttpResponse, ApiError> {
    let input = validated(input)?;
    let now = Utc::now();

    let mut trip = SavedTrip {
        id: None,
        user_id: user.user_id,
        title: input.title,
        total_duration: input.total_duration,
        form_data: input.form_data,
        timeline_data: input.timeline_data,
        created_at: Some(now),
        updated_at: Some(now),
    };
    trip.id = Some(state.store.create_trip(&trip).await?);

    Ok(HttpResponse::Created().json(SavedTripView::from(&trip)))
}

pub async fn get_trip(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Trip")?;
    let trip = own_trip(&state, user.user_id, id).await?;
    Ok(HttpResponse::Ok().json(SavedTripView::from(&trip)))
}

pub async fn update_trip(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<SavedTripInput>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Trip")?;
    let mut trip = own_trip(&state, user.user_id, id).await?;
    let input = validated(input)?;

    trip.title = input.title;
    trip.total_duration = input.total_duration;
    trip.form_data = input.form_data;
    trip.timeline_data = input.timeline_data;
    trip.updated_at = Some(Utc::now());

    if !state.store.update_trip(&trip).await? {
        return Err(ApiError::not_found("Trip"));
    }
    Ok(HttpResponse::Ok().json(SavedTripView::from(&trip)))
}

pub async fn delete_trip(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Trip")?;
    let trip = state
        .store
        .find_trip(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Trip"))?;

    if trip.user_id != user.user_id {
        log::warn!(
            "User {} attempted to delete trip {} owned by {}",
            user.user_id,
            id,
            trip.user_id
        );
        return Err(ApiError::Forbidden(
            "You may only delete your own trips".to_string(),
        ));
    }

    state.store.delete_trip(id).await?;
    Ok(HttpResponse::NoContent().finish())
}
