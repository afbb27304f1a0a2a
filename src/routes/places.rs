use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::db::repository::PlaceRepository;
use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::place::{Place, PlaceCategory, PlaceFilter, PlaceInput, PlaceView};
use crate::models::user::UserRole;
use crate::routes::parse_id;
use crate::state::AppState;

async fn list_filtered(state: &AppState, filter: PlaceFilter) -> Result<HttpResponse, ApiError> {
    let places = state.store.list_places(&filter).await?;
    let views: Vec<PlaceView> = places.iter().map(PlaceView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

pub async fn list_places(
    state: web::Data<AppState>,
    query: web::Query<PlaceFilter>,
) -> Result<HttpResponse, ApiError> {
    list_filtered(&state, query.into_inner()).await
}

pub async fn list_hotels(
    state: web::Data<AppState>,
    query: web::Query<PlaceFilter>,
) -> Result<HttpResponse, ApiError> {
    let filter = PlaceFilter::for_category(PlaceCategory::Hotel, query.into_inner());
    list_filtered(&state, filter).await
}

pub async fn list_restaurants(
    state: web::Data<AppState>,
    query: web::Query<PlaceFilter>,
) -> Result<HttpResponse, ApiError> {
    let filter = PlaceFilter::for_category(PlaceCategory::Restaurant, query.into_inner());
    list_filtered(&state, filter).await
}

pub async fn list_attractions(
    state: web::Data<AppState>,
    query: web::Query<PlaceFilter>,
) -> Result<HttpResponse, ApiError> {
    let filter = PlaceFilter::for_category(PlaceCategory::Attraction, query.into_inner());
    list_filtered(&state, filter).await
}

pub async fn get_place(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Place")?;
    match state.store.find_place(id).await? {
        Some(place) => Ok(HttpResponse::Ok().json(PlaceView::from(&place))),
        None => Err(ApiError::not_found("Place")),
    }
}

pub async fn create_place(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    input: web::Json<PlaceInput>,
) -> Result<HttpResponse, ApiError> {
    user.require_role(&[UserRole::Business])?;
    let input = input.into_inner();
    input.validate()?;

    let now = Utc::now();
    let mut place = Place {
        id: None,
        owner_id: user.user_id,
        name: String::new(),
        description: None,
        region: None,
        address: None,
        latitude: None,
        longitude: None,
        tags: Vec::new(),
        genre_name: None,
        categories: Vec::new(),
        price: None,
        deleted_at: None,
        created_at: Some(now),
        updated_at: Some(now),
    };
    input.apply_to(&mut place);
    place.id = Some(state.store.create_place(&place).await?);

    Ok(HttpResponse::Created().json(PlaceView::from(&place)))
}

async fn owned_place(
    state: &AppState,
    user: &AuthenticatedUser,
    raw_id: &str,
) -> Result<Place, ApiError> {
    let id = parse_id(raw_id, "Place")?;
    let place = state
        .store
        .find_place(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Place"))?;
    if place.owner_id != user.user_id && !user.is_admin() {
        return Err(ApiError::Forbidden(
            "You may only change your own places".to_string(),
        ));
    }
    Ok(place)
}

pub async fn update_place(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<PlaceInput>,
) -> Result<HttpResponse, ApiError> {
    let mut place = owned_place(&state, &user, &path).await?;
    let input = input.into_inner();
    input.validate()?;

    input.apply_to(&mut place);
    place.updated_at = Some(Utc::now());
    if !state.store.update_place(&place).await? {
        return Err(ApiError::not_found("Place"));
    }
    Ok(HttpResponse::Ok().json(PlaceView::from(&place)))
}

pub async fn delete_place(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let place = owned_place(&state, &user, &path).await?;
    let id = place
        .id
        .ok_or_else(|| ApiError::Internal("place has no id".to_string()))?;

    if !state.store.soft_delete_place(id, Utc::now()).await? {
        return Err(ApiError::not_found("Place"));
    }
    log::info!("Place {} deleted by user {}", id, user.user_id);
    Ok(HttpResponse::NoContent().finish())
}
