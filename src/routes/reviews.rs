use actix_web::{web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::db::repository::{PlaceRepository, ReviewRepository};
use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::review::{Review, ReviewInput, ReviewView};
use crate::routes::parse_id;
use crate::state::AppState;

pub async fn list_reviews(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let place_id = parse_id(&path, "Place")?;
    if state.store.find_place(place_id).await?.is_none() {
        return Err(ApiError::not_found("Place"));
    }

    let reviews = state.store.list_reviews(place_id).await?;
    let views: Vec<ReviewView> = reviews.iter().map(ReviewView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

pub async fn create_review(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    input: web::Json<ReviewInput>,
) -> Result<HttpResponse, ApiError> {
    let place_id = parse_id(&path, "Place")?;
    let input = input.into_inner();
    input.validate()?;

    if state.store.find_place(place_id).await?.is_none() {
        return Err(ApiError::not_found("Place"));
    }

    let mut review = Review {
        id: None,
        user_id: user.user_id,
        place_id,
        rating: input.rating,
        comment: input.comment.filter(|c| !c.trim().is_empty()),
        created_at: Some(Utc::now()),
    };
    review.id = Some(state.store.create_review(&review).await?);

    Ok(HttpResponse::Created().json(ReviewView::from(&review)))
}

pub async fn delete_review(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Review")?;
    let review = state
        .store
        .find_review(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Review"))?;

    if review.user_id != user.user_id && !user.is_admin() {
        return Err(ApiError::Forbidden(
            "You may only delete your own reviews".to_string(),
        ));
    }
    state.store.delete_review(id).await?;
    Ok(HttpResponse::NoContent().finish())
}
