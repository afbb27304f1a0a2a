use actix_web::{web, HttpResponse};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use validator::Validate;

use crate::db::repository::{BookingRepository, PlaceRepository};
use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::bookings::{Booking, BookingInput, BookingStatus, BookingView};
use crate::routes::parse_id;
use crate::state::AppState;

pub async fn list_bookings(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, ApiError> {
    let bookings = state.store.list_bookings(user.user_id).await?;
    let views: Vec<BookingView> = bookings.iter().map(BookingView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

pub async fn create_booking(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    input: web::Json<BookingInput>,
) -> Result<HttpResponse, ApiError> {
    let input = input.into_inner();
    input.validate()?;

    let place_id = ObjectId::parse_str(&input.place_id)
        .map_err(|_| ApiError::field("place_id", "The selected place is invalid."))?;
    if state.store.find_place(place_id).await?.is_none() {
        return Err(ApiError::field("place_id", "The selected place is invalid."));
    }

    let now = Utc::now();
    let mut booking = Booking {
        id: None,
        user_id: user.user_id,
        place_id,
        check_in: input.check_in,
        check_out: input.check_out,
        guests: input.guests,
        status: BookingStatus::Pending,
        created_at: Some(now),
        updated_at: Some(now),
    };
    booking.id = Some(state.store.create_booking(&booking).await?);
    log::info!("User {} booked place {}", user.user_id, place_id);

    Ok(HttpResponse::Created().json(BookingView::from(&booking)))
}

/// Bookings are never removed, only marked cancelled.
pub async fn cancel_booking(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(&path, "Booking")?;
    let mut booking = match state.store.find_booking(id).await? {
        Some(booking) if booking.user_id == user.user_id => booking,
        _ => return Err(ApiError::not_found("Booking")),
    };

    if booking.status != BookingStatus::Cancelled {
        state
            .store
            .update_booking_status(id, BookingStatus::Cancelled)
            .await?;
        booking.status = BookingStatus::Cancelled;
    }
    Ok(HttpResponse::Ok().json(BookingView::from(&booking)))
}
