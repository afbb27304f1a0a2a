use actix_web::{web, HttpResponse};
use mongodb::bson::oid::ObjectId;

use crate::error::ApiError;
use crate::middleware::auth::AuthMiddleware;
use crate::middleware::role_auth::RequireRole;
use crate::models::user::UserRole;

pub mod admin;
pub mod ai;
pub mod auth;
pub mod bookings;
pub mod health;
pub mod itineraries;
pub mod places;
pub mod reviews;
pub mod trips;

/// Malformed ids are answered like unknown ones.
pub fn parse_id(raw: &str, what: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::not_found(what))
}

async fn unknown_route() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound("Route not found".to_string()))
}

/// Registers every route. Signed-in-only resources carry `AuthMiddleware`;
/// paths that mix public and signed-in methods authenticate through the
/// extractor. Unknown `/api` paths are a 404 whether or not a token is sent.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::field("body", err.to_string()).into()),
    )
    .route("/health", web::get().to(health::liveness))
    .service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .route("/register", web::post().to(auth::register))
            .route("/login", web::post().to(auth::login))
            .route("/hotels", web::get().to(places::list_hotels))
            .route("/restaurants", web::get().to(places::list_restaurants))
            .route("/attractions", web::get().to(places::list_attractions))
            .service(
                web::resource("/places")
                    .route(web::get().to(places::list_places))
                    .route(web::post().to(places::create_place)),
            )
            .service(
                web::resource("/places/{id}")
                    .route(web::get().to(places::get_place))
                    .route(web::put().to(places::update_place))
                    .route(web::delete().to(places::delete_place)),
            )
            .service(
                web::resource("/places/{id}/reviews")
                    .route(web::get().to(reviews::list_reviews))
                    .route(web::post().to(reviews::create_review)),
            )
            .route(
                "/generate-japan-itinerary",
                web::post().to(ai::generate_itinerary),
            )
            .route("/ai/adjust-itinerary", web::post().to(ai::adjust_itinerary))
            .service(
                web::scope("/admin")
                    .wrap(RequireRole::new(UserRole::Admin))
                    .wrap(AuthMiddleware)
                    .route("/users", web::get().to(admin::list_users))
                    .route("/users/{id}/role", web::put().to(admin::update_user_role)),
            )
            // Protected routes
            .service(
                web::resource("/logout")
                    .wrap(AuthMiddleware)
                    .route(web::post().to(auth::logout)),
            )
            .service(
                web::resource("/user")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(auth::user_session)),
            )
            .service(
                web::resource("/reviews/{id}")
                    .wrap(AuthMiddleware)
                    .route(web::delete().to(reviews::delete_review)),
            )
            .service(
                web::resource("/trips")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(trips::list_trips))
                    .route(web::post().to(trips::create_trip)),
            )
            .service(
                web::resource("/trips/{id}")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(trips::get_trip))
                    .route(web::put().to(trips::update_trip))
                    .route(web::delete().to(trips::delete_trip)),
            )
            .service(
                web::resource("/itineraries")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(itineraries::list_itineraries)),
            )
            .service(
                web::resource("/itineraries/{id}")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(itineraries::get_itinerary))
                    .route(web::delete().to(itineraries::delete_itinerary)),
            )
            .service(
                web::resource("/bookings")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(bookings::list_bookings))
                    .route(web::post().to(bookings::create_booking)),
            )
            .service(
                web::resource("/bookings/{id}")
                    .wrap(AuthMiddleware)
                    .route(web::delete().to(bookings::cancel_booking)),
            )
            .service(
                web::resource("/ai/save-itinerary")
                    .wrap(AuthMiddleware)
                    .route(web::post().to(ai::save_itinerary)),
            )
            .service(
                web::resource("/ai/chat/log/{user_id}")
                    .wrap(AuthMiddleware)
                    .route(web::get().to(ai::chat_log)),
            )
            .default_service(web::to(unknown_route)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn malformed_ids_are_not_found() {
        let err = parse_id("not-an-object-id", "Trip").unwrap_err();
        assert_eq!(err.status_code(), actix_web::http::StatusCode::NOT_FOUND);
        assert!(parse_id(&ObjectId::new().to_hex(), "Trip").is_ok());
    }
}
