//! Storage ports used by the routes and services.
//!
//! Each aggregate gets its own trait; `Store` bundles them so handlers can
//! hold a single `Arc<dyn Store>`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::models::{
    ai_log::{AiInteractionLog, AiSuggestion},
    bookings::{Booking, BookingStatus},
    itinerary::{Itinerary, ItineraryPlace},
    place::{Place, PlaceFilter},
    review::Review,
    saved_trip::SavedTrip,
    user::{User, UserRole},
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("database error: {0}")]
    Database(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        use mongodb::error::{ErrorKind, WriteFailure};

        if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = err.kind.as_ref() {
            if write_error.code == 11000 {
                return StoreError::DuplicateKey(write_error.message.clone());
            }
        }
        StoreError::Database(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateKey` when the email is taken.
    async fn create_user(&self, user: &User) -> StoreResult<ObjectId>;
    async fn find_user_by_id(&self, id: ObjectId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn record_signin(&self, id: ObjectId, at: DateTime<Utc>) -> StoreResult<()>;
    async fn record_failed_signin(&self, id: ObjectId) -> StoreResult<()>;
    async fn update_user_role(&self, id: ObjectId, role: UserRole) -> StoreResult<bool>;
}

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> StoreResult<()>;
    async fn is_token_revoked(&self, jti: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait PlaceRepository: Send + Sync {
    async fn create_place(&self, place: &Place) -> StoreResult<ObjectId>;
    /// Soft-deleted places are never returned.
    async fn find_place(&self, id: ObjectId) -> StoreResult<Option<Place>>;
    async fn find_place_by_name(&self, name: &str) -> StoreResult<Option<Place>>;
    async fn list_places(&self, filter: &PlaceFilter) -> StoreResult<Vec<Place>>;
    async fn update_place(&self, place: &Place) -> StoreResult<bool>;
    async fn soft_delete_place(&self, id: ObjectId, at: DateTime<Utc>) -> StoreResult<bool>;
}

#[async_trait]
pub trait ItineraryRepository: Send + Sync {
    async fn create_itinerary(&self, itinerary: &Itinerary) -> StoreResult<ObjectId>;
    async fn add_itinerary_place(&self, entry: &ItineraryPlace) -> StoreResult<ObjectId>;
    async fn find_itinerary(&self, id: ObjectId) -> StoreResult<Option<Itinerary>>;
    async fn list_itineraries(&self, user_id: ObjectId) -> StoreResult<Vec<Itinerary>>;
    /// Entries sorted by `(day, order)`.
    async fn itinerary_places(&self, itinerary_id: ObjectId) -> StoreResult<Vec<ItineraryPlace>>;
    /// Removes the itinerary together with its entries.
    async fn delete_itinerary(&self, id: ObjectId) -> StoreResult<bool>;
}

#[async_trait]
pub trait TripRepository: Send + Sync {
    async fn create_trip(&self, trip: &SavedTrip) -> StoreResult<ObjectId>;
    async fn find_trip(&self, id: ObjectId) -> StoreResult<Option<SavedTrip>>;
    async fn list_trips(&self, user_id: ObjectId) -> StoreResult<Vec<SavedTrip>>;
    async fn update_trip(&self, trip: &SavedTrip) -> StoreResult<bool>;
    async fn delete_trip(&self, id: ObjectId) -> StoreResult<bool>;
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create_review(&self, review: &Review) -> StoreResult<ObjectId>;
    async fn find_review(&self, id: ObjectId) -> StoreResult<Option<Review>>;
    async fn list_reviews(&self, place_id: ObjectId) -> StoreResult<Vec<Review>>;
    async fn delete_review(&self, id: ObjectId) -> StoreResult<bool>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(&self, booking: &Booking) -> StoreResult<ObjectId>;
    async fn find_booking(&self, id: ObjectId) -> StoreResult<Option<Booking>>;
    async fn list_bookings(&self, user_id: ObjectId) -> StoreResult<Vec<Booking>>;
    async fn update_booking_status(&self, id: ObjectId, status: BookingStatus)
        -> StoreResult<bool>;
}

#[async_trait]
pub trait AiLogRepository: Send + Sync {
    async fn append_interaction(&self, log: &AiInteractionLog) -> StoreResult<ObjectId>;
    async fn list_interactions(&self, user_id: ObjectId) -> StoreResult<Vec<AiInteractionLog>>;
    async fn append_suggestion(&self, suggestion: &AiSuggestion) -> StoreResult<ObjectId>;
    async fn list_suggestions(&self, user_id: ObjectId) -> StoreResult<Vec<AiSuggestion>>;
}

#[async_trait]
pub trait Store:
    UserRepository
    + TokenRepository
    + PlaceRepository
    + ItineraryRepository
    + TripRepository
    + ReviewRepository
    + BookingRepository
    + AiLogRepository
{
    fn backend(&self) -> &'static str;
    async fn ping(&self) -> StoreResult<()>;
}
