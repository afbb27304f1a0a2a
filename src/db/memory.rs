use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use parking_lot::RwLock;

use crate::db::repository::{
    AiLogRepository, BookingRepository, ItineraryRepository, PlaceRepository, ReviewRepository,
    Store, StoreError, StoreResult, TokenRepository, TripRepository, UserRepository,
};
use crate::models::{
    ai_log::{AiInteractionLog, AiSuggestion},
    bookings::{Booking, BookingStatus},
    itinerary::{Itinerary, ItineraryPlace},
    place::{Place, PlaceFilter},
    review::Review,
    saved_trip::SavedTrip,
    user::{RevokedToken, User, UserRole},
};

/// Process-local store used for development runs and the test suite.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    revoked: RwLock<Vec<RevokedToken>>,
    places: RwLock<Vec<Place>>,
    itineraries: RwLock<Vec<Itinerary>>,
    itinerary_places: RwLock<Vec<ItineraryPlace>>,
    trips: RwLock<Vec<SavedTrip>>,
    reviews: RwLock<Vec<Review>>,
    bookings: RwLock<Vec<Booking>>,
    interactions: RwLock<Vec<AiInteractionLog>>,
    suggestions: RwLock<Vec<AiSuggestion>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    pub fn trip_count(&self) -> usize {
        self.trips.read().len()
    }
}

fn insert_with_id<T: Clone>(
    rows: &RwLock<Vec<T>>,
    row: &T,
    set_id: impl FnOnce(&mut T, ObjectId),
) -> ObjectId {
    let id = ObjectId::new();
    let mut row = row.clone();
    set_id(&mut row, id);
    rows.write().push(row);
    id
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: &User) -> StoreResult<ObjectId> {
        let mut users = self.users.write();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::DuplicateKey(format!("email {}", user.email)));
        }
        let id = ObjectId::new();
        let mut user = user.clone();
        user.id = Some(id);
        users.push(user);
        Ok(id)
    }

    async fn find_user_by_id(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users.read().iter().find(|u| u.id == Some(id)).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.users.read().clone())
    }

    async fn record_signin(&self, id: ObjectId, at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(user) = self.users.write().iter_mut().find(|u| u.id == Some(id)) {
            user.last_signin = Some(at);
            user.failed_signins = Some(0);
        }
        Ok(())
    }

    async fn record_failed_signin(&self, id: ObjectId) -> StoreResult<()> {
        if let Some(user) = self.users.write().iter_mut().find(|u| u.id == Some(id)) {
            user.failed_signins = Some(user.failed_signins.unwrap_or(0) + 1);
        }
        Ok(())
    }

    async fn update_user_role(&self, id: ObjectId, role: UserRole) -> StoreResult<bool> {
        match self.users.write().iter_mut().find(|u| u.id == Some(id)) {
            Some(user) => {
                user.role = role;
                user.updated_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let mut revoked = self.revoked.write();
        // Expired entries can no longer be presented, drop them here.
        let now = Utc::now();
        revoked.retain(|t| t.expires_at > now);
        revoked.push(RevokedToken {
            id: Some(ObjectId::new()),
            jti: jti.to_string(),
            expires_at,
        });
        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> StoreResult<bool> {
        Ok(self.revoked.read().iter().any(|t| t.jti == jti))
    }
}

#[async_trait]
impl PlaceRepository for MemoryStore {
    async fn create_place(&self, place: &Place) -> StoreResult<ObjectId> {
        Ok(insert_with_id(&self.places, place, |p, id| p.id = Some(id)))
    }

    async fn find_place(&self, id: ObjectId) -> StoreResult<Option<Place>> {
        Ok(self
            .places
            .read()
            .iter()
            .find(|p| p.id == Some(id) && !p.is_deleted())
            .cloned())
    }

    async fn find_place_by_name(&self, name: &str) -> StoreResult<Option<Place>> {
        Ok(self
            .places
            .read()
            .iter()
            .find(|p| p.name == name && !p.is_deleted())
            .cloned())
    }

    async fn list_places(&self, filter: &PlaceFilter) -> StoreResult<Vec<Place>> {
        let mut places: Vec<Place> = self
            .places
            .read()
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        places.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(places)
    }

    async fn update_place(&self, place: &Place) -> StoreResult<bool> {
        let mut places = self.places.write();
        match places
            .iter_mut()
            .find(|p| p.id == place.id && !p.is_deleted())
        {
            Some(existing) => {
                *existing = place.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn soft_delete_place(&self, id: ObjectId, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut places = self.places.write();
        match places
            .iter_mut()
            .find(|p| p.id == Some(id) && !p.is_deleted())
        {
            Some(place) => {
                place.deleted_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl ItineraryRepository for MemoryStore {
    async fn create_itinerary(&self, itinerary: &Itinerary) -> StoreResult<ObjectId> {
        Ok(insert_with_id(&self.itineraries, itinerary, |i, id| {
            i.id = Some(id)
        }))
    }

    async fn add_itinerary_place(&self, entry: &ItineraryPlace) -> StoreResult<ObjectId> {
        Ok(insert_with_id(&self.itinerary_places, entry, |e, id| {
            e.id = Some(id)
        }))
    }

    async fn find_itinerary(&self, id: ObjectId) -> StoreResult<Option<Itinerary>> {
        Ok(self
            .itineraries
            .read()
            .iter()
            .find(|i| i.id == Some(id))
            .cloned())
    }

    async fn list_itineraries(&self, user_id: ObjectId) -> StoreResult<Vec<Itinerary>> {
        let mut itineraries: Vec<Itinerary> = self
            .itineraries
            .read()
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        itineraries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(itineraries)
    }

    async fn itinerary_places(&self, itinerary_id: ObjectId) -> StoreResult<Vec<ItineraryPlace>> {
        let mut entries: Vec<ItineraryPlace> = self
            .itinerary_places
            .read()
            .iter()
            .filter(|e| e.itinerary_id == itinerary_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.day, e.order));
        Ok(entries)
    }

    async fn delete_itinerary(&self, id: ObjectId) -> StoreResult<bool> {
        let mut itineraries = self.itineraries.write();
        let before = itineraries.len();
        itineraries.retain(|i| i.id != Some(id));
        let removed = itineraries.len() != before;
        if removed {
            self.itinerary_places
                .write()
                .retain(|e| e.itinerary_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl TripRepository for MemoryStore {
    async fn create_trip(&self, trip: &SavedTrip) -> StoreResult<ObjectId> {
        Ok(insert_with_id(&self.trips, trip, |t, id| t.id = Some(id)))
    }

    async fn find_trip(&self, id: ObjectId) -> StoreResult<Option<SavedTrip>> {
        Ok(self.trips.read().iter().find(|t| t.id == Some(id)).cloned())
    }

    async fn list_trips(&self, user_id: ObjectId) -> StoreResult<Vec<SavedTrip>> {
        let mut trips: Vec<SavedTrip> = self
            .trips
            .read()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        trips.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(trips)
    }

    async fn update_trip(&self, trip: &SavedTrip) -> StoreResult<bool> {
        match self.trips.write().iter_mut().find(|t| t.id == trip.id) {
            Some(existing) => {
                *existing = trip.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_trip(&self, id: ObjectId) -> StoreResult<bool> {
        let mut trips = self.trips.write();
        let before = trips.len();
        trips.retain(|t| t.id != Some(id));
        Ok(trips.len() != before)
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn create_review(&self, review: &Review) -> StoreResult<ObjectId> {
        Ok(insert_with_id(&self.reviews, review, |r, id| r.id = Some(id)))
    }

    async fn find_review(&self, id: ObjectId) -> StoreResult<Option<Review>> {
        Ok(self.reviews.read().iter().find(|r| r.id == Some(id)).cloned())
    }

    async fn list_reviews(&self, place_id: ObjectId) -> StoreResult<Vec<Review>> {
        Ok(self
            .reviews
            .read()
            .iter()
            .filter(|r| r.place_id == place_id)
            .cloned()
            .collect())
    }

    async fn delete_review(&self, id: ObjectId) -> StoreResult<bool> {
        let mut reviews = self.reviews.write();
        let before = reviews.len();
        reviews.retain(|r| r.id != Some(id));
        Ok(reviews.len() != before)
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_booking(&self, booking: &Booking) -> StoreResult<ObjectId> {
        Ok(insert_with_id(&self.bookings, booking, |b, id| b.id = Some(id)))
    }

    async fn find_booking(&self, id: ObjectId) -> StoreResult<Option<Booking>> {
        Ok(self.bookings.read().iter().find(|b| b.id == Some(id)).cloned())
    }

    async fn list_bookings(&self, user_id: ObjectId) -> StoreResult<Vec<Booking>> {
        Ok(self
            .bookings
            .read()
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_booking_status(
        &self,
        id: ObjectId,
        status: BookingStatus,
    ) -> StoreResult<bool> {
        match self.bookings.write().iter_mut().find(|b| b.id == Some(id)) {
            Some(booking) => {
                booking.status = status;
                booking.updated_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl AiLogRepository for MemoryStore {
    async fn append_interaction(&self, log: &AiInteractionLog) -> StoreResult<ObjectId> {
        Ok(insert_with_id(&self.interactions, log, |l, id| l.id = Some(id)))
    }

    async fn list_interactions(&self, user_id: ObjectId) -> StoreResult<Vec<AiInteractionLog>> {
        Ok(self
            .interactions
            .read()
            .iter()
            .filter(|l| l.user_id == Some(user_id))
            .cloned()
            .collect())
    }

    async fn append_suggestion(&self, suggestion: &AiSuggestion) -> StoreResult<ObjectId> {
        Ok(insert_with_id(&self.suggestions, suggestion, |s, id| {
            s.id = Some(id)
        }))
    }

    async fn list_suggestions(&self, user_id: ObjectId) -> StoreResult<Vec<AiSuggestion>> {
        Ok(self
            .suggestions
            .read()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
