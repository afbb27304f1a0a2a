use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
    Client, Collection, IndexModel,
};
use std::sync::Arc;
use std::time::Duration;

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

pub async fn create_mongo_client(uri: &str) -> Result<Arc<Client>, mongodb::error::Error> {
    log::info!("Connecting to MongoDB");

    let mut client_options = ClientOptions::parse(uri).await?;

    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    // Set the server API if using MongoDB 5.0+
    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    let client = Client::with_options(client_options)?;

    match client
        .database("admin")
        .run_command(doc! {"ping": 1})
        .await
    {
        Ok(_) => log::info!("Connected to MongoDB and verified with ping"),
        Err(e) => {
            log::warn!("Connected to MongoDB but ping failed: {}", e);
            log::warn!("The API may still work, but some functionality might be impaired");
        }
    }

    Ok(Arc::new(client))
}

pub struct MongoStore {
    client: Arc<Client>,
    database: String,
}

impl MongoStore {
    pub fn new(client: Arc<Client>, database: &str) -> Self {
        Self {
            client,
            database: database.to_string(),
        }
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.client.database(&self.database).collection(name)
    }

    fn users(&self) -> Collection<User> {
        self.collection("users")
    }

    fn revoked_tokens(&self) -> Collection<RevokedToken> {
        self.collection("revoked_tokens")
    }

    fn places(&self) -> Collection<Place> {
        self.collection("places")
    }

    fn itineraries(&self) -> Collection<Itinerary> {
        self.collection("itineraries")
    }

    fn itinerary_places_collection(&self) -> Collection<ItineraryPlace> {
        self.collection("itinerary_places")
    }

    fn trips(&self) -> Collection<SavedTrip> {
        self.collection("saved_trips")
    }

    fn reviews(&self) -> Collection<Review> {
        self.collection("reviews")
    }

    fn bookings(&self) -> Collection<Booking> {
        self.collection("bookings")
    }

    fn interactions(&self) -> Collection<AiInteractionLog> {
        self.collection("ai_interaction_logs")
    }

    fn suggestions(&self) -> Collection<AiSuggestion> {
        self.collection("ai_suggestions")
    }

    /// Creates the indexes the repositories rely on. Safe to run on every start.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.users().create_index(unique_email).await?;

        let by_itinerary = IndexModel::builder()
            .keys(doc! { "itinerary_id": 1, "day": 1, "order": 1 })
            .build();
        self.itinerary_places_collection()
            .create_index(by_itinerary)
            .await?;

        let by_jti = IndexModel::builder().keys(doc! { "jti": 1 }).build();
        self.revoked_tokens().create_index(by_jti).await?;

        // Revocations are dropped once the token would have expired anyway.
        let expiry = IndexModel::builder()
            .keys(doc! { "expires_at": 1 })
            .options(IndexOptions::builder().expire_after(Duration::ZERO).build())
            .build();
        self.revoked_tokens().create_index(expiry).await?;

        let by_owner = IndexModel::builder().keys(doc! { "user_id": 1 }).build();
        self.trips().create_index(by_owner).await?;
        Ok(())
    }
}

fn inserted_id(result: mongodb::results::InsertOneResult) -> StoreResult<ObjectId> {
    result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| StoreError::Database("inserted _id is not an ObjectId".to_string()))
}

/// Translates a place filter into a query that mirrors `PlaceFilter::matches`.
pub fn place_query(filter: &PlaceFilter) -> Document {
    let mut clauses = vec![doc! { "deleted_at": null }];

    if let Some(tag) = &filter.tag {
        clauses.push(doc! { "$or": [ { "tags": tag }, { "genre_name": tag } ] });
    }
    if let Some(category) = &filter.category {
        clauses.push(doc! { "categories": category });
    }
    if let Some(region) = &filter.region {
        let pattern = format!("^{}$", regex::escape(region));
        clauses.push(doc! { "region": { "$regex": pattern, "$options": "i" } });
    }
    if let Some(q) = &filter.q {
        let pattern = regex::escape(q);
        clauses.push(doc! {
            "$or": [
                { "name": { "$regex": &pattern, "$options": "i" } },
                { "description": { "$regex": &pattern, "$options": "i" } },
            ]
        });
    }

    doc! { "$and": clauses }
}

#[async_trait]
impl UserRepository for MongoStore {
    async fn create_user(&self, user: &User) -> StoreResult<ObjectId> {
        inserted_id(self.users().insert_one(user).await?)
    }

    async fn find_user_by_id(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let cursor = self.users().find(doc! {}).sort(doc! { "email": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn record_signin(&self, id: ObjectId, at: DateTime<Utc>) -> StoreResult<()> {
        let update = doc! {
            "$set": {
                "last_signin": at.to_rfc3339(),
                "failed_signins": 0
            }
        };
        self.users().update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }

    async fn record_failed_signin(&self, id: ObjectId) -> StoreResult<()> {
        let update = doc! { "$inc": { "failed_signins": 1 } };
        self.users().update_one(doc! { "_id": id }, update).await?;
        Ok(())
    }

    async fn update_user_role(&self, id: ObjectId, role: UserRole) -> StoreResult<bool> {
        let update = doc! {
            "$set": { "role": role.as_str(), "updated_at": Utc::now().to_rfc3339() }
        };
        let result = self.users().update_one(doc! { "_id": id }, update).await?;
        Ok(result.matched_count > 0)
    }
}

#[async_trait]
impl TokenRepository for MongoStore {
    async fn revoke_token(&self, jti: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let token = RevokedToken {
            id: None,
            jti: jti.to_string(),
            expires_at,
        };
        self.revoked_tokens().insert_one(&token).await?;
        Ok(())
    }

    async fn is_token_revoked(&self, jti: &str) -> StoreResult<bool> {
        let count = self
            .revoked_tokens()
            .count_documents(doc! { "jti": jti })
            .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl PlaceRepository for MongoStore {
    async fn create_place(&self, place: &Place) -> StoreResult<ObjectId> {
        inserted_id(self.places().insert_one(place).await?)
    }

    async fn find_place(&self, id: ObjectId) -> StoreResult<Option<Place>> {
        Ok(self
            .places()
            .find_one(doc! { "_id": id, "deleted_at": null })
            .await?)
    }

    async fn find_place_by_name(&self, name: &str) -> StoreResult<Option<Place>> {
        Ok(self
            .places()
            .find_one(doc! { "name": name, "deleted_at": null })
            .await?)
    }

    async fn list_places(&self, filter: &PlaceFilter) -> StoreResult<Vec<Place>> {
        let cursor = self
            .places()
            .find(place_query(filter))
            .sort(doc! { "name": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_place(&self, place: &Place) -> StoreResult<bool> {
        let Some(id) = place.id else {
            return Ok(false);
        };
        let result = self
            .places()
            .replace_one(doc! { "_id": id, "deleted_at": null }, place)
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn soft_delete_place(&self, id: ObjectId, at: DateTime<Utc>) -> StoreResult<bool> {
        let update = doc! { "$set": { "deleted_at": at.to_rfc3339() } };
        let result = self
            .places()
            .update_one(doc! { "_id": id, "deleted_at": null }, update)
            .await?;
        Ok(result.matched_count > 0)
    }
}

#[async_trait]
impl ItineraryRepository for MongoStore {
    async fn create_itinerary(&self, itinerary: &Itinerary) -> StoreResult<ObjectId> {
        inserted_id(self.itineraries().insert_one(itinerary).await?)
    }

    async fn add_itinerary_place(&self, entry: &ItineraryPlace) -> StoreResult<ObjectId> {
        inserted_id(self.itinerary_places_collection().insert_one(entry).await?)
    }

    async fn find_itinerary(&self, id: ObjectId) -> StoreResult<Option<Itinerary>> {
        Ok(self.itineraries().find_one(doc! { "_id": id }).await?)
    }

    async fn list_itineraries(&self, user_id: ObjectId) -> StoreResult<Vec<Itinerary>> {
        let cursor = self
            .itineraries()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn itinerary_places(&self, itinerary_id: ObjectId) -> StoreResult<Vec<ItineraryPlace>> {
        let cursor = self
            .itinerary_places_collection()
            .find(doc! { "itinerary_id": itinerary_id })
            .sort(doc! { "day": 1, "order": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete_itinerary(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.itineraries().delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            return Ok(false);
        }
        self.itinerary_places_collection()
            .delete_many(doc! { "itinerary_id": id })
            .await?;
        Ok(true)
    }
}

#[async_trait]
impl TripRepository for MongoStore {
    async fn create_trip(&self, trip: &SavedTrip) -> StoreResult<ObjectId> {
        inserted_id(self.trips().insert_one(trip).await?)
    }

    async fn find_trip(&self, id: ObjectId) -> StoreResult<Option<SavedTrip>> {
        Ok(self.trips().find_one(doc! { "_id": id }).await?)
    }

    async fn list_trips(&self, user_id: ObjectId) -> StoreResult<Vec<SavedTrip>> {
        let cursor = self
            .trips()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_trip(&self, trip: &SavedTrip) -> StoreResult<bool> {
        let Some(id) = trip.id else {
            return Ok(false);
        };
        let result = self.trips().replace_one(doc! { "_id": id }, trip).await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_trip(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.trips().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl ReviewRepository for MongoStore {
    async fn create_review(&self, review: &Review) -> StoreResult<ObjectId> {
        inserted_id(self.reviews().insert_one(review).await?)
    }

    async fn find_review(&self, id: ObjectId) -> StoreResult<Option<Review>> {
        Ok(self.reviews().find_one(doc! { "_id": id }).await?)
    }

    async fn list_reviews(&self, place_id: ObjectId) -> StoreResult<Vec<Review>> {
        let cursor = self
            .reviews()
            .find(doc! { "place_id": place_id })
            .sort(doc! { "created_at": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn delete_review(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.reviews().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[async_trait]
impl BookingRepository for MongoStore {
    async fn create_booking(&self, booking: &Booking) -> StoreResult<ObjectId> {
        inserted_id(self.bookings().insert_one(booking).await?)
    }

    async fn find_booking(&self, id: ObjectId) -> StoreResult<Option<Booking>> {
        Ok(self.bookings().find_one(doc! { "_id": id }).await?)
    }

    async fn list_bookings(&self, user_id: ObjectId) -> StoreResult<Vec<Booking>> {
        let cursor = self
            .bookings()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "check_in": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_booking_status(
        &self,
        id: ObjectId,
        status: BookingStatus,
    ) -> StoreResult<bool> {
        let status = mongodb::bson::to_bson(&status)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let update = doc! {
            "$set": { "status": status, "updated_at": Utc::now().to_rfc3339() }
        };
        let result = self.bookings().update_one(doc! { "_id": id }, update).await?;
        Ok(result.matched_count > 0)
    }
}

#[async_trait]
impl AiLogRepository for MongoStore {
    async fn append_interaction(&self, log: &AiInteractionLog) -> StoreResult<ObjectId> {
        inserted_id(self.interactions().insert_one(log).await?)
    }

    async fn list_interactions(&self, user_id: ObjectId) -> StoreResult<Vec<AiInteractionLog>> {
        let cursor = self
            .interactions()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn append_suggestion(&self, suggestion: &AiSuggestion) -> StoreResult<ObjectId> {
        inserted_id(self.suggestions().insert_one(suggestion).await?)
    }

    async fn list_suggestions(&self, user_id: ObjectId) -> StoreResult<Vec<AiSuggestion>> {
        let cursor = self
            .suggestions()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "created_at": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[async_trait]
impl Store for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client
            .database(&self.database)
            .run_command(doc! {"ping": 1})
            .await?;
        Ok(())
    }
}
