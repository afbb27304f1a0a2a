use chrono::{Duration, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;

use crate::db::repository::{ItineraryRepository, PlaceRepository, Store, StoreResult};
use crate::models::{
    itinerary::{
        Itinerary, ItineraryDay, ItineraryDetail, ItineraryPlace, ItineraryStop,
        ItinerarySummary, SaveItineraryInput,
    },
    place::Place,
    timeline::{Timeline, TimelineActivity, TimelineDay, TripPreferences},
};

fn default_title(prefs: Option<&TripPreferences>, timeline: &Timeline) -> String {
    let mut regions: Vec<String> = match prefs {
        Some(prefs) => prefs.region_names(),
        None => Vec::new(),
    };
    if regions.is_empty() {
        for day in &timeline.days {
            if !day.region.is_empty() && !regions.contains(&day.region) {
                regions.push(day.region.clone());
            }
        }
    }
    let destination = if regions.is_empty() {
        "日本".to_string()
    } else {
        regions.join("・")
    };
    format!("{} {}日間の旅", destination, timeline.days.len())
}

fn offset_date(start: Option<NaiveDate>, days: u32) -> Option<NaiveDate> {
    start.map(|date| date + Duration::days(i64::from(days)))
}

/// Reuses a live place with the same name, otherwise creates one owned by
/// the user and tagged with the activity kind.
async fn resolve_place(
    store: &dyn Store,
    user_id: ObjectId,
    day: &TimelineDay,
    activity: &TimelineActivity,
) -> StoreResult<ObjectId> {
    if let Some(existing) = store.find_place_by_name(&activity.name).await? {
        if let Some(id) = existing.id {
            return Ok(id);
        }
    }

    let now = Utc::now();
    let tag = activity.kind.place_tag();
    let place = Place {
        id: None,
        owner_id: user_id,
        name: activity.name.clone(),
        description: Some(activity.description.clone()).filter(|d| !d.is_empty()),
        region: Some(day.region.clone()).filter(|r| !r.is_empty()),
        address: activity.location.clone(),
        latitude: None,
        longitude: None,
        tags: vec![tag.to_string()],
        genre_name: Some(tag.to_string()),
        categories: Vec::new(),
        price: Some(activity.cost).filter(|cost| *cost > 0.0),
        deleted_at: None,
        created_at: Some(now),
        updated_at: Some(now),
    };
    store.create_place(&place).await
}

/// Stores a timeline as an itinerary with one entry per activity.
pub async fn persist_itinerary(
    store: &dyn Store,
    user_id: ObjectId,
    input: SaveItineraryInput,
) -> StoreResult<ObjectId> {
    let timeline = input.timeline.recalculated();
    let now = Utc::now();

    let title = input
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| default_title(input.preferences.as_ref(), &timeline));
    let last_offset = (timeline.days.len() as u32).saturating_sub(1);

    let itinerary = Itinerary {
        id: None,
        user_id,
        title,
        start_date: input.start_date,
        end_date: offset_date(input.start_date, last_offset),
        preferences: input.preferences,
        created_at: Some(now),
        updated_at: Some(now),
    };
    let itinerary_id = store.create_itinerary(&itinerary).await?;

    // A half-written itinerary is removed again, entries included.
    let written = store_entries(store, user_id, itinerary_id, input.start_date, &timeline).await;
    if let Err(err) = written {
        if let Err(cleanup) = store.delete_itinerary(itinerary_id).await {
            log::error!(
                "Failed to remove partial itinerary {}: {}",
                itinerary_id,
                cleanup
            );
        }
        return Err(err);
    }

    log::info!(
        "Stored itinerary {} with {} days for user {}",
        itinerary_id,
        timeline.days.len(),
        user_id
    );
    Ok(itinerary_id)
}

async fn store_entries(
    store: &dyn Store,
    user_id: ObjectId,
    itinerary_id: ObjectId,
    start_date: Option<NaiveDate>,
    timeline: &Timeline,
) -> StoreResult<()> {
    let now = Utc::now();
    for day in &timeline.days {
        let visit_date = offset_date(start_date, day.day.saturating_sub(1));
        for (index, activity) in day.activities.iter().enumerate() {
            if activity.name.trim().is_empty() {
                continue;
            }
            let place_id = resolve_place(store, user_id, day, activity).await?;
            let end_time = day
                .activities
                .get(index + 1)
                .map(|next| next.time.clone())
                .filter(|t| !t.is_empty());

            let entry = ItineraryPlace {
                id: None,
                itinerary_id,
                place_id,
                day: day.day,
                visit_date,
                start_time: Some(activity.time.clone()).filter(|t| !t.is_empty()),
                end_time,
                order: index as i32 + 1,
                cost: activity.cost,
                notes: Some(activity.description.clone()).filter(|d| !d.is_empty()),
                created_at: Some(now),
            };
            store.add_itinerary_place(&entry).await?;
        }
    }
    Ok(())
}

/// Groups an itinerary's entries by day, in `(day, order)` sequence.
pub async fn itinerary_detail(
    store: &dyn Store,
    itinerary: &Itinerary,
) -> StoreResult<ItineraryDetail> {
    let Some(itinerary_id) = itinerary.id else {
        return Ok(ItineraryDetail {
            summary: ItinerarySummary::from(itinerary),
            preferences: itinerary.preferences.clone(),
            days: Vec::new(),
            total_cost: 0.0,
        });
    };

    let entries = store.itinerary_places(itinerary_id).await?;
    let mut days: Vec<ItineraryDay> = Vec::new();
    let mut total_cost = 0.0;

    for entry in entries {
        let place_name = store.find_place(entry.place_id).await?.map(|p| p.name);
        total_cost += entry.cost;
        let stop = ItineraryStop {
            id: entry.id.map(|id| id.to_hex()).unwrap_or_default(),
            place_id: entry.place_id.to_hex(),
            place_name,
            start_time: entry.start_time,
            end_time: entry.end_time,
            order: entry.order,
            cost: entry.cost,
            notes: entry.notes,
        };
        match days.last_mut() {
            Some(current) if current.day == entry.day => current.stops.push(stop),
            _ => days.push(ItineraryDay {
                day: entry.day,
                visit_date: entry.visit_date,
                stops: vec![stop],
            }),
        }
    }

    Ok(ItineraryDetail {
        summary: ItinerarySummary::from(itinerary),
        preferences: itinerary.preferences.clone(),
        days,
        total_cost,
    })
}
