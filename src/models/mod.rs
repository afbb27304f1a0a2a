pub mod ai_log;
pub mod bookings;
pub mod itinerary;
pub mod place;
pub mod review;
pub mod saved_trip;
pub mod timeline;
pub mod user;
