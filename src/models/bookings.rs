use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub place_id: ObjectId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: u32,
    pub status: BookingStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_stay", skip_on_field_errors = false))]
pub struct BookingInput {
    pub place_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[validate(range(min = 1, max = 20, message = "Guests must be between 1 and 20."))]
    pub guests: u32,
}

fn validate_stay(input: &BookingInput) -> Result<(), ValidationError> {
    if input.check_out <= input.check_in {
        let mut err = ValidationError::new("check_out");
        err.message = Some("The check out date must be after the check in date.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct BookingView {
    pub id: String,
    pub place_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub guests: u32,
    pub status: BookingStatus,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Booking> for BookingView {
    fn from(booking: &Booking) -> Self {
        Self {
            id: booking.id.map(|id| id.to_hex()).unwrap_or_default(),
            place_id: booking.place_id.to_hex(),
            check_in: booking.check_in,
            check_out: booking.check_out,
            nights: (booking.check_out - booking.check_in).num_days(),
            guests: booking.guests,
            status: booking.status,
            created_at: booking.created_at,
        }
    }
}
