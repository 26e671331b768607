use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One booking record as the gateway stores it.
#[derive(Debug, Clone)]
pub(crate) struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub restaurant_id: i64,
    pub table_id: i64,
    pub party_size: i16,
    pub booked_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_approved: bool,
    pub is_fulfilled: bool,
    pub is_expired: bool,
}

impl Booking {
    pub fn from_row(row: &Row) -> Result<Self, tokio_postgres::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            restaurant_id: row.try_get("restaurant_id")?,
            table_id: row.try_get("table_id")?,
            party_size: row.try_get("party_size")?,
            booked_at: row.try_get("booked_at")?,
            expires_at: row.try_get("expires_at")?,
            is_approved: row.try_get("is_approved")?,
            is_fulfilled: row.try_get("is_fulfilled")?,
            is_expired: row.try_get("is_expired")?,
        })
    }
}

/// Insert payload for a new booking; the caller supplies both timestamps.
#[derive(Debug, Clone)]
pub(crate) struct NewBooking {
    pub user_id: i64,
    pub restaurant_id: i64,
    pub table_id: i64,
    pub party_size: i16,
    pub booked_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateBookingRequest {
    pub user_id: i64,
    pub restaurant_id: i64,
    pub party_size: i16,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateBookingResponse {
    pub booking_id: Option<i64>,
    pub hold_minutes: Option<i64>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct BookingView {
    pub id: i64,
    pub user_id: i64,
    pub table_id: i64,
    pub party_size: i16,
    pub booked_at: String,
    pub expires_at: String,
    pub is_approved: bool,
    pub is_fulfilled: bool,
    pub is_expired: bool,
}

impl From<&Booking> for BookingView {
    fn from(b: &Booking) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            table_id: b.table_id,
            party_size: b.party_size,
            booked_at: b.booked_at.format(TS_FORMAT).to_string(),
            expires_at: b.expires_at.format(TS_FORMAT).to_string(),
            is_approved: b.is_approved,
            is_fulfilled: b.is_fulfilled,
            is_expired: b.is_expired,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GetBookingsResponse {
    pub bookings: Vec<BookingView>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PatchBookingRequest {
    pub approve: bool,
}
