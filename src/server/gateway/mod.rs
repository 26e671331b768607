//! Seam between the domain logic and the hosted document store. Everything
//! the floor-plan and booking code knows about persistence goes through
//! [`Gateway`], so the same logic runs against postgres in production and
//! the in-memory store in tests.

use chrono::{DateTime, Utc};
use derive_more::{Display, Error};

use crate::server::model::booking::{Booking, NewBooking};
use crate::server::model::table::{Position, Table, TableSpec};

pub(crate) mod postgres;

#[cfg(test)]
pub(crate) mod memory;

#[derive(Debug, Display, Error, PartialEq)]
pub(crate) enum GatewayError {
    /// every pooled connection is checked out
    #[display("no gateway connection available")]
    Busy,
    #[display("failed to read from the gateway")]
    Fetch,
    #[display("failed to write to the gateway")]
    Persistence,
}

pub(crate) trait Gateway {
    async fn list_tables(&self, restaurant_id: i64) -> Result<Vec<Table>, GatewayError>;

    async fn fetch_table(&self, table_id: i64) -> Result<Option<Table>, GatewayError>;

    /// Bulk insert, one row per unit of each spec's count.
    async fn create_tables(
        &self,
        restaurant_id: i64,
        created_by: i64,
        specs: &[TableSpec],
    ) -> Result<u64, GatewayError>;

    async fn update_position(&self, table_id: i64, position: Position)
        -> Result<(), GatewayError>;

    async fn update_availability(
        &self,
        table_id: i64,
        is_available: bool,
    ) -> Result<(), GatewayError>;

    /// Returns the number of deleted rows.
    async fn delete_table(&self, table_id: i64) -> Result<u64, GatewayError>;

    /// Conditional insert: the booking is created and the table closed only
    /// if the table is still open at write time. `None` reports a lost race.
    async fn create_booking(&self, booking: &NewBooking) -> Result<Option<Booking>, GatewayError>;

    async fn list_bookings(
        &self,
        restaurant_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Booking>, GatewayError>;

    async fn set_booking_approval(
        &self,
        booking_id: i64,
        approve: bool,
    ) -> Result<u64, GatewayError>;

    /// Non-expired, non-fulfilled bookings booked at or before `cutoff`.
    async fn stale_bookings(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Booking>, GatewayError>;

    /// Mark the given bookings expired and reopen their tables in one batch
    /// write. Returns the number of bookings expired.
    async fn expire_bookings(&self, bookings: &[Booking]) -> Result<u64, GatewayError>;
}
