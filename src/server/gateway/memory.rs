//! In-memory gateway for the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::server::gateway::{Gateway, GatewayError};
use crate::server::model::booking::{Booking, NewBooking};
use crate::server::model::table::{Position, Table, TableSpec};

#[derive(Default)]
struct Store {
    tables: HashMap<i64, Table>,
    bookings: Vec<Booking>,
    next_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub(crate) struct MemoryGateway {
    store: Mutex<Store>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_table(&self, table: Table) {
        let mut store = self.store.lock().unwrap();
        store.next_id = store.next_id.max(table.id);
        store.tables.insert(table.id, table);
    }

    pub fn seed_booking(&self, booking: Booking) {
        let mut store = self.store.lock().unwrap();
        store.next_id = store.next_id.max(booking.id);
        store.bookings.push(booking);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn table(&self, table_id: i64) -> Option<Table> {
        self.store.lock().unwrap().tables.get(&table_id).cloned()
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.store.lock().unwrap().bookings.clone()
    }

    fn read_guard(&self) -> Result<(), GatewayError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(GatewayError::Fetch);
        }
        Ok(())
    }

    fn write_guard(&self) -> Result<(), GatewayError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Persistence);
        }
        Ok(())
    }
}

impl Gateway for MemoryGateway {
    async fn list_tables(&self, restaurant_id: i64) -> Result<Vec<Table>, GatewayError> {
        self.read_guard()?;
        Ok(self
            .store
            .lock()
            .unwrap()
            .tables
            .values()
            .filter(|t| t.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn fetch_table(&self, table_id: i64) -> Result<Option<Table>, GatewayError> {
        self.read_guard()?;
        Ok(self.table(table_id))
    }

    async fn create_tables(
        &self,
        restaurant_id: i64,
        created_by: i64,
        specs: &[TableSpec],
    ) -> Result<u64, GatewayError> {
        self.write_guard()?;
        let mut store = self.store.lock().unwrap();
        let mut created = 0;
        for spec in specs {
            for _ in 0..spec.count.max(0) {
                let id = store.next_id();
                store.tables.insert(
                    id,
                    Table {
                        id,
                        restaurant_id,
                        position: Position { x: 0.0, y: 0.0 },
                        capacity: spec.capacity,
                        is_available: true,
                        created_by,
                    },
                );
                created += 1;
            }
        }
        Ok(created)
    }

    async fn update_position(
        &self,
        table_id: i64,
        position: Position,
    ) -> Result<(), GatewayError> {
        self.write_guard()?;
        if let Some(table) = self.store.lock().unwrap().tables.get_mut(&table_id) {
            table.position = position;
        }
        Ok(())
    }

    async fn update_availability(
        &self,
        table_id: i64,
        is_available: bool,
    ) -> Result<(), GatewayError> {
        self.write_guard()?;
        if let Some(table) = self.store.lock().unwrap().tables.get_mut(&table_id) {
            table.is_available = is_available;
        }
        Ok(())
    }

    async fn delete_table(&self, table_id: i64) -> Result<u64, GatewayError> {
        self.write_guard()?;
        Ok(self
            .store
            .lock()
            .unwrap()
            .tables
            .remove(&table_id)
            .map(|_| 1)
            .unwrap_or(0))
    }

    async fn create_booking(&self, booking: &NewBooking) -> Result<Option<Booking>, GatewayError> {
        self.write_guard()?;
        let mut store = self.store.lock().unwrap();
        let open = store
            .tables
            .get(&booking.table_id)
            .is_some_and(|t| t.is_available);
        if !open {
            return Ok(None);
        }
        if let Some(table) = store.tables.get_mut(&booking.table_id) {
            table.is_available = false;
        }
        let id = store.next_id();
        let created = Booking {
            id,
            user_id: booking.user_id,
            restaurant_id: booking.restaurant_id,
            table_id: booking.table_id,
            party_size: booking.party_size,
            booked_at: booking.booked_at,
            expires_at: booking.expires_at,
            is_approved: false,
            is_fulfilled: false,
            is_expired: false,
        };
        store.bookings.push(created.clone());
        Ok(Some(created))
    }

    async fn list_bookings(
        &self,
        restaurant_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Booking>, GatewayError> {
        self.read_guard()?;
        Ok(self
            .store
            .lock()
            .unwrap()
            .bookings
            .iter()
            .filter(|b| b.restaurant_id == restaurant_id)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn set_booking_approval(
        &self,
        booking_id: i64,
        approve: bool,
    ) -> Result<u64, GatewayError> {
        self.write_guard()?;
        let mut store = self.store.lock().unwrap();
        match store.bookings.iter_mut().find(|b| b.id == booking_id) {
            Some(booking) => {
                booking.is_approved = approve;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn stale_bookings(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Booking>, GatewayError> {
        self.read_guard()?;
        Ok(self
            .store
            .lock()
            .unwrap()
            .bookings
            .iter()
            .filter(|b| !b.is_expired && !b.is_fulfilled && b.booked_at <= cutoff)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn expire_bookings(&self, bookings: &[Booking]) -> Result<u64, GatewayError> {
        self.write_guard()?;
        let mut store = self.store.lock().unwrap();
        let mut expired = 0;
        for stale in bookings {
            let Some(booking) = store
                .bookings
                .iter_mut()
                .find(|b| b.id == stale.id && !b.is_expired)
            else {
                continue;
            };
            booking.is_expired = true;
            let table_id = booking.table_id;
            if let Some(table) = store.tables.get_mut(&table_id) {
                table.is_available = true;
            }
            expired += 1;
        }
        Ok(expired)
    }
}
