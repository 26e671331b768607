//! In-memory layout of one restaurant's tables, keyed by table id. Position
//! edits land in a pending slot and only become committed once the gateway
//! write succeeds.

use std::collections::HashMap;

use log::warn;

use crate::server::floorplan::SessionContext;
use crate::server::gateway::{Gateway, GatewayError};
use crate::server::model::table::{Position, Table};

#[derive(Debug, Clone, Copy)]
struct TrackedPosition {
    committed: Position,
    pending: Option<Position>,
}

impl TrackedPosition {
    fn live(&self) -> Position {
        self.pending.unwrap_or(self.committed)
    }
}

#[derive(Debug)]
pub(crate) struct TableLayout {
    restaurant_id: i64,
    tables: HashMap<i64, Table>,
    positions: HashMap<i64, TrackedPosition>,
}

impl TableLayout {
    /// Fetch every table of one restaurant and build the position cache.
    pub async fn load<G: Gateway>(gateway: &G, restaurant_id: i64) -> Result<Self, GatewayError> {
        let records = gateway.list_tables(restaurant_id).await?;
        let mut tables = HashMap::with_capacity(records.len());
        let mut positions = HashMap::with_capacity(records.len());
        for table in records {
            positions.insert(
                table.id,
                TrackedPosition {
                    committed: table.position,
                    pending: None,
                },
            );
            tables.insert(table.id, table);
        }
        Ok(Self {
            restaurant_id,
            tables,
            positions,
        })
    }

    pub fn restaurant_id(&self) -> i64 {
        self.restaurant_id
    }

    pub fn table(&self, table_id: i64) -> Option<&Table> {
        self.tables.get(&table_id)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// The position as the user currently sees it, pending edits included.
    pub fn live_position(&self, table_id: i64) -> Option<Position> {
        self.positions.get(&table_id).map(|p| p.live())
    }

    /// Whether the table has edits that have not reached the gateway.
    pub fn is_dirty(&self, table_id: i64) -> bool {
        self.positions
            .get(&table_id)
            .is_some_and(|p| p.pending.is_some())
    }

    /// Shift one table by a relative offset, locally and immediately. Guests
    /// cannot move tables; their deltas are dropped.
    pub fn apply_delta(
        &mut self,
        ctx: &SessionContext,
        table_id: i64,
        dx: f64,
        dy: f64,
    ) -> bool {
        if !ctx.is_owner() {
            return false;
        }
        match self.positions.get_mut(&table_id) {
            Some(tracked) => {
                tracked.pending = Some(tracked.live().translate(dx, dy));
                true
            }
            None => false,
        }
    }

    /// Persist the live position; safe to repeat with unchanged coordinates.
    /// On failure the pending position is kept — the on-screen position is
    /// the user's intent, and a later commit may still land it.
    pub async fn commit_position<G: Gateway>(
        &mut self,
        gateway: &G,
        table_id: i64,
    ) -> Result<Position, GatewayError> {
        let Some(tracked) = self.positions.get(&table_id).copied() else {
            warn!("position commit for unknown table {}", table_id);
            return Err(GatewayError::Persistence);
        };
        let live = tracked.live();
        gateway.update_position(table_id, live).await?;
        if let Some(tracked) = self.positions.get_mut(&table_id) {
            tracked.committed = live;
            tracked.pending = None;
        }
        if let Some(table) = self.tables.get_mut(&table_id) {
            table.position = live;
        }
        Ok(live)
    }

    /// Persist an availability flag, then reflect it locally.
    pub async fn set_availability<G: Gateway>(
        &mut self,
        gateway: &G,
        table_id: i64,
        is_available: bool,
    ) -> Result<(), GatewayError> {
        gateway.update_availability(table_id, is_available).await?;
        if let Some(table) = self.tables.get_mut(&table_id) {
            table.is_available = is_available;
        }
        Ok(())
    }

    /// Reflect an availability change that was already persisted by another
    /// write (e.g. a booking insert closing the table).
    pub fn mark_unavailable(&mut self, table_id: i64) {
        if let Some(table) = self.tables.get_mut(&table_id) {
            table.is_available = false;
        }
    }

    /// Delete the table remotely, then drop it from the cache.
    pub async fn remove<G: Gateway>(
        &mut self,
        gateway: &G,
        table_id: i64,
    ) -> Result<(), GatewayError> {
        gateway.delete_table(table_id).await?;
        self.tables.remove(&table_id);
        self.positions.remove(&table_id);
        Ok(())
    }
}
