//! Per-session orchestration of one restaurant's floor plan: fetch on open,
//! local-first drag edits, and the owner/guest interaction split.

use std::collections::HashMap;

use chrono::Duration;
use derive_more::{Display, Error};

use crate::server::floorplan::layout::TableLayout;
use crate::server::floorplan::rules::{self, RejectReason, Verdict};
use crate::server::floorplan::{SessionContext, HOLD_WINDOW_MINUTES};
use crate::server::gateway::{Gateway, GatewayError};
use crate::server::model::booking::NewBooking;
use crate::server::model::table::Position;
use crate::server::util::time;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum TableState {
    Open,
    PendingBooking,
    Booked,
}

#[derive(Debug, Display, Error, PartialEq)]
pub(crate) enum SessionError {
    #[display("only the restaurant owner can do this")]
    NotOwner,
    #[display("unknown table")]
    UnknownTable,
    #[display("party size must be a positive number")]
    InvalidPartySize,
    #[display("no drag in progress")]
    NoActiveDrag,
    #[display("{_0}")]
    Gateway(GatewayError),
}

impl From<GatewayError> for SessionError {
    fn from(e: GatewayError) -> Self {
        Self::Gateway(e)
    }
}

/// Result of releasing a drag. Both cases are reported to the user; only
/// `Failed` is an alert.
#[derive(Debug, PartialEq)]
pub(crate) enum DragOutcome {
    Persisted(Position),
    Failed(Position),
}

#[derive(Debug, PartialEq)]
pub(crate) enum BookingOutcome {
    Confirmed { booking_id: i64, hold_minutes: i64 },
    Rejected(RejectReason),
    /// someone else claimed the table between our read and the write
    TableTaken,
}

pub(crate) struct FloorPlanSession {
    ctx: SessionContext,
    layout: TableLayout,
    states: HashMap<i64, TableState>,
    drag: Option<i64>,
}

impl FloorPlanSession {
    /// Fetch-on-mount: load the layout and derive each table's state.
    pub async fn open<G: Gateway>(
        gateway: &G,
        ctx: SessionContext,
        restaurant_id: i64,
    ) -> Result<Self, GatewayError> {
        let layout = TableLayout::load(gateway, restaurant_id).await?;
        let states = layout
            .tables()
            .map(|t| {
                let state = if t.is_available {
                    TableState::Open
                } else {
                    TableState::Booked
                };
                (t.id, state)
            })
            .collect();
        Ok(Self {
            ctx,
            layout,
            states,
            drag: None,
        })
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    pub fn state_of(&self, table_id: i64) -> Option<TableState> {
        self.states.get(&table_id).copied()
    }

    /// Pointer-down on a table. One drag at a time, owners only.
    pub fn begin_drag(&mut self, table_id: i64) -> Result<(), SessionError> {
        if !self.ctx.is_owner() {
            return Err(SessionError::NotOwner);
        }
        if self.layout.table(table_id).is_none() {
            return Err(SessionError::UnknownTable);
        }
        self.drag = Some(table_id);
        Ok(())
    }

    /// One pointer-move frame; applied locally, no network call.
    pub fn drag_by(&mut self, dx: f64, dy: f64) -> Result<(), SessionError> {
        let table_id = self.drag.ok_or(SessionError::NoActiveDrag)?;
        self.layout.apply_delta(&self.ctx, table_id, dx, dy);
        Ok(())
    }

    /// Pointer-up: persist the dragged position. A failed write keeps the
    /// local position and still ends the drag.
    pub async fn end_drag<G: Gateway>(&mut self, gateway: &G) -> Result<DragOutcome, SessionError> {
        let table_id = self.drag.take().ok_or(SessionError::NoActiveDrag)?;
        match self.layout.commit_position(gateway, table_id).await {
            Ok(position) => Ok(DragOutcome::Persisted(position)),
            Err(_) => {
                let position = self
                    .layout
                    .live_position(table_id)
                    .ok_or(SessionError::UnknownTable)?;
                Ok(DragOutcome::Failed(position))
            }
        }
    }

    /// Guest path: validate the party size, run the rule evaluator, then
    /// conditionally create the booking and close the table.
    pub async fn book<G: Gateway>(
        &mut self,
        gateway: &G,
        table_id: i64,
        party_size: i16,
    ) -> Result<BookingOutcome, SessionError> {
        if party_size <= 0 {
            return Err(SessionError::InvalidPartySize);
        }
        let table = self
            .layout
            .table(table_id)
            .cloned()
            .ok_or(SessionError::UnknownTable)?;
        if self.state_of(table_id) != Some(TableState::Open) {
            return Ok(BookingOutcome::TableTaken);
        }

        self.states.insert(table_id, TableState::PendingBooking);
        if let Verdict::Reject(reason) = rules::evaluate(&table, party_size) {
            // advisory rejection: back to open, nothing changed
            self.states.insert(table_id, TableState::Open);
            return Ok(BookingOutcome::Rejected(reason));
        }

        let booked_at = time::helper::get_utc_now();
        let booking = NewBooking {
            user_id: self.ctx.user_id,
            restaurant_id: self.layout.restaurant_id(),
            table_id,
            party_size,
            booked_at,
            expires_at: booked_at + Duration::minutes(HOLD_WINDOW_MINUTES),
        };
        match gateway.create_booking(&booking).await {
            Ok(Some(created)) => {
                self.states.insert(table_id, TableState::Booked);
                self.layout.mark_unavailable(table_id);
                Ok(BookingOutcome::Confirmed {
                    booking_id: created.id,
                    hold_minutes: HOLD_WINDOW_MINUTES,
                })
            }
            Ok(None) => {
                self.states.insert(table_id, TableState::Booked);
                self.layout.mark_unavailable(table_id);
                Ok(BookingOutcome::TableTaken)
            }
            Err(e) => {
                self.states.insert(table_id, TableState::Open);
                Err(e.into())
            }
        }
    }

    /// Owner action: flip availability, independent of any booking.
    pub async fn toggle_availability<G: Gateway>(
        &mut self,
        gateway: &G,
        table_id: i64,
    ) -> Result<bool, SessionError> {
        if !self.ctx.is_owner() {
            return Err(SessionError::NotOwner);
        }
        let table = self
            .layout
            .table(table_id)
            .ok_or(SessionError::UnknownTable)?;
        let target = !table.is_available;
        self.layout.set_availability(gateway, table_id, target).await?;
        let state = if target {
            TableState::Open
        } else {
            TableState::Booked
        };
        self.states.insert(table_id, state);
        Ok(target)
    }

    /// Owner action: remove the table for good.
    pub async fn remove_table<G: Gateway>(
        &mut self,
        gateway: &G,
        table_id: i64,
    ) -> Result<(), SessionError> {
        if !self.ctx.is_owner() {
            return Err(SessionError::NotOwner);
        }
        if self.layout.table(table_id).is_none() {
            return Err(SessionError::UnknownTable);
        }
        self.layout.remove(gateway, table_id).await?;
        self.states.remove(&table_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::floorplan::Role;
    use crate::server::gateway::memory::MemoryGateway;
    use crate::server::model::table::Table;

    const RESTAURANT: i64 = 11;

    fn owner() -> SessionContext {
        SessionContext {
            user_id: 7,
            role: Role::Owner,
        }
    }

    fn guest() -> SessionContext {
        SessionContext {
            user_id: 42,
            role: Role::Guest,
        }
    }

    fn seed(gateway: &MemoryGateway, id: i64, capacity: i16) {
        gateway.seed_table(Table {
            id,
            restaurant_id: RESTAURANT,
            position: Position { x: 100.0, y: 100.0 },
            capacity,
            is_available: true,
            created_by: 7,
        });
    }

    #[tokio::test]
    async fn booking_an_open_table_confirms_and_closes_it() {
        let gateway = MemoryGateway::new();
        seed(&gateway, 1, 4);
        let mut session = FloorPlanSession::open(&gateway, guest(), RESTAURANT)
            .await
            .unwrap();

        let outcome = session.book(&gateway, 1, 4).await.unwrap();
        assert_eq!(
            outcome,
            BookingOutcome::Confirmed {
                booking_id: 2,
                hold_minutes: HOLD_WINDOW_MINUTES
            }
        );
        assert_eq!(session.state_of(1), Some(TableState::Booked));
        assert!(!gateway.table(1).unwrap().is_available);

        let bookings = gateway.bookings();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].table_id, 1);
        assert_eq!(bookings[0].user_id, 42);
        assert_eq!(
            bookings[0].expires_at - bookings[0].booked_at,
            Duration::minutes(HOLD_WINDOW_MINUTES)
        );
    }

    #[tokio::test]
    async fn rejected_booking_changes_nothing() {
        let gateway = MemoryGateway::new();
        seed(&gateway, 1, 4);
        let mut session = FloorPlanSession::open(&gateway, guest(), RESTAURANT)
            .await
            .unwrap();

        let outcome = session.book(&gateway, 1, 5).await.unwrap();
        assert_eq!(
            outcome,
            BookingOutcome::Rejected(RejectReason::PartyTooLarge)
        );
        assert_eq!(session.state_of(1), Some(TableState::Open));
        assert!(gateway.table(1).unwrap().is_available);
        assert!(gateway.bookings().is_empty());
    }

    #[tokio::test]
    async fn non_positive_party_size_is_invalid() {
        let gateway = MemoryGateway::new();
        seed(&gateway, 1, 4);
        let mut session = FloorPlanSession::open(&gateway, guest(), RESTAURANT)
            .await
            .unwrap();

        assert_eq!(
            session.book(&gateway, 1, 0).await.unwrap_err(),
            SessionError::InvalidPartySize
        );
        assert!(gateway.bookings().is_empty());
    }

    #[tokio::test]
    async fn losing_the_booking_race_reports_taken() {
        let gateway = MemoryGateway::new();
        seed(&gateway, 1, 4);
        let mut session = FloorPlanSession::open(&gateway, guest(), RESTAURANT)
            .await
            .unwrap();

        // another client books the table after our fetch
        gateway.update_availability(1, false).await.unwrap();

        let outcome = session.book(&gateway, 1, 4).await.unwrap();
        assert_eq!(outcome, BookingOutcome::TableTaken);
        assert_eq!(session.state_of(1), Some(TableState::Booked));
        assert!(gateway.bookings().is_empty());
    }

    #[tokio::test]
    async fn gateway_failure_leaves_the_table_open() {
        let gateway = MemoryGateway::new();
        seed(&gateway, 1, 4);
        let mut session = FloorPlanSession::open(&gateway, guest(), RESTAURANT)
            .await
            .unwrap();

        gateway.fail_writes(true);
        let err = session.book(&gateway, 1, 4).await.unwrap_err();
        assert_eq!(err, SessionError::Gateway(GatewayError::Persistence));
        assert_eq!(session.state_of(1), Some(TableState::Open));
    }

    #[tokio::test]
    async fn drag_round_trip_persists_the_accumulated_offset() {
        let gateway = MemoryGateway::new();
        seed(&gateway, 1, 4);
        let mut session = FloorPlanSession::open(&gateway, owner(), RESTAURANT)
            .await
            .unwrap();

        session.begin_drag(1).unwrap();
        session.drag_by(3.0, 4.0).unwrap();
        session.drag_by(5.0, 6.0).unwrap();
        let outcome = session.end_drag(&gateway).await.unwrap();

        assert_eq!(
            outcome,
            DragOutcome::Persisted(Position { x: 108.0, y: 110.0 })
        );
        assert_eq!(
            gateway.table(1).unwrap().position,
            Position { x: 108.0, y: 110.0 }
        );
    }

    #[tokio::test]
    async fn failed_drag_release_reports_the_kept_local_position() {
        let gateway = MemoryGateway::new();
        seed(&gateway, 1, 4);
        let mut session = FloorPlanSession::open(&gateway, owner(), RESTAURANT)
            .await
            .unwrap();

        session.begin_drag(1).unwrap();
        session.drag_by(10.0, 0.0).unwrap();
        gateway.fail_writes(true);
        let outcome = session.end_drag(&gateway).await.unwrap();

        assert_eq!(outcome, DragOutcome::Failed(Position { x: 110.0, y: 100.0 }));
        assert!(session.layout().is_dirty(1));
        assert_eq!(
            gateway.table(1).unwrap().position,
            Position { x: 100.0, y: 100.0 }
        );
    }

    #[tokio::test]
    async fn guests_cannot_drag_toggle_or_remove() {
        let gateway = MemoryGateway::new();
        seed(&gateway, 1, 4);
        let mut session = FloorPlanSession::open(&gateway, guest(), RESTAURANT)
            .await
            .unwrap();

        assert_eq!(session.begin_drag(1).unwrap_err(), SessionError::NotOwner);
        assert_eq!(
            session.toggle_availability(&gateway, 1).await.unwrap_err(),
            SessionError::NotOwner
        );
        assert_eq!(
            session.remove_table(&gateway, 1).await.unwrap_err(),
            SessionError::NotOwner
        );
        assert!(gateway.table(1).is_some());
    }

    #[tokio::test]
    async fn owner_toggle_flips_between_open_and_closed() {
        let gateway = MemoryGateway::new();
        seed(&gateway, 1, 4);
        let mut session = FloorPlanSession::open(&gateway, owner(), RESTAURANT)
            .await
            .unwrap();

        assert!(!session.toggle_availability(&gateway, 1).await.unwrap());
        assert_eq!(session.state_of(1), Some(TableState::Booked));
        assert!(!gateway.table(1).unwrap().is_available);

        assert!(session.toggle_availability(&gateway, 1).await.unwrap());
        assert_eq!(session.state_of(1), Some(TableState::Open));
    }

    #[tokio::test]
    async fn removed_table_stays_gone_after_a_reload() {
        let gateway = MemoryGateway::new();
        seed(&gateway, 1, 4);
        seed(&gateway, 2, 2);
        let mut session = FloorPlanSession::open(&gateway, owner(), RESTAURANT)
            .await
            .unwrap();

        session.remove_table(&gateway, 1).await.unwrap();
        assert!(session.state_of(1).is_none());

        let reloaded = FloorPlanSession::open(&gateway, owner(), RESTAURANT)
            .await
            .unwrap();
        assert!(reloaded.layout().table(1).is_none());
        assert!(reloaded.layout().table(2).is_some());
    }
}
