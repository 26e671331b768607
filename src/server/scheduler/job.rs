//! Scheduled housekeeping: expire stale bookings and free their tables.

use std::time::Duration;

use log::{error, info};
use tokio::{pin, select, time};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::server::gateway::postgres::PgGateway;
use crate::server::gateway::{Gateway, GatewayError};
use crate::server::util::time as time_util;

/// How often the sweeper runs.
pub(crate) const SWEEP_INTERVAL_SECONDS: u64 = 600;

/// A booking this much older than its booked time counts as abandoned,
/// whatever its own hold window said.
pub(crate) const STALENESS_HOURS: i64 = 3;

/// Bookings handled per tick; anything beyond waits for the next one.
pub(crate) const SWEEP_BATCH_SIZE: i64 = 50;

/// One sweep pass: mark every stale booking expired and reopen its table in
/// a single batch write. Returns how many bookings were expired.
pub(crate) async fn sweep_once<G: Gateway>(gateway: &G) -> Result<u64, GatewayError> {
    let cutoff = time_util::helper::get_utc_now() - chrono::Duration::hours(STALENESS_HOURS);
    let stale = gateway.stale_bookings(cutoff, SWEEP_BATCH_SIZE).await?;
    if stale.is_empty() {
        return Ok(0);
    }
    let expired = gateway.expire_bookings(&stale).await?;
    info!(
        "expired bookings {:?} and reopened their tables",
        stale.iter().map(|b| b.id).collect::<Vec<_>>()
    );
    Ok(expired)
}

async fn worker(gateway: PgGateway, cancel_token: CancellationToken) {
    let interval = time::interval(Duration::from_secs(SWEEP_INTERVAL_SECONDS));
    pin!(interval);
    loop {
        select! {
            _ = interval.tick() => {},
            _ = cancel_token.cancelled() => {
                info!("received cancel signal, returning gracefully");
                return;
            }
        }

        if let Err(e) = sweep_once(&gateway).await {
            error!("booking sweep failed, {}", e);
        }
    }
}

/// Run the sweeper until the token is cancelled.
pub(crate) async fn booking_sweeper(gateway: PgGateway, cancel_token: CancellationToken) {
    let tracker = TaskTracker::new();
    tracker.spawn(worker(gateway, cancel_token));
    if tracker.close() {
        tracker.wait().await;
    }
}
