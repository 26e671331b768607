use chrono::{DateTime, Utc};
use log::error;
use tokio_postgres::types::ToSql;

use crate::server::database::pool::{Pool, PooledConn};
use crate::server::gateway::{Gateway, GatewayError};
use crate::server::model::booking::{Booking, NewBooking};
use crate::server::model::table::{Position, Table, TableSpec};

/// Gateway backed by the postgres pools. Reads and writes go through
/// separate pools so a burst of one cannot starve the other.
#[derive(Clone)]
pub(crate) struct PgGateway {
    read_pool: Pool,
    write_pool: Pool,
}

impl PgGateway {
    pub fn new(read_pool: Pool, write_pool: Pool) -> Self {
        Self {
            read_pool,
            write_pool,
        }
    }

    fn read_conn(&self) -> Result<PooledConn, GatewayError> {
        self.read_pool.acquire().ok_or(GatewayError::Busy)
    }

    fn write_conn(&self) -> Result<PooledConn, GatewayError> {
        self.write_pool.acquire().ok_or(GatewayError::Busy)
    }
}

fn table_from_row(row: &tokio_postgres::Row) -> Result<Table, GatewayError> {
    Table::from_row(row).map_err(|e| {
        error!("malformed table row, {}", e);
        GatewayError::Fetch
    })
}

fn booking_from_row(row: &tokio_postgres::Row) -> Result<Booking, GatewayError> {
    Booking::from_row(row).map_err(|e| {
        error!("malformed booking row, {}", e);
        GatewayError::Fetch
    })
}

impl Gateway for PgGateway {
    async fn list_tables(&self, restaurant_id: i64) -> Result<Vec<Table>, GatewayError> {
        let conn = self.read_conn()?;
        let rows = conn
            .query(
                r#"
                SELECT id, restaurant_id, pos_x, pos_y, capacity, is_available, created_by
                FROM restaurant_table
                WHERE restaurant_id = $1
                "#,
                &[&restaurant_id],
            )
            .await
            .map_err(|e| {
                error!("list_tables failed, {}", e);
                GatewayError::Fetch
            })?;
        rows.iter().map(table_from_row).collect()
    }

    async fn fetch_table(&self, table_id: i64) -> Result<Option<Table>, GatewayError> {
        let conn = self.read_conn()?;
        let rows = conn
            .query(
                r#"
                SELECT id, restaurant_id, pos_x, pos_y, capacity, is_available, created_by
                FROM restaurant_table
                WHERE id = $1
                "#,
                &[&table_id],
            )
            .await
            .map_err(|e| {
                error!("fetch_table failed, {}", e);
                GatewayError::Fetch
            })?;
        rows.first().map(table_from_row).transpose()
    }

    async fn create_tables(
        &self,
        restaurant_id: i64,
        created_by: i64,
        specs: &[TableSpec],
    ) -> Result<u64, GatewayError> {
        let capacities: Vec<i16> = specs
            .iter()
            .flat_map(|s| std::iter::repeat(s.capacity).take(s.count.max(0) as usize))
            .collect();
        if capacities.is_empty() {
            return Ok(0);
        }

        let mut stmt =
            "INSERT INTO restaurant_table(restaurant_id, capacity, created_by) VALUES".to_string();
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(capacities.len() + 2);
        params.push(&restaurant_id);
        params.push(&created_by);
        let mut idx = 3;
        for (i, capacity) in capacities.iter().enumerate() {
            let maybe_comma = if i != capacities.len() - 1 { "," } else { "" };
            stmt.push_str(&format!(" ($1, ${}, $2){}", idx, maybe_comma));
            params.push(capacity);
            idx += 1;
        }

        let conn = self.write_conn()?;
        conn.execute(stmt.as_str(), params.as_slice())
            .await
            .map_err(|e| {
                error!("create_tables failed, {}", e);
                GatewayError::Persistence
            })
    }

    async fn update_position(
        &self,
        table_id: i64,
        position: Position,
    ) -> Result<(), GatewayError> {
        let conn = self.write_conn()?;
        conn.execute(
            r#"
            UPDATE restaurant_table
            SET pos_x = $2, pos_y = $3
            WHERE id = $1
            "#,
            &[&table_id, &position.x, &position.y],
        )
        .await
        .map(|_| ())
        .map_err(|e| {
            error!("update_position failed, {}", e);
            GatewayError::Persistence
        })
    }

    async fn update_availability(
        &self,
        table_id: i64,
        is_available: bool,
    ) -> Result<(), GatewayError> {
        let conn = self.write_conn()?;
        conn.execute(
            r#"
            UPDATE restaurant_table
            SET is_available = $2
            WHERE id = $1
            "#,
            &[&table_id, &is_available],
        )
        .await
        .map(|_| ())
        .map_err(|e| {
            error!("update_availability failed, {}", e);
            GatewayError::Persistence
        })
    }

    async fn delete_table(&self, table_id: i64) -> Result<u64, GatewayError> {
        let conn = self.write_conn()?;
        conn.execute("DELETE FROM restaurant_table WHERE id = $1", &[&table_id])
            .await
            .map_err(|e| {
                error!("delete_table failed, {}", e);
                GatewayError::Persistence
            })
    }

    async fn create_booking(&self, booking: &NewBooking) -> Result<Option<Booking>, GatewayError> {
        let conn = self.write_conn()?;
        // the insert only sees the table row if it was still open when the
        // CTE update claimed it
        let rows = conn
            .query(
                r#"
                WITH held AS (
                    UPDATE restaurant_table
                    SET is_available = FALSE
                    WHERE id = $3 AND is_available = TRUE
                    RETURNING id
                )
                INSERT INTO booking(user_id, restaurant_id, table_id, party_size, booked_at, expires_at)
                SELECT $1, $2, held.id, $4, $5, $6
                FROM held
                RETURNING id
                "#,
                &[
                    &booking.user_id,
                    &booking.restaurant_id,
                    &booking.table_id,
                    &booking.party_size,
                    &booking.booked_at,
                    &booking.expires_at,
                ],
            )
            .await
            .map_err(|e| {
                error!("create_booking failed, {}", e);
                GatewayError::Persistence
            })?;

        let Some(row) = rows.first() else {
            return Ok(None); // table was taken between the read and this write
        };
        let id: i64 = row.try_get("id").map_err(|e| {
            error!("malformed booking insert result, {}", e);
            GatewayError::Persistence
        })?;
        Ok(Some(Booking {
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
        }))
    }

    async fn list_bookings(
        &self,
        restaurant_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Booking>, GatewayError> {
        let conn = self.read_conn()?;
        let rows = conn
            .query(
                r#"
                SELECT id, user_id, restaurant_id, table_id, party_size,
                       booked_at, expires_at, is_approved, is_fulfilled, is_expired
                FROM booking
                WHERE restaurant_id = $1
                ORDER BY booked_at DESC
                OFFSET $2
                LIMIT $3
                "#,
                &[&restaurant_id, &offset, &limit],
            )
            .await
            .map_err(|e| {
                error!("list_bookings failed, {}", e);
                GatewayError::Fetch
            })?;
        rows.iter().map(booking_from_row).collect()
    }

    async fn set_booking_approval(
        &self,
        booking_id: i64,
        approve: bool,
    ) -> Result<u64, GatewayError> {
        let conn = self.write_conn()?;
        conn.execute(
            "UPDATE booking SET is_approved = $2 WHERE id = $1",
            &[&booking_id, &approve],
        )
        .await
        .map_err(|e| {
            error!("set_booking_approval failed, {}", e);
            GatewayError::Persistence
        })
    }

    async fn stale_bookings(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Booking>, GatewayError> {
        let conn = self.read_conn()?;
        let rows = conn
            .query(
                r#"
                SELECT id, user_id, restaurant_id, table_id, party_size,
                       booked_at, expires_at, is_approved, is_fulfilled, is_expired
                FROM booking
                WHERE is_expired = FALSE
                AND is_fulfilled = FALSE
                AND booked_at <= $1
                LIMIT $2
                "#,
                &[&cutoff, &limit],
            )
            .await
            .map_err(|e| {
                error!("stale_bookings failed, {}", e);
                GatewayError::Fetch
            })?;
        rows.iter().map(booking_from_row).collect()
    }

    async fn expire_bookings(&self, bookings: &[Booking]) -> Result<u64, GatewayError> {
        if bookings.is_empty() {
            return Ok(0);
        }
        let ids = bookings
            .iter()
            .map(|b| b.id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let stmt = format!(
            r#"
            WITH reopened AS (
                UPDATE restaurant_table t
                SET is_available = TRUE
                FROM booking b
                WHERE b.id IN ({ids})
                AND b.is_expired = FALSE
                AND t.id = b.table_id
                RETURNING t.id
            )
            UPDATE booking
            SET is_expired = TRUE
            WHERE is_expired = FALSE AND id IN ({ids})
            RETURNING id
            "#
        );

        let conn = self.write_conn()?;
        let rows = conn.query(stmt.as_str(), &[]).await.map_err(|e| {
            error!("expire_bookings failed, {}", e);
            GatewayError::Persistence
        })?;
        Ok(rows.len() as u64)
    }
}
